// Routing rule engine
//
// Maps an onboarding request to its organizational placement. Evaluation is
// ordered, first match wins, and the configured default catches everything
// else so resolution can never fail.

pub mod rules;

pub use rules::{
    Placement, PlacementConfigError, PlacementResolution, PlacementRule, PlacementRules,
    PlacementTarget, RuleConditions,
};
