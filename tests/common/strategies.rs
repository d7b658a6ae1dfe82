use proptest::prelude::*;

use gangway::models::{EmployeeData, OnboardingRequest};

/// Strategy for ticket keys in the shape the ticketing system issues
pub fn ticket_key_strategy() -> impl Strategy<Value = String> {
    "HR-[1-9][0-9]{0,4}"
}

/// Strategy for two-token human names, with the punctuation real names carry
pub fn full_name_strategy() -> impl Strategy<Value = String> {
    ("[A-Za-z][A-Za-z'-]{0,11}", "[A-Za-z][A-Za-z'-]{0,14}")
        .prop_map(|(first, last)| format!("{first} {last}"))
}

/// Strategy for raw name fragments, including ones that sanitize to nothing
pub fn name_part_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z .'-]{0,12}"
}

/// Strategy for departments: some covered by the test rules, some not
pub fn department_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(
        &[
            "Engineering",
            "Platform Engineering",
            "Finance",
            "People Operations",
            "Sales",
            "Design",
        ][..],
    )
    .prop_map(str::to_string)
}

/// Strategy for optional work locations
pub fn location_strategy() -> impl Strategy<Value = Option<String>> {
    prop::option::of(
        prop::sample::select(&["London", "Manchester", "Remote", "New York"][..])
            .prop_map(str::to_string),
    )
}

/// Strategy for validated onboarding requests
pub fn request_strategy() -> impl Strategy<Value = OnboardingRequest> {
    (
        ticket_key_strategy(),
        full_name_strategy(),
        department_strategy(),
        location_strategy(),
    )
        .prop_map(|(ticket_key, full_name, department, work_location)| {
            OnboardingRequest::from_parts(
                &ticket_key,
                EmployeeData {
                    full_name: Some(full_name),
                    department: Some(department),
                    work_location,
                    ..Default::default()
                },
            )
            .expect("generated request should validate")
        })
}
