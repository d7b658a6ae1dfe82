pub mod fakes;
pub mod fixtures;
pub mod strategies;

pub use fakes::*;
pub use fixtures::*;
pub use strategies::*;
