pub mod signal;
pub mod validation;
