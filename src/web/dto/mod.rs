pub mod account;
pub mod attempt;
pub mod certificate;
pub mod course;
pub mod grammar;
pub mod study;
