pub mod inputs;
pub mod outcome;
