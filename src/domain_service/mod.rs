mod duplicate_checker;

pub use duplicate_checker::*;
