//! Utility functions

mod paths;

pub use paths::expand_home;
