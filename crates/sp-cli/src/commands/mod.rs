//! CLI command implementations

pub(crate) mod common;
pub(crate) mod ls;
pub(crate) mod progress;
pub(crate) mod run;
