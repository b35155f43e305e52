//! CLI command implementations

pub(crate) mod analyze;
pub(crate) mod common;
pub(crate) mod inspect;
pub(crate) mod output;
