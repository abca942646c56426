//! Command implementations
//!
//! Thin CLI wrappers that resolve config/ledger and delegate to the domain
//! modules.

pub mod completions;
pub mod dev;
pub mod gains;
pub mod helpers;
pub mod import;
pub mod lots;
pub mod version;
