//! Command implementations
//!
//! Argument parsing lives in the `cli` module; each submodule here holds
//! the implementation for one command area.

mod core;
mod export;
mod import;
mod reports;
mod serve;

pub use core::{cmd_init, cmd_status, open_db};
pub use export::cmd_export;
pub use import::cmd_import;
pub use reports::cmd_report;
pub use serve::cmd_serve;
