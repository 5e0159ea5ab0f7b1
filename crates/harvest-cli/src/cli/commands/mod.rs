//! CLI command handlers, one file per command.

mod chunk;
mod consolidate;
mod plan;
mod session;
mod status;

pub use chunk::run_chunk;
pub use consolidate::run_consolidate;
pub use plan::run_plan;
pub use session::{run_session_encode, run_session_import_har};
pub use status::run_status;
