pub mod acme;
pub mod cli;
pub mod utils;
pub mod watch;

pub use acme::{AcmeStore, ExportSummary, StoreFormat, StoreVersion};
pub use cli::{args, commands};
pub use utils::errors::{Result, TraextorError};
pub use watch::StoreWatcher;
