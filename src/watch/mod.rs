pub mod watcher;

pub use watcher::{wait_for_file, StoreWatcher, FILE_POLL_INTERVAL};
