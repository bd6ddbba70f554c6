pub mod errors;
pub mod logging;
pub mod paths;
pub mod pem;

pub use errors::*;
pub use paths::*;
pub use pem::*;
