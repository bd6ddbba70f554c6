pub mod export;
pub mod model;
pub mod store;

pub use export::{export_certificates, ExportSummary};
pub use model::{Account, Certificate, Domain, FlatStore, NamespacedStore};
pub use store::{AcmeStore, StoreFormat, StoreVersion};
