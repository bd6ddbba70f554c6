use crate::acme::export::{export_certificates, sanitize_filename, ExportSummary};
use crate::acme::model::{FlatStore, NamespacedStore};
use crate::utils::errors::{Result, TraextorError};
use ordermap::OrderMap;
use serde_json::{Map, Value};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Layout of the ACME file, picked once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreVersion {
    /// Traefik v1: flat document
    V1,
    /// Traefik v2 and later: one document per certificate resolver
    V2,
}

impl StoreVersion {
    /// `"1"` selects the flat layout, anything else the namespaced one
    pub fn from_selector(selector: &str) -> Self {
        match selector.trim() {
            "1" => StoreVersion::V1,
            _ => StoreVersion::V2,
        }
    }
}

impl fmt::Display for StoreVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreVersion::V1 => write!(f, "v1 (flat)"),
            StoreVersion::V2 => write!(f, "v2 (namespaced)"),
        }
    }
}

/// Behaviour shared by both ACME file layouts
pub trait StoreFormat: Sized {
    const VERSION: StoreVersion;

    /// Parse a complete ACME document
    fn from_slice(bytes: &[u8]) -> Result<Self>;

    /// Write every certificate/key pair below `output_dir`
    fn export(&self, output_dir: &Path) -> Result<ExportSummary>;

    fn certificate_count(&self) -> usize;
}

impl StoreFormat for FlatStore {
    const VERSION: StoreVersion = StoreVersion::V1;

    fn from_slice(bytes: &[u8]) -> Result<Self> {
        let store = flat_from_value(serde_json::from_slice(bytes)?)?;
        validate(&store).map_err(TraextorError::InvalidStore)?;

        if store.is_empty() {
            tracing::warn!(
                "ACME file has no account and no certificates, check that TRAEFIK_VERSION matches your Traefik version"
            );
        }
        Ok(store)
    }

    fn export(&self, output_dir: &Path) -> Result<ExportSummary> {
        export_certificates(&self.certificates, output_dir)
    }

    fn certificate_count(&self) -> usize {
        self.certificates.len()
    }
}

impl StoreFormat for NamespacedStore {
    const VERSION: StoreVersion = StoreVersion::V2;

    fn from_slice(bytes: &[u8]) -> Result<Self> {
        let raw: OrderMap<String, Value> = serde_json::from_slice(bytes)?;

        let mut stores = OrderMap::with_capacity(raw.len());
        for (name, document) in raw {
            let store = flat_from_value(document).map_err(|source| TraextorError::ParseStore {
                store: name.clone(),
                source,
            })?;
            validate(&store)
                .map_err(|e| TraextorError::InvalidStore(format!("store '{name}': {e}")))?;
            stores.insert(name, store);
        }

        Ok(NamespacedStore { stores })
    }

    fn export(&self, output_dir: &Path) -> Result<ExportSummary> {
        let mut summary = ExportSummary::default();

        for (name, store) in &self.stores {
            let store_dir = output_dir.join(sanitize_filename(name));
            tracing::info!("Exporting store '{}' to {}", name, store_dir.display());
            summary.merge(store.export(&store_dir)?);
        }

        Ok(summary)
    }

    fn certificate_count(&self) -> usize {
        self.stores.values().map(FlatStore::certificate_count).sum()
    }
}

/// A loaded ACME file in either layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcmeStore {
    Flat(FlatStore),
    Namespaced(NamespacedStore),
}

impl AcmeStore {
    /// Read a whole stream and parse it with the layout of `version`
    pub fn load<R: Read>(version: StoreVersion, mut reader: R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_slice(version, &bytes)
    }

    /// Parse an in-memory document with the layout of `version`
    pub fn from_slice(version: StoreVersion, bytes: &[u8]) -> Result<Self> {
        match version {
            StoreVersion::V1 => FlatStore::from_slice(bytes).map(AcmeStore::Flat),
            StoreVersion::V2 => NamespacedStore::from_slice(bytes).map(AcmeStore::Namespaced),
        }
    }

    /// Open and parse the ACME file at `path`
    pub fn load_from_file(version: StoreVersion, path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => TraextorError::NotFound(path.to_path_buf()),
            _ => TraextorError::Io(e),
        })?;

        let store = Self::load(version, file)?;
        tracing::debug!(
            "Loaded {} with {} certificate(s) as {}",
            path.display(),
            store.certificate_count(),
            store.version()
        );
        Ok(store)
    }

    /// Layout this store was parsed from
    pub fn version(&self) -> StoreVersion {
        match self {
            AcmeStore::Flat(_) => FlatStore::VERSION,
            AcmeStore::Namespaced(_) => NamespacedStore::VERSION,
        }
    }

    /// Run one export pass into `output_dir`
    pub fn export(&self, output_dir: &Path) -> Result<ExportSummary> {
        match self {
            AcmeStore::Flat(store) => store.export(output_dir),
            AcmeStore::Namespaced(store) => store.export(output_dir),
        }
    }

    /// Number of certificate entries across all resolvers
    pub fn certificate_count(&self) -> usize {
        match self {
            AcmeStore::Flat(store) => store.certificate_count(),
            AcmeStore::Namespaced(store) => store.certificate_count(),
        }
    }
}

/// Both layouts are built from JSON objects; serde would otherwise accept an
/// array as a tuple of `FlatStore` fields.
fn flat_from_value(document: Value) -> serde_json::Result<FlatStore> {
    let object: Map<String, Value> = serde_json::from_value(document)?;
    serde_json::from_value(Value::Object(object))
}

fn validate(store: &FlatStore) -> std::result::Result<(), String> {
    match store
        .certificates
        .iter()
        .position(|cert| cert.domain.main.is_empty())
    {
        Some(index) => Err(format!("certificate #{index} has no main domain")),
        None => Ok(()),
    }
}
