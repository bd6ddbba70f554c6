use crate::acme::model::Certificate;
use crate::utils::errors::{Result, TraextorError};
use crate::utils::paths::{ensure_dir_exists, write_atomic};
use crate::utils::pem::{PemCertificate, PemPrivateKey};
use std::path::{Path, PathBuf};

/// What one export pass wrote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub certificates: usize,
    /// Files in the order they were written
    pub files: Vec<PathBuf>,
}

impl ExportSummary {
    /// Fold the result of a sub-store pass into this one
    pub fn merge(&mut self, other: ExportSummary) {
        self.certificates += other.certificates;
        self.files.extend(other.files);
    }
}

/// Export every certificate in order into `output_dir`.
///
/// Stops at the first decode or write error; files written before it stay on disk.
pub fn export_certificates(
    certificates: &[Certificate],
    output_dir: &Path,
) -> Result<ExportSummary> {
    ensure_dir_exists(output_dir).map_err(|source| TraextorError::Write {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let mut summary = ExportSummary::default();
    for cert in certificates {
        export_certificate(cert, output_dir, &mut summary)?;
        summary.certificates += 1;
    }

    Ok(summary)
}

fn export_certificate(
    cert: &Certificate,
    output_dir: &Path,
    summary: &mut ExportSummary,
) -> Result<()> {
    let domain = &cert.domain.main;

    let key = PemPrivateKey::from_base64(&cert.key).map_err(|source| TraextorError::Decode {
        domain: domain.clone(),
        field: "Key",
        source,
    })?;
    let certificate =
        PemCertificate::from_base64(&cert.certificate).map_err(|source| TraextorError::Decode {
            domain: domain.clone(),
            field: "Certificate",
            source,
        })?;

    for san in &cert.domain.sans {
        tracing::debug!("SAN: {}", san);
        write_pair(san, &certificate, &key, output_dir, summary)?;
    }

    tracing::info!("Domain: {}", domain);
    write_pair(domain, &certificate, &key, output_dir, summary)
}

/// Write `<name>.pem` and `<name>.key`
fn write_pair(
    name: &str,
    certificate: &PemCertificate,
    key: &PemPrivateKey,
    output_dir: &Path,
    summary: &mut ExportSummary,
) -> Result<()> {
    let stem = sanitize_filename(name);

    for (path, contents) in [
        (output_dir.join(format!("{stem}.pem")), certificate.pem_data()),
        (output_dir.join(format!("{stem}.key")), key.pem_data()),
    ] {
        write_atomic(&path, contents).map_err(|source| TraextorError::Write {
            path: path.clone(),
            source,
        })?;
        summary.files.push(path);
    }

    Ok(())
}

/// Keep a domain or store name from escaping the output directory
pub fn sanitize_filename(name: &str) -> String {
    let sanitized = name.replace(['/', '\\', '\0'], "_");
    match sanitized.as_str() {
        "" | "." | ".." => sanitized.replace('.', "_") + "_",
        _ => sanitized,
    }
}
