use crate::acme::AcmeStore;
use crate::cli::args::{Cli, Settings};
use crate::utils::errors::{Result, TraextorError};
use crate::utils::logging::init_logging;
use crate::utils::paths::ensure_dir_exists;
use crate::watch::{wait_for_file, StoreWatcher, FILE_POLL_INTERVAL};
use tokio_util::sync::CancellationToken;
use tracing::info;

pub async fn handle_command(cli: Cli) -> Result<()> {
    // Initialize logging - always to stderr
    init_logging(cli.verbose, cli.quiet);

    let settings = Settings::from(&cli);

    ensure_dir_exists(&settings.output_dir).map_err(|e| {
        TraextorError::Config(format!(
            "Failed to create output dir {}: {e}",
            settings.output_dir.display()
        ))
    })?;

    if settings.build_test {
        info!("Running as build test");
        info!("ACME file is: {}", settings.acme_file.display());
        info!("Output directory is: {}", settings.output_dir.display());
        info!("Traefik layout is: {}", settings.version);
        return Ok(());
    }

    wait_for_file(&settings.acme_file, FILE_POLL_INTERVAL).await;
    info!(
        "Your certificates will be exported to {}",
        settings.output_dir.display()
    );

    export_once(&settings)?;
    watch(&settings).await
}

/// Initial pass: any failure here is fatal
pub fn export_once(settings: &Settings) -> Result<()> {
    let store = AcmeStore::load_from_file(settings.version, &settings.acme_file)?;
    let summary = store.export(&settings.output_dir)?;

    info!(
        "Exported {} certificate(s), {} file(s) written",
        summary.certificates,
        summary.files.len()
    );
    Ok(())
}

async fn watch(settings: &Settings) -> Result<()> {
    let watcher =
        StoreWatcher::register(&settings.acme_file, &settings.output_dir, settings.version)?;

    let token = CancellationToken::new();
    let shutdown = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, shutting down");
            shutdown.cancel();
        }
    });

    watcher.run(token).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acme::StoreVersion;
    use std::fs;

    const V2_DOCUMENT: &str = r#"{
        "letsencrypt": {
            "Account": { "Email": "ops@example.com" },
            "Certificates": [
                { "domain": { "main": "example.com", "sans": ["www.example.com"] }, "certificate": "Y2VydA==", "key": "a2V5" }
            ]
        },
        "internal": {
            "Certificates": [
                { "domain": { "main": "intranet.local" }, "certificate": "Y2VydA==", "key": "a2V5" }
            ]
        }
    }"#;

    fn settings(dir: &std::path::Path, version: StoreVersion) -> Settings {
        Settings {
            acme_file: dir.join("acme.json"),
            output_dir: dir.join("certificates"),
            version,
            build_test: false,
        }
    }

    #[test]
    fn test_export_once_namespaced() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = settings(tmp.path(), StoreVersion::V2);
        fs::write(&settings.acme_file, V2_DOCUMENT).unwrap();

        export_once(&settings).unwrap();

        let le = settings.output_dir.join("letsencrypt");
        let internal = settings.output_dir.join("internal");
        for file in [
            "example.com.pem",
            "example.com.key",
            "www.example.com.pem",
            "www.example.com.key",
        ] {
            assert!(le.join(file).exists(), "missing {file}");
        }
        assert_eq!(fs::read(internal.join("intranet.local.key")).unwrap(), b"key");
        assert!(!settings.output_dir.join("example.com.pem").exists());
    }

    #[test]
    fn test_export_once_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = settings(tmp.path(), StoreVersion::V1);

        let err = export_once(&settings).unwrap_err();
        assert!(matches!(err, TraextorError::NotFound(_)));
    }

    #[test]
    fn test_export_once_invalid_document() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = settings(tmp.path(), StoreVersion::V1);
        fs::write(&settings.acme_file, "not json").unwrap();

        let err = export_once(&settings).unwrap_err();
        assert!(matches!(err, TraextorError::Parse(_)));
    }

    #[tokio::test]
    async fn test_build_test_only_creates_output_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let output_dir = tmp.path().join("certificates");
        let cli = Cli {
            acme_file: tmp.path().join("missing.json"),
            output_dir: output_dir.clone(),
            traefik_version: Some("1".to_string()),
            build_test: Some("1".to_string()),
            verbose: 0,
            quiet: true,
        };

        handle_command(cli).await.unwrap();

        assert!(output_dir.is_dir());
        assert_eq!(fs::read_dir(&output_dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_output_dir_creation_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let occupied = tmp.path().join("occupied");
        fs::write(&occupied, b"x").unwrap();
        let cli = Cli {
            acme_file: tmp.path().join("acme.json"),
            output_dir: occupied,
            traefik_version: None,
            build_test: Some("1".to_string()),
            verbose: 0,
            quiet: true,
        };

        let err = handle_command(cli).await.unwrap_err();
        assert!(matches!(err, TraextorError::Config(_)));
    }
}
