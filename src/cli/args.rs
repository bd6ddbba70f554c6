use crate::acme::StoreVersion;
use crate::utils::paths::{DEFAULT_ACME_FILE, DEFAULT_OUTPUT_DIR};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "traextor")]
#[command(version)]
#[command(about = "Export certificates from a Traefik acme.json file and keep them in sync")]
#[command(long_about = None)]
pub struct Cli {
    /// ACME state file written by Traefik
    #[arg(long, env = "ACME_FILE", default_value = DEFAULT_ACME_FILE)]
    pub acme_file: PathBuf,

    /// Directory receiving <domain>.pem / <domain>.key files
    #[arg(long, env = "OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Traefik major version: "1" reads the flat v1 layout, anything else the v2+ resolver layout
    #[arg(long, env = "TRAEFIK_VERSION")]
    pub traefik_version: Option<String>,

    /// Log the resolved configuration and exit (image smoke test)
    #[arg(long, env = "BUILD_TEST", hide = true)]
    pub build_test: Option<String>,

    /// Enable verbose logging (repeat for more verbosity: -v DEBUG, -vv TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all log output
    #[arg(short, long)]
    pub quiet: bool,
}

/// Resolved runtime configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub acme_file: PathBuf,
    pub output_dir: PathBuf,
    pub version: StoreVersion,
    pub build_test: bool,
}

impl From<&Cli> for Settings {
    fn from(cli: &Cli) -> Self {
        let version =
            StoreVersion::from_selector(cli.traefik_version.as_deref().unwrap_or_default());

        Self {
            acme_file: cli.acme_file.clone(),
            output_dir: cli.output_dir.clone(),
            version,
            build_test: cli.build_test.as_deref().is_some_and(|v| !v.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Settings {
        let cli = Cli::try_parse_from(std::iter::once("traextor").chain(args.iter().copied()))
            .unwrap();
        Settings::from(&cli)
    }

    #[test]
    fn test_flags() {
        let settings = parse(&[
            "--acme-file",
            "/data/acme.json",
            "--output-dir",
            "/srv/certs",
            "--traefik-version",
            "1",
        ]);

        assert_eq!(settings.acme_file, PathBuf::from("/data/acme.json"));
        assert_eq!(settings.output_dir, PathBuf::from("/srv/certs"));
        assert_eq!(settings.version, StoreVersion::V1);
        assert!(!settings.build_test);
    }

    #[test]
    fn test_version_selector() {
        assert_eq!(parse(&["--traefik-version", "2"]).version, StoreVersion::V2);
        assert_eq!(parse(&["--traefik-version", "v1"]).version, StoreVersion::V2);
        assert_eq!(parse(&["--traefik-version", " 1"]).version, StoreVersion::V1);
    }

    #[test]
    fn test_build_test_requires_non_empty_value() {
        assert!(parse(&["--build-test", "yes"]).build_test);
        assert!(!parse(&["--build-test", ""]).build_test);
    }

    #[test]
    fn test_verbosity() {
        let cli = Cli::try_parse_from(["traextor", "-vv", "-q"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.quiet);
    }
}
