use std::fmt;
use std::io;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::EnvFilter;

/// RFC 850 style timestamps, e.g. `Monday, 02-Jan-06 15:04:05 UTC`
#[derive(Debug, Clone, Copy, Default)]
pub struct Rfc850Time;

impl Rfc850Time {
    pub fn format<Tz>(now: &chrono::DateTime<Tz>) -> String
    where
        Tz: chrono::TimeZone,
        Tz::Offset: fmt::Display,
    {
        now.format("%A, %d-%b-%y %H:%M:%S %Z").to_string()
    }
}

impl FormatTime for Rfc850Time {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", Self::format(&chrono::Utc::now()))
    }
}

/// Filter directive for a `-v` count
pub fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "traextor=info",  // Default: progress and warnings
        1 => "traextor=debug", // -v: watcher events
        _ => "traextor=trace", // -vv+: everything
    }
}

/// Install the global subscriber, always writing to stderr. `RUST_LOG` wins over `-v`.
pub fn init_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level(verbose)));

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_timer(Rfc850Time)
        .with_env_filter(filter)
        .init();
}
