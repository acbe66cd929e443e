//! Provide tracing for the bring-up tool.
//!
//! The binary calls `init_journald_or_stdout()` once before touching any
//! hardware. Boot-time runs under systemd end up in the journal tagged with
//! the tool's identifier; interactive runs print to stdout.
//!
//! Other modules `use crate::tracing::prelude::*` for the `trace!()`,
//! `debug!()`, `info!()`, `warn!()`, and `error!()` macros.

use std::env;
use time::OffsetDateTime;
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    fmt::{format::Writer, time::FormatTime},
    prelude::*,
};

pub mod prelude {
    #[allow(unused_imports)]
    pub use tracing::{debug, error, info, trace, warn};
}

use prelude::*;

/// Identifier attached to journal entries.
pub const SYSLOG_IDENTIFIER: &str = "agc7646v1-baseconfig";

/// Initialize logging.
///
/// `default_level` applies when RUST_LOG is unset or unparsable. Under
/// systemd (JOURNAL_STREAM set) events go to journald; otherwise stdout.
pub fn init_journald_or_stdout(default_level: LevelFilter) {
    if env::var("JOURNAL_STREAM").is_ok() {
        match tracing_journald::layer() {
            Ok(layer) => {
                tracing_subscriber::registry()
                    .with(env_filter(default_level))
                    .with(layer.with_syslog_identifier(SYSLOG_IDENTIFIER.to_string()))
                    .init();
            }
            Err(e) => {
                use_stdout(default_level);
                error!(error = %e, "Failed to initialize journald logging, using stdout.");
            }
        }
    } else {
        use_stdout(default_level);
    }
}

/// Parse a level name from configuration, falling back to INFO.
pub fn parse_level(name: Option<&str>) -> LevelFilter {
    name.and_then(|s| s.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::INFO)
}

fn env_filter(default_level: LevelFilter) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(default_level.into())
        .with_env_var("RUST_LOG")
        .from_env_lossy()
}

fn use_stdout(default_level: LevelFilter) {
    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(tracing_subscriber::fmt::layer().with_timer(LocalTimer))
        .init();
}

// Boot logs are read next to dmesg output, so stamp them in local time to
// the second rather than the default UTC RFC 3339 string.
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = OffsetDateTime::now_local().unwrap_or(OffsetDateTime::now_utc());
        let stamp = now
            .format(time::macros::format_description!("[hour]:[minute]:[second]"))
            .map_err(|_| std::fmt::Error)?;
        write!(w, "{}", stamp)
    }
}
