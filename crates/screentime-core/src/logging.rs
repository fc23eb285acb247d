//! Logging bootstrap for hosts embedding the crate.
//!
//! The crate itself only emits `tracing` events; a host installs a
//! subscriber once at startup.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_LOG_DIRECTIVES: &str = "info,screentime_core=debug";

/// Install a global fmt subscriber.
///
/// `RUST_LOG` takes precedence over `directives`; unparseable directives fall
/// back to `info`. Returns false if a global subscriber was already set, in
/// which case nothing changes.
pub fn init_logging(directives: Option<&str>) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directives.unwrap_or(DEFAULT_LOG_DIRECTIVES)))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_a_no_op() {
        init_logging(Some("not a == valid directive"));
        assert!(!init_logging(None));
        tracing::info!("logging still works");
    }
}
