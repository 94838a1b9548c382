//! Tracing subscriber setup
//!
//! Library code only emits `tracing` events; binaries and tests decide where
//! they go by calling [`init_tracing`] once.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{CommonError, CommonResult};

/// Install a global fmt subscriber.
///
/// `filter` uses `EnvFilter` directive syntax (`"info"`,
/// `"restorekit_core=debug,reqwest=warn"`). `RUST_LOG`, when set, takes
/// precedence. Calling this more than once is harmless: the second call
/// reports `Ok(false)` and leaves the first subscriber in place.
pub fn init_tracing(filter: &str, json: bool) -> CommonResult<bool> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(from_env) => from_env,
        Err(_) => EnvFilter::try_new(filter)
            .map_err(|e| CommonError::config_field("logging.filter", e.to_string()))?,
    };

    let registry = tracing_subscriber::registry().with(env_filter);
    let installed = if json {
        registry.with(fmt::layer().json().with_target(true)).try_init().is_ok()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init().is_ok()
    };

    Ok(installed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_filter() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let err = init_tracing("restorekit=[", false).unwrap_err();
        assert!(
            matches!(&err, CommonError::Config { field: Some(field), .. } if field == "logging.filter"),
            "{err}"
        );
    }

    #[test]
    fn second_install_is_a_no_op() {
        let _ = init_tracing("warn", false);
        assert!(!init_tracing("debug", true).unwrap());
    }
}
