use crate::config::Config;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

/// Crate-level directives used when `RUST_LOG` is unset.
fn default_directives(is_production: bool) -> &'static str {
    if is_production {
        "restdesk_server=info,restdesk_core=info,tower_http=warn"
    } else {
        "restdesk_server=debug,restdesk_core=debug,tower_http=debug"
    }
}

fn build_filter(is_production: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(is_production)))
}

/// Installs the global subscriber: pretty text while developing, one JSON
/// object per event in production.
pub fn init_tracing(config: &Config) -> Result<(), TryInitError> {
    let registry = tracing_subscriber::registry().with(build_filter(config.is_production));

    if config.is_production {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(false)).try_init()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_cover_both_crates() {
        for is_production in [true, false] {
            let directives = default_directives(is_production);
            assert!(directives.contains("restdesk_server="));
            assert!(directives.contains("restdesk_core="));
            assert!(EnvFilter::try_new(directives).is_ok());
        }
    }

    #[test]
    fn test_production_is_quieter_than_development() {
        assert!(default_directives(true).contains("restdesk_core=info"));
        assert!(default_directives(false).contains("restdesk_core=debug"));
    }
}
