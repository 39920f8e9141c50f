use tracing_subscriber::EnvFilter;

use crate::app::config::LogFormat;

/// Installs the global subscriber. `RUST_LOG` overrides the default `info` filter.
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let _ = match format {
        LogFormat::Plain => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
