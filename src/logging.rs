use crate::config::AppConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn rolling_file(config: &AppConfig) -> RollingFileAppender {
    use tracing_appender::rolling;
    match config.rotation.as_str() {
        "hourly" => rolling::hourly(&config.log_dir, &config.log_file),
        "daily" => rolling::daily(&config.log_dir, &config.log_file),
        _ => rolling::never(&config.log_dir, &config.log_file),
    }
}

/// Installs the global subscriber. The returned guard flushes the file
/// writer on drop; hold it for the life of the process.
pub fn init_logging(config: &AppConfig) -> WorkerGuard {
    let (writer, guard) = tracing_appender::non_blocking(rolling_file(config));

    // sqlx traces every statement at debug; silence it unless tracing
    // was explicitly enabled
    let default_filter = if config.enable_tracing {
        config.log_level.clone()
    } else {
        format!("{},sqlx=warn", config.log_level)
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let base = tracing_subscriber::registry().with(filter);
    if config.use_json {
        // JSON goes to the file only; targets kept for structured queries
        base.with(
            fmt::layer()
                .json()
                .with_target(true)
                .with_writer(writer)
                .with_ansi(false),
        )
        .init();
    } else {
        // Text mode mirrors to stdout for local runs
        base.with(fmt::layer().with_target(false).with_writer(writer).with_ansi(false))
            .with(fmt::layer().with_target(false).with_ansi(true))
            .init();
    }

    guard
}
