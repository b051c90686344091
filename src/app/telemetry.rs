use super::error::AppError;
use std::path::Path;
use tracing::{subscriber::set_global_default, Subscriber};
use tracing_log::LogTracer;
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, EnvFilter, Layer, Registry};

/// Creates a subscriber which writes to `console::Term::stdout` and to a log file `log.log`
/// located in the output directory.
///
/// When `verbose` is false the console only receives warnings and errors, the log file still
/// receives everything passing the filter.
pub(crate) fn get_subscriber(
    env_filter: super::LogLevel,
    directory: &Path,
    verbose: bool,
) -> (
    impl Subscriber + Send + Sync,
    tracing_appender::non_blocking::WorkerGuard,
) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(env_filter.to_string()));

    let console_level = if verbose {
        LevelFilter::TRACE
    } else {
        LevelFilter::WARN
    };
    let fmt_layer = tracing_subscriber::fmt::Layer::new()
        .with_writer(console::Term::stderr)
        .without_time()
        .with_filter(console_level);

    let appender = tracing_appender::rolling::never(directory, "log.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    (
        Registry::default().with(env_filter).with(fmt_layer).with(
            tracing_subscriber::fmt::Layer::new()
                .with_writer(non_blocking)
                .json(),
        ),
        guard,
    )
}

pub(crate) fn init_subscriber(subscriber: impl Subscriber + Send + Sync) -> Result<(), AppError> {
    LogTracer::init().map_err(|e| AppError::Telemetry(e.to_string()))?;
    set_global_default(subscriber).map_err(|e| AppError::Telemetry(e.to_string()))?;
    Ok(())
}
