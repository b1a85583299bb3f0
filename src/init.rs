use crate::hook::CallerHook;
use crate::layer::HookLayer;
use crate::options::{ConfigError, HookOptions};
use crate::root_logger::StderrLogger;
use crate::sink::RecordSink;
use std::sync::Arc;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Layer stack configuration.
///
/// **Fields**
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt` layer is added
///   next to the [`HookLayer`] so events are also printed to the console.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub enable_stdout: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self { enable_stdout: true }
    }
}

/// Error returned when installing the global subscriber.
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error("global tracing subscriber already set")]
    AlreadySet(#[from] SetGlobalDefaultError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Build a [`HookLayer`] carrying a [`CallerHook`] configured from
/// `options`. Setup diagnostics go to stderr.
pub fn caller_layer(sink: Arc<dyn RecordSink>, options: HookOptions) -> HookLayer {
    let hook = CallerHook::new(&StderrLogger, Some(options));
    HookLayer::new(sink).with_hook(Arc::new(hook))
}

/// Install a global `tracing` subscriber that stamps records with caller
/// information before handing them to `sink`.
///
/// **Parameters**
/// - `sink`: receives every event as an enriched [`LogRecord`](crate::record::LogRecord).
/// - `options`: [`HookOptions`] for the caller hook.
/// - `config`: [`LayerConfig`] controlling the extra console layer.
pub fn init_tracing_with_config(
    sink: Arc<dyn RecordSink>,
    options: HookOptions,
    config: LayerConfig,
) -> Result<(), InitError> {
    let layer = caller_layer(sink, options);

    // The two subscriber types differ, so each branch installs its own.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(())
}

/// Initialize tracing with default options and a console layer.
pub fn init_tracing(sink: Arc<dyn RecordSink>) -> Result<(), InitError> {
    init_tracing_with_config(sink, HookOptions::default(), LayerConfig::default())
}

/// Initialize tracing with options read from the `CALLER_HOOK_*`
/// environment variables.
pub fn init_tracing_from_env(sink: Arc<dyn RecordSink>) -> Result<(), InitError> {
    let options = HookOptions::from_env()?;
    init_tracing_with_config(sink, options, LayerConfig::default())
}
