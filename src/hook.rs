use crate::env::env_non_empty;
use crate::options::{check_hook_options, HookOptions};
use crate::path::limit_path;
use crate::record::LogRecord;
use crate::root_logger::RootLogger;
use crate::stack::{
    enclosing_function, CallerFrame, Callsite, StackResolver, DEFAULT_STACK_SEARCH_OFFSET,
};
use tracing::Level;

/// Short name of the calling function.
pub const FUNCTION_KEY: &str = "fn";
/// `<file>:<line>` of the call site.
pub const SOURCE_KEY: &str = "src";
/// Application version.
pub const VERSION_KEY: &str = "ver";

/// Modules whose frames sit between the application and the hook.
const PIPELINE_MODULES: &[&str] = &[
    env!("CARGO_CRATE_NAME"),
    "tracing",
    "tracing_core",
    "tracing_subscriber",
    "tracing_log",
    "log",
];

/// Extension point fired by [`HookLayer`](crate::layer::HookLayer) for every
/// record whose level is listed in [`Hook::levels`].
pub trait Hook: Send + Sync {
    /// Levels this hook fires for.
    fn levels(&self) -> &[Level];

    /// Decorate a record in place. Called synchronously on the logging
    /// thread before the record is handed to the sink.
    fn fire(&self, record: &mut LogRecord) -> Result<(), HookError>;
}

/// Error a [`Hook`] may report from [`Hook::fire`]. The layer counts it and
/// still emits the record.
#[derive(thiserror::Error, Debug)]
pub enum HookError {
    #[error("{hook} hook failed: {reason}")]
    Failed { hook: &'static str, reason: String },
}

/// Adds `fn`, `src` and `ver` fields describing where a record was logged.
#[derive(Clone, Debug)]
pub struct CallerHook {
    levels: Vec<Level>,
    app_version: String,
    path_segments_limit: i32,
    stack: StackResolver,
}

impl CallerHook {
    /// Build the hook from `options`, applying defaults for anything unset.
    ///
    /// `logger` receives setup diagnostics, such as a warning when stack
    /// frames carry no source location because the binary was built without
    /// debuginfo.
    pub fn new(logger: &dyn RootLogger, options: Option<HookOptions>) -> Self {
        let opt = check_hook_options(options, env_non_empty);

        let stack = StackResolver::new(
            DEFAULT_STACK_SEARCH_OFFSET,
            opt.stack_offset,
            PIPELINE_MODULES.iter().copied(),
        )
        .with_wrapper_modules(opt.skip_modules);

        let hook = Self {
            levels: opt.levels,
            app_version: opt.app_version,
            path_segments_limit: opt.path_segments_limit,
            stack,
        };

        if !hook.stack.caller().is_resolved() {
            logger.warning(format_args!(
                "stack frames carry no source location (build with debug = \"line-tables-only\" or more); \
                 src falls back to the logging call site and is empty behind wrappers"
            ));
        }
        logger.debug(format_args!(
            "caller hook enabled for levels {:?}, version {:?}",
            hook.levels, hook.app_version
        ));

        hook
    }

    /// Write the caller fields for `caller` into `record`.
    pub fn enrich(&self, record: &mut LogRecord, caller: &CallerFrame) {
        if !caller.function.is_empty() {
            record.insert_field(FUNCTION_KEY, short_function_name(&caller.function));
        }

        let file = limit_path(&caller.file, self.path_segments_limit);
        record.insert_field(SOURCE_KEY, format!("{}:{}", file, caller.line));

        if !self.app_version.is_empty() {
            record.insert_field(VERSION_KEY, self.app_version.as_str());
        }
    }
}

impl Hook for CallerHook {
    fn levels(&self) -> &[Level] {
        &self.levels
    }

    fn fire(&self, record: &mut LogRecord) -> Result<(), HookError> {
        let caller = match (record.file.as_deref(), record.line) {
            (Some(file), Some(line)) => self.stack.caller_from(Callsite { file, line }),
            _ => self.stack.caller(),
        };
        self.enrich(record, &caller);
        Ok(())
    }
}

/// Bare function or method name of a fully qualified identifier.
///
/// `app::worker::Worker::run` gives `run`,
/// `<app::Worker as app::Job>::run::{{closure}}` gives `run`, and
/// `github.com/org/pkg.(*Type).Method` gives `Method`.
pub fn short_function_name(identifier: &str) -> &str {
    let name = enclosing_function(identifier);
    let name = match name.rfind('/') {
        Some(idx) => &name[idx + 1..],
        None => name,
    };

    let mut segments = qualifier_segments(name);
    // Trailing turbofish or shim segments carry no name.
    while segments.len() > 1 {
        match segments.last() {
            Some(s) if s.starts_with('<') || s.starts_with('{') => {
                segments.pop();
            }
            _ => break,
        }
    }
    segments.last().copied().unwrap_or(name)
}

/// Split on `::` and `.` outside of `<>`, `()` and `[]`.
fn qualifier_segments(name: &str) -> Vec<&str> {
    let bytes = name.as_bytes();
    let mut segments = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'<' | b'(' | b'[' => depth += 1,
            // `->` in fn pointer types
            b'>' if i > 0 && bytes[i - 1] == b'-' => {}
            b'>' | b')' | b']' => depth -= 1,
            b':' if depth == 0 && bytes.get(i + 1) == Some(&b':') => {
                segments.push(&name[start..i]);
                i += 2;
                start = i;
                continue;
            }
            b'.' if depth == 0 => {
                segments.push(&name[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    segments.push(&name[start..]);
    segments
}
