use std::fmt;

/// Minimal logger a hook reports its own setup problems to.
///
/// Hooks run inside the `tracing` dispatcher, so they cannot log through
/// `tracing` without re-entering it. This goes around the pipeline instead.
pub trait RootLogger: Send + Sync {
    fn warning(&self, args: fmt::Arguments<'_>);
    fn error(&self, args: fmt::Arguments<'_>);
    fn debug(&self, args: fmt::Arguments<'_>);
    fn info(&self, args: fmt::Arguments<'_>);
}

/// Writes to stderr with a `[tracing-caller-hook]` prefix.
#[derive(Clone, Copy, Debug, Default)]
pub struct StderrLogger;

impl RootLogger for StderrLogger {
    fn warning(&self, args: fmt::Arguments<'_>) {
        eprintln!("[tracing-caller-hook] warning: {}", args);
    }

    fn error(&self, args: fmt::Arguments<'_>) {
        eprintln!("[tracing-caller-hook] error: {}", args);
    }

    fn debug(&self, args: fmt::Arguments<'_>) {
        eprintln!("[tracing-caller-hook] debug: {}", args);
    }

    fn info(&self, args: fmt::Arguments<'_>) {
        eprintln!("[tracing-caller-hook] info: {}", args);
    }
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopLogger;

impl RootLogger for NoopLogger {
    fn warning(&self, _args: fmt::Arguments<'_>) {}
    fn error(&self, _args: fmt::Arguments<'_>) {}
    fn debug(&self, _args: fmt::Arguments<'_>) {}
    fn info(&self, _args: fmt::Arguments<'_>) {}
}
