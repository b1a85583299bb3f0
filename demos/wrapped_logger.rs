use std::sync::Arc;
use std::time::Instant;

use tracing_caller_hook::init::{init_tracing_with_config, LayerConfig};
use tracing_caller_hook::noop_sink::NoopSink;
use tracing_caller_hook::options::HookOptions;

/// Application-side logging facade. Its frames are hidden from the `fn`
/// and `src` fields through `skip_modules`.
mod audit {
    pub fn record(action: &str) {
        tracing::debug!(action, "audit");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let options = HookOptions {
        skip_modules: vec!["wrapped_logger::audit".to_string()],
        ..Default::default()
    };
    init_tracing_with_config(Arc::new(NoopSink), options, LayerConfig { enable_stdout: false })?;

    let n: u64 = 10_000;
    let start = Instant::now();
    for _ in 0..n {
        audit::record("login");
    }

    let elapsed = start.elapsed();
    println!(
        "resolved {} callers in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );
    Ok(())
}
