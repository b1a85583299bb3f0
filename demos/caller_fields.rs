use std::sync::Arc;
use tracing::{debug, info};

use tracing_caller_hook::init::{init_tracing_with_config, LayerConfig};
use tracing_caller_hook::memory_sink::MemorySink;
use tracing_caller_hook::options::HookOptions;

struct Worker {
    id: u32,
}

impl Worker {
    fn run(&self) {
        debug!(worker = self.id, "processing batch");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let sink = Arc::new(MemorySink::new());
    let options = HookOptions {
        app_version: Some(env!("CARGO_PKG_VERSION").to_string()),
        ..Default::default()
    };
    init_tracing_with_config(sink.clone(), options, LayerConfig { enable_stdout: false })?;

    info!("starting workers");
    for id in 0..2 {
        Worker { id }.run();
    }

    for record in sink.take() {
        println!("{}", serde_json::to_string(&record)?);
    }
    Ok(())
}
