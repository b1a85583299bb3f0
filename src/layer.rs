use crate::hook::Hook;
use crate::record::LogRecord;
use crate::sink::RecordSink;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Arc, atomic::{AtomicU64, Ordering}};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that turns events into [`LogRecord`]s, runs
/// the registered [`Hook`]s over them and hands the result to a
/// [`RecordSink`].
///
/// Everything happens synchronously on the logging thread, so the hooks see
/// the application's call stack and the sink always receives the decorated
/// record.
pub struct HookLayer {
    sink: Arc<dyn RecordSink>,
    hooks: Vec<Arc<dyn Hook>>,
    /// Total events seen by the layer.
    pub total_events: Arc<AtomicU64>,
    /// Events at least one hook fired for.
    pub enriched_events: Arc<AtomicU64>,
    /// Errors returned by hooks.
    pub hook_errors: Arc<AtomicU64>,
}

impl HookLayer {
    /// Create a layer with no hooks that forwards every event to `sink`.
    pub fn new(sink: Arc<dyn RecordSink>) -> Self {
        Self {
            sink,
            hooks: Vec::new(),
            total_events: Arc::new(AtomicU64::new(0)),
            enriched_events: Arc::new(AtomicU64::new(0)),
            hook_errors: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Register a hook. Hooks fire in registration order.
    pub fn with_hook(mut self, hook: Arc<dyn Hook>) -> Self {
        self.hooks.push(hook);
        self
    }

    fn fire_hooks(&self, record: &mut LogRecord, level: &tracing::Level) {
        let mut fired = false;
        for hook in &self.hooks {
            if !hook.levels().contains(level) {
                continue;
            }
            fired = true;
            if let Err(e) = hook.fire(record) {
                self.hook_errors.fetch_add(1, Ordering::Relaxed);
                eprintln!("log hook failed: {}", e);
            }
        }
        if fired {
            self.enriched_events.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl<S> Layer<S> for HookLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);

        let mut fields = BTreeMap::new();
        let mut message: Option<String> = None;

        let mut visitor = FieldVisitor { fields: &mut fields, message: &mut message };
        event.record(&mut visitor);

        let meta = event.metadata();
        let mut record = LogRecord {
            timestamp: Utc::now(),
            level: meta.level().to_string(),
            target: meta.target().to_string(),
            module_path: meta.module_path().map(|s| s.to_string()),
            file: meta.file().map(|s| s.to_string()),
            line: meta.line(),
            fields,
            message,
        };

        self.fire_hooks(&mut record, meta.level());
        self.sink.emit(record);
    }
}

use tracing::field::{Field, Visit};

/// Collects event fields into JSON values; `message` is kept apart.
pub struct FieldVisitor<'a> {
    pub fields: &'a mut BTreeMap<String, serde_json::Value>,
    pub message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.insert(field.name().to_string(), serde_json::Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.fields.insert(field.name().to_string(), serde_json::Value::String(format!("{:?}", value)));
        }
    }
}
