use crate::record::LogRecord;

/// Destination for enriched [`LogRecord`]s produced by the hook layer.
///
/// `emit` runs synchronously on the thread that logged, after every hook
/// registered for the record's level has fired. Implementations that do I/O
/// should hand the record off quickly rather than block the caller.
pub trait RecordSink: Send + Sync {
    /// Accept a single, fully decorated record.
    fn emit(&self, record: LogRecord);
}
