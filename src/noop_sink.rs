use crate::record::LogRecord;
use crate::sink::RecordSink;

/// A sink that simply drops all records.
///
/// Useful for measuring the cost of caller resolution on its own.
#[derive(Clone, Default)]
pub struct NoopSink;

impl RecordSink for NoopSink {
    fn emit(&self, _record: LogRecord) {}
}
