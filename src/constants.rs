use std::time::Duration;

use tracing::Level;

// How often the local feedback generator emits a report if there is anything to report.
// Same order of magnitude as a receiver sending RFC 8888 feedback once per frame.
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_millis(20);

// Acked packets kept per SSRC while waiting for the next report. Oldest are evicted first.
pub const DEFAULT_MAX_WINDOW_PER_SSRC: usize = 4096;

// Report early once this many acked packets are pending, without waiting for the tick.
pub const DEFAULT_MAX_REPORT_BATCH: usize = 1024;

pub const FEEDBACK_TRACING_LOG_LEVEL: Level = Level::TRACE;
pub const RTTE_TRACING_LOG_LEVEL: Level = Level::TRACE;
