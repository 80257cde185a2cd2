//! Trace export functionality
//!
//! Writes buffered render records in Chrome Trace Event Format for
//! visualization in chrome://tracing, Perfetto or Speedscope.

pub mod chrome_trace;

pub use chrome_trace::ChromeTraceExporter;
