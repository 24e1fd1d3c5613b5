//! The Worker: an HTTP dispatch server that receives extraction tasks,
//! runs them, and reports outcomes to a monitor sink.

pub mod dispatch;
pub mod monitor;
pub mod pipeline;

pub use dispatch::DispatchServer;
pub use monitor::{DeadLetterSink, HttpMonitorSink, LogDeadLetterSink, LogMonitorSink, MonitorSink, StatusEvent, TaskStatus};
pub use pipeline::run_task;
