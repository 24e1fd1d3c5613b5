//! Task status reporting, grounded in `BaseMonitor`/`GCPMonitor`'s
//! `post_status(msg_type, msg_payload)` calls. `msg_type` is restricted to
//! `STARTED`/`FINISHED`/`FAILED` in the original; modeled here as
//! [`TaskStatus`] instead of a validated string.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use satex_core::types::Constellation;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
	Started,
	Finished,
	Failed,
}

/// One lifecycle event for a dispatched task, shaped as the row a monitor
/// sink records: `(job_id, task_id, storage_path, constellation, timestamp)`
/// plus the status and a free-form payload (a stack trace on failure).
#[derive(Debug, Clone)]
pub struct StatusEvent<'a> {
	pub job_id: &'a str,
	pub task_id: &'a str,
	pub storage_path: &'a str,
	pub constellation: Constellation,
	pub timestamp: DateTime<Utc>,
	pub status: TaskStatus,
	pub payload: &'a str,
}

/// Where a dispatched task's lifecycle events are reported.
#[async_trait]
pub trait MonitorSink: Send + Sync {
	async fn post_status(&self, event: StatusEvent<'_>) -> Result<()>;
}

/// Reports status via the `log` facade — the sink used when no external
/// monitor endpoint is configured.
#[derive(Debug, Default)]
pub struct LogMonitorSink;

#[async_trait]
impl MonitorSink for LogMonitorSink {
	async fn post_status(&self, event: StatusEvent<'_>) -> Result<()> {
		let StatusEvent { job_id, task_id, storage_path, constellation, timestamp, status, payload } = event;
		match status {
			TaskStatus::Failed => {
				log::error!("job={job_id} task={task_id} path={storage_path} constellation={constellation:?} ts={timestamp} status={status:?} {payload}");
			}
			_ => {
				log::info!("job={job_id} task={task_id} path={storage_path} constellation={constellation:?} ts={timestamp} status={status:?} {payload}");
			}
		}
		Ok(())
	}
}

/// Reports status by POSTing a JSON payload to an HTTP endpoint — the
/// equivalent of `GCPMonitor.post_status`'s BigQuery row insert, adapted to
/// a plain webhook since the pipeline has no BigQuery dependency.
pub struct HttpMonitorSink {
	client: reqwest::Client,
	endpoint: String,
}

impl HttpMonitorSink {
	#[must_use]
	pub fn new(endpoint: impl Into<String>) -> Self {
		Self { client: reqwest::Client::new(), endpoint: endpoint.into() }
	}
}

#[derive(Serialize)]
struct StatusBody<'a> {
	job_id: &'a str,
	task_id: &'a str,
	storage_path: &'a str,
	constellation: Constellation,
	timestamp: DateTime<Utc>,
	msg_type: TaskStatus,
	msg_payload: &'a str,
}

#[async_trait]
impl MonitorSink for HttpMonitorSink {
	async fn post_status(&self, event: StatusEvent<'_>) -> Result<()> {
		let body = StatusBody {
			job_id: event.job_id,
			task_id: event.task_id,
			storage_path: event.storage_path,
			constellation: event.constellation,
			timestamp: event.timestamp,
			msg_type: event.status,
			msg_payload: event.payload,
		};
		let response = self.client.post(&self.endpoint).json(&body).send().await?;
		anyhow::ensure!(
			response.status().is_success(),
			"monitor endpoint {} returned {}",
			self.endpoint,
			response.status()
		);
		Ok(())
	}
}

/// Where tasks that exceeded the delivery-attempt limit are recorded. The
/// Worker never counts attempts itself — the caller (bus-side redelivery
/// tracking) reports when a task has exhausted its retries.
#[async_trait]
pub trait DeadLetterSink: Send + Sync {
	async fn record(&self, job_id: &str, task_id: &str, attempts: u32, last_error: &str) -> Result<()>;
}

/// Logs dead-lettered tasks via the `log` facade.
#[derive(Debug, Default)]
pub struct LogDeadLetterSink;

#[async_trait]
impl DeadLetterSink for LogDeadLetterSink {
	async fn record(&self, job_id: &str, task_id: &str, attempts: u32, last_error: &str) -> Result<()> {
		log::error!("dead-letter job={job_id} task={task_id} attempts={attempts} last_error={last_error}");
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn event(status: TaskStatus, payload: &str) -> StatusEvent<'_> {
		StatusEvent {
			job_id: "job-1",
			task_id: "task-1",
			storage_path: "gs://bucket/dataset",
			constellation: Constellation::Sentinel2,
			timestamp: Utc::now(),
			status,
			payload,
		}
	}

	#[tokio::test]
	async fn test_log_sink_never_fails() {
		let sink = LogMonitorSink;
		sink.post_status(event(TaskStatus::Started, "begin")).await.unwrap();
		sink.post_status(event(TaskStatus::Failed, "boom")).await.unwrap();
	}

	#[tokio::test]
	async fn test_http_sink_posts_status() {
		let server = wiremock::MockServer::start().await;
		wiremock::Mock::given(wiremock::matchers::method("POST"))
			.and(wiremock::matchers::path("/status"))
			.respond_with(wiremock::ResponseTemplate::new(200))
			.mount(&server)
			.await;

		let sink = HttpMonitorSink::new(format!("{}/status", server.uri()));
		sink.post_status(event(TaskStatus::Finished, "ok")).await.unwrap();
	}

	#[tokio::test]
	async fn test_http_sink_errors_on_failure_status() {
		let server = wiremock::MockServer::start().await;
		wiremock::Mock::given(wiremock::matchers::method("POST"))
			.and(wiremock::matchers::path("/status"))
			.respond_with(wiremock::ResponseTemplate::new(500))
			.mount(&server)
			.await;

		let sink = HttpMonitorSink::new(format!("{}/status", server.uri()));
		assert!(sink.post_status(event(TaskStatus::Failed, "err")).await.is_err());
	}

	#[tokio::test]
	async fn test_dead_letter_sink_never_fails() {
		let sink = LogDeadLetterSink;
		sink.record("job-1", "task-1", 5, "timeout").await.unwrap();
	}
}
