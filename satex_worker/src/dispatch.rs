//! Worker HTTP dispatch server lifecycle.
//!
//! Lifecycle structure (idempotent start, graceful shutdown via a oneshot
//! channel, a tower protection stack ahead of the router) is grounded in
//! `versatiles`'s `server::tile_server::TileServer::start`/`stop`, repurposed
//! to receive push-subscription task messages (`POST /tasks`) instead of
//! serving tiles.

use crate::monitor::{DeadLetterSink, MonitorSink, StatusEvent, TaskStatus};
use crate::pipeline::run_task;
use anyhow::{Context, Result};
use axum::error_handling::HandleErrorLayer;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{BoxError, Json, Router};
use chrono::Utc;
use satex_core::error::SatexError;
use satex_core::types::DispatchEnvelope;
use satex_extractor::MosaicMethod;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::{net::TcpListener, sync::oneshot};
use tower::{ServiceBuilder, buffer::BufferLayer, limit::ConcurrencyLimitLayer, load_shed::LoadShedLayer, timeout::TimeoutLayer};
use tower_http::catch_panic::CatchPanicLayer;

struct DispatchState {
	archive_root: PathBuf,
	resolution: f64,
	method: MosaicMethod,
	monitor: Arc<dyn MonitorSink>,
	dead_letter: Arc<dyn DeadLetterSink>,
}

/// The Worker's HTTP dispatch server: receives [`DispatchEnvelope`]s over
/// `POST /tasks`, runs extraction and storage, and reports outcomes through
/// a [`MonitorSink`].
pub struct DispatchServer {
	ip: String,
	port: u16,
	state: Arc<DispatchState>,
	exit_signal: Option<oneshot::Sender<()>>,
	join: Option<tokio::task::JoinHandle<()>>,
}

impl DispatchServer {
	#[must_use]
	pub fn new(
		ip: impl Into<String>,
		port: u16,
		archive_root: PathBuf,
		resolution: f64,
		method: MosaicMethod,
		monitor: Arc<dyn MonitorSink>,
		dead_letter: Arc<dyn DeadLetterSink>,
	) -> Self {
		Self {
			ip: ip.into(),
			port,
			state: Arc::new(DispatchState { archive_root, resolution, method, monitor, dead_letter }),
			exit_signal: None,
			join: None,
		}
	}

	/// The port the server is listening on (useful when constructed with
	/// port `0` for tests).
	#[must_use]
	pub fn port(&self) -> u16 {
		self.port
	}

	fn router(&self) -> Router {
		let protection = ServiceBuilder::new()
			.layer(HandleErrorLayer::new(|_err: BoxError| async move {
				Ok::<_, std::convert::Infallible>((StatusCode::SERVICE_UNAVAILABLE, "worker overloaded, try later"))
			}))
			.layer(CatchPanicLayer::new())
			.layer(TimeoutLayer::new(std::time::Duration::from_secs(300)))
			.layer(BufferLayer::new(64))
			.layer(ConcurrencyLimitLayer::new(num_cpus::get().max(1)))
			.layer(LoadShedLayer::new());

		Router::new()
			.route("/status", get(|| async { "ready!" }))
			.route("/tasks", post(dispatch_task))
			.route("/dead-letter", post(dead_letter_task))
			.layer(protection)
			.with_state(self.state.clone())
	}

	/// Starts listening. Idempotent: calling twice stops the previous
	/// instance first.
	pub async fn start(&mut self) -> Result<()> {
		if self.exit_signal.is_some() || self.join.is_some() {
			self.stop().await;
		}

		let router = self.router();
		let addr = format!("{}:{}", self.ip, self.port);
		let listener = TcpListener::bind(&addr).await.with_context(|| format!("binding {addr}"))?;
		if self.port == 0 {
			self.port = listener.local_addr()?.port();
		}

		let (tx, rx) = oneshot::channel::<()>();
		let handle = tokio::spawn(async move {
			if let Err(err) = axum::serve(listener, router.into_make_service())
				.with_graceful_shutdown(async {
					rx.await.ok();
				})
				.await
			{
				log::error!("worker dispatch server exited with error: {err}");
			}
		});

		self.exit_signal = Some(tx);
		self.join = Some(handle);
		Ok(())
	}

	/// Triggers graceful shutdown and waits (bounded) for the serving task
	/// to finish. Idempotent.
	pub async fn stop(&mut self) {
		if self.exit_signal.is_none() && self.join.is_none() {
			return;
		}
		if let Some(tx) = self.exit_signal.take() {
			let _ = tx.send(());
		}
		if let Some(handle) = self.join.take() {
			let _ = tokio::time::timeout(std::time::Duration::from_secs(10), handle).await;
		}
	}
}

async fn dispatch_task(State(state): State<Arc<DispatchState>>, Json(envelope): Json<DispatchEnvelope>) -> impl IntoResponse {
	let job_id = envelope.job_id.clone();
	let task_id = envelope.extraction_task.task_id.clone();
	let storage_path = envelope.storage_gs_path.clone();
	let constellation = envelope.extraction_task.constellation;

	let post = |status, payload: &str| {
		state.monitor.post_status(StatusEvent {
			job_id: &job_id,
			task_id: &task_id,
			storage_path: &storage_path,
			constellation,
			timestamp: Utc::now(),
			status,
			payload,
		})
	};

	let _ = post(TaskStatus::Started, "dispatched").await;

	let archive_root = state.archive_root.clone();
	let resolution = state.resolution;
	let method = state.method;
	let result = tokio::task::spawn_blocking(move || run_task(&envelope, &archive_root, resolution, method)).await;

	match result {
		Ok(Ok(())) => {
			let _ = post(TaskStatus::Finished, "ok").await;
			StatusCode::OK
		}
		Ok(Err(err)) => {
			let _ = post(TaskStatus::Failed, &err.to_string()).await;
			let retryable = SatexError::downcast(&err).is_some_and(SatexError::is_retryable);
			if retryable { StatusCode::SERVICE_UNAVAILABLE } else { StatusCode::UNPROCESSABLE_ENTITY }
		}
		Err(join_err) => {
			let _ = post(TaskStatus::Failed, &join_err.to_string()).await;
			StatusCode::INTERNAL_SERVER_ERROR
		}
	}
}

/// Request body for `POST /dead-letter`: the caller (bus-side redelivery
/// tracking) reports a task that exceeded its delivery-attempt limit.
#[derive(Debug, Deserialize)]
struct DeadLetterRequest {
	job_id: String,
	task_id: String,
	attempts: u32,
	last_error: String,
}

async fn dead_letter_task(State(state): State<Arc<DispatchState>>, Json(request): Json<DeadLetterRequest>) -> impl IntoResponse {
	match state.dead_letter.record(&request.job_id, &request.task_id, request.attempts, &request.last_error).await {
		Ok(()) => StatusCode::OK,
		Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
	}
}
