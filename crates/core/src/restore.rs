//! Restore service: reopen session windows and reconcile new handles.
//!
//! The automation layer offers no identity linkage between "the path I
//! asked to open" and "the handle that appears", so the handle returned by
//! `open_path` is authoritative. When an open cannot return one
//! synchronously, a bounded poll over `list_open_windows` looks for a new
//! handle browsing the requested path; no fuzzier matching is attempted.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};
use winshelf_shell::{ShellError, ShellWindows, WindowHandle};

use crate::calls::bounded;
use crate::session::{Session, WindowDescriptor};

/// Bounds for the handle-discovery poll used when an open cannot return a
/// handle synchronously.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreConfig {
	pub max_poll_attempts: u32,
	pub poll_interval_ms: u64,
}

impl Default for RestoreConfig {
	fn default() -> Self {
		// 2s worst case per window, matching how long Explorer usually
		// takes to surface a spawned window.
		Self { max_poll_attempts: 20, poll_interval_ms: 100 }
	}
}

/// Why a descriptor was skipped without an open attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
	/// Flagged non-restorable at capture, or the path is empty/sentinel.
	NotRestorable,
}

/// Why an attempted open produced no window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailReason {
	OpenFailed(String),
	OpenTimeout,
}

/// Outcome of one descriptor during restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RestoreStatus {
	/// The window opened. `geometry_applied` is false when the rect/state
	/// could not be applied afterwards: a partial success, not a failure.
	Opened { geometry_applied: bool },
	Skipped(SkipReason),
	Failed(FailReason),
}

impl RestoreStatus {
	pub fn is_opened(&self) -> bool {
		matches!(self, Self::Opened { .. })
	}
}

impl fmt::Display for RestoreStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Opened { geometry_applied: true } => write!(f, "opened"),
			Self::Opened { geometry_applied: false } => write!(f, "opened (geometry not applied)"),
			Self::Skipped(SkipReason::NotRestorable) => write!(f, "skipped: not restorable"),
			Self::Failed(FailReason::OpenFailed(detail)) => write!(f, "failed: {detail}"),
			Self::Failed(FailReason::OpenTimeout) => {
				write!(f, "failed: timed out waiting for the window to appear")
			}
		}
	}
}

/// Per-descriptor outcome, recorded in ascending capture order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreOutcome {
	pub order: u32,
	pub path: String,
	pub status: RestoreStatus,
}

/// Full report of one restore pass; one entry per descriptor processed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreReport {
	pub outcomes: Vec<RestoreOutcome>,
}

impl RestoreReport {
	pub fn opened(&self) -> usize {
		self.outcomes.iter().filter(|o| o.status.is_opened()).count()
	}

	pub fn skipped(&self) -> usize {
		self.outcomes.iter().filter(|o| matches!(o.status, RestoreStatus::Skipped(_))).count()
	}

	pub fn failed(&self) -> usize {
		self.outcomes.iter().filter(|o| matches!(o.status, RestoreStatus::Failed(_))).count()
	}

	/// Opened windows whose geometry could not be applied.
	pub fn geometry_misses(&self) -> usize {
		self.outcomes
			.iter()
			.filter(|o| o.status == RestoreStatus::Opened { geometry_applied: false })
			.count()
	}

	pub fn summary_line(&self) -> String {
		format!(
			"{} of {} windows restored, {} skipped, {} failed",
			self.opened(),
			self.outcomes.len(),
			self.skipped(),
			self.failed()
		)
	}
}

/// Cooperative cancellation checked between descriptors. In-flight
/// per-window calls complete, so a window is never left mid-geometry.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn cancel(&self) {
		self.0.store(true, Ordering::Relaxed);
	}

	pub fn is_cancelled(&self) -> bool {
		self.0.load(Ordering::Relaxed)
	}
}

/// Reopens a session's windows and reapplies their geometry.
pub struct RestoreService {
	shell: Arc<dyn ShellWindows>,
	config: RestoreConfig,
}

impl RestoreService {
	pub fn new(shell: Arc<dyn ShellWindows>) -> Self {
		Self::with_config(shell, RestoreConfig::default())
	}

	pub fn with_config(shell: Arc<dyn ShellWindows>, config: RestoreConfig) -> Self {
		Self { shell, config }
	}

	/// Restores every descriptor in ascending capture order.
	///
	/// One descriptor's failure never blocks the rest; the report carries an
	/// independent outcome per descriptor. Not transactional: windows opened
	/// before an interruption stay open, and re-running restore on the same
	/// session is safe (it opens duplicates, matching capture's no-dedup
	/// policy).
	pub async fn restore(&self, session: &Session) -> RestoreReport {
		self.restore_with_cancel(session, &CancelFlag::new()).await
	}

	/// Like [`restore`](Self::restore), stopping between descriptors once
	/// `cancel` fires and returning the partial report recorded so far.
	pub async fn restore_with_cancel(&self, session: &Session, cancel: &CancelFlag) -> RestoreReport {
		let mut report = RestoreReport::default();
		if session.windows.is_empty() {
			return report;
		}

		let mut descriptors: Vec<&WindowDescriptor> = session.windows.iter().collect();
		descriptors.sort_by_key(|d| d.order);

		// Handles alive before this pass. Polled discovery only accepts a
		// handle outside this set, so an already-open window on the same
		// path can never satisfy a descriptor.
		let mut claimed: HashSet<WindowHandle> =
			match bounded(self.shell.list_open_windows(), ShellError::Inaccessible).await {
				Ok(handles) => handles.into_iter().collect(),
				Err(err) => {
					debug!(
						target = "winshelf.restore",
						error = %err,
						"baseline enumeration failed; polled discovery may match pre-existing windows"
					);
					HashSet::new()
				}
			};

		for descriptor in descriptors {
			if cancel.is_cancelled() {
				info!(
					target = "winshelf.restore",
					recorded = report.outcomes.len(),
					"restore cancelled; returning partial report"
				);
				break;
			}
			let status = self.restore_window(descriptor, &mut claimed).await;
			report.outcomes.push(RestoreOutcome {
				order: descriptor.order,
				path: descriptor.path.clone(),
				status,
			});
		}

		info!(target = "winshelf.restore", id = %session.id, "{}", report.summary_line());
		report
	}

	async fn restore_window(
		&self,
		descriptor: &WindowDescriptor,
		claimed: &mut HashSet<WindowHandle>,
	) -> RestoreStatus {
		if !descriptor.is_restorable_target() {
			debug!(target = "winshelf.restore", order = descriptor.order, "skipping non-restorable window");
			return RestoreStatus::Skipped(SkipReason::NotRestorable);
		}

		let handle = match bounded(self.shell.open_path(&descriptor.path), ShellError::OpenFailed).await {
			Ok(Some(handle)) => handle,
			Ok(None) => match self.poll_for_window(&descriptor.path, claimed).await {
				Some(handle) => handle,
				None => {
					warn!(
						target = "winshelf.restore",
						path = %descriptor.path,
						attempts = self.config.max_poll_attempts,
						"no new window appeared for path"
					);
					return RestoreStatus::Failed(FailReason::OpenTimeout);
				}
			},
			Err(err) => {
				warn!(target = "winshelf.restore", path = %descriptor.path, error = %err, "open failed");
				return RestoreStatus::Failed(FailReason::OpenFailed(err.to_string()));
			}
		};
		claimed.insert(handle);

		match bounded(
			self.shell.set_geometry(handle, descriptor.rect, descriptor.state),
			ShellError::ApplyFailed,
		)
		.await
		{
			Ok(()) => RestoreStatus::Opened { geometry_applied: true },
			Err(err) => {
				warn!(
					target = "winshelf.restore",
					path = %descriptor.path,
					%handle,
					error = %err,
					"window opened but geometry was not applied"
				);
				RestoreStatus::Opened { geometry_applied: false }
			}
		}
	}

	/// Bounded poll for a handle the open call could not return
	/// synchronously: a new handle, unclaimed by any earlier descriptor,
	/// whose path matches case-insensitively.
	async fn poll_for_window(
		&self,
		path: &str,
		claimed: &HashSet<WindowHandle>,
	) -> Option<WindowHandle> {
		for attempt in 0..self.config.max_poll_attempts {
			if attempt > 0 {
				tokio::time::sleep(Duration::from_millis(self.config.poll_interval_ms)).await;
			}

			let handles =
				match bounded(self.shell.list_open_windows(), ShellError::Inaccessible).await {
					Ok(handles) => handles,
					Err(err) => {
						debug!(target = "winshelf.restore", error = %err, "poll listing failed; retrying");
						continue;
					}
				};

			for handle in handles {
				if claimed.contains(&handle) {
					continue;
				}
				let Ok(candidate) =
					bounded(self.shell.read_path(handle), ShellError::Inaccessible).await
				else {
					continue;
				};
				if candidate.eq_ignore_ascii_case(path) {
					return Some(handle);
				}
			}
		}
		None
	}
}
