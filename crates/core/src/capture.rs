//! Capture service: one enumerator pass into an ordered descriptor set.

use std::sync::Arc;

use tracing::{debug, warn};
use winshelf_shell::{ShellError, ShellWindows, WindowHandle};

use crate::calls::bounded;
use crate::error::{Error, Result};
use crate::session::{Session, WindowDescriptor};

/// Builds a [`Session`] from the currently open windows.
///
/// Persistence is the caller's explicit next step; capture itself has no
/// side effects beyond the enumerator reads.
pub struct CaptureService {
	shell: Arc<dyn ShellWindows>,
}

impl CaptureService {
	pub fn new(shell: Arc<dyn ShellWindows>) -> Self {
		Self { shell }
	}

	/// Captures every open window, in the enumerator's order, into a new
	/// session named `name`.
	///
	/// Per-window read failures degrade that slot to a non-restorable
	/// descriptor and never abort the pass; only the listing call itself is
	/// an operation-level error. Duplicate windows on one path are kept:
	/// each handle contributes exactly one descriptor, and content is never
	/// deduplicated.
	pub async fn capture(&self, name: impl Into<String>) -> Result<Session> {
		let handles = bounded(self.shell.list_open_windows(), ShellError::Inaccessible)
			.await
			.map_err(Error::Enumerator)?;

		let mut windows = Vec::with_capacity(handles.len());
		for (index, handle) in handles.into_iter().enumerate() {
			windows.push(self.capture_window(handle, index as u32).await);
		}

		let session = Session::with_windows(name, windows);
		if session.is_empty() {
			warn!(
				target = "winshelf.capture",
				id = %session.id,
				"captured an empty session; no open windows were found"
			);
		} else {
			debug!(
				target = "winshelf.capture",
				id = %session.id,
				windows = session.windows.len(),
				degraded = session.degraded_count(),
				"capture complete"
			);
		}
		Ok(session)
	}

	async fn capture_window(&self, handle: WindowHandle, order: u32) -> WindowDescriptor {
		let path = match bounded(self.shell.read_path(handle), ShellError::Inaccessible).await {
			Ok(path) => path,
			Err(err) => {
				warn!(target = "winshelf.capture", %handle, error = %err, "path unreadable; degrading window");
				return WindowDescriptor::degraded(order);
			}
		};

		let placement =
			match bounded(self.shell.read_geometry(handle), ShellError::Inaccessible).await {
				Ok(placement) => placement,
				Err(err) => {
					warn!(target = "winshelf.capture", %handle, error = %err, "geometry unreadable; degrading window");
					return WindowDescriptor::degraded(order);
				}
			};

		let descriptor = WindowDescriptor {
			path,
			rect: placement.rect,
			state: placement.state,
			order,
			restorable: true,
		};
		match descriptor.validate() {
			Ok(()) => descriptor,
			Err(err) => {
				warn!(target = "winshelf.capture", %handle, error = %err, "descriptor invalid; degrading window");
				WindowDescriptor::degraded(order)
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use winshelf_shell::fake::FakeShell;
	use winshelf_shell::{Rect, WindowPlacement, WindowState};

	use super::*;
	use crate::session::INACCESSIBLE_PATH;

	fn placement(left: i32, top: i32, width: i32, height: i32) -> WindowPlacement {
		WindowPlacement::new(Rect::new(left, top, width, height), WindowState::Normal)
	}

	#[tokio::test]
	async fn capture_preserves_enumeration_order() {
		let shell = FakeShell::new();
		shell.push_window(r"C:\Users\demo\Documents", placement(0, 0, 800, 600));
		shell.push_window(r"C:\Users\demo\Downloads", placement(100, 100, 640, 480));
		shell.push_window(r"C:\Users\demo\Documents", placement(0, 0, 800, 600));

		let service = CaptureService::new(Arc::new(shell));
		let session = service.capture("work").await.unwrap();

		assert_eq!(session.windows.len(), 3);
		for (i, window) in session.windows.iter().enumerate() {
			assert_eq!(window.order, i as u32);
			assert!(window.restorable);
		}
		// Duplicate path+rect pairs survive; dedup is by handle only.
		assert_eq!(session.windows[0].path, session.windows[2].path);
	}

	#[tokio::test]
	async fn unreadable_path_degrades_in_place() {
		let shell = FakeShell::new();
		shell.push_window(r"C:\a", placement(0, 0, 800, 600));
		shell.push_inaccessible_window();
		shell.push_window(r"C:\b", placement(0, 0, 800, 600));

		let session = CaptureService::new(Arc::new(shell)).capture("mixed").await.unwrap();

		assert_eq!(session.windows.len(), 3);
		assert_eq!(session.windows[1].path, INACCESSIBLE_PATH);
		assert!(!session.windows[1].restorable);
		assert_eq!(session.windows[2].path, r"C:\b");
		assert_eq!(session.windows[2].order, 2);
		assert_eq!(session.degraded_count(), 1);
	}

	#[tokio::test]
	async fn unreadable_geometry_degrades_without_dropping_others() {
		let shell = FakeShell::new();
		shell.push_unreadable_geometry(r"C:\elevated");
		shell.push_window(r"C:\plain", placement(10, 10, 500, 400));

		let session = CaptureService::new(Arc::new(shell)).capture("s").await.unwrap();

		assert_eq!(session.windows.len(), 2);
		assert!(!session.windows[0].restorable);
		assert!(session.windows[0].has_unknown_geometry());
		assert!(session.windows[1].restorable);
	}

	#[tokio::test(start_paused = true)]
	async fn stalled_geometry_call_times_out_and_degrades_in_place() {
		let shell = FakeShell::new();
		shell.push_window(r"C:\a", placement(0, 0, 800, 600));
		shell.push_stalled_geometry(r"C:\hung");
		shell.push_window(r"C:\b", placement(5, 5, 640, 480));

		let session = CaptureService::new(Arc::new(shell)).capture("s").await.unwrap();

		assert_eq!(session.windows.len(), 3);
		assert_eq!(session.windows[0].path, r"C:\a");
		assert_eq!(session.windows[1].path, INACCESSIBLE_PATH);
		assert!(!session.windows[1].restorable);
		assert_eq!(session.windows[2].path, r"C:\b");
		assert_eq!(session.windows[2].order, 2);
	}

	#[tokio::test]
	async fn empty_desktop_captures_an_empty_session() {
		let shell = FakeShell::new();
		let session = CaptureService::new(Arc::new(shell)).capture("empty").await.unwrap();
		assert!(session.is_empty());
	}

	#[tokio::test]
	async fn listing_failure_is_an_operation_error() {
		let shell = FakeShell::new();
		shell.fail_listing();

		let err = CaptureService::new(Arc::new(shell)).capture("s").await.unwrap_err();
		assert!(matches!(err, Error::Enumerator(_)));
	}

	#[tokio::test]
	async fn empty_window_path_is_treated_like_inaccessible() {
		let shell = FakeShell::new();
		shell.push_window("", placement(0, 0, 800, 600));

		let session = CaptureService::new(Arc::new(shell)).capture("s").await.unwrap();
		assert_eq!(session.windows[0].path, INACCESSIBLE_PATH);
		assert!(!session.windows[0].restorable);
		// Invalid descriptors degrade exactly like inaccessible ones; the
		// read geometry is not kept.
		assert!(session.windows[0].has_unknown_geometry());
	}
}
