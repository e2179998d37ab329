//! Automation boundary between the winshelf engine and the host shell.
//!
//! The engine only ever talks to the desktop through the [`ShellWindows`]
//! capability trait: enumerate open file-browser windows, read a window's
//! path and geometry, open a path, apply geometry. Implementations report
//! raw outcomes and perform no retry or recovery; the capture/restore
//! services own that policy.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(windows)]
pub mod explorer;
pub mod fake;

/// Opaque identifier for one live file-browser window.
///
/// Only meaningful within the enumerator that produced it. The automation
/// layer offers no identity linkage across process restarts, so handles are
/// never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowHandle(u64);

impl WindowHandle {
	pub fn new(raw: u64) -> Self {
		Self(raw)
	}

	pub fn raw(self) -> u64 {
		self.0
	}
}

impl fmt::Display for WindowHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "0x{:x}", self.0)
	}
}

/// Window rectangle in desktop coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
	pub left: i32,
	pub top: i32,
	pub width: i32,
	pub height: i32,
}

impl Rect {
	pub fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
		Self { left, top, width, height }
	}

	/// A 0x0 rect is legal and means the geometry could not be read.
	pub fn is_degenerate(&self) -> bool {
		self.width == 0 && self.height == 0
	}
}

/// Display state of a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowState {
	#[default]
	Normal,
	Maximized,
	Minimized,
}

/// Live geometry snapshot read from one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPlacement {
	pub rect: Rect,
	pub state: WindowState,
}

impl WindowPlacement {
	pub fn new(rect: Rect, state: WindowState) -> Self {
		Self { rect, state }
	}
}

/// Raw failure reported by the automation surface.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
	/// The window exists but its path or geometry could not be read
	/// (elevated process, permission denied, vanished mid-call).
	#[error("window inaccessible: {0}")]
	Inaccessible(String),
	/// The path could not be opened: missing target, or a virtual shell
	/// container unsupported by direct open.
	#[error("open failed: {0}")]
	OpenFailed(String),
	/// Geometry or state could not be applied to an opened window.
	#[error("apply failed: {0}")]
	ApplyFailed(String),
}

/// Capability contract required from the host shell automation layer.
///
/// Every call is blocking in effect; callers bound it with their own
/// timeout and treat expiry as a failure of that call only.
#[async_trait]
pub trait ShellWindows: Send + Sync {
	/// Snapshot of the currently open file-browser windows.
	///
	/// Finite and restartable; ordering is whatever the automation layer
	/// returns and is not stable across calls.
	async fn list_open_windows(&self) -> Result<Vec<WindowHandle>, ShellError>;

	/// Folder location the window is browsing.
	async fn read_path(&self, handle: WindowHandle) -> Result<String, ShellError>;

	/// Live rectangle and display state of the window.
	async fn read_geometry(&self, handle: WindowHandle) -> Result<WindowPlacement, ShellError>;

	/// Opens a new browser window at `path`.
	///
	/// Returns `Some(handle)` when the automation layer hands back the new
	/// window synchronously, `None` when the open was launched and the
	/// handle must be discovered by polling [`list_open_windows`].
	///
	/// [`list_open_windows`]: ShellWindows::list_open_windows
	async fn open_path(&self, path: &str) -> Result<Option<WindowHandle>, ShellError>;

	/// Applies geometry and display state to an open window.
	async fn set_geometry(
		&self,
		handle: WindowHandle,
		rect: Rect,
		state: WindowState,
	) -> Result<(), ShellError>;
}
