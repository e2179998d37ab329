//! In-memory shell automation fake for testing capture/restore without a
//! real desktop.
//!
//! Windows are scripted onto the fake, failures are injected per path or
//! per handle, and every call is recorded so tests can assert which
//! automation calls an operation made (or that it made none).

use std::collections::HashSet;

use parking_lot::Mutex;
use std::sync::Arc;

use crate::{
	Rect, ShellError, ShellWindows, WindowHandle, WindowPlacement, WindowState,
};

/// One call made against the fake, recorded for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCall {
	List,
	ReadPath(WindowHandle),
	ReadGeometry(WindowHandle),
	OpenPath(String),
	SetGeometry(WindowHandle),
}

#[derive(Debug, Clone)]
struct FakeWindow {
	handle: WindowHandle,
	path: String,
	placement: WindowPlacement,
	path_readable: bool,
	geometry_readable: bool,
	geometry_stalled: bool,
}

/// An open that returned no handle; the window appears after a countdown
/// of further `list_open_windows` calls.
#[derive(Debug, Clone)]
struct PendingOpen {
	path: String,
	lists_remaining: u32,
}

#[derive(Debug, Default)]
struct FakeState {
	windows: Vec<FakeWindow>,
	pending: Vec<PendingOpen>,
	next_handle: u64,
	open_failures: HashSet<String>,
	apply_failures: HashSet<String>,
	deferred_opens: HashSet<String>,
	deferral_lists: u32,
	listing_fails: bool,
	calls: Vec<ShellCall>,
}

impl FakeState {
	fn alloc_handle(&mut self) -> WindowHandle {
		self.next_handle += 1;
		WindowHandle::new(self.next_handle)
	}

	fn insert_window(&mut self, path: String, placement: WindowPlacement) -> WindowHandle {
		let handle = self.alloc_handle();
		self.windows.push(FakeWindow {
			handle,
			path,
			placement,
			path_readable: true,
			geometry_readable: true,
			geometry_stalled: false,
		});
		handle
	}

	/// Ages pending opens by one list pass, materializing any that are due.
	fn age_pending(&mut self) {
		let mut due = Vec::new();
		self.pending.retain_mut(|pending| {
			if pending.lists_remaining > 1 {
				pending.lists_remaining -= 1;
				true
			} else {
				due.push(pending.path.clone());
				false
			}
		});
		for path in due {
			self.insert_window(path, WindowPlacement::new(Rect::new(0, 0, 800, 600), WindowState::Normal));
		}
	}
}

/// Scriptable in-memory implementation of [`ShellWindows`].
///
/// Cloning shares the underlying state, so a test can keep a controller
/// clone while handing the fake to a service.
#[derive(Debug, Clone, Default)]
pub struct FakeShell {
	state: Arc<Mutex<FakeState>>,
}

impl FakeShell {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds an open window and returns its handle.
	pub fn push_window(&self, path: &str, placement: WindowPlacement) -> WindowHandle {
		self.state.lock().insert_window(path.to_string(), placement)
	}

	/// Adds a window whose path cannot be read (elevated process).
	pub fn push_inaccessible_window(&self) -> WindowHandle {
		let mut state = self.state.lock();
		let handle = state.insert_window(String::new(), WindowPlacement::new(Rect::default(), WindowState::Normal));
		if let Some(window) = state.windows.iter_mut().find(|w| w.handle == handle) {
			window.path_readable = false;
		}
		handle
	}

	/// Adds a window whose geometry cannot be read.
	pub fn push_unreadable_geometry(&self, path: &str) -> WindowHandle {
		let mut state = self.state.lock();
		let handle = state.insert_window(path.to_string(), WindowPlacement::new(Rect::default(), WindowState::Normal));
		if let Some(window) = state.windows.iter_mut().find(|w| w.handle == handle) {
			window.geometry_readable = false;
		}
		handle
	}

	/// Adds a window whose `read_geometry` never completes, so callers must
	/// bound the call themselves.
	pub fn push_stalled_geometry(&self, path: &str) -> WindowHandle {
		let mut state = self.state.lock();
		let handle = state.insert_window(path.to_string(), WindowPlacement::new(Rect::default(), WindowState::Normal));
		if let Some(window) = state.windows.iter_mut().find(|w| w.handle == handle) {
			window.geometry_stalled = true;
		}
		handle
	}

	/// Makes `open_path` fail for this path.
	pub fn fail_open(&self, path: &str) {
		self.state.lock().open_failures.insert(path.to_ascii_lowercase());
	}

	/// Makes `set_geometry` fail for any window browsing this path.
	pub fn fail_apply(&self, path: &str) {
		self.state.lock().apply_failures.insert(path.to_ascii_lowercase());
	}

	/// Makes `open_path` return no handle for this path; the window appears
	/// after `lists` further `list_open_windows` calls.
	pub fn defer_open(&self, path: &str, lists: u32) {
		let mut state = self.state.lock();
		state.deferred_opens.insert(path.to_ascii_lowercase());
		state.deferral_lists = lists;
	}

	/// Makes `list_open_windows` fail outright.
	pub fn fail_listing(&self) {
		self.state.lock().listing_fails = true;
	}

	/// Removes a window, as if the user closed it.
	pub fn close_window(&self, handle: WindowHandle) {
		self.state.lock().windows.retain(|w| w.handle != handle);
	}

	/// Current placement of a window, if it is still open.
	pub fn placement_of(&self, handle: WindowHandle) -> Option<WindowPlacement> {
		self.state
			.lock()
			.windows
			.iter()
			.find(|w| w.handle == handle)
			.map(|w| w.placement)
	}

	/// Open windows as `(handle, path)` pairs, in insertion order.
	pub fn open_windows(&self) -> Vec<(WindowHandle, String)> {
		self.state
			.lock()
			.windows
			.iter()
			.map(|w| (w.handle, w.path.clone()))
			.collect()
	}

	pub fn window_count(&self) -> usize {
		self.state.lock().windows.len()
	}

	/// Takes all recorded calls, clearing the log.
	pub fn take_calls(&self) -> Vec<ShellCall> {
		std::mem::take(&mut self.state.lock().calls)
	}
}

#[async_trait::async_trait]
impl ShellWindows for FakeShell {
	async fn list_open_windows(&self) -> Result<Vec<WindowHandle>, ShellError> {
		let mut state = self.state.lock();
		state.calls.push(ShellCall::List);
		if state.listing_fails {
			return Err(ShellError::Inaccessible("shell enumerator unavailable".into()));
		}
		state.age_pending();
		Ok(state.windows.iter().map(|w| w.handle).collect())
	}

	async fn read_path(&self, handle: WindowHandle) -> Result<String, ShellError> {
		let mut state = self.state.lock();
		state.calls.push(ShellCall::ReadPath(handle));
		let window = state
			.windows
			.iter()
			.find(|w| w.handle == handle)
			.ok_or_else(|| ShellError::Inaccessible(format!("no window {handle}")))?;
		if !window.path_readable {
			return Err(ShellError::Inaccessible(format!("access denied reading {handle}")));
		}
		Ok(window.path.clone())
	}

	async fn read_geometry(&self, handle: WindowHandle) -> Result<WindowPlacement, ShellError> {
		let placement = {
			let mut state = self.state.lock();
			state.calls.push(ShellCall::ReadGeometry(handle));
			let window = state
				.windows
				.iter()
				.find(|w| w.handle == handle)
				.ok_or_else(|| ShellError::Inaccessible(format!("no window {handle}")))?;
			if !window.geometry_readable {
				return Err(ShellError::Inaccessible(format!("placement unreadable for {handle}")));
			}
			if window.geometry_stalled { None } else { Some(window.placement) }
		};
		match placement {
			Some(placement) => Ok(placement),
			None => std::future::pending().await,
		}
	}

	async fn open_path(&self, path: &str) -> Result<Option<WindowHandle>, ShellError> {
		let mut state = self.state.lock();
		state.calls.push(ShellCall::OpenPath(path.to_string()));
		let key = path.to_ascii_lowercase();
		if state.open_failures.contains(&key) {
			return Err(ShellError::OpenFailed(format!("cannot open '{path}'")));
		}
		if state.deferred_opens.contains(&key) {
			let lists_remaining = state.deferral_lists;
			state.pending.push(PendingOpen { path: path.to_string(), lists_remaining });
			return Ok(None);
		}
		let handle = state.insert_window(
			path.to_string(),
			WindowPlacement::new(Rect::new(0, 0, 800, 600), WindowState::Normal),
		);
		Ok(Some(handle))
	}

	async fn set_geometry(
		&self,
		handle: WindowHandle,
		rect: Rect,
		state: WindowState,
	) -> Result<(), ShellError> {
		let mut inner = self.state.lock();
		inner.calls.push(ShellCall::SetGeometry(handle));
		let apply_failures = inner.apply_failures.clone();
		let window = inner
			.windows
			.iter_mut()
			.find(|w| w.handle == handle)
			.ok_or_else(|| ShellError::ApplyFailed(format!("stale handle {handle}")))?;
		if apply_failures.contains(&window.path.to_ascii_lowercase()) {
			return Err(ShellError::ApplyFailed(format!("placement rejected for {handle}")));
		}
		window.placement = WindowPlacement::new(rect, state);
		Ok(())
	}
}
