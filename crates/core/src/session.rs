//! Window descriptor and session records.
//!
//! Pure data plus validation; the services own all behavior. A descriptor
//! is created during capture, immutable thereafter, and consumed read-only
//! during restore.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use winshelf_shell::{Rect, WindowState};

use crate::error::{Error, Result};

/// Sentinel path recorded for windows whose location could not be read.
pub const INACCESSIBLE_PATH: &str = "<inaccessible>";

/// Persisted representation of one file-browser window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowDescriptor {
	/// Folder location the window was browsing. May reference a virtual
	/// (non-filesystem) location; [`INACCESSIBLE_PATH`] when unreadable.
	pub path: String,
	#[serde(flatten)]
	pub rect: Rect,
	pub state: WindowState,
	/// Position within the session at capture time. Deterministic restore
	/// ordering only, never UI z-order; frozen at capture.
	pub order: u32,
	/// False when restore should not attempt to reopen this window.
	pub restorable: bool,
}

impl WindowDescriptor {
	/// Placeholder for a window that could not be read; keeps its slot in
	/// the session instead of dropping it.
	pub fn degraded(order: u32) -> Self {
		Self {
			path: INACCESSIBLE_PATH.to_string(),
			rect: Rect::default(),
			state: WindowState::Normal,
			order,
			restorable: false,
		}
	}

	/// Fails with [`Error::InvalidDescriptor`] when the path is empty or a
	/// rectangle dimension is negative. No side effects.
	pub fn validate(&self) -> Result<()> {
		if self.path.is_empty() {
			return Err(Error::InvalidDescriptor("path is empty".into()));
		}
		if self.rect.width < 0 || self.rect.height < 0 {
			return Err(Error::InvalidDescriptor(format!(
				"negative rect dimension {}x{}",
				self.rect.width, self.rect.height
			)));
		}
		Ok(())
	}

	/// Whether restore should attempt to reopen this descriptor.
	pub fn is_restorable_target(&self) -> bool {
		self.restorable && !self.path.is_empty() && self.path != INACCESSIBLE_PATH
	}

	/// True when the rect is the 0x0 "unknown geometry" marker.
	pub fn has_unknown_geometry(&self) -> bool {
		self.rect.is_degenerate()
	}
}

/// A named, timestamped, ordered collection of window descriptors
/// representing one captured desktop arrangement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
	/// Assigned at creation, never reused.
	pub id: Uuid,
	/// Display label; user-editable, not required unique.
	pub name: String,
	/// Capture timestamp, unix seconds.
	pub created_at: u64,
	/// Insertion order = capture order.
	pub windows: Vec<WindowDescriptor>,
}

impl Session {
	pub fn with_windows(name: impl Into<String>, windows: Vec<WindowDescriptor>) -> Self {
		Self {
			id: Uuid::new_v4(),
			name: name.into(),
			created_at: now_ts(),
			windows,
		}
	}

	/// A zero-window session is valid but semantically empty.
	pub fn is_empty(&self) -> bool {
		self.windows.is_empty()
	}

	/// Windows that degraded during capture and will be skipped on restore.
	pub fn degraded_count(&self) -> usize {
		self.windows.iter().filter(|w| !w.restorable).count()
	}

	pub fn summary(&self) -> SessionSummary {
		SessionSummary {
			id: self.id,
			name: self.name.clone(),
			created_at: self.created_at,
			window_count: self.windows.len(),
			restorable_count: self.windows.iter().filter(|w| w.is_restorable_target()).count(),
		}
	}
}

/// Listing row for one persisted session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
	pub id: Uuid,
	pub name: String,
	pub created_at: u64,
	pub window_count: usize,
	pub restorable_count: usize,
}

pub(crate) fn now_ts() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.unwrap_or_default()
		.as_secs()
}
