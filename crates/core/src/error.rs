//! Error taxonomy for the capture/restore engine.
//!
//! Per-window failures during capture and restore are recovered locally and
//! surface as degraded descriptors or per-item outcomes, never as values of
//! this type. What remains here are the operation-level failures: the
//! enumerator refusing to list at all, and persistence faults.

use std::path::PathBuf;

use uuid::Uuid;
use winshelf_shell::ShellError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// A descriptor failed validation.
	#[error("invalid descriptor: {0}")]
	InvalidDescriptor(String),

	/// The enumerator could not list any windows; no partial progress is
	/// possible, so the whole operation fails.
	#[error("window enumeration failed: {0}")]
	Enumerator(#[source] ShellError),

	/// No persisted session with this id.
	#[error("session {0} not found")]
	NotFound(Uuid),

	/// A persisted record that cannot be parsed at all.
	#[error("corrupt session record at {path}: {reason}")]
	CorruptRecord { path: PathBuf, reason: String },

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}
