//! Capture/restore engine for Explorer window sessions.
//!
//! A [`CaptureService`] turns one enumerator pass over the open windows
//! into an ordered, immutable [`Session`]; a [`SessionStore`] persists it;
//! a [`RestoreService`] reopens the windows and reports a per-descriptor
//! outcome. Per-window failures degrade locally and never abort an
//! operation.

mod calls;
pub mod capture;
pub mod error;
pub mod restore;
pub mod session;
pub mod store;

pub use capture::CaptureService;
pub use error::{Error, Result};
pub use restore::{
	CancelFlag, FailReason, RestoreConfig, RestoreOutcome, RestoreReport, RestoreService,
	RestoreStatus, SkipReason,
};
pub use session::{INACCESSIBLE_PATH, Session, SessionSummary, WindowDescriptor};
pub use store::SessionStore;
