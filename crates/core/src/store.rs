//! Directory-backed session persistence.
//!
//! One pretty-printed JSON record per session under a sessions directory;
//! pure (de)serialization with no capture/restore logic. Damaged records
//! degrade the way capture does: invalid window entries are dropped and
//! reported, the rest of the session survives.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;
use uuid::Uuid;
use winshelf_shell::{Rect, WindowState};

use crate::error::{Error, Result};
use crate::session::{Session, SessionSummary, WindowDescriptor};

#[derive(Debug, Clone)]
pub struct SessionStore {
	dir: PathBuf,
}

impl SessionStore {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self { dir: dir.into() }
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	fn record_path(&self, id: Uuid) -> PathBuf {
		self.dir.join(format!("{id}.json"))
	}

	pub fn save(&self, session: &Session) -> Result<()> {
		fs::create_dir_all(&self.dir)?;
		let json = serde_json::to_string_pretty(session)?;
		fs::write(self.record_path(session.id), json)?;
		Ok(())
	}

	/// Loads a session, dropping (with a warning) any window entry that
	/// fails descriptor validation. A record that does not parse at all is
	/// [`Error::CorruptRecord`].
	pub fn load(&self, id: Uuid) -> Result<Session> {
		let path = self.record_path(id);
		let raw = match fs::read_to_string(&path) {
			Ok(raw) => raw,
			Err(err) if err.kind() == io::ErrorKind::NotFound => return Err(Error::NotFound(id)),
			Err(err) => return Err(err.into()),
		};

		let mut session: Session = serde_json::from_str(&raw).map_err(|err| Error::CorruptRecord {
			path: path.clone(),
			reason: err.to_string(),
		})?;

		session.windows.retain(|window| match window.validate() {
			Ok(()) => true,
			Err(err) => {
				warn!(
					target = "winshelf.store",
					id = %id,
					order = window.order,
					error = %err,
					"dropping invalid window entry from session record"
				);
				false
			}
		});
		Ok(session)
	}

	pub fn delete(&self, id: Uuid) -> Result<()> {
		match fs::remove_file(self.record_path(id)) {
			Ok(()) => Ok(()),
			Err(err) if err.kind() == io::ErrorKind::NotFound => Err(Error::NotFound(id)),
			Err(err) => Err(err.into()),
		}
	}

	/// Summaries of every readable session record, newest first.
	/// Unreadable records are skipped with a warning, never a failure.
	pub fn list(&self) -> Result<Vec<SessionSummary>> {
		let mut summaries = Vec::new();
		let entries = match fs::read_dir(&self.dir) {
			Ok(entries) => entries,
			Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(summaries),
			Err(err) => return Err(err.into()),
		};

		for entry in entries {
			let path = entry?.path();
			if path.extension().is_none_or(|ext| ext != "json") {
				continue;
			}
			let Some(id) = path
				.file_stem()
				.and_then(|stem| stem.to_str())
				.and_then(|stem| Uuid::parse_str(stem).ok())
			else {
				continue;
			};
			match self.load(id) {
				Ok(session) => summaries.push(session.summary()),
				Err(err) => {
					warn!(
						target = "winshelf.store",
						path = %path.display(),
						error = %err,
						"skipping unreadable session record"
					);
				}
			}
		}

		summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
		Ok(summaries)
	}

	/// Appends a window entry for `path` with default geometry, taking the
	/// next free `order` slot. Returns false (without writing) when the
	/// session already has an entry for that path (case-insensitive).
	pub fn add_path(&self, id: Uuid, path: &str) -> Result<bool> {
		let mut session = self.load(id)?;
		if session.windows.iter().any(|w| w.path.eq_ignore_ascii_case(path)) {
			return Ok(false);
		}
		let order = session.windows.iter().map(|w| w.order).max().map_or(0, |max| max + 1);
		session.windows.push(WindowDescriptor {
			path: path.to_string(),
			rect: Rect::new(100, 100, 1000, 600),
			state: WindowState::Normal,
			order,
			restorable: true,
		});
		self.save(&session)?;
		Ok(true)
	}

	/// Removes every window entry browsing `path` (case-insensitive).
	/// Deletes the whole record when the last entry goes. Returns whether
	/// the session still exists afterwards.
	pub fn remove_path(&self, id: Uuid, path: &str) -> Result<bool> {
		let mut session = self.load(id)?;
		session.windows.retain(|w| !w.path.eq_ignore_ascii_case(path));
		if session.windows.is_empty() {
			self.delete(id)?;
			return Ok(false);
		}
		self.save(&session)?;
		Ok(true)
	}
}

#[cfg(test)]
mod tests {
	use winshelf_shell::{Rect, WindowState};

	use super::*;
	use crate::session::WindowDescriptor;

	fn store() -> (tempfile::TempDir, SessionStore) {
		let dir = tempfile::tempdir().unwrap();
		let store = SessionStore::new(dir.path().join("sessions"));
		(dir, store)
	}

	fn descriptor(path: &str, order: u32) -> WindowDescriptor {
		WindowDescriptor {
			path: path.to_string(),
			rect: Rect::new(10, 20, 1024, 768),
			state: WindowState::Normal,
			order,
			restorable: true,
		}
	}

	#[test]
	fn save_load_round_trips_field_for_field() {
		let (_guard, store) = store();
		let mut session = Session::with_windows(
			"daily",
			vec![descriptor(r"C:\a", 0), descriptor(r"C:\b", 1)],
		);
		session.windows[1].state = WindowState::Minimized;

		store.save(&session).unwrap();
		let loaded = store.load(session.id).unwrap();

		assert_eq!(loaded, session);
	}

	#[test]
	fn load_of_unknown_id_is_not_found() {
		let (_guard, store) = store();
		let err = store.load(Uuid::new_v4()).unwrap_err();
		assert!(matches!(err, Error::NotFound(_)));
	}

	#[test]
	fn delete_of_unknown_id_is_not_found() {
		let (_guard, store) = store();
		let err = store.delete(Uuid::new_v4()).unwrap_err();
		assert!(matches!(err, Error::NotFound(_)));
	}

	#[test]
	fn delete_removes_the_record() {
		let (_guard, store) = store();
		let session = Session::with_windows("gone", Vec::new());
		store.save(&session).unwrap();

		store.delete(session.id).unwrap();
		assert!(matches!(store.load(session.id).unwrap_err(), Error::NotFound(_)));
	}

	#[test]
	fn corrupt_entry_is_dropped_and_the_rest_survive() {
		let (_guard, store) = store();
		let id = Uuid::new_v4();
		let record = serde_json::json!({
			"id": id,
			"name": "damaged",
			"createdAt": 1_700_000_000u64,
			"windows": [
				{"path": r"C:\fine", "left": 0, "top": 0, "width": 800, "height": 600,
				 "state": "normal", "order": 0, "restorable": true},
				{"path": r"C:\bad", "left": 0, "top": 0, "width": -100, "height": 600,
				 "state": "normal", "order": 1, "restorable": true},
				{"path": r"C:\also-fine", "left": 5, "top": 5, "width": 640, "height": 480,
				 "state": "maximized", "order": 2, "restorable": true}
			]
		});
		fs::create_dir_all(store.dir()).unwrap();
		fs::write(
			store.dir().join(format!("{id}.json")),
			serde_json::to_string_pretty(&record).unwrap(),
		)
		.unwrap();

		let session = store.load(id).unwrap();
		assert_eq!(session.windows.len(), 2);
		assert_eq!(session.windows[0].path, r"C:\fine");
		assert_eq!(session.windows[1].path, r"C:\also-fine");
		assert_eq!(session.windows[1].order, 2);
	}

	#[test]
	fn unparseable_record_is_corrupt_not_a_crash() {
		let (_guard, store) = store();
		let id = Uuid::new_v4();
		fs::create_dir_all(store.dir()).unwrap();
		fs::write(store.dir().join(format!("{id}.json")), "{ not json").unwrap();

		let err = store.load(id).unwrap_err();
		assert!(matches!(err, Error::CorruptRecord { .. }));
	}

	#[test]
	fn list_is_newest_first_and_skips_garbage() {
		let (_guard, store) = store();
		let mut old = Session::with_windows("old", vec![descriptor(r"C:\a", 0)]);
		old.created_at = 100;
		let mut new = Session::with_windows("new", Vec::new());
		new.created_at = 200;
		store.save(&old).unwrap();
		store.save(&new).unwrap();

		// A stray file and a corrupt record must not poison the listing.
		fs::write(store.dir().join("notes.txt"), "hello").unwrap();
		fs::write(store.dir().join(format!("{}.json", Uuid::new_v4())), "{").unwrap();

		let summaries = store.list().unwrap();
		assert_eq!(summaries.len(), 2);
		assert_eq!(summaries[0].name, "new");
		assert_eq!(summaries[1].name, "old");
		assert_eq!(summaries[1].window_count, 1);
	}

	#[test]
	fn list_without_directory_is_empty() {
		let (_guard, store) = store();
		assert!(store.list().unwrap().is_empty());
	}

	#[test]
	fn add_path_appends_with_default_geometry_and_next_order() {
		let (_guard, store) = store();
		let session = Session::with_windows(
			"grow",
			vec![descriptor(r"C:\existing", 0), descriptor(r"C:\other", 3)],
		);
		store.save(&session).unwrap();

		assert!(store.add_path(session.id, r"C:\added").unwrap());

		let loaded = store.load(session.id).unwrap();
		assert_eq!(loaded.windows.len(), 3);
		let added = &loaded.windows[2];
		assert_eq!(added.path, r"C:\added");
		assert_eq!(added.rect, Rect::new(100, 100, 1000, 600));
		assert_eq!(added.state, WindowState::Normal);
		assert_eq!(added.order, 4);
		assert!(added.restorable);
	}

	#[test]
	fn add_path_refuses_duplicates_case_insensitively() {
		let (_guard, store) = store();
		let session = Session::with_windows("dup", vec![descriptor(r"C:\Projects", 0)]);
		store.save(&session).unwrap();

		assert!(!store.add_path(session.id, r"c:\PROJECTS").unwrap());
		// The refusal must not touch the record.
		assert_eq!(store.load(session.id).unwrap().windows.len(), 1);
	}

	#[test]
	fn add_path_to_unknown_session_is_not_found() {
		let (_guard, store) = store();
		let err = store.add_path(Uuid::new_v4(), r"C:\anywhere").unwrap_err();
		assert!(matches!(err, Error::NotFound(_)));
	}

	#[test]
	fn remove_path_edits_or_deletes_the_record() {
		let (_guard, store) = store();
		let session = Session::with_windows(
			"edit",
			vec![descriptor(r"C:\keep", 0), descriptor(r"C:\drop", 1)],
		);
		store.save(&session).unwrap();

		assert!(store.remove_path(session.id, r"c:\DROP").unwrap());
		let loaded = store.load(session.id).unwrap();
		assert_eq!(loaded.windows.len(), 1);
		assert_eq!(loaded.windows[0].path, r"C:\keep");

		assert!(!store.remove_path(session.id, r"C:\keep").unwrap());
		assert!(matches!(store.load(session.id).unwrap_err(), Error::NotFound(_)));
	}
}
