mod capture;
mod restore;
mod sessions;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use uuid::Uuid;
use winshelf_core::SessionStore;
use winshelf_shell::ShellWindows;

use crate::cli::{Cli, Commands};

pub async fn dispatch(cli: Cli) -> Result<()> {
	let store = SessionStore::new(sessions_dir(cli.sessions_dir)?);

	match cli.command {
		Commands::Capture { name } => capture::run(&store, name, cli.json).await,
		Commands::Restore { session, poll_attempts, poll_interval_ms } => {
			restore::run(&store, &session, poll_attempts, poll_interval_ms, cli.json).await
		}
		Commands::List => sessions::list(&store, cli.json),
		Commands::Show { session } => sessions::show(&store, &session, cli.json),
		Commands::Delete { session } => sessions::delete(&store, &session),
		Commands::AddPath { session, path } => sessions::add_path(&store, &session, &path),
		Commands::RemovePath { session, path } => sessions::remove_path(&store, &session, &path),
	}
}

/// Explicit `--sessions-dir` wins; otherwise records live under the
/// platform's local data directory.
fn sessions_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
	if let Some(dir) = explicit {
		return Ok(dir);
	}
	let base = dirs::data_local_dir().context("no local data directory for this platform")?;
	Ok(base.join("winshelf").join("sessions"))
}

/// Resolves a user-supplied session reference. A well-formed uuid is used
/// directly; anything else is matched against saved session names.
pub(crate) fn resolve_session_id(store: &SessionStore, reference: &str) -> Result<Uuid> {
	if let Ok(id) = Uuid::parse_str(reference) {
		return Ok(id);
	}

	let summaries = store.list()?;
	let matches: Vec<_> = summaries.iter().filter(|s| s.name == reference).collect();
	match matches.as_slice() {
		[] => bail!("no session named '{reference}'"),
		[one] => Ok(one.id),
		many => bail!(
			"session name '{reference}' is ambiguous ({} matches); use an id instead",
			many.len()
		),
	}
}

#[cfg(windows)]
pub(crate) fn shell_backend() -> Result<Arc<dyn ShellWindows>> {
	Ok(Arc::new(winshelf_shell::explorer::ExplorerShell::new()))
}

#[cfg(not(windows))]
pub(crate) fn shell_backend() -> Result<Arc<dyn ShellWindows>> {
	bail!("Explorer automation requires Windows; session records can still be listed and edited")
}

#[cfg(test)]
mod tests {
	use super::*;
	use winshelf_core::{Session, WindowDescriptor};
	use winshelf_shell::{Rect, WindowState};

	fn descriptor(path: &str) -> WindowDescriptor {
		WindowDescriptor {
			path: path.to_string(),
			rect: Rect { left: 0, top: 0, width: 800, height: 600 },
			state: WindowState::Normal,
			order: 0,
			restorable: true,
		}
	}

	#[test]
	fn resolve_accepts_a_raw_uuid_without_touching_the_store() {
		let dir = tempfile::tempdir().unwrap();
		let store = SessionStore::new(dir.path().join("does-not-exist"));
		let id = Uuid::new_v4();
		assert_eq!(resolve_session_id(&store, &id.to_string()).unwrap(), id);
	}

	#[test]
	fn resolve_finds_a_session_by_name() {
		let dir = tempfile::tempdir().unwrap();
		let store = SessionStore::new(dir.path().to_path_buf());
		let session = Session::with_windows("work", vec![descriptor("C:\\work")]);
		store.save(&session).unwrap();

		assert_eq!(resolve_session_id(&store, "work").unwrap(), session.id);
	}

	#[test]
	fn resolve_rejects_unknown_names() {
		let dir = tempfile::tempdir().unwrap();
		let store = SessionStore::new(dir.path().to_path_buf());
		let err = resolve_session_id(&store, "nothing-here").unwrap_err();
		assert!(err.to_string().contains("no session named"));
	}

	#[test]
	fn resolve_refuses_ambiguous_names() {
		let dir = tempfile::tempdir().unwrap();
		let store = SessionStore::new(dir.path().to_path_buf());
		store.save(&Session::with_windows("dup", vec![descriptor("C:\\a")])).unwrap();
		store.save(&Session::with_windows("dup", vec![descriptor("C:\\b")])).unwrap();

		let err = resolve_session_id(&store, "dup").unwrap_err();
		assert!(err.to_string().contains("ambiguous"));
	}

	#[test]
	fn explicit_sessions_dir_is_used_verbatim() {
		let dir = sessions_dir(Some(PathBuf::from("/tmp/custom"))).unwrap();
		assert_eq!(dir, PathBuf::from("/tmp/custom"));
	}
}
