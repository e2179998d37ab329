use anyhow::Result;
use chrono::{Local, TimeZone};
use winshelf_core::SessionStore;

use super::resolve_session_id;

pub fn list(store: &SessionStore, json: bool) -> Result<()> {
	let summaries = store.list()?;

	if json {
		println!("{}", serde_json::to_string_pretty(&summaries)?);
		return Ok(());
	}

	if summaries.is_empty() {
		println!("No saved sessions.");
		return Ok(());
	}
	for summary in &summaries {
		println!(
			"{}  {}  {} window(s), {} restorable  [{}]",
			format_ts(summary.created_at),
			summary.name,
			summary.window_count,
			summary.restorable_count,
			summary.id
		);
	}
	Ok(())
}

pub fn show(store: &SessionStore, reference: &str, json: bool) -> Result<()> {
	let id = resolve_session_id(store, reference)?;
	let session = store.load(id)?;

	if json {
		println!("{}", serde_json::to_string_pretty(&session)?);
		return Ok(());
	}

	println!("{} ({})", session.name, session.id);
	println!("captured {}", format_ts(session.created_at));
	for window in &session.windows {
		let marker = if window.restorable { " " } else { "!" };
		println!(
			"  {marker}[{}] {}  {}x{} at ({}, {})  {:?}",
			window.order,
			window.path,
			window.rect.width,
			window.rect.height,
			window.rect.left,
			window.rect.top,
			window.state
		);
	}
	if session.is_empty() {
		println!("  (no windows)");
	}
	Ok(())
}

pub fn delete(store: &SessionStore, reference: &str) -> Result<()> {
	let id = resolve_session_id(store, reference)?;
	store.delete(id)?;
	println!("Deleted session {id}");
	Ok(())
}

pub fn add_path(store: &SessionStore, reference: &str, path: &str) -> Result<()> {
	let id = resolve_session_id(store, reference)?;
	if store.add_path(id, path)? {
		println!("Added '{path}' to session {id}");
	} else {
		println!("Session {id} already contains '{path}'");
	}
	Ok(())
}

pub fn remove_path(store: &SessionStore, reference: &str, path: &str) -> Result<()> {
	let id = resolve_session_id(store, reference)?;
	if store.remove_path(id, path)? {
		println!("Removed '{path}' from session {id}");
	} else {
		println!("Removed '{path}'; session {id} had no windows left and was deleted");
	}
	Ok(())
}

fn format_ts(secs: u64) -> String {
	match Local.timestamp_opt(secs as i64, 0).single() {
		Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
		None => format!("@{secs}"),
	}
}
