use anyhow::Result;
use winshelf_core::{CaptureService, SessionStore};

use super::shell_backend;

pub async fn run(store: &SessionStore, name: Option<String>, json: bool) -> Result<()> {
	let shell = shell_backend()?;
	let name = name.unwrap_or_else(default_name);

	let session = CaptureService::new(shell).capture(name).await?;
	store.save(&session)?;

	if json {
		println!("{}", serde_json::to_string_pretty(&session)?);
		return Ok(());
	}

	println!(
		"Saved session '{}' ({}): {} window(s)",
		session.name,
		session.id,
		session.windows.len()
	);
	let degraded = session.degraded_count();
	if degraded > 0 {
		println!("  {degraded} window(s) could not be fully read and will be skipped on restore");
	}
	if session.is_empty() {
		println!("  no Explorer windows were open");
	}
	Ok(())
}

fn default_name() -> String {
	chrono::Local::now().format("Session %Y-%m-%d %H:%M:%S").to_string()
}
