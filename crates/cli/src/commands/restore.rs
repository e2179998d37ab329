use anyhow::Result;
use winshelf_core::{RestoreConfig, RestoreService, SessionStore};

use super::{resolve_session_id, shell_backend};

pub async fn run(
	store: &SessionStore,
	reference: &str,
	poll_attempts: u32,
	poll_interval_ms: u64,
	json: bool,
) -> Result<()> {
	let id = resolve_session_id(store, reference)?;
	let session = store.load(id)?;
	let shell = shell_backend()?;

	let config = RestoreConfig { max_poll_attempts: poll_attempts, poll_interval_ms };
	let report = RestoreService::with_config(shell, config).restore(&session).await;

	if json {
		println!("{}", serde_json::to_string_pretty(&report)?);
	} else {
		for outcome in &report.outcomes {
			println!("  [{}] {}: {}", outcome.order, outcome.path, outcome.status);
		}
		println!("{}", report.summary_line());
	}

	if report.opened() == 0 && report.failed() > 0 {
		anyhow::bail!("no windows could be restored");
	}
	Ok(())
}
