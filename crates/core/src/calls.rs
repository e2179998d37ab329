//! Bounded shell-call helper shared by the capture and restore services.

use std::future::Future;
use std::time::Duration;

use winshelf_shell::ShellError;

/// Ceiling for any single automation call. Expiry degrades to the calling
/// site's failure variant, never a fatal abort of the whole operation.
pub(crate) const SHELL_CALL_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) async fn bounded<T>(
	fut: impl Future<Output = Result<T, ShellError>>,
	timed_out: fn(String) -> ShellError,
) -> Result<T, ShellError> {
	match tokio::time::timeout(SHELL_CALL_TIMEOUT, fut).await {
		Ok(result) => result,
		Err(_) => Err(timed_out(format!(
			"automation call exceeded {}s",
			SHELL_CALL_TIMEOUT.as_secs()
		))),
	}
}
