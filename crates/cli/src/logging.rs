//! Tracing subscriber setup for the CLI.

use tracing_subscriber::EnvFilter;

/// Initializes logging from the `-v` count. `WINSHELF_LOG` overrides the
/// derived filter when set.
pub fn init_logging(verbose: u8) {
	let default_level = match verbose {
		0 => "warn",
		1 => "info",
		_ => "debug",
	};
	let filter = EnvFilter::try_from_env("WINSHELF_LOG")
		.unwrap_or_else(|_| EnvFilter::new(default_level));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.init();
}
