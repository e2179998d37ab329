use clap::Parser;
use tracing::error;
use winshelf_cli::{cli::Cli, commands, logging};

// Current-thread runtime: the Explorer backend is apartment-threaded COM
// and every operation is a single sequential pass anyway.
#[tokio::main(flavor = "current_thread")]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	if let Err(err) = commands::dispatch(cli).await {
		error!(target = "winshelf", error = %err, "command failed");
		std::process::exit(1);
	}
}
