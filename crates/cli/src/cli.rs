use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "winshelf")]
#[command(about = "Save and restore Explorer window sessions")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Directory holding session records (defaults to the local data dir)
	#[arg(long, global = true, value_name = "DIR")]
	pub sessions_dir: Option<PathBuf>,

	/// Emit machine-readable JSON instead of text
	#[arg(long, global = true)]
	pub json: bool,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Capture the currently open Explorer windows into a new session
	#[command(alias = "save")]
	Capture {
		/// Display name for the session (defaults to a timestamp label)
		name: Option<String>,
	},

	/// Reopen the windows of a saved session
	Restore {
		/// Session id or name
		session: String,

		/// List passes to wait for a spawned window before giving up
		#[arg(long, default_value = "20")]
		poll_attempts: u32,

		/// Delay between list passes in milliseconds
		#[arg(long, default_value = "100")]
		poll_interval_ms: u64,
	},

	/// List saved sessions, newest first
	#[command(alias = "ls")]
	List,

	/// Show one session's window entries
	Show {
		/// Session id or name
		session: String,
	},

	/// Delete a saved session
	#[command(alias = "rm")]
	Delete {
		/// Session id or name
		session: String,
	},

	/// Add a folder path to a session with default geometry
	AddPath {
		/// Session id or name
		session: String,
		/// Folder path to add
		path: String,
	},

	/// Remove every entry for a folder path from a session
	RemovePath {
		/// Session id or name
		session: String,
		/// Folder path to remove
		path: String,
	},
}
