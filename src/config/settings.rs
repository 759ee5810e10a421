//! Configuration settings for restoremod
//!
//! Defines the CLI/environment surface the invoking download manager uses,
//! the runtime configuration, and the exit-status contract.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// restoremod - Restore default permissions on a completed download
#[derive(Parser, Debug, Clone)]
#[command(name = "restoremod")]
#[command(author = "SmartCopy Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Restore inheritable filesystem permissions on a completed download")]
#[command(long_about = r#"
restoremod runs as a post-processing hook after a download manager finishes
writing into a destination directory. The content was produced by an
untrusted external process; restoremod puts the tree back into the
predictable permission state implied by the destination directory itself.

If the destination carries a default ACL, that ACL and the destination's
setgid bit are propagated to the destination and every descendant, with
setuid and sticky bits cleared. Otherwise permissions are rebuilt from the
standard creation templates and the process umask, and any extended ACLs
left behind by archive extraction are discarded.

Examples:
  restoremod /srv/downloads/item              # explicit destination
  RESTOREMOD_DIRECTORY=/srv/downloads/item restoremod
  restoremod /srv/downloads/item --dry-run    # show planned changes only
"#)]
pub struct CliArgs {
    /// Destination directory (hook invocations pass it via the environment)
    #[arg(value_name = "DIRECTORY", env = "RESTOREMOD_DIRECTORY")]
    pub directory: Option<PathBuf>,

    /// Final download status reported by the invoking manager; any value
    /// other than SUCCESS skips processing
    #[arg(long, value_name = "STATUS", env = "RESTOREMOD_STATUS")]
    pub status: Option<String>,

    /// Compute and log every change without writing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Suppress the summary output
    #[arg(short, long)]
    pub quiet: bool,
}

/// Runtime configuration for a restore run
#[derive(Debug, Clone)]
pub struct RestoreConfig {
    /// Destination directory whose tree is restored
    pub directory: PathBuf,
    /// Walk and report without mutating
    pub dry_run: bool,
}

impl RestoreConfig {
    /// Build a runtime configuration from parsed CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self, String> {
        let directory = args.directory.clone().ok_or_else(|| {
            "no destination directory given (pass it as an argument or via RESTOREMOD_DIRECTORY)"
                .to_string()
        })?;

        Ok(Self {
            directory,
            dry_run: args.dry_run,
        })
    }
}

/// Outcome reported back to the invoking download manager.
///
/// The numeric values follow the manager's post-processing exit-code
/// convention: one code each for success, failure and "nothing to do".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostProcessStatus {
    /// Permissions were restored on the whole tree
    Success,
    /// The run aborted at an unfixable step; re-running is safe
    Failure,
    /// Nothing was eligible for processing
    Nothing,
}

impl PostProcessStatus {
    /// Process exit code understood by the invoking manager
    pub fn code(self) -> i32 {
        match self {
            Self::Success => 93,
            Self::Failure => 94,
            Self::Nothing => 95,
        }
    }
}
