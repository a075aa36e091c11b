use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "uplink",
    about = "Uplink: one-way mirroring of a local directory onto an FTP server",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Transport {
    /// FTP server in passive mode
    Ftp,
    /// Locally mounted directory
    Mount,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Mirror a local directory onto the remote tree
    Sync(SyncArgs),
}

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Project directory; fingerprint keys and local ignore globs are relative to it
    #[arg(long, env = "PROJECT_DIR", default_value = ".")]
    pub project_dir: PathBuf,

    /// Directory to mirror, relative to the project directory
    #[arg(long, env = "LOCAL_DIR")]
    pub local_dir: PathBuf,

    /// Remote directory receiving the mirror
    #[arg(long, env = "REMOTE_DIR")]
    pub remote_dir: String,

    #[arg(long, value_enum, default_value = "ftp")]
    pub transport: Transport,

    #[arg(long, env = "FTP_HOST")]
    pub host: Option<String>,

    #[arg(long, env = "FTP_PORT", default_value_t = 21)]
    pub port: u16,

    #[arg(long, env = "FTP_USERNAME", default_value = "anonymous")]
    pub username: String,

    #[arg(long, env = "FTP_PASSWORD", default_value = "", hide_env_values = true)]
    pub password: String,

    /// Root of the mounted remote tree (mount transport)
    #[arg(long)]
    pub mount_root: Option<PathBuf>,

    /// Connect timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub connect_timeout: u64,

    /// Log what would change without touching the remote tree
    #[arg(long, env = "DRY_RUN")]
    pub dry_run: bool,

    /// Ignore rules file (default: <project-dir>/.ftpignore.json)
    #[arg(long)]
    pub ignore_file: Option<PathBuf>,

    /// Name of the fingerprint state file under the remote directory
    #[arg(long, default_value = ".hashes")]
    pub state_file: String,
}
