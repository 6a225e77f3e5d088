//! Vocalis CLI - speech synthesis and voice cloning from the command line.

use clap::{Parser, Subcommand};

mod commands;

use commands::{ConfigCommand, HealthCommand, SayCommand, StreamCommand, VoiceCommand};

/// Vocalis CLI - speech synthesis with cloned voices.
///
/// Drives a local synthesis engine sidecar:
///   - Speech synthesis, whole or streamed chunk by chunk
///   - Voice cloning from a short prompt sample
///   - Voice listing and deletion
///
/// Configuration is read from ~/.vocalis/config.yaml unless --config is given.
#[derive(Parser)]
#[command(name = "vocalis")]
#[command(about = "Vocalis speech synthesis CLI tool")]
#[command(version)]
pub struct Cli {
    /// Config file (default is ~/.vocalis/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Output file or directory (default: stdout)
    #[arg(short = 'o', long, global = true)]
    pub output: Option<String>,

    /// Input request file (YAML or JSON)
    #[arg(short = 'f', long = "file", global = true)]
    pub input: Option<String>,

    /// Output as JSON (for piping)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the effective configuration
    Config(ConfigCommand),
    /// Synthesize speech into one file
    Say(SayCommand),
    /// Synthesize speech chunk by chunk
    Stream(StreamCommand),
    /// Manage voices
    Voice(VoiceCommand),
    /// Show engine and service status
    Health(HealthCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = commands::get_config(&cli)?;
    commands::init_logging(&cli, &config);

    match &cli.command {
        Commands::Config(cmd) => cmd.run(&cli, config).await,
        Commands::Say(cmd) => cmd.run(&cli, config).await,
        Commands::Stream(cmd) => cmd.run(&cli, config).await,
        Commands::Voice(cmd) => cmd.run(&cli, config).await,
        Commands::Health(cmd) => cmd.run(&cli, config).await,
    }
}
