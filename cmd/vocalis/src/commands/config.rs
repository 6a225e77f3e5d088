//! Configuration command.

use clap::{Args, Subcommand};
use vocalis_synth::Config;

use super::{default_config_path, output_result};
use crate::Cli;

/// Inspect the configuration.
#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Subcommand)]
enum ConfigSubcommand {
    /// Print the effective configuration
    Show,
    /// Print the config file path
    Path,
}

impl ConfigCommand {
    pub async fn run(&self, cli: &Cli, config: Config) -> anyhow::Result<()> {
        match self.command {
            ConfigSubcommand::Show => output_result(&config, cli.output.as_deref(), cli.json),
            ConfigSubcommand::Path => {
                let path = cli
                    .config
                    .clone()
                    .or_else(|| default_config_path().map(|p| p.display().to_string()))
                    .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
                println!("{}", path);
                Ok(())
            }
        }
    }
}
