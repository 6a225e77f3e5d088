//! Voice management commands.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Subcommand};
use vocalis_profile::CloneRequest;
use vocalis_synth::Config;

use super::{connect, output_result, print_success, print_verbose};
use crate::Cli;

/// Voice management.
///
/// Lists, clones and deletes voices stored in the voices directory.
#[derive(Args)]
pub struct VoiceCommand {
    #[command(subcommand)]
    command: VoiceSubcommand,
}

#[derive(Subcommand)]
enum VoiceSubcommand {
    /// List all voices
    List,
    /// Clone a voice from a WAV sample and save it
    Clone {
        /// Voice id to register
        voice_id: String,

        /// Prompt sample (WAV)
        #[arg(long)]
        sample: PathBuf,

        /// Speaker label
        #[arg(long)]
        speaker: String,

        /// Owning customer; empty registers a preset voice
        #[arg(long, default_value = "")]
        customer: String,

        /// Transcript of the sample
        #[arg(long, default_value = "")]
        prompt_text: String,
    },
    /// Delete a voice and its stored files
    Delete {
        /// Voice id to delete
        voice_id: String,
    },
}

impl VoiceCommand {
    pub async fn run(&self, cli: &Cli, config: Config) -> anyhow::Result<()> {
        match &self.command {
            VoiceSubcommand::List => list(cli, config).await,
            VoiceSubcommand::Clone {
                voice_id,
                sample,
                speaker,
                customer,
                prompt_text,
            } => {
                let sample = std::fs::read(sample)
                    .with_context(|| format!("reading sample {}", sample.display()))?;
                let req = CloneRequest {
                    voice_id: voice_id.clone(),
                    speaker_label: speaker.clone(),
                    customer_id: customer.clone(),
                    sample,
                    prompt_text: prompt_text.clone(),
                };
                clone(cli, config, req).await
            }
            VoiceSubcommand::Delete { voice_id } => delete(cli, config, voice_id).await,
        }
    }
}

async fn list(cli: &Cli, config: Config) -> anyhow::Result<()> {
    let orch = connect(cli, config).await?;
    let voices = orch.list_voices().await;
    print_verbose(cli, &format!("{} voices", voices.len()));
    output_result(&voices, cli.output.as_deref(), cli.json)
}

async fn clone(cli: &Cli, config: Config, req: CloneRequest) -> anyhow::Result<()> {
    let orch = connect(cli, config).await?;
    print_verbose(
        cli,
        &format!("Sample: {} bytes, speaker: {}", req.sample.len(), req.speaker_label),
    );
    let voice_id = orch.clone_and_persist(req).await?;
    print_success(&format!("Voice cloned: {}", voice_id));

    let result = serde_json::json!({
        "voice_id": voice_id,
        "status": "created",
    });
    output_result(&result, None, cli.json)
}

async fn delete(cli: &Cli, config: Config, voice_id: &str) -> anyhow::Result<()> {
    let orch = connect(cli, config).await?;
    if !orch.delete_voice(voice_id).await? {
        anyhow::bail!("voice '{}' not found", voice_id);
    }
    print_success(&format!("Voice deleted: {}", voice_id));
    Ok(())
}
