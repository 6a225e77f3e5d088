//! Service status command.

use clap::Args;
use vocalis_synth::Config;

use super::{connect, output_result};
use crate::Cli;

/// Show engine readiness, voice count and worker settings.
#[derive(Args)]
pub struct HealthCommand {}

impl HealthCommand {
    pub async fn run(&self, cli: &Cli, config: Config) -> anyhow::Result<()> {
        let engine_url = config.engine.url.clone();
        let orch = connect(cli, config).await?;
        let health = orch.health().await;

        let result = serde_json::json!({
            "engine_url": engine_url,
            "model_ready": health.model_ready,
            "voices": health.voices,
            "streaming_enabled": health.streaming_enabled,
            "workers": health.workers,
        });
        output_result(&result, cli.output.as_deref(), cli.json)
    }
}
