//! Speech synthesis commands.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context as _;
use clap::Args;
use futures::StreamExt;
use vocalis_audio::ResponseFormat;
use vocalis_synth::{Config, Orchestrator, SynthesisRequest};

use super::{
    connect, format_bytes, load_request, output_bytes, output_result, print_success,
    print_verbose,
};
use crate::Cli;

/// Request options shared by `say` and `stream`.
#[derive(Args)]
pub struct RequestArgs {
    /// Text to synthesize (or use -f with a request file)
    text: Option<String>,

    /// Voice id
    #[arg(long)]
    voice: Option<String>,

    /// Output format: wav, flac or mp3
    #[arg(long, default_value = "wav")]
    format: String,

    /// Playback speed multiplier
    #[arg(long, default_value_t = 1.0)]
    speed: f32,

    /// Clone a voice from this WAV sample for this run only
    #[arg(long, requires = "speaker")]
    sample: Option<PathBuf>,

    /// Speaker label for --sample; also the voice id
    #[arg(long)]
    speaker: Option<String>,

    /// Transcript of --sample
    #[arg(long, default_value = "")]
    prompt_text: String,
}

impl RequestArgs {
    /// Builds the request from a request file or from arguments.
    fn request(&self, cli: &Cli) -> anyhow::Result<SynthesisRequest> {
        if let Some(path) = cli.input.as_deref() {
            return load_request(path);
        }
        let text = self
            .text
            .clone()
            .ok_or_else(|| anyhow::anyhow!("text is required, or use -f flag"))?;
        let voice = self
            .voice
            .clone()
            .or_else(|| self.speaker.clone())
            .ok_or_else(|| anyhow::anyhow!("--voice is required"))?;
        Ok(SynthesisRequest::new(text, voice)
            .with_format(ResponseFormat::from_name(&self.format))
            .with_speed(self.speed))
    }

    /// Registers the session voice from `--sample`, if given.
    async fn clone_sample(&self, cli: &Cli, orch: &Orchestrator) -> anyhow::Result<()> {
        let (Some(sample), Some(speaker)) = (&self.sample, &self.speaker) else {
            return Ok(());
        };
        let bytes = std::fs::read(sample)
            .with_context(|| format!("reading sample {}", sample.display()))?;
        let id = orch
            .clone_voice(bytes, speaker.clone(), self.prompt_text.clone())
            .await?;
        print_verbose(cli, &format!("Cloned session voice: {}", id));
        Ok(())
    }
}

/// Synthesize speech into one file.
#[derive(Args)]
pub struct SayCommand {
    #[command(flatten)]
    args: RequestArgs,
}

impl SayCommand {
    pub async fn run(&self, cli: &Cli, config: Config) -> anyhow::Result<()> {
        let req = self.args.request(cli)?;
        let orch = connect(cli, config).await?;
        self.args.clone_sample(cli, &orch).await?;

        print_verbose(cli, &format!("Voice: {}", req.voice_id));
        print_verbose(cli, &format!("Text length: {} characters", req.text.chars().count()));

        let started = Instant::now();
        let out = orch.synthesize(req).await?;
        // Named after the format produced, which differs after an mp3 fallback.
        let output_path = output_file(cli.output.as_deref(), out.format);
        output_bytes(&out.audio, &output_path)?;
        print_success(&format!(
            "Audio saved to: {} ({})",
            output_path,
            format_bytes(out.audio.len())
        ));

        let degraded: Vec<String> = out.degraded.iter().map(|d| d.to_string()).collect();
        let result = serde_json::json!({
            "audio_size": out.audio.len(),
            "format": out.format.as_str(),
            "content_type": out.content_type(),
            "degraded": degraded,
            "elapsed_ms": started.elapsed().as_millis() as u64,
            "output_file": output_path,
        });
        output_result(&result, None, cli.json)
    }
}

/// Synthesize speech chunk by chunk.
///
/// Each chunk is a complete audio file, written as `chunk_NNN.<format>` into
/// the output directory.
#[derive(Args)]
pub struct StreamCommand {
    #[command(flatten)]
    args: RequestArgs,
}

impl StreamCommand {
    pub async fn run(&self, cli: &Cli, config: Config) -> anyhow::Result<()> {
        let req = self.args.request(cli)?;
        let output_dir = cli
            .output
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("output directory is required for streaming, use -o flag"))?;
        std::fs::create_dir_all(output_dir)?;

        let orch = connect(cli, config).await?;
        self.args.clone_sample(cli, &orch).await?;

        let started = Instant::now();
        let mut stream = orch.synthesize_stream(req).await?;
        let mut first_chunk_ms = None;
        let mut chunks = 0usize;
        let mut total = 0usize;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if first_chunk_ms.is_none() {
                first_chunk_ms = Some(started.elapsed().as_millis() as u64);
            }

            let path = chunk_path(Path::new(output_dir), chunks, chunk.format);
            output_bytes(&chunk.audio, &path)?;
            print_verbose(
                cli,
                &format!("Chunk {}: {} -> {}", chunks, format_bytes(chunk.audio.len()), path.display()),
            );
            chunks += 1;
            total += chunk.audio.len();
        }

        print_success(&format!(
            "{} chunks saved to: {} ({})",
            chunks,
            output_dir,
            format_bytes(total)
        ));

        let result = serde_json::json!({
            "chunks": chunks,
            "audio_size": total,
            "first_chunk_ms": first_chunk_ms,
            "elapsed_ms": started.elapsed().as_millis() as u64,
            "output_dir": output_dir,
        });
        output_result(&result, None, cli.json)
    }
}

fn output_file(explicit: Option<&str>, format: ResponseFormat) -> String {
    match explicit {
        Some(path) => path.to_string(),
        None => format!("speech.{}", format),
    }
}

fn chunk_path(dir: &Path, index: usize, format: ResponseFormat) -> PathBuf {
    dir.join(format!("chunk_{:03}.{}", index, format))
}
