// voicecast - Compose multi-speaker scripts and synthesize them to audio

mod script_file;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use script_file::ScriptFile;
use tts_pipeline::{Assembly, CloneOutcome, Pipeline, Session, VoicecastConfig};

#[derive(Parser, Debug)]
#[command(name = "voicecast")]
#[command(about = "Compose multi-speaker scripts and synthesize them to audio", long_about = None)]
#[command(version)]
struct Args {
    /// User the quota counters are kept under (default: from config)
    #[arg(short, long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Synthesize every segment of a script file
    Generate {
        /// Path to the script TOML file
        script: PathBuf,

        /// Merge the clips into one file (falls back to a zip on failure)
        #[arg(long, conflicts_with = "zip")]
        merge: bool,

        /// Package the clips into a zip without merging
        #[arg(long)]
        zip: bool,
    },
    /// List the voices available from the provider
    Voices {
        /// Only show voices you cloned
        #[arg(long)]
        mine: bool,
    },
    /// Create an instant voice clone from an audio sample
    Clone {
        /// Path to the sample audio file (MP3/WAV)
        sample: PathBuf,

        /// Name for the new voice
        #[arg(short, long, default_value = "")]
        name: String,
    },
    /// Delete a cloned voice
    DeleteVoice {
        /// Provider voice identifier
        voice_id: String,
    },
    /// Show past generations, newest first
    History,
    /// Show quota usage
    Usage,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set the provider model
    SetModel {
        /// Model identifier
        model: String,
    },
    /// Set the output directory for clips and artifacts
    SetOutputDir {
        /// Directory path
        dir: PathBuf,
    },
    /// Set the default user
    SetUser {
        /// User identifier
        user: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    // Handle config subcommands before touching the provider
    if let Commands::Config { action } = &args.command {
        return handle_config_command(action);
    }

    let config = VoicecastConfig::load().context("Failed to load configuration")?;
    let pipeline = config.build_pipeline()?;
    let user = args.user.clone().unwrap_or_else(|| config.user_id.clone());
    let mut session = Session::new(user);

    match args.command {
        Commands::Generate { script, merge, zip } => {
            let assembly = if merge {
                Assembly::Merge
            } else if zip {
                Assembly::Zip
            } else {
                Assembly::Individual
            };
            generate(&pipeline, &mut session, &script, assembly).await
        }
        Commands::Voices { mine } => {
            if mine {
                list_my_voices(&pipeline, &session).await
            } else {
                list_voices(&pipeline, &mut session).await
            }
        }
        Commands::Clone { sample, name } => clone_voice(&pipeline, &mut session, &sample, &name).await,
        Commands::DeleteVoice { voice_id } => {
            pipeline.delete_voice(&mut session, &voice_id).await?;
            println!("Deleted voice {}", voice_id);
            Ok(())
        }
        Commands::History => history(&pipeline, &session).await,
        Commands::Usage => usage(&pipeline, &session).await,
        Commands::Config { .. } => unreachable!("handled above"),
    }
}

async fn generate(
    pipeline: &Pipeline,
    session: &mut Session,
    script_path: &PathBuf,
    assembly: Assembly,
) -> Result<()> {
    if !script_path.exists() {
        anyhow::bail!("Script file not found: {}", script_path.display());
    }

    let file = ScriptFile::load(script_path)?;
    if file.segments.is_empty() {
        anyhow::bail!("Script has no segments");
    }

    if file.needs_catalog() {
        pipeline
            .refresh_voices(session)
            .await
            .context("Failed to fetch the voice catalog")?;
    }
    let script = file.into_script(session)?;
    session.script = script;

    eprintln!(
        "Generating {} segment(s) via {}...",
        session.script.len(),
        pipeline.provider_name()
    );

    let report = pipeline.generate(session, assembly).await?;

    for error in &report.outcome.errors {
        eprintln!("warning: {}", error);
    }

    if report.outcome.clips.is_empty() {
        anyhow::bail!("All segments failed; nothing was generated");
    }

    eprintln!("Generated {} clip(s):", report.outcome.clips.len());
    for clip in &report.outcome.clips {
        eprintln!(
            "  [{}] {} ({} bytes)",
            clip.ordinal,
            clip.path.display(),
            clip.byte_len
        );
    }

    if let Some(artifact) = &report.artifact {
        println!("{}", artifact.path().display());
    }

    Ok(())
}

async fn list_voices(pipeline: &Pipeline, session: &mut Session) -> Result<()> {
    pipeline
        .refresh_voices(session)
        .await
        .context("Failed to fetch the voice catalog")?;

    println!("Available voices ({}):", session.voices().len());
    println!();
    for voice in session.voices() {
        println!("  {}  {}", voice.id, voice.name);
    }
    Ok(())
}

async fn list_my_voices(pipeline: &Pipeline, session: &Session) -> Result<()> {
    let records = pipeline.user_voices(session).await?;

    if records.is_empty() {
        println!("No cloned voices yet. Use `voicecast clone` to create one.");
        return Ok(());
    }

    for record in records {
        println!(
            "  {}  {}  (created {})",
            record.voice_id,
            record.voice_name,
            record.created_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

async fn clone_voice(
    pipeline: &Pipeline,
    session: &mut Session,
    sample: &PathBuf,
    name: &str,
) -> Result<()> {
    if !sample.exists() {
        anyhow::bail!("Sample file not found: {}", sample.display());
    }

    eprintln!("Creating cloned voice...");
    match pipeline.clone_voice(session, sample, name).await {
        CloneOutcome::Created { voice_id } => {
            println!("Voice created: {}", voice_id);
            Ok(())
        }
        CloneOutcome::Denied(reason) => {
            anyhow::bail!("Voice quota: {}. Delete your existing voice first.", reason)
        }
        CloneOutcome::Failed { reason } => anyhow::bail!("Clone failed: {}", reason),
    }
}

async fn history(pipeline: &Pipeline, session: &Session) -> Result<()> {
    let records = pipeline.history(session).await?;

    if records.is_empty() {
        println!("No generations yet.");
        return Ok(());
    }

    for record in records {
        let preview: String = record.text.chars().take(60).collect();
        println!(
            "  {}  [{}]  {}",
            record.created_at.format("%Y-%m-%d %H:%M"),
            record.voice_label,
            preview
        );
    }
    Ok(())
}

async fn usage(pipeline: &Pipeline, session: &Session) -> Result<()> {
    let usage = pipeline.usage(session).await?;

    println!(
        "Voices:      {} / {}  ({} remaining)",
        usage.voices_used,
        usage.limits.max_voices,
        usage.voices_remaining()
    );
    println!(
        "Generations: {} / {}  ({} remaining)",
        usage.generations_used,
        usage.limits.max_generations,
        usage.generations_remaining()
    );
    Ok(())
}

fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = VoicecastConfig::load()?;
            println!("Configuration file: {:?}", VoicecastConfig::config_path()?);
            println!();
            println!("user_id = \"{}\"", config.user_id);
            println!("model_id = \"{}\"", config.model_id);
            println!("api_key_env = \"{}\"", config.api_key_env);
            println!("output_dir = \"{}\"", config.output_dir.display());
            println!("samples_dir = \"{}\"", config.samples_dir.display());
            println!("max_voices = {}", config.max_voices);
            println!("max_generations = {}", config.max_generations);
            match &config.store_url {
                Some(url) => println!("store_url = \"{}\"", url),
                None => println!("store_url = (in-process store)"),
            }
        }
        ConfigAction::SetModel { model } => {
            let mut config = VoicecastConfig::load()?;
            config.model_id = model.clone();
            config.save()?;
            println!("Default model set to: {}", model);
        }
        ConfigAction::SetOutputDir { dir } => {
            let mut config = VoicecastConfig::load()?;
            config.output_dir = dir.clone();
            config.save()?;
            println!("Output directory set to: {}", dir.display());
        }
        ConfigAction::SetUser { user } => {
            let mut config = VoicecastConfig::load()?;
            config.user_id = user.clone();
            config.save()?;
            println!("Default user set to: {}", user);
        }
    }
    Ok(())
}
