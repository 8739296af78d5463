//! Audio assembly
//!
//! Merges a batch's clips into one MP3 with a fixed silence gap between
//! segments, shelling out to ffmpeg. When ffmpeg is missing or the merge
//! fails, the clips are packaged unmodified into a zip archive instead.

use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use uuid::Uuid;

use crate::batch::SynthesizedClip;
use crate::error::{Result, TtsError};

/// Silence inserted between consecutive clips. No leading or trailing gap.
const SEGMENT_GAP_MS: u64 = 300;

/// Output profile, matching what the provider emits.
const SAMPLE_RATE: &str = "44100";
const BITRATE: &str = "128k";

/// The final downloadable output of a batch.
#[derive(Debug, Clone)]
pub enum Artifact {
    /// One concatenated MP3
    Merged(PathBuf),
    /// Zip of the individual clips
    Archive(PathBuf),
}

impl Artifact {
    pub fn path(&self) -> &Path {
        match self {
            Artifact::Merged(p) | Artifact::Archive(p) => p,
        }
    }
}

pub struct AudioAssembler {
    output_root: PathBuf,
}

impl AudioAssembler {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
        }
    }

    /// Whether the concatenation facility exists on this machine.
    pub fn merge_available() -> bool {
        which::which("ffmpeg").is_ok()
    }

    /// Concatenate clips in input order with a 300 ms gap between each
    /// pair. Input order must already be script order; completion order
    /// upstream is irrelevant here.
    pub async fn merge(&self, clips: &[SynthesizedClip]) -> Result<Artifact> {
        if clips.is_empty() {
            return Err(TtsError::Merge("no clips to merge".to_string()));
        }

        std::fs::create_dir_all(&self.output_root)?;
        let workdir = tempfile::tempdir()?;

        let silence = workdir.path().join("gap.mp3");
        self.render_silence(&silence).await?;

        let list = concat_list(clips, &silence);
        let list_path = workdir.path().join("concat.txt");
        let mut file = std::fs::File::create(&list_path)?;
        file.write_all(list.as_bytes())?;

        let output_path = self
            .output_root
            .join(format!("merged_{}.mp3", Uuid::new_v4().simple()));

        let output = Command::new("ffmpeg")
            .args(["-f", "concat", "-safe", "0", "-i"])
            .arg(&list_path)
            .args(["-c:a", "libmp3lame", "-b:a", BITRATE, "-ar", SAMPLE_RATE, "-y"])
            .arg(&output_path)
            .output()
            .await
            .map_err(|e| TtsError::Merge(format!("failed to run ffmpeg: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TtsError::Merge(format!("ffmpeg failed: {}", stderr)));
        }

        log::info!(
            "merged {} clips -> {}",
            clips.len(),
            output_path.display()
        );
        Ok(Artifact::Merged(output_path))
    }

    /// Package clips unmodified into a zip, each under its basename.
    pub fn archive(&self, clips: &[SynthesizedClip]) -> Result<Artifact> {
        if clips.is_empty() {
            return Err(TtsError::Archive("no clips to archive".to_string()));
        }

        std::fs::create_dir_all(&self.output_root)?;
        let zip_path = self
            .output_root
            .join(format!("segments_{}.zip", Uuid::new_v4().simple()));

        let file = std::fs::File::create(&zip_path)?;
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();

        for clip in clips {
            let name = clip
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| format!("segment_{}.mp3", clip.ordinal));

            writer
                .start_file(name, options)
                .map_err(|e| TtsError::Archive(e.to_string()))?;
            let mut source = std::fs::File::open(&clip.path)?;
            std::io::copy(&mut source, &mut writer)?;
        }

        writer
            .finish()
            .map_err(|e| TtsError::Archive(e.to_string()))?;

        log::info!(
            "archived {} clips -> {}",
            clips.len(),
            zip_path.display()
        );
        Ok(Artifact::Archive(zip_path))
    }

    /// Merge, or fall back to an archive when merging is unavailable or
    /// fails. Only a failure of the fallback itself reaches the caller.
    pub async fn merge_or_archive(&self, clips: &[SynthesizedClip]) -> Result<Artifact> {
        if Self::merge_available() {
            match self.merge(clips).await {
                Ok(artifact) => return Ok(artifact),
                Err(e) => log::warn!("merge failed, packaging clips instead: {}", e),
            }
        } else {
            log::warn!("ffmpeg not found, packaging clips instead of merging");
        }
        self.archive(clips)
    }

    /// Render the inter-segment gap as an MP3 matching the clip profile.
    async fn render_silence(&self, path: &Path) -> Result<()> {
        let duration = format!("{}", SEGMENT_GAP_MS as f64 / 1000.0);
        let source = format!("anullsrc=r={}:cl=mono", SAMPLE_RATE);

        let output = Command::new("ffmpeg")
            .args(["-f", "lavfi", "-i", &source, "-t", &duration])
            .args(["-c:a", "libmp3lame", "-b:a", BITRATE, "-y"])
            .arg(path)
            .output()
            .await
            .map_err(|e| TtsError::Merge(format!("failed to run ffmpeg: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TtsError::Merge(format!(
                "silence generation failed: {}",
                stderr
            )));
        }
        Ok(())
    }
}

/// Build the ffmpeg concat-demuxer list: clips in input order, the silence
/// entry between consecutive clips only.
fn concat_list(clips: &[SynthesizedClip], silence: &Path) -> String {
    let mut list = String::new();
    for (i, clip) in clips.iter().enumerate() {
        if i > 0 {
            list.push_str(&concat_entry(silence));
        }
        list.push_str(&concat_entry(&clip.path));
    }
    list
}

fn concat_entry(path: &Path) -> String {
    // concat demuxer syntax: single-quoted path, embedded quotes closed,
    // escaped, reopened.
    let escaped = path.to_string_lossy().replace('\'', "'\\''");
    format!("file '{}'\n", escaped)
}
