use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use semver::Version;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tokio::sync::OnceCell;

use super::AudioExtractor;
use crate::errors::{AppError, AppResult};

static FFMPEG_VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"ffmpeg version n?(\d+)\.(\d+)(?:\.(\d+))?").expect("valid regex"));

const MIN_FFMPEG_VERSION: Version = Version::new(4, 0, 0);

/// Extracts 16 kHz mono PCM audio with the `ffmpeg` binary
pub struct FfmpegExtractor {
    explicit_path: Option<PathBuf>,
    resolved: OnceCell<PathBuf>,
}

impl FfmpegExtractor {
    /// Locate `ffmpeg` in PATH on first use
    pub fn new() -> Self {
        Self {
            explicit_path: None,
            resolved: OnceCell::new(),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            explicit_path: Some(path.into()),
            resolved: OnceCell::new(),
        }
    }

    async fn ffmpeg_path(&self) -> Result<&PathBuf> {
        self.resolved
            .get_or_try_init(|| async {
                let explicit = self.explicit_path.clone();
                // PATH lookup and `ffmpeg -version` block
                tokio::task::spawn_blocking(move || locate_ffmpeg(explicit))
                    .await
                    .context("ffmpeg lookup task failed")?
            })
            .await
    }
}

fn locate_ffmpeg(explicit: Option<PathBuf>) -> Result<PathBuf> {
    let path = match explicit {
        Some(path) => path,
        None => which::which("ffmpeg").context("ffmpeg not found in PATH")?,
    };
    let version = check_ffmpeg_version(&path)?;
    if version < MIN_FFMPEG_VERSION {
        return Err(anyhow!(
            "ffmpeg {} at {} is older than the required {}",
            version,
            path.display(),
            MIN_FFMPEG_VERSION
        ));
    }
    info!("Using ffmpeg {} at {}", version, path.display());
    Ok(path)
}

impl Default for FfmpegExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioExtractor for FfmpegExtractor {
    async fn extract(&self, video_path: &Path, audio_path: &Path) -> AppResult<()> {
        let ffmpeg = self
            .ffmpeg_path()
            .await
            .map_err(|e| AppError::upstream("Audio extraction unavailable", e))?;

        debug!(
            "Extracting audio from {} to {}",
            video_path.display(),
            audio_path.display()
        );

        let output = Command::new(ffmpeg)
            .arg("-y")
            .arg("-i")
            .arg(video_path)
            .args(["-vn", "-acodec", "pcm_s16le", "-ar", "16000", "-ac", "1"])
            .arg(audio_path)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: Vec<&str> = stderr.lines().rev().take(5).collect();
            return Err(AppError::upstream(
                format!("Failed to extract audio from {}", video_path.display()),
                anyhow!(
                    "ffmpeg exited with {}: {}",
                    output.status,
                    tail.into_iter().rev().collect::<Vec<_>>().join(" | ")
                ),
            ));
        }

        Ok(())
    }
}

/// Check ffmpeg version
fn check_ffmpeg_version(path: &Path) -> Result<Version> {
    let output = std::process::Command::new(path)
        .args(["-version"])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .context("Failed to execute ffmpeg")?;

    if !output.status.success() {
        return Err(anyhow!("Failed to get ffmpeg version"));
    }

    let version_str = String::from_utf8_lossy(&output.stdout);
    Ok(parse_ffmpeg_version(&version_str).unwrap_or_else(|| {
        // nightly builds report a git hash instead of a version
        debug!("Could not parse ffmpeg version, assuming {}", MIN_FFMPEG_VERSION);
        MIN_FFMPEG_VERSION
    }))
}

pub fn parse_ffmpeg_version(output: &str) -> Option<Version> {
    let caps = FFMPEG_VERSION_RE.captures(output)?;
    let part = |i: usize| {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };
    Some(Version::new(part(1), part(2), part(3)))
}
