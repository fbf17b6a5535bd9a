use anyhow::{Context, Result, bail};
use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

use crate::config::VoiceSection;
use crate::state::ensure_nudge_home;

const SYNTHESIZERS: [&str; 3] = ["say", "espeak-ng", "espeak"];
const PLAYERS: [&str; 4] = ["afplay", "mpg123", "ffplay", "paplay"];

/// Speech output: server audio when we have it, the on-device synthesizer
/// otherwise. Each utterance runs to completion before `say` returns.
#[derive(Debug, Clone)]
pub struct Voice {
    enabled: bool,
    synth: Option<PathBuf>,
    player: Option<PathBuf>,
}

impl Voice {
    pub fn detect(cfg: &VoiceSection) -> Self {
        let synth = match &cfg.fallback_command {
            Some(cmd) => which::which(cmd).ok(),
            None => SYNTHESIZERS.iter().find_map(|c| which::which(c).ok()),
        };
        let player = PLAYERS.iter().find_map(|c| which::which(c).ok());
        tracing::debug!(?synth, ?player, "voice tools");
        Self {
            enabled: cfg.enabled,
            synth,
            player,
        }
    }

    #[cfg(test)]
    pub fn silent() -> Self {
        Self {
            enabled: false,
            synth: None,
            player: None,
        }
    }

    #[cfg(test)]
    pub fn with_synth(synth: PathBuf) -> Self {
        Self {
            enabled: true,
            synth: Some(synth),
            player: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Play synthesized audio, or fall back to speaking `text` locally.
    pub async fn say(&self, text: &str, audio: Option<&[u8]>) {
        if !self.enabled {
            return;
        }
        let res = match audio {
            Some(bytes) => match self.play(bytes).await {
                Ok(()) => Ok(()),
                Err(e) => {
                    tracing::debug!("audio playback unavailable: {e:#}");
                    self.speak_locally(text).await
                }
            },
            None => self.speak_locally(text).await,
        };
        if let Err(e) = res {
            tracing::debug!("speech skipped: {e:#}");
        }
    }

    async fn play(&self, bytes: &[u8]) -> Result<()> {
        let Some(player) = &self.player else {
            bail!("no audio player found");
        };
        // Removed when dropped, after the player has exited.
        let mut clip = tempfile::Builder::new()
            .prefix("speech-")
            .suffix(".mp3")
            .tempfile_in(ensure_nudge_home()?)
            .context("create speech clip")?;
        clip.write_all(bytes)
            .and_then(|()| clip.flush())
            .with_context(|| format!("write {}", clip.path().display()))?;

        let mut cmd = Command::new(player);
        if player.ends_with("ffplay") {
            cmd.args(["-nodisp", "-autoexit", "-loglevel", "quiet"]);
        }
        cmd.arg(clip.path());
        run_quiet(cmd).await.with_context(|| format!("running {}", player.display()))
    }

    async fn speak_locally(&self, text: &str) -> Result<()> {
        let Some(synth) = &self.synth else {
            bail!("no speech synthesizer found (tried {})", SYNTHESIZERS.join(", "));
        };
        let mut cmd = Command::new(synth);
        cmd.arg(text);
        run_quiet(cmd).await.with_context(|| format!("running {}", synth.display()))
    }
}

/// Run `cmd` with no stdio and wait for it, so the child is reaped.
async fn run_quiet(mut cmd: Command) -> Result<()> {
    let status = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .status()
        .await?;
    if !status.success() {
        bail!("exited with {status}");
    }
    Ok(())
}
