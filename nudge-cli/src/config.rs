use anyhow::{Context, Result, bail};
use chrono_tz::Tz;
use nudge_ai::{AiConfig, Provider};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::auth;
use crate::state::ensure_nudge_home;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ai: AiSection,
    pub schedule: ScheduleSection,
    pub voice: VoiceSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSection {
    /// "openai" or "offline"
    pub provider: String,
    pub base_url: String,
    pub model: String,
    pub image_model: String,
    pub tts_model: String,
    pub voice: String,
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSection {
    /// IANA name used for explicit times ("2026-03-01 17:30").
    pub timezone: String,
    /// Quick picks offered by the scheduling prompt, in minutes.
    pub quick_picks: Vec<i64>,
    pub tick_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceSection {
    pub enabled: bool,
    /// Overrides the detected on-device synthesizer (say, espeak-ng, espeak).
    pub fallback_command: Option<String>,
}

impl Default for AiSection {
    fn default() -> Self {
        let d = AiConfig::default();
        Self {
            provider: "openai".to_string(),
            base_url: d.base_url,
            model: d.model,
            image_model: d.image_model,
            tts_model: d.tts_model,
            voice: d.voice,
            temperature: d.temperature,
        }
    }
}

impl Default for ScheduleSection {
    fn default() -> Self {
        Self {
            timezone: "America/Chicago".to_string(),
            quick_picks: vec![5, 15, 30, 60, 120],
            tick_ms: nudge_core::scheduler::DEFAULT_TICK.as_millis() as u64,
        }
    }
}

impl Default for VoiceSection {
    fn default() -> Self {
        Self {
            enabled: true,
            fallback_command: None,
        }
    }
}

impl Config {
    pub fn timezone(&self) -> Result<Tz> {
        self.schedule
            .timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("bad schedule.timezone {:?}: {e}", self.schedule.timezone))
    }

    /// Resolve the AI client settings, pulling the key from env or auth.json.
    /// Without a key the client runs offline.
    pub fn ai_config(&self) -> Result<AiConfig> {
        let Some(mut provider) = Provider::from_name(&self.ai.provider) else {
            bail!("unknown ai.provider {:?} (expected openai or offline)", self.ai.provider);
        };
        let api_key = auth::openai_api_key()?;
        if provider == Provider::OpenAI && api_key.is_none() {
            tracing::info!("no OpenAI key configured; AI features run offline");
            provider = Provider::Offline;
        }
        Ok(AiConfig {
            provider,
            base_url: self.ai.base_url.clone(),
            api_key,
            model: self.ai.model.clone(),
            image_model: self.ai.image_model.clone(),
            tts_model: self.ai.tts_model.clone(),
            voice: self.ai.voice.clone(),
            temperature: self.ai.temperature,
            timezone: self.timezone()?,
        })
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_nudge_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).context("parse config.toml")
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}
