use anyhow::{Context, Result};
use nudge_core::SnapshotStore;
use std::fs;
use std::path::PathBuf;

/// `$NUDGE_HOME`, else `~/.nudge`.
pub fn nudge_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("NUDGE_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".nudge"))
}

pub fn ensure_nudge_home() -> Result<PathBuf> {
    let dir = nudge_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn log_path() -> Result<PathBuf> {
    Ok(ensure_nudge_home()?.join("nudge.log"))
}

/// One JSON file per snapshot key under `<home>/state/`.
#[derive(Debug, Clone)]
pub struct FileSnapshots {
    dir: PathBuf,
}

impl FileSnapshots {
    pub fn open_default() -> Result<Self> {
        Self::open(ensure_nudge_home()?.join("state"))
    }

    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SnapshotStore for FileSnapshots {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let p = self.path(key);
        if !p.exists() {
            return Ok(None);
        }
        let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
        Ok(Some(s))
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        let p = self.path(key);
        // replace atomically
        let tmp = p.with_extension("json.tmp");
        fs::write(&tmp, value).with_context(|| format!("write {}", tmp.display()))?;
        fs::rename(&tmp, &p).with_context(|| format!("replace {}", p.display()))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let p = self.path(key);
        match fs::remove_file(&p) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove {}", p.display())),
        }
    }
}
