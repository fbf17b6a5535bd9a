use std::path::{Path, PathBuf};
use std::process::Command;

/// Version suffix for `nudge --version`: the short commit, `+dirty` when the
/// worktree has local edits. Packagers building outside a checkout can pin
/// it with `NUDGE_BUILD_SHA`.
fn main() {
    println!("cargo:rerun-if-env-changed=NUDGE_BUILD_SHA");

    let sha = match std::env::var("NUDGE_BUILD_SHA") {
        Ok(pinned) if !pinned.trim().is_empty() => pinned.trim().to_string(),
        _ => from_git(),
    };
    println!("cargo:rustc-env=NUDGE_BUILD_SHA={sha}");
}

fn from_git() -> String {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let workspace = PathBuf::from(manifest_dir).join("..");

    let git_dir = workspace.join(".git");
    if git_dir.is_dir() {
        println!("cargo:rerun-if-changed={}", git_dir.join("HEAD").display());
        println!("cargo:rerun-if-changed={}", git_dir.join("index").display());
        println!("cargo:rerun-if-changed={}", git_dir.join("refs").display());
    }

    let Some(sha) = git(&workspace, &["rev-parse", "--short", "HEAD"]).filter(|s| !s.is_empty()) else {
        return "unknown".to_string();
    };
    match git(&workspace, &["status", "--porcelain", "--untracked-files=no"]) {
        Some(changes) if !changes.is_empty() => format!("{sha}+dirty"),
        _ => sha,
    }
}

fn git(repo: &Path, args: &[&str]) -> Option<String> {
    let out = Command::new("git").arg("-C").arg(repo).args(args).output().ok()?;
    if !out.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&out.stdout).trim().to_string())
}
