//! No-network provider: a small phrase heuristic for parsing, fallbacks for
//! everything else.

use anyhow::{Context, Result};
use nudge_core::ParsedTask;
use regex::Regex;

/// Pull "in N minutes" / "in N hours" / "in half an hour" out of `raw`.
pub fn parse(raw: &str) -> Result<ParsedTask> {
    let re = Regex::new(
        r"(?i)\s*\bin\s+(?:(\d+)\s*(m|min|mins|minutes?|h|hr|hrs|hours?)|(half\s+an\s+hour|an\s+hour))\b",
    )?;

    let Some(caps) = re.captures(raw) else {
        return Ok(ParsedTask::fallback(raw));
    };

    let minutes = if let Some(n) = caps.get(1) {
        let n: i64 = n.as_str().parse().with_context(|| format!("duration {:?}", n.as_str()))?;
        let unit = caps.get(2).map(|m| m.as_str().to_lowercase()).unwrap_or_default();
        if unit.starts_with('h') {
            n.checked_mul(60).with_context(|| format!("{n} hours is out of range"))?
        } else {
            n
        }
    } else {
        let phrase = caps.get(3).map(|m| m.as_str().to_lowercase()).unwrap_or_default();
        if phrase.starts_with("half") { 30 } else { 60 }
    };

    let whole = caps.get(0).map(|m| m.range()).unwrap_or(0..0);
    let mut title = String::with_capacity(raw.len());
    title.push_str(&raw[..whole.start]);
    title.push(' ');
    title.push_str(&raw[whole.end..]);
    let title = title.split_whitespace().collect::<Vec<_>>().join(" ");

    Ok(ParsedTask {
        title: if title.is_empty() { raw.trim().to_string() } else { title },
        minutes_from_now: minutes,
        time_specified: true,
    })
}
