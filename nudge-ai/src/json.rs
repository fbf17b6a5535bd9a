//! Defensive readers for model replies.
//!
//! Models wrap JSON in markdown fences, prepend chatter, or return numbers as
//! strings. These helpers dig the payload out and coerce it, and error on
//! anything they cannot make sense of so callers fall back.

use anyhow::{Context, Result, bail};
use nudge_core::{ParsedTask, Priority, PriorityAssignment};
use serde_json::Value;

/// Slice out the first top-level JSON object or array in `text`.
pub fn extract_json(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let open = text[start..].chars().next()?;
    let close = if open == '{' { '}' } else { ']' };
    let end = text.rfind(close)?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

fn parse_value(reply: &str) -> Result<Value> {
    let json = extract_json(reply).with_context(|| format!("no JSON in reply: {reply:.80}"))?;
    serde_json::from_str(json).context("malformed JSON in reply")
}

fn as_minutes(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.round() as i64),
        _ => None,
    }
}

/// `{"title": .., "minutesFromNow": .., "timeSpecified": ..}`
pub fn parse_task_reply(raw_input: &str, reply: &str) -> Result<ParsedTask> {
    let v = parse_value(reply)?;
    let Value::Object(obj) = v else {
        bail!("expected an object");
    };

    let title = obj
        .get("title")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| raw_input.trim())
        .to_string();

    let minutes = obj
        .get("minutesFromNow")
        .or_else(|| obj.get("minutes_from_now"))
        .and_then(as_minutes);

    let time_specified = obj
        .get("timeSpecified")
        .or_else(|| obj.get("time_specified"))
        .and_then(Value::as_bool)
        .unwrap_or(minutes.is_some_and(|m| m > 0));

    let minutes_from_now = match (time_specified, minutes) {
        (true, Some(m)) if m >= 0 => m,
        (true, _) => bail!("time specified without a usable minute offset"),
        (false, _) => 0,
    };

    Ok(ParsedTask {
        title,
        minutes_from_now,
        time_specified,
    })
}

/// `["step", ..]` or `{"subtasks": ["step", ..]}`
pub fn parse_subtasks(reply: &str) -> Result<Vec<String>> {
    let v = parse_value(reply)?;
    let list = match v {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("subtasks").or_else(|| obj.remove("steps")) {
            Some(Value::Array(items)) => items,
            _ => bail!("no subtasks array"),
        },
        _ => bail!("expected an array"),
    };
    Ok(list
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect())
}

/// `[{"id": .., "category": .., "priority": "high"}, ..]`, keeping only ids
/// we asked about.
pub fn parse_priorities(reply: &str, known_ids: &[&str]) -> Result<Vec<PriorityAssignment>> {
    let v = parse_value(reply)?;
    let items = match v {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("tasks") {
            Some(Value::Array(items)) => items,
            _ => bail!("no tasks array"),
        },
        _ => bail!("expected an array"),
    };

    let mut out = Vec::new();
    for item in &items {
        let Some(id) = item.get("id").and_then(Value::as_str) else { continue };
        if !known_ids.contains(&id) {
            continue;
        }
        let category = item
            .get("category")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("General");
        let priority = item
            .get("priority")
            .and_then(Value::as_str)
            .and_then(Priority::from_label)
            .unwrap_or(Priority::Medium);
        out.push(PriorityAssignment {
            id: id.to_string(),
            category: category.to_string(),
            priority,
        });
    }
    Ok(out)
}
