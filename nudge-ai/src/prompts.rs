//! System prompts for the chat-completion operations.

use nudge_core::TaskSummary;

pub const PARSE_SYSTEM: &str = "You turn a short to-do note into a task. \
Reply with JSON only: {\"title\": string, \"minutesFromNow\": integer, \"timeSpecified\": boolean}. \
The title is a short imperative phrase with any timing words removed. \
Set timeSpecified to true only when the note says when to do it, and give minutesFromNow \
relative to the current time. Otherwise timeSpecified is false and minutesFromNow is 0.";

pub const DECOMPOSE_SYSTEM: &str = "You help someone who is stuck get started. \
Split the task into 3 to 5 tiny, concrete first steps, each doable in a few minutes. \
Reply with a JSON array of strings only.";

pub const PRIORITIZE_SYSTEM: &str = "You sort a to-do list. For every task give a one or two word \
category and a priority of high, medium or low. \
Reply with a JSON array only: [{\"id\": string, \"category\": string, \"priority\": string}]. \
Use the ids exactly as given.";

pub fn parse_user(raw: &str, local_now: &str) -> String {
    format!("Current local time: {local_now}\nNote: {raw}")
}

pub fn decompose_user(title: &str) -> String {
    format!("Task: {title}")
}

pub fn prioritize_user(tasks: &[TaskSummary]) -> String {
    let mut s = String::from("Tasks:\n");
    for t in tasks {
        s.push_str(&format!("- id={} title={}\n", t.id, t.title));
    }
    s
}

pub fn image_prompt(title: &str) -> String {
    format!(
        "A friendly cartoon mascot cheerfully doing this task: {title}. \
         Flat colors, simple shapes, white background, no text."
    )
}
