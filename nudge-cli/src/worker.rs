use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use nudge_ai::AiClient;
use nudge_core::{Effect, Enrichment, Event, Session, SnapshotStore};
use tokio::sync::mpsc;

use crate::voice::Voice;

/// Run one effect against the AI client. `None` for effects that do not
/// produce an enrichment (speech, celebration).
pub async fn resolve(ai: &AiClient, voice: &Voice, effect: Effect) -> Option<Enrichment> {
    match effect {
        Effect::Parse { task_id, text } => {
            let parsed = ai.parse(&text, Utc::now()).await;
            Some(Enrichment::Parsed { task_id, parsed })
        }
        Effect::GenerateImage { task_id, title } => {
            let image_url = ai.generate_image(&title).await;
            Some(Enrichment::Image { task_id, image_url })
        }
        Effect::Decompose { task_id, title } => {
            let subtasks = ai.decompose(&title).await;
            Some(Enrichment::Decomposed { task_id, subtasks })
        }
        Effect::Prioritize { tasks } => {
            let assignments = ai.prioritize(&tasks).await;
            Some(Enrichment::Prioritized { assignments })
        }
        Effect::Speak(text) => {
            speak(ai, voice, &text).await;
            None
        }
        Effect::Celebrate(_) => None,
    }
}

async fn speak(ai: &AiClient, voice: &Voice, text: &str) {
    if voice.is_enabled() {
        let audio = ai.speak(text).await;
        voice.say(text, audio.as_deref()).await;
    }
}

/// Background enrichment for the interactive loop: effects in over a tokio
/// channel, completions back out as events. Requests run concurrently and
/// are never cancelled; the core ignores results for tasks that are gone.
/// Speech is the exception: utterances play one at a time, in order.
pub async fn run_worker(
    ai: AiClient,
    voice: Voice,
    mut rx: mpsc::UnboundedReceiver<Effect>,
    tx: std::sync::mpsc::Sender<Event>,
) {
    let ai = Arc::new(ai);
    let voice = Arc::new(voice);

    let (speech_tx, mut speech_rx) = mpsc::unbounded_channel::<String>();
    let speaker = {
        let ai = Arc::clone(&ai);
        let voice = Arc::clone(&voice);
        tokio::spawn(async move {
            while let Some(text) = speech_rx.recv().await {
                speak(&ai, &voice, &text).await;
            }
        })
    };

    while let Some(effect) = rx.recv().await {
        if let Effect::Speak(text) = effect {
            let _ = speech_tx.send(text);
            continue;
        }
        let ai = Arc::clone(&ai);
        let voice = Arc::clone(&voice);
        let tx = tx.clone();
        tokio::spawn(async move {
            if let Some(done) = resolve(&ai, &voice, effect).await {
                let _ = tx.send(Event::Enriched(done));
            }
        });
    }

    drop(speech_tx);
    if let Err(e) = speaker.await {
        tracing::warn!("speech queue stopped: {e}");
    }
}

/// Drive effects to completion inline, for one-shot commands.
pub async fn settle<S: SnapshotStore>(
    session: &mut Session<S>,
    ai: &AiClient,
    voice: &Voice,
    effects: Vec<Effect>,
) -> Result<()> {
    let mut queue: VecDeque<Effect> = effects.into();
    while let Some(effect) = queue.pop_front() {
        if let Effect::Celebrate(reward) = &effect {
            println!(
                "+{} xp  level {}  streak {}{}",
                reward.xp_gained,
                reward.level,
                reward.streak,
                if reward.leveled_up { "  LEVEL UP!" } else { "" }
            );
        }
        if let Some(done) = resolve(ai, voice, effect).await {
            let more = session.dispatch(Event::Enriched(done), Utc::now())?;
            queue.extend(more);
        }
    }
    Ok(())
}
