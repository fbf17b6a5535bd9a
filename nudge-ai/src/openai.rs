//! OpenAI-compatible HTTP calls: chat completions, image generations, speech.

use anyhow::{Context, Result, anyhow, bail};
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};

use crate::AiConfig;

fn endpoint(cfg: &AiConfig, path: &str) -> String {
    format!("{}/{}", cfg.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

fn api_key(cfg: &AiConfig) -> Result<&str> {
    cfg.api_key
        .as_deref()
        .ok_or_else(|| anyhow!("missing openai_api_key; run: nudge auth paste-openai-api-key"))
}

async fn check(resp: reqwest::Response, what: &str) -> Result<reqwest::Response> {
    let status = resp.status();
    if !status.is_success() {
        let txt = resp.text().await.unwrap_or_default();
        bail!("{what} error: {status} {txt}");
    }
    Ok(resp)
}

pub async fn chat_complete(http: &reqwest::Client, cfg: &AiConfig, system: &str, user: &str) -> Result<String> {
    let key = api_key(cfg)?;

    #[derive(Serialize)]
    struct Msg<'a> {
        role: &'a str,
        content: &'a str,
    }

    #[derive(Serialize)]
    struct Req<'a> {
        model: &'a str,
        messages: Vec<Msg<'a>>,
        temperature: f32,
    }

    #[derive(Deserialize)]
    struct Resp {
        choices: Vec<Choice>,
    }

    #[derive(Deserialize)]
    struct Choice {
        message: MsgOut,
    }

    #[derive(Deserialize)]
    struct MsgOut {
        content: Option<String>,
    }

    let body = Req {
        model: &cfg.model,
        messages: vec![
            Msg { role: "system", content: system },
            Msg { role: "user", content: user },
        ],
        temperature: cfg.temperature,
    };

    let resp = http
        .post(endpoint(cfg, "v1/chat/completions"))
        .header(AUTHORIZATION, format!("Bearer {key}"))
        .json(&body)
        .send()
        .await
        .context("chat request")?;
    let out: Resp = check(resp, "chat").await?.json().await.context("parse chat response")?;

    let content = out
        .choices
        .first()
        .and_then(|c| c.message.content.clone())
        .unwrap_or_default();
    Ok(content.trim().to_string())
}

/// Returns a URL, or a `data:` URI when the server answers with base64.
pub async fn generate_image(http: &reqwest::Client, cfg: &AiConfig, prompt: &str) -> Result<String> {
    let key = api_key(cfg)?;

    #[derive(Serialize)]
    struct Req<'a> {
        model: &'a str,
        prompt: &'a str,
        n: u8,
        size: &'a str,
    }

    #[derive(Deserialize)]
    struct Resp {
        data: Vec<Image>,
    }

    #[derive(Deserialize)]
    struct Image {
        url: Option<String>,
        b64_json: Option<String>,
    }

    let body = Req {
        model: &cfg.image_model,
        prompt,
        n: 1,
        size: "1024x1024",
    };

    let resp = http
        .post(endpoint(cfg, "v1/images/generations"))
        .header(AUTHORIZATION, format!("Bearer {key}"))
        .json(&body)
        .send()
        .await
        .context("image request")?;
    let out: Resp = check(resp, "image").await?.json().await.context("parse image response")?;

    let img = out.data.into_iter().next().context("image response had no data")?;
    match (img.url, img.b64_json) {
        (Some(url), _) if !url.is_empty() => Ok(url),
        (_, Some(b64)) if !b64.is_empty() => Ok(format!("data:image/png;base64,{b64}")),
        _ => bail!("image response had neither url nor b64_json"),
    }
}

pub async fn speech(http: &reqwest::Client, cfg: &AiConfig, text: &str) -> Result<Vec<u8>> {
    let key = api_key(cfg)?;

    #[derive(Serialize)]
    struct Req<'a> {
        model: &'a str,
        input: &'a str,
        voice: &'a str,
        response_format: &'a str,
    }

    let body = Req {
        model: &cfg.tts_model,
        input: text,
        voice: &cfg.voice,
        response_format: "mp3",
    };

    let resp = http
        .post(endpoint(cfg, "v1/audio/speech"))
        .header(AUTHORIZATION, format!("Bearer {key}"))
        .json(&body)
        .send()
        .await
        .context("speech request")?;
    let bytes = check(resp, "speech").await?.bytes().await.context("read speech audio")?;
    if bytes.is_empty() {
        bail!("speech response was empty");
    }
    Ok(bytes.to_vec())
}
