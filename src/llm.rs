use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

pub trait LanguageModel {
    fn generate(&self, prompt: &str) -> Result<String>;
}

const PROMPT_HEADER: &str = r#"Analyze the following text extracted from an Advisory Agreement and extract the specific data points.
Return ONLY a raw JSON object. No markdown.

CRITICAL INSTRUCTIONS:
1. **Fee:** Look at the "Annualized Investment Advisory Fee" table. IF EMPTY, look immediately below at "Other Arrangements" or "Flat Fee". (Target value in text is often like 'Flat 1%' or similar).
2. **Client Name:** Distinguish between the "Entity/Trust Name" (often Top line) and the "Signer Name" (often Bottom line).
3. **Date:** Use the "Effective Date" found on Page 1.

Data Points to Extract:

1. "Client Entity Name" -> The legal name of the trust or entity (e.g., "Ted Smith Trust").
2. "Authorized Signer" -> The name of the person signing (e.g., "Joshua Bajorek").
3. "Rep Code" -> Look for a Rep Code (e.g., "TSM") usually on Page 1 or with the rep signature.
4. "Effective Date" -> The date the agreement is effective (MM/DD/YYYY).
5. "Account Type" -> Combine Discretionary/Non-Discretionary AND Wrap/Non-Wrap status (e.g., "Discretionary Wrap").
6. "Fee Structure" -> The fee percentage or arrangement (e.g., "Flat 1%", "Tiered", "1.00%"). PRIORITIZE "Other Arrangements" if standard table is empty.
7. "Account Number" -> Look for "Account Number" in registration tables.
8. "ADV Received Date" -> Look for "date received ADV".
9. "Client Signed P11" -> "Yes" if signature/date present on Agreement page (approx Page 11), else "No".
10. "Client Dated P11" -> The actual date the client wrote on Page 11 (MM/DD/YYYY format), or "Not Found" if no date.
11. "Client Signed P14" -> "Yes" if signature/date present on Fee page (approx Page 13-14), else "No".
12. "Client Dated P14" -> The actual date the client wrote on Page 14 (MM/DD/YYYY format), or "Not Found" if no date.

If a value is absolutely not found, return "Not Found".

Extracted Document Text:
"#;

/// Reply key that carries the fee arrangement.
pub const FEE_STRUCTURE_KEY: &str = "Fee Structure";

pub fn build_prompt(document_text: &str) -> String {
    format!("{PROMPT_HEADER}{document_text}\n")
}

/// Removes a markdown code fence the model sometimes wraps its JSON in.
pub fn strip_code_fence(reply: &str) -> &str {
    let mut text = reply.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text
}

pub fn parse_reply(reply: &str) -> Result<Map<String, Value>> {
    let body = strip_code_fence(reply);
    let value: Value =
        serde_json::from_str(body).context("model reply is not valid JSON")?;
    match value {
        Value::Object(map) => Ok(map),
        _ => bail!("model reply is JSON but not an object"),
    }
}

pub fn summarize(model: &dyn LanguageModel, document_text: &str) -> Result<Map<String, Value>> {
    let prompt = build_prompt(document_text);
    debug!(prompt_chars = prompt.len(), "submitting extraction prompt");
    let reply = model.generate(&prompt)?;
    parse_reply(&reply)
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

pub struct GeminiClient {
    client: Client,
    api_base: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: &str, api_base: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            model: model.trim_start_matches("models/").to_string(),
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }
}

impl LanguageModel for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        info!(model = %self.model, "calling generative model");
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .with_context(|| format!("request to model {} failed", self.model))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            bail!("model {} returned {}: {}", self.model, status, body.trim());
        }

        let parsed: GenerateResponse = response
            .json()
            .context("failed to decode model response envelope")?;
        extract_reply_text(parsed)
    }
}

fn extract_reply_text(response: GenerateResponse) -> Result<String> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .context("model response has no candidates")?;

    let text: String = candidate
        .content
        .map(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|part| part.text)
        .collect();

    if text.trim().is_empty() {
        bail!("model response has no text");
    }
    Ok(text)
}
