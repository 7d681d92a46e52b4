use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::info;

use crate::batch::SceneImageSource;
use crate::config::{AspectRatio, ContentRequest, Genre, Language, Tone, AgeGroup, TITLE_COUNT};
use crate::content::ContentDraft;
use crate::error::{Result, StudioError};
use crate::poll::OperationStatus;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

const TEXT_MODEL: &str = "gemini-3-pro-preview";
const RECOMMEND_MODEL: &str = "gemini-3-flash-preview";
const IMAGE_MODEL: &str = "gemini-2.5-flash-image";
const VIDEO_MODEL: &str = "veo-3.1-fast-generate-preview";
const TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";

const IMAGE_QUALITY_PREFIX: &str = "Cinematic YouTube masterpiece, highly detailed, 8k resolution: ";
const IMAGE_EDIT_INSTRUCTION: &str =
    "Modify this image to match the following description while keeping the same composition. Style: ";
const VIDEO_MOTION_PREFIX: &str = "Motion animate this scene: ";
const VIDEO_RESOLUTION: &str = "720p";

#[derive(Debug, Clone)]
pub struct GeminiClient {
    api_key: String,
    client: Client,
}

/// Opaque token for an in-flight video-generation job. Exchanged for status
/// on every poll tick and discarded once the job reports done.
#[derive(Debug, Clone)]
pub struct OperationHandle {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenreRecommendation {
    #[serde(rename = "genreId")]
    pub genre_id: String,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
    #[serde(default, rename = "inlineData")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    #[allow(dead_code)]
    #[serde(default, rename = "mimeType")]
    mime_type: Option<String>,
    data: String,
}

#[derive(Debug, Deserialize)]
struct OperationResponse {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<OperationError>,
    #[serde(default)]
    response: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    #[serde(default)]
    message: Option<String>,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .expect("Failed to create HTTP client");

        Self { api_key, client }
    }

    fn model_url(&self, model: &str, verb: &str) -> String {
        format!("{API_BASE}/models/{model}:{verb}")
    }

    async fn post(&self, url: &str, body: &Value) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(StudioError::Generation(format!(
                "Gemini API error (HTTP {status}): {error_text}"
            )));
        }
        Ok(response)
    }

    /// Structured text generation: script, titles, per-scene image prompts
    /// and the narration script, schema-constrained to JSON.
    pub async fn generate_content(&self, request: &ContentRequest) -> Result<ContentDraft> {
        info!(
            "Generating content plan ({} scenes, genre {})...",
            request.image_count, request.genre_name
        );

        let body = json!({
            "contents": [{ "parts": [{ "text": request.user_prompt() }] }],
            "systemInstruction": { "parts": [{ "text": request.system_instruction() }] },
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": content_response_schema(request.image_count),
            }
        });

        let url = self.model_url(TEXT_MODEL, "generateContent");
        let response: GenerateContentResponse = self.post(&url, &body).await?.json().await?;
        let text = first_text(&response).ok_or_else(|| {
            StudioError::Generation("text generation returned no usable payload".to_string())
        })?;

        parse_content_draft(&text, request.image_count)
    }

    /// Ask the provider to pick a genre for the configured tone and audience.
    pub async fn recommend_genre(
        &self,
        tone: Tone,
        age_group: AgeGroup,
        genres: &[Genre],
    ) -> Result<GenreRecommendation> {
        let genre_list: Vec<String> = genres
            .iter()
            .map(|g| format!("{} ({})", g.id, g.name))
            .collect();
        let prompt = format!(
            "Available Genres: [{}]\nTone: {}\nTarget: {}\nRecommend one genre from the list and explain why in 1 sentence.",
            genre_list.join(", "),
            tone.prompt_label(),
            age_group.prompt_label(),
        );

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "systemInstruction": {
                "parts": [{ "text": "You are a YouTube strategy expert. Respond with strictly valid JSON." }]
            },
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": {
                        "genreId": { "type": "STRING" },
                        "reason": { "type": "STRING" }
                    },
                    "required": ["genreId", "reason"]
                }
            }
        });

        let url = self.model_url(RECOMMEND_MODEL, "generateContent");
        let response: GenerateContentResponse = self.post(&url, &body).await?.json().await?;
        let text = first_text(&response).ok_or_else(|| {
            StudioError::Generation("genre recommendation returned no usable payload".to_string())
        })?;
        serde_json::from_str(strip_markdown_fences(&text))
            .map_err(|e| StudioError::Generation(format!("invalid genre recommendation: {e}")))
    }

    /// Generate one scene image. With a reference image the request becomes
    /// an edit that keeps the reference composition; without one the prompt
    /// gets the quality-boosting prefix.
    pub async fn generate_image(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
        reference: Option<&[u8]>,
    ) -> Result<Vec<u8>> {
        info!("Generating image for prompt: {}", prompt);

        let mut parts = Vec::new();
        if let Some(bytes) = reference {
            parts.push(json!({
                "inlineData": { "mimeType": "image/png", "data": BASE64.encode(bytes) }
            }));
            parts.push(json!({ "text": format!("{IMAGE_EDIT_INSTRUCTION}{prompt}") }));
        } else {
            parts.push(json!({ "text": format!("{IMAGE_QUALITY_PREFIX}{prompt}") }));
        }

        let body = json!({
            "contents": [{ "parts": parts }],
            "generationConfig": {
                "imageConfig": { "aspectRatio": aspect_ratio.as_str() }
            }
        });

        let url = self.model_url(IMAGE_MODEL, "generateContent");
        let response: GenerateContentResponse = self.post(&url, &body).await?.json().await?;
        let payload = first_inline_payload(&response).ok_or_else(|| {
            StudioError::Generation("image generation returned no image payload".to_string())
        })?;
        Ok(BASE64.decode(payload)?)
    }

    /// Submit a long-running video-generation job conditioned on a scene
    /// image. The returned handle must be polled until done.
    pub async fn submit_video(
        &self,
        image: &[u8],
        prompt: &str,
        aspect_ratio: AspectRatio,
    ) -> Result<OperationHandle> {
        info!("Submitting video generation job...");

        let body = json!({
            "instances": [{
                "prompt": format!("{VIDEO_MOTION_PREFIX}{prompt}"),
                "image": {
                    "bytesBase64Encoded": BASE64.encode(image),
                    "mimeType": "image/png"
                }
            }],
            "parameters": {
                "aspectRatio": aspect_ratio.as_str(),
                "resolution": VIDEO_RESOLUTION,
                "sampleCount": 1
            }
        });

        let url = self.model_url(VIDEO_MODEL, "predictLongRunning");
        let response: OperationResponse = self.post(&url, &body).await?.json().await?;
        let name = response.name.ok_or_else(|| {
            StudioError::Generation("video submission returned no operation name".to_string())
        })?;
        info!("Video generation job submitted: {}", name);
        Ok(OperationHandle { name })
    }

    /// Exchange a handle for the job's current status.
    pub async fn poll_video(&self, handle: &OperationHandle) -> Result<OperationStatus> {
        let url = format!("{API_BASE}/{}", handle.name);
        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(StudioError::Generation(format!(
                "operation status check failed (HTTP {status}): {error_text}"
            )));
        }

        let operation: OperationResponse = response.json().await?;
        Ok(operation_status(operation))
    }

    /// Fetch the bytes behind a completed job's video URI. The URI requires
    /// the API key appended as a query parameter. Failures here are download
    /// failures, not generation failures.
    pub async fn download_video(&self, uri: &str) -> Result<Vec<u8>> {
        info!("Downloading video from: {}", uri);

        let separator = if uri.contains('?') { '&' } else { '?' };
        let url = format!("{uri}{separator}key={}", self.api_key);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| StudioError::Download(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StudioError::Download(format!(
                "HTTP {} fetching video bytes",
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| StudioError::Download(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    /// Speech synthesis for the narration script. Returns the base64 raw PCM
    /// payload exactly as the provider sent it (16-bit mono, 24 kHz).
    pub async fn generate_speech(&self, text: &str, language: Language) -> Result<String> {
        info!("Synthesizing narration ({} chars)...", text.len());

        let body = json!({
            "contents": [{ "parts": [{ "text": format!("Read this script naturally: {text}") }] }],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": language.voice_name() }
                    }
                }
            }
        });

        let url = self.model_url(TTS_MODEL, "generateContent");
        let response: GenerateContentResponse = self.post(&url, &body).await?.json().await?;
        let payload = first_inline_payload(&response).ok_or_else(|| {
            StudioError::Generation("speech synthesis returned no audio payload".to_string())
        })?;
        Ok(payload.to_string())
    }
}

/// Batch-orchestrator adapter: every scene in one sweep shares the aspect
/// ratio and the optional global reference image.
pub struct GeminiSceneSource<'a> {
    pub client: &'a GeminiClient,
    pub aspect_ratio: AspectRatio,
    pub reference: Option<&'a [u8]>,
}

#[async_trait]
impl SceneImageSource for GeminiSceneSource<'_> {
    async fn generate(&self, _scene: usize, prompt: &str) -> Result<Vec<u8>> {
        self.client
            .generate_image(prompt, self.aspect_ratio, self.reference)
            .await
    }
}

fn content_response_schema(image_count: usize) -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "script": { "type": "STRING", "description": "full video script" },
            "titles": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "minItems": TITLE_COUNT,
                "maxItems": TITLE_COUNT,
                "description": "click-worthy title suggestions"
            },
            "imagePrompts": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "minItems": image_count,
                "maxItems": image_count,
                "description": "per-scene image generation prompts (English)"
            },
            "ttsScript": { "type": "STRING", "description": "narration script" }
        },
        "required": ["script", "titles", "imagePrompts", "ttsScript"]
    })
}

fn first_text(response: &GenerateContentResponse) -> Option<String> {
    let content = response.candidates.first()?.content.as_ref()?;
    let text: String = content
        .parts
        .iter()
        .filter_map(|p| p.text.as_deref())
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn first_inline_payload(response: &GenerateContentResponse) -> Option<&str> {
    response
        .candidates
        .first()?
        .content
        .as_ref()?
        .parts
        .iter()
        .find_map(|p| p.inline_data.as_ref().map(|d| d.data.as_str()))
}

/// Models sometimes wrap the JSON payload in a markdown code fence despite
/// the response mime type.
fn strip_markdown_fences(text: &str) -> &str {
    text.trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Validate a text-generation payload against the required shape. Any
/// missing field or count mismatch means no project gets created.
fn parse_content_draft(text: &str, expected_prompts: usize) -> Result<ContentDraft> {
    let draft: ContentDraft = serde_json::from_str(strip_markdown_fences(text))
        .map_err(|e| StudioError::Generation(format!("content payload failed validation: {e}")))?;

    if draft.script.trim().is_empty() {
        return Err(StudioError::Generation("content payload has an empty script".to_string()));
    }
    if draft.titles.len() != TITLE_COUNT {
        return Err(StudioError::Generation(format!(
            "expected {TITLE_COUNT} titles, got {}",
            draft.titles.len()
        )));
    }
    if draft.image_prompts.len() != expected_prompts {
        return Err(StudioError::Generation(format!(
            "expected {expected_prompts} image prompts, got {}",
            draft.image_prompts.len()
        )));
    }
    if draft.tts_script.trim().is_empty() {
        return Err(StudioError::Generation("content payload has an empty TTS script".to_string()));
    }
    Ok(draft)
}

fn operation_status(operation: OperationResponse) -> OperationStatus {
    if let Some(error) = operation.error {
        return OperationStatus::Failed(
            error.message.unwrap_or_else(|| "video generation job errored".to_string()),
        );
    }
    if !operation.done {
        return OperationStatus::Running;
    }
    let uri = operation
        .response
        .as_ref()
        .and_then(|r| r.pointer("/generateVideoResponse/generatedSamples/0/video/uri"))
        .and_then(Value::as_str);
    match uri {
        Some(uri) => OperationStatus::Succeeded(uri.to_string()),
        None => OperationStatus::Failed("no video link in completed operation".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_DRAFT: &str = r#"{
        "script": "Intro. Body. Outro.",
        "titles": ["a", "b", "c", "d", "e"],
        "imagePrompts": ["scene one", "scene two", "scene three", "scene four"],
        "ttsScript": "Hello and welcome."
    }"#;

    #[test]
    fn parses_a_valid_draft() {
        let draft = parse_content_draft(VALID_DRAFT, 4).unwrap();
        assert_eq!(draft.titles.len(), 5);
        assert_eq!(draft.image_prompts[1], "scene two");
    }

    #[test]
    fn strips_markdown_fences_before_parsing() {
        let fenced = format!("```json\n{VALID_DRAFT}\n```");
        assert!(parse_content_draft(&fenced, 4).is_ok());
    }

    #[test]
    fn missing_field_is_a_generation_failure() {
        let payload = r#"{"script": "s", "titles": ["a","b","c","d","e"], "imagePrompts": ["x","y"]}"#;
        let err = parse_content_draft(payload, 2).unwrap_err();
        assert!(matches!(err, StudioError::Generation(_)));
    }

    #[test]
    fn wrong_title_count_is_rejected() {
        let payload = r#"{
            "script": "s",
            "titles": ["a", "b"],
            "imagePrompts": ["x", "y"],
            "ttsScript": "t"
        }"#;
        let err = parse_content_draft(payload, 2).unwrap_err();
        assert!(matches!(err, StudioError::Generation(_)));
    }

    #[test]
    fn prompt_count_mismatch_is_rejected() {
        let err = parse_content_draft(VALID_DRAFT, 6).unwrap_err();
        assert!(matches!(err, StudioError::Generation(_)));
    }

    #[test]
    fn finds_the_first_inline_payload_across_parts() {
        let raw = r#"{
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "here is your image" },
                        { "inlineData": { "mimeType": "image/png", "data": "QUJD" } }
                    ]
                }
            }]
        }"#;
        let response: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(first_inline_payload(&response), Some("QUJD"));
    }

    #[test]
    fn no_candidates_means_no_payload() {
        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(first_text(&response).is_none());
        assert!(first_inline_payload(&response).is_none());
    }

    #[test]
    fn running_operation_maps_to_running() {
        let op: OperationResponse =
            serde_json::from_str(r#"{"name": "operations/abc", "done": false}"#).unwrap();
        assert!(matches!(operation_status(op), OperationStatus::Running));
    }

    #[test]
    fn errored_operation_maps_to_failed() {
        let op: OperationResponse = serde_json::from_str(
            r#"{"name": "operations/abc", "done": true, "error": {"message": "quota"}}"#,
        )
        .unwrap();
        match operation_status(op) {
            OperationStatus::Failed(msg) => assert_eq!(msg, "quota"),
            other => panic!("unexpected status: {other:?}"),
        }
    }

    #[test]
    fn completed_operation_yields_the_video_uri() {
        let op: OperationResponse = serde_json::from_str(
            r#"{
                "name": "operations/abc",
                "done": true,
                "response": {
                    "generateVideoResponse": {
                        "generatedSamples": [{ "video": { "uri": "https://dl/video.mp4" } }]
                    }
                }
            }"#,
        )
        .unwrap();
        match operation_status(op) {
            OperationStatus::Succeeded(uri) => assert_eq!(uri, "https://dl/video.mp4"),
            other => panic!("unexpected status: {other:?}"),
        }
    }

    #[test]
    fn completed_operation_without_a_link_fails() {
        let op: OperationResponse =
            serde_json::from_str(r#"{"name": "operations/abc", "done": true, "response": {}}"#)
                .unwrap();
        assert!(matches!(operation_status(op), OperationStatus::Failed(_)));
    }
}
