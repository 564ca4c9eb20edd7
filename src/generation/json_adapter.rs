/*!
 * JSON payload adaptation.
 *
 * This module validates a provider's chaptered JSON payload against the
 * documented schema and flattens it into a script. Unlike the Markdown
 * parser, validation here is strict and fails fast: a missing field is a
 * `ScriptError::Schema` naming the offending chapter or scene, which the
 * assembler turns into a per-batch Markdown fallback.
 */

use serde_json::Value;

use crate::errors::ScriptError;
use crate::script::{CodeHighlight, Scene, Script};

/// Placeholder path used when a chapter lists no files at all
const UNKNOWN_FILE: &str = "unknown";

/// Strict adapter from a decoded JSON payload to a `Script`
pub struct JsonScriptAdapter;

impl JsonScriptAdapter {
    /// Validate `payload` against the chapters schema and flatten it
    ///
    /// Chapters are flattened in input order. No chapter-marker scenes are
    /// synthesized here; that is the assembler's job.
    pub fn adapt(payload: &Value) -> Result<Script, ScriptError> {
        let chapters = payload
            .get("chapters")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                ScriptError::Schema("payload is missing a 'chapters' array".to_string())
            })?;

        let mut scenes = Vec::new();
        for (chapter_index, chapter) in chapters.iter().enumerate() {
            scenes.extend(Self::adapt_chapter(chapter_index, chapter)?);
        }

        Ok(Script::new(scenes))
    }

    fn adapt_chapter(chapter_index: usize, chapter: &Value) -> Result<Vec<Scene>, ScriptError> {
        let title = require_str(chapter, "title")
            .map_err(|field| chapter_error(chapter_index, chapter, field))?;
        let files = chapter
            .get("files")
            .and_then(Value::as_array)
            .ok_or_else(|| chapter_error(chapter_index, chapter, "files"))?;
        let scene_values = chapter
            .get("scenes")
            .and_then(Value::as_array)
            .ok_or_else(|| chapter_error(chapter_index, chapter, "scenes"))?;

        let chapter_file: Option<String> = files
            .first()
            .and_then(Value::as_str)
            .map(|s| s.to_string());

        let mut scenes = Vec::with_capacity(scene_values.len());
        for (scene_index, descriptor) in scene_values.iter().enumerate() {
            scenes.push(Self::adapt_scene(
                title,
                scene_index,
                descriptor,
                chapter_file.as_deref(),
            )?);
        }
        Ok(scenes)
    }

    fn adapt_scene(
        chapter_title: &str,
        scene_index: usize,
        descriptor: &Value,
        chapter_file: Option<&str>,
    ) -> Result<Scene, ScriptError> {
        let title = require_str(descriptor, "title")
            .map_err(|field| scene_error(chapter_title, scene_index, field))?;
        // Scene durations are strictly positive seconds
        let duration = descriptor
            .get("duration")
            .and_then(Value::as_u64)
            .filter(|&d| d >= 1 && d <= u64::from(u32::MAX))
            .ok_or_else(|| scene_error(chapter_title, scene_index, "duration"))?;
        let explanation = require_str(descriptor, "explanation")
            .map_err(|field| scene_error(chapter_title, scene_index, field))?;
        let code = require_str(descriptor, "code")
            .map_err(|field| scene_error(chapter_title, scene_index, field))?;
        require_str(descriptor, "type_of_code")
            .map_err(|field| scene_error(chapter_title, scene_index, field))?;

        let mut scene = Scene::new(title, duration as u32, explanation);

        if !code.is_empty() {
            // Line-accurate mapping is not available from this payload shape
            let file_path = descriptor
                .get("file")
                .and_then(Value::as_str)
                .or(chapter_file)
                .unwrap_or(UNKNOWN_FILE);
            scene
                .code_highlights
                .push(CodeHighlight::new(file_path, 1, 1, explanation, code));
        }

        Ok(scene)
    }
}

/// Pull a JSON object out of raw provider text
///
/// Providers routinely wrap the payload in a fenced ```json block or pad it
/// with prose; strip down to the outermost object before decoding.
pub fn extract_json_payload(raw: &str) -> Result<Value, ScriptError> {
    let trimmed = raw.trim();

    let candidate = if let Some(start) = trimmed.find('{') {
        let end = trimmed
            .rfind('}')
            .ok_or_else(|| ScriptError::Payload("unterminated JSON object".to_string()))?;
        if end < start {
            return Err(ScriptError::Payload("unterminated JSON object".to_string()));
        }
        &trimmed[start..=end]
    } else {
        return Err(ScriptError::Payload(
            "response contains no JSON object".to_string(),
        ));
    };

    serde_json::from_str(candidate).map_err(|e| ScriptError::Payload(e.to_string()))
}

fn require_str<'v>(value: &'v Value, field: &'static str) -> Result<&'v str, &'static str> {
    value.get(field).and_then(Value::as_str).ok_or(field)
}

fn chapter_error(index: usize, chapter: &Value, field: &str) -> ScriptError {
    let label = chapter
        .get("title")
        .and_then(Value::as_str)
        .map(|t| format!("'{}'", t))
        .unwrap_or_else(|| format!("#{}", index + 1));
    ScriptError::Schema(format!("chapter {} is missing '{}'", label, field))
}

fn scene_error(chapter_title: &str, scene_index: usize, field: &str) -> ScriptError {
    ScriptError::Schema(format!(
        "scene #{} of chapter '{}' has an invalid or missing '{}'",
        scene_index + 1,
        chapter_title,
        field
    ))
}
