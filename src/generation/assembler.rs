/*!
 * Script assembly.
 *
 * The assembler drives the whole generation run: it plans token-bounded
 * batches, invokes the provider once per batch through the retry
 * orchestrator, routes raw output through the configured parser, and merges
 * the per-batch results into one globally consistent script with chapter
 * markers, global numbering, a skipped-files summary and an optional
 * repository overview.
 */

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use crate::app_config::{Depth, GenerationCommonConfig, Proficiency, ResponseFormat};
use crate::errors::GenerationError;
use crate::generation::batch::{Batch, BatchPlanner, HeuristicTokenEstimator};
use crate::generation::json_adapter::{JsonScriptAdapter, extract_json_payload};
use crate::generation::markdown::MarkdownScriptParser;
use crate::generation::prompt;
use crate::generation::retry::RetryOrchestrator;
use crate::providers::{ChatMessage, Provider};
use crate::script::{Scene, Script, SourceFile};

/// Fixed duration of synthesized chapter-marker scenes
const CHAPTER_MARKER_DURATION: u32 = 5;

/// Fixed duration of the skipped-files summary scene
const SKIPPED_SUMMARY_DURATION: u32 = 10;

/// Prefix applied by the global numbering pass
const SCENE_PREFIX: &str = "Scene ";

/// Progress callback invoked after each completed batch with (done, total)
pub type ProgressCallback = Box<dyn Fn(usize, usize) + Send + Sync>;

/// Tunables for one assembly run
#[derive(Debug, Clone)]
pub struct AssemblerOptions {
    pub proficiency: Proficiency,
    pub depth: Depth,
    pub response_format: ResponseFormat,
    pub include_overview: bool,
    pub max_tokens_per_batch: usize,
    pub inter_batch_delay: Duration,
}

impl Default for AssemblerOptions {
    fn default() -> Self {
        Self::from_common(&GenerationCommonConfig::default())
    }
}

impl AssemblerOptions {
    pub fn from_common(common: &GenerationCommonConfig) -> Self {
        Self {
            proficiency: common.proficiency,
            depth: common.depth,
            response_format: common.response_format,
            include_overview: common.include_overview,
            max_tokens_per_batch: common.max_tokens_per_batch,
            inter_batch_delay: Duration::from_millis(common.inter_batch_delay_ms),
        }
    }
}

/// Assembles one final script out of per-batch provider calls
pub struct ScriptAssembler {
    provider: Arc<dyn Provider>,
    orchestrator: RetryOrchestrator,
    options: AssemblerOptions,
    progress: Option<ProgressCallback>,
}

impl ScriptAssembler {
    pub fn new(
        provider: Arc<dyn Provider>,
        orchestrator: RetryOrchestrator,
        options: AssemblerOptions,
    ) -> Self {
        Self {
            provider,
            orchestrator,
            options,
            progress: None,
        }
    }

    /// Report per-batch progress through `callback`
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Generate the complete script for `files`
    ///
    /// Batches run strictly sequentially: later batches reuse the growing
    /// conversation context, and the orchestrator's permit only admits one
    /// provider call at a time anyway. A failed batch degrades into skipped
    /// files instead of aborting the run.
    pub async fn assemble(&self, files: &[SourceFile]) -> Result<Script, GenerationError> {
        if files.is_empty() {
            return Err(GenerationError::NoSourceFiles);
        }

        let planner =
            BatchPlanner::new(HeuristicTokenEstimator, self.options.max_tokens_per_batch);
        let plan = planner.plan(files);
        let total_batches = plan.batches.len();
        info!(
            "Planned {} batch(es) over {} file(s), {} skipped up front",
            total_batches,
            files.len(),
            plan.skipped.len()
        );

        let system = prompt::system_prompt(self.options.proficiency);
        let mut conversation: Vec<ChatMessage> = Vec::new();
        let mut covered: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut skipped = plan.skipped.clone();
        let mut scenes: Vec<Scene> = Vec::new();
        let mut next_scene_number: usize = 1;

        for (index, batch) in plan.batches.iter().enumerate() {
            let marker_position = scenes.len();
            scenes.push(chapter_marker(index, batch));

            match self
                .generate_batch(files, batch, &system, &mut conversation)
                .await
            {
                Ok(batch_scenes) => {
                    let mut titles = Vec::with_capacity(batch_scenes.len());
                    for mut scene in batch_scenes {
                        if !is_numbered_title(&scene.title) {
                            scene.title = format!("Scene {}: {}", next_scene_number, scene.title);
                            next_scene_number += 1;
                        }
                        titles.push(scene.title.clone());
                        scenes.push(scene);
                    }
                    for path in batch.file_paths() {
                        covered.entry(path).or_default().extend(titles.clone());
                    }
                }
                Err(error) if error.is_batch_local() => {
                    warn!(
                        "Batch {}/{} failed: {}; recording its files as skipped",
                        index + 1,
                        total_batches,
                        error
                    );
                    scenes.truncate(marker_position);
                    skipped.extend(batch.file_paths());
                }
                Err(error) => return Err(error),
            }

            if let Some(callback) = &self.progress {
                callback(index + 1, total_batches);
            }

            // Fixed rate-limit safety margin between batches
            if index + 1 < total_batches && !self.options.inter_batch_delay.is_zero() {
                tokio::time::sleep(self.options.inter_batch_delay).await;
            }
        }

        if !skipped.is_empty() {
            scenes.insert(0, skipped_summary(&skipped));
        }

        if self.options.include_overview && files.len() > 1 {
            match self.generate_overview(files, &covered, &system).await {
                Ok(overview) if !overview.is_empty() => {
                    info!("Prepending {} overview scene(s)", overview.len());
                    for (offset, scene) in overview.into_iter().enumerate() {
                        scenes.insert(offset, scene);
                    }
                }
                Ok(_) => debug!("Overview pass returned no scenes"),
                // Best-effort enrichment, never fatal to the run
                Err(error) => debug!("Overview pass skipped: {}", error),
            }
        }

        Ok(Script::new(scenes))
    }

    async fn generate_batch(
        &self,
        files: &[SourceFile],
        batch: &Batch,
        system: &str,
        conversation: &mut Vec<ChatMessage>,
    ) -> Result<Vec<Scene>, GenerationError> {
        match self.options.response_format {
            ResponseFormat::Markdown => {
                self.generate_markdown(files, batch, system, conversation).await
            }
            ResponseFormat::Json => {
                match self.generate_json(batch, system, conversation).await {
                    Ok(scenes) => Ok(scenes),
                    // Malformed payloads are batch-local: retry the batch in
                    // the lenient Markdown pairing instead of aborting
                    Err(GenerationError::Script(error)) => {
                        warn!(
                            "JSON payload rejected ({}); falling back to Markdown for this batch",
                            error
                        );
                        self.generate_markdown(files, batch, system, conversation).await
                    }
                    Err(other) => Err(other),
                }
            }
        }
    }

    async fn generate_markdown(
        &self,
        files: &[SourceFile],
        batch: &Batch,
        system: &str,
        conversation: &mut Vec<ChatMessage>,
    ) -> Result<Vec<Scene>, GenerationError> {
        let user_prompt =
            prompt::markdown_batch_prompt(&batch.files, self.options.proficiency, self.options.depth);
        let raw = self.call_provider(system, conversation, user_prompt).await?;

        // The parser gets the full file list so highlight headers without a
        // fenced block can fall back to slicing the original source
        let parser = MarkdownScriptParser::new(files);
        Ok(parser.parse(&raw))
    }

    async fn generate_json(
        &self,
        batch: &Batch,
        system: &str,
        conversation: &mut Vec<ChatMessage>,
    ) -> Result<Vec<Scene>, GenerationError> {
        let user_prompt =
            prompt::json_batch_prompt(&batch.files, self.options.proficiency, self.options.depth);
        let raw = self.call_provider(system, conversation, user_prompt).await?;

        let payload = extract_json_payload(&raw)?;
        let script = JsonScriptAdapter::adapt(&payload)?;
        Ok(script.scenes)
    }

    async fn generate_overview(
        &self,
        files: &[SourceFile],
        covered: &BTreeMap<String, Vec<String>>,
        system: &str,
    ) -> Result<Vec<Scene>, GenerationError> {
        let all_paths: Vec<String> = files.iter().map(|f| f.path.clone()).collect();
        let user_prompt = prompt::overview_prompt(&all_paths, covered, self.options.proficiency);

        let provider = self.provider.clone();
        let system = system.to_string();
        let messages = vec![ChatMessage::user(user_prompt)];
        let raw = self
            .orchestrator
            .execute(move || {
                let provider = provider.clone();
                let system = system.clone();
                let messages = messages.clone();
                async move { provider.generate(&system, &messages).await }
            })
            .await?;

        let parser = MarkdownScriptParser::new(files);
        Ok(parser.parse(&raw))
    }

    /// Run one provider call through the orchestrator and record the
    /// exchange in the growing conversation on success
    async fn call_provider(
        &self,
        system: &str,
        conversation: &mut Vec<ChatMessage>,
        user_prompt: String,
    ) -> Result<String, GenerationError> {
        let mut messages = conversation.clone();
        messages.push(ChatMessage::user(user_prompt.clone()));

        let provider = self.provider.clone();
        let system_owned = system.to_string();
        let raw = self
            .orchestrator
            .execute(move || {
                let provider = provider.clone();
                let system = system_owned.clone();
                let messages = messages.clone();
                async move { provider.generate(&system, &messages).await }
            })
            .await?;

        conversation.push(ChatMessage::user(user_prompt));
        conversation.push(ChatMessage::assistant(raw.clone()));
        Ok(raw)
    }
}

/// True only for titles already stamped `Scene <n>: ...`; a title that
/// merely opens with the word "Scene" still gets a number
fn is_numbered_title(title: &str) -> bool {
    title
        .strip_prefix(SCENE_PREFIX)
        .and_then(|rest| rest.split_once(':'))
        .is_some_and(|(number, _)| {
            !number.is_empty() && number.bytes().all(|b| b.is_ascii_digit())
        })
}

/// Zero-code scene marking the start of a batch's chapter; never numbered
fn chapter_marker(index: usize, batch: &Batch) -> Scene {
    let mut content = String::from("This chapter covers the following files:\n");
    for path in batch.file_paths() {
        content.push_str(&format!("- {}\n", path));
    }
    Scene::new(
        format!("Chapter {}", index + 1),
        CHAPTER_MARKER_DURATION,
        content.trim_end().to_string(),
    )
}

/// Zero-code scene summarizing every skipped file; never numbered
fn skipped_summary(skipped: &[String]) -> Scene {
    let mut content = String::from(
        "The following files were not covered, either because they exceed the \
         token budget on their own or because their batch failed:\n",
    );
    for path in skipped {
        content.push_str(&format!("- {}\n", path));
    }
    Scene::new(
        "Skipped Files",
        SKIPPED_SUMMARY_DURATION,
        content.trim_end().to_string(),
    )
}
