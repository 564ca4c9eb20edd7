use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::app_config::{Config, ScriptProvider};
use crate::fetch::{GithubFetcher, GithubUrl, LocalFetcher};
use crate::file_utils::FileManager;
use crate::generation::{AssemblerOptions, RetryOrchestrator, ScriptAssembler};
use crate::providers::Provider;
use crate::providers::anthropic::Anthropic;
use crate::providers::openai::OpenAI;
use crate::registry::ScriptRegistry;
use crate::script::{Script, SourceFile};

// @module: Application controller for script generation

/// Per-run options layered on top of the loaded configuration
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Extension filter applied to directory sources (empty keeps everything)
    pub file_types: Vec<String>,
    /// Skip writing the rendered Markdown to disk
    pub no_save: bool,
}

/// Result of one generation run
#[derive(Debug)]
pub struct RunOutcome {
    /// Registry identifier of the generated script
    pub script_id: Uuid,
    /// Number of scenes in the final script
    pub scene_count: usize,
    /// Sum of scene durations in seconds
    pub total_duration: u32,
    /// Where the rendered Markdown was written, unless saving was disabled
    pub output_path: Option<PathBuf>,
}

/// Main application controller for script generation
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: In-memory script store
    registry: ScriptRegistry,
}

impl Controller {
    /// Create a new controller for test purposes with default configuration
    pub fn new_for_test() -> Result<Self> {
        Self::with_config(Config::default())
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self {
            config,
            registry: ScriptRegistry::new(),
        })
    }

    /// Check if the controller is properly initialized with configuration
    pub fn is_initialized(&self) -> bool {
        !self.config.generation.get_model().is_empty()
    }

    /// Access the script registry
    pub fn registry(&self) -> &ScriptRegistry {
        &self.registry
    }

    /// Run the full workflow: fetch sources, generate the script, save it
    ///
    /// `source` is either a GitHub blob/tree URL or a local file or
    /// directory path.
    pub async fn run(&self, source: &str, options: &RunOptions) -> Result<RunOutcome> {
        let start_time = std::time::Instant::now();

        let files = self.fetch_sources(source, &options.file_types).await?;
        if files.is_empty() {
            return Err(anyhow!("No source files found at: {}", source));
        }
        info!("Fetched {} source file(s) from {}", files.len(), source);

        let script = self.generate_script(&files).await?;

        let output_path = if options.no_save {
            None
        } else {
            Some(self.save_script(&script, source)?)
        };

        let scene_count = script.scenes.len();
        let total_duration = script.total_duration();
        let script_id = self.registry.register(script);

        info!(
            "Generated {} scene(s), {}s of narration, in {:.1}s",
            scene_count,
            total_duration,
            start_time.elapsed().as_secs_f64()
        );

        Ok(RunOutcome {
            script_id,
            scene_count,
            total_duration,
            output_path,
        })
    }

    /// Fetch source files from a GitHub URL or a local path
    async fn fetch_sources(
        &self,
        source: &str,
        file_types: &[String],
    ) -> Result<Vec<SourceFile>> {
        if source.starts_with("http://") || source.starts_with("https://") {
            let url = GithubUrl::parse(source)?;
            let token = std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty());
            if token.is_none() {
                warn!("GITHUB_TOKEN not set, using unauthenticated GitHub API limits");
            }
            let fetcher = GithubFetcher::new(token);
            Ok(fetcher.fetch(&url, file_types).await?)
        } else {
            let fetcher = LocalFetcher::new();
            Ok(fetcher.fetch(Path::new(source), file_types)?)
        }
    }

    /// Drive the assembler over the fetched files with progress reporting
    async fn generate_script(&self, files: &[SourceFile]) -> Result<Script> {
        let provider = self.build_provider()?;
        let common = &self.config.generation.common;

        let orchestrator = RetryOrchestrator::new(
            RetryOrchestrator::single_flight_permit(),
            common.retry_count,
            std::time::Duration::from_millis(common.retry_backoff_ms),
        );

        let progress_bar = ProgressBar::new(1);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));

        let callback_bar = progress_bar.clone();
        let assembler = ScriptAssembler::new(
            provider,
            orchestrator,
            AssemblerOptions::from_common(common),
        )
        .with_progress(Box::new(move |done, total| {
            callback_bar.set_length(total as u64);
            callback_bar.set_position(done as u64);
        }));

        let result = assembler.assemble(files).await;
        progress_bar.finish_and_clear();

        result.context("Script generation failed")
    }

    /// Instantiate the configured provider client
    fn build_provider(&self) -> Result<Arc<dyn Provider>> {
        let generation = &self.config.generation;
        let api_key = generation.get_api_key();
        let endpoint = generation.get_endpoint();
        let model = generation.get_model();
        let temperature = generation.common.temperature;
        let timeout_secs = generation.get_timeout_secs();

        let provider: Arc<dyn Provider> = match generation.provider {
            ScriptProvider::OpenAI => {
                Arc::new(OpenAI::new(api_key, endpoint, model, temperature, timeout_secs))
            }
            ScriptProvider::Anthropic => Arc::new(Anthropic::new(
                api_key,
                endpoint,
                model,
                temperature,
                timeout_secs,
                generation.get_max_output_tokens(),
            )),
        };
        Ok(provider)
    }

    /// Render the script to Markdown and write it under the output directory
    fn save_script(&self, script: &Script, source: &str) -> Result<PathBuf> {
        let output_dir = Path::new(&self.config.output_dir);
        FileManager::ensure_dir(output_dir)?;

        let path = FileManager::script_output_path(source, output_dir);
        FileManager::write_to_file(&path, &script.to_markdown())?;
        info!("Saved script to {}", path.display());
        Ok(path)
    }
}
