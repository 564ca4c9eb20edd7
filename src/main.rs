// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::fs::File;
use std::io::BufReader;
use std::io::Write;
use std::path::Path;

use crate::app_config::{Config, Depth, Proficiency, ResponseFormat, ScriptProvider};
use app_controller::{Controller, RunOptions};

mod app_config;
mod app_controller;
mod errors;
mod fetch;
mod file_utils;
mod generation;
mod providers;
mod registry;
mod script;

/// CLI Wrapper for ScriptProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliScriptProvider {
    OpenAI,
    Anthropic,
}

impl From<CliScriptProvider> for ScriptProvider {
    fn from(cli_provider: CliScriptProvider) -> Self {
        match cli_provider {
            CliScriptProvider::OpenAI => ScriptProvider::OpenAI,
            CliScriptProvider::Anthropic => ScriptProvider::Anthropic,
        }
    }
}

/// CLI Wrapper for Proficiency to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliProficiency {
    Beginner,
    Intermediate,
    Expert,
}

impl From<CliProficiency> for Proficiency {
    fn from(cli_proficiency: CliProficiency) -> Self {
        match cli_proficiency {
            CliProficiency::Beginner => Proficiency::Beginner,
            CliProficiency::Intermediate => Proficiency::Intermediate,
            CliProficiency::Expert => Proficiency::Expert,
        }
    }
}

/// CLI Wrapper for Depth to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliDepth {
    LineByLine,
    Chunk,
    KeyParts,
}

impl From<CliDepth> for Depth {
    fn from(cli_depth: CliDepth) -> Self {
        match cli_depth {
            CliDepth::LineByLine => Depth::LineByLine,
            CliDepth::Chunk => Depth::Chunk,
            CliDepth::KeyParts => Depth::KeyParts,
        }
    }
}

/// CLI Wrapper for ResponseFormat to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliResponseFormat {
    Markdown,
    Json,
}

impl From<CliResponseFormat> for ResponseFormat {
    fn from(cli_format: CliResponseFormat) -> Self {
        match cli_format {
            CliResponseFormat::Markdown => ResponseFormat::Markdown,
            CliResponseFormat::Json => ResponseFormat::Json,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate an explanation script for source code (default command)
    #[command(alias = "generate")]
    Generate(GenerateArgs),

    /// Generate shell completions for codecast
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    /// GitHub blob/tree URL or local file/directory to explain
    #[arg(value_name = "SOURCE")]
    source: String,

    /// Provider to use for generation
    #[arg(short, long, value_enum)]
    provider: Option<CliScriptProvider>,

    /// Model name to use for generation
    #[arg(short, long)]
    model: Option<String>,

    /// Reader proficiency the narration should target
    #[arg(long, value_enum)]
    proficiency: Option<CliProficiency>,

    /// Explanation depth to request
    #[arg(short, long, value_enum)]
    depth: Option<CliDepth>,

    /// Response format to request from the provider
    #[arg(short = 'F', long, value_enum)]
    format: Option<CliResponseFormat>,

    /// Skip the repository overview pass
    #[arg(long)]
    no_overview: bool,

    /// Only include files with these extensions (e.g. -t py -t rs)
    #[arg(short = 't', long = "file-type")]
    file_types: Vec<String>,

    /// Directory where the rendered script is written
    #[arg(short, long)]
    output_dir: Option<String>,

    /// Do not write the rendered script to disk
    #[arg(long)]
    no_save: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// Codecast - AI-powered code explanation scripts
///
/// Fetches source code from GitHub or the local filesystem and turns it into
/// a narrated, scene-by-scene explanation script using AI providers.
#[derive(Parser, Debug)]
#[command(name = "codecast")]
#[command(version = "0.1.0")]
#[command(about = "AI-powered code explanation script generator")]
#[command(long_about = "Codecast fetches source code and generates a narrated explanation script using AI providers.

EXAMPLES:
    codecast https://github.com/acme/widgets/tree/main/src   # Explain a GitHub tree
    codecast src/main.rs                                     # Explain a local file
    codecast -p anthropic -m claude-3-haiku src/             # Use a specific provider and model
    codecast --proficiency expert -d line-by-line src/       # Tune narration for experts
    codecast -F json src/                                    # Request structured JSON output
    codecast -t py -t rs https://github.com/acme/widgets     # Only cover Python and Rust files
    codecast completions bash > codecast.bash                # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default
    one will be created automatically.

SUPPORTED PROVIDERS:
    openai    - OpenAI API (requires API key; also OpenAI-compatible servers)
    anthropic - Anthropic Claude API (requires API key)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// GitHub blob/tree URL or local file/directory to explain
    #[arg(value_name = "SOURCE")]
    source: Option<String>,

    /// Provider to use for generation
    #[arg(short, long, value_enum)]
    provider: Option<CliScriptProvider>,

    /// Model name to use for generation
    #[arg(short, long)]
    model: Option<String>,

    /// Reader proficiency the narration should target
    #[arg(long, value_enum)]
    proficiency: Option<CliProficiency>,

    /// Explanation depth to request
    #[arg(short, long, value_enum)]
    depth: Option<CliDepth>,

    /// Response format to request from the provider
    #[arg(short = 'F', long, value_enum)]
    format: Option<CliResponseFormat>,

    /// Skip the repository overview pass
    #[arg(long)]
    no_overview: bool,

    /// Only include files with these extensions (e.g. -t py -t rs)
    #[arg(short = 't', long = "file-type")]
    file_types: Vec<String>,

    /// Directory where the rendered script is written
    #[arg(short, long)]
    output_dir: Option<String>,

    /// Do not write the rendered script to disk
    #[arg(long)]
    no_save: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color code for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let color = Self::get_color_for_level(record.level());
            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {}\x1B[0m", color, now, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    // Parse command line arguments using clap
    let cli = CommandLineOptions::parse();

    // Handle subcommands
    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "codecast", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Generate(args)) => run_generate(args).await,
        None => {
            // Default behavior - use top-level args for backwards compatibility
            let source = cli
                .source
                .ok_or_else(|| anyhow!("SOURCE is required when no subcommand is specified"))?;

            let generate_args = GenerateArgs {
                source,
                provider: cli.provider,
                model: cli.model,
                proficiency: cli.proficiency,
                depth: cli.depth,
                format: cli.format,
                no_overview: cli.no_overview,
                file_types: cli.file_types,
                output_dir: cli.output_dir,
                no_save: cli.no_save,
                config_path: cli.config_path,
                log_level: cli.log_level,
            };
            run_generate(generate_args).await
        }
    }
}

async fn run_generate(options: GenerateArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let config_log_level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level_filter(&config_log_level));
    }

    // Load or create configuration
    let config_path = &options.config_path;
    let mut config = if Path::new(config_path).exists() {
        // Load existing configuration
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;

        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", config_path))?
    } else {
        // Create default configuration if not exists
        warn!(
            "Config file not found at '{}', creating default config.",
            config_path
        );

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;
        config
    };

    // Override config with CLI options if provided
    apply_overrides(&mut config, &options);

    // Validate the configuration after loading and overriding
    config
        .validate()
        .context("Configuration validation failed")?;

    // If log level was not set via command line, update it from config now
    if options.log_level.is_none() {
        log::set_max_level(level_filter(&config.log_level));
    }

    // Create controller and run the generation workflow
    let controller = Controller::with_config(config)?;
    let run_options = RunOptions {
        file_types: options.file_types.clone(),
        no_save: options.no_save,
    };

    let outcome = controller.run(&options.source, &run_options).await?;
    match &outcome.output_path {
        Some(path) => info!(
            "Done: {} scene(s), {}s of narration, saved to {}",
            outcome.scene_count,
            outcome.total_duration,
            path.display()
        ),
        None => info!(
            "Done: {} scene(s), {}s of narration (not saved)",
            outcome.scene_count, outcome.total_duration
        ),
    }

    Ok(())
}

/// Apply CLI overrides onto the loaded configuration
fn apply_overrides(config: &mut Config, options: &GenerateArgs) {
    if let Some(provider) = &options.provider {
        config.generation.provider = provider.clone().into();
    }

    if let Some(model) = &options.model {
        // Find the provider config and update the model
        let provider_str = config.generation.provider.to_lowercase_string();
        if let Some(provider_config) = config
            .generation
            .available_providers
            .iter_mut()
            .find(|p| p.provider_type == provider_str)
        {
            provider_config.model = model.clone();
        }
    }

    if let Some(proficiency) = &options.proficiency {
        config.generation.common.proficiency = proficiency.clone().into();
    }

    if let Some(depth) = &options.depth {
        config.generation.common.depth = depth.clone().into();
    }

    if let Some(format) = &options.format {
        config.generation.common.response_format = format.clone().into();
    }

    if options.no_overview {
        config.generation.common.include_overview = false;
    }

    if let Some(output_dir) = &options.output_dir {
        config.output_dir = output_dir.clone();
    }

    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}
