/*!
 * Tests for application configuration functionality
 */

use codecast::app_config::{
    Config, Depth, LogLevel, Proficiency, ResponseFormat, ScriptProvider,
};

/// Test default configuration values
#[test]
fn test_defaultConfig_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.generation.provider, ScriptProvider::OpenAI);
    assert_eq!(config.output_dir, "scripts");
    assert_eq!(config.log_level, LogLevel::Info);

    let common = &config.generation.common;
    assert_eq!(common.max_tokens_per_batch, 10_000);
    assert_eq!(common.retry_count, 3);
    assert_eq!(common.retry_backoff_ms, 1_000);
    assert_eq!(common.inter_batch_delay_ms, 1_000);
    assert_eq!(common.response_format, ResponseFormat::Markdown);
    assert!(common.include_overview);
    assert_eq!(common.proficiency, Proficiency::Beginner);
    assert_eq!(common.depth, Depth::KeyParts);
}

#[test]
fn test_defaultConfig_shouldListBothProviders() {
    let config = Config::default();
    assert_eq!(config.generation.available_providers.len(), 2);
    assert_eq!(config.generation.get_model(), "gpt-4o");
    assert_eq!(config.generation.get_endpoint(), "https://api.openai.com/v1");
    assert_eq!(config.generation.get_timeout_secs(), 60);
}

#[test]
fn test_getActiveProviderConfig_withAnthropic_shouldSwitchDefaults() {
    let mut config = Config::default();
    config.generation.provider = ScriptProvider::Anthropic;

    assert_eq!(config.generation.get_model(), "claude-3-haiku");
    assert_eq!(config.generation.get_endpoint(), "https://api.anthropic.com");
    assert_eq!(config.generation.get_timeout_secs(), 120);
    assert_eq!(config.generation.get_max_output_tokens(), 4096);
}

#[test]
fn test_validate_withMissingApiKey_shouldFail() {
    let config = Config::default();
    let error = config.validate().unwrap_err();
    assert!(error.to_string().contains("API key"));
}

#[test]
fn test_validate_withApiKeyAndBudget_shouldPass() {
    let mut config = Config::default();
    config.generation.available_providers[0].api_key = "sk-test".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_withZeroTokenBudget_shouldFail() {
    let mut config = Config::default();
    config.generation.available_providers[0].api_key = "sk-test".to_string();
    config.generation.common.max_tokens_per_batch = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_configSerde_shouldRoundTripThroughJson() {
    let mut config = Config::default();
    config.generation.provider = ScriptProvider::Anthropic;
    config.generation.common.response_format = ResponseFormat::Json;
    config.generation.common.depth = Depth::LineByLine;

    let json = serde_json::to_string_pretty(&config).unwrap();
    let parsed: Config = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed.generation.provider, ScriptProvider::Anthropic);
    assert_eq!(parsed.generation.common.response_format, ResponseFormat::Json);
    assert_eq!(parsed.generation.common.depth, Depth::LineByLine);
}

#[test]
fn test_configSerde_withSparseJson_shouldFillDefaults() {
    let parsed: Config = serde_json::from_str(r#"{"generation": {}}"#).unwrap();
    assert_eq!(parsed.output_dir, "scripts");
    assert_eq!(parsed.generation.common.max_tokens_per_batch, 10_000);
}

#[test]
fn test_fromStr_shouldParseEnumValues() {
    assert_eq!(
        "anthropic".parse::<ScriptProvider>().unwrap(),
        ScriptProvider::Anthropic
    );
    assert_eq!("expert".parse::<Proficiency>().unwrap(), Proficiency::Expert);
    assert_eq!("line-by-line".parse::<Depth>().unwrap(), Depth::LineByLine);
    assert_eq!("json".parse::<ResponseFormat>().unwrap(), ResponseFormat::Json);
    assert!("carrier-pigeon".parse::<ScriptProvider>().is_err());
}

#[test]
fn test_display_shouldUseLowercaseIdentifiers() {
    assert_eq!(ScriptProvider::OpenAI.to_string(), "openai");
    assert_eq!(ScriptProvider::Anthropic.display_name(), "Anthropic");
    assert_eq!(Depth::KeyParts.to_string(), "key-parts");
    assert_eq!(Proficiency::Intermediate.to_string(), "intermediate");
}
