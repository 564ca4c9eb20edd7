/*!
 * Tests for end-to-end script assembly
 */

use std::sync::Arc;
use std::time::Duration;

use codecast::app_config::{Depth, Proficiency, ResponseFormat};
use codecast::errors::GenerationError;
use codecast::generation::{AssemblerOptions, RetryOrchestrator, ScriptAssembler};
use codecast::providers::mock::{MockProvider, MockStep};
use codecast::script::SourceFile;

use crate::common::{sample_helper_file, sample_json_response, sample_markdown_response, sample_source_file};

fn options() -> AssemblerOptions {
    AssemblerOptions {
        proficiency: Proficiency::Beginner,
        depth: Depth::KeyParts,
        response_format: ResponseFormat::Markdown,
        include_overview: false,
        max_tokens_per_batch: 10_000,
        inter_batch_delay: Duration::ZERO,
    }
}

fn assembler(provider: MockProvider, options: AssemblerOptions) -> ScriptAssembler {
    let orchestrator = RetryOrchestrator::new(
        RetryOrchestrator::single_flight_permit(),
        2,
        Duration::from_millis(10),
    );
    ScriptAssembler::new(Arc::new(provider), orchestrator, options)
}

#[tokio::test(start_paused = true)]
async fn test_assemble_withNoFiles_shouldFail() {
    let assembler = assembler(MockProvider::returning("unused"), options());
    let error = assembler.assemble(&[]).await.unwrap_err();
    assert!(matches!(error, GenerationError::NoSourceFiles));
}

#[tokio::test(start_paused = true)]
async fn test_assemble_withOneBatch_shouldPrependChapterMarker() {
    let assembler = assembler(
        MockProvider::returning(sample_markdown_response()),
        options(),
    );
    let script = assembler.assemble(&[sample_source_file()]).await.unwrap();

    // Marker plus the two parsed scenes
    assert_eq!(script.scenes.len(), 3);
    assert_eq!(script.scenes[0].title, "Chapter 1");
    assert_eq!(script.scenes[0].duration, 5);
    assert!(script.scenes[0].content.contains("main.py"));
    assert!(script.scenes[0].code_highlights.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_assemble_shouldNumberScenesGloballyAcrossBatches() {
    // Budget forces one file per batch, so the mock is called twice
    let mut opts = options();
    opts.max_tokens_per_batch = 30;
    let assembler = assembler(
        MockProvider::returning(sample_markdown_response()),
        opts,
    );

    let script = assembler
        .assemble(&[sample_source_file(), sample_helper_file()])
        .await
        .unwrap();

    let numbered: Vec<&str> = script
        .scenes
        .iter()
        .filter(|s| s.title.starts_with("Scene "))
        .map(|s| s.title.as_str())
        .collect();
    assert_eq!(
        numbered,
        vec![
            "Scene 1: Entry Point",
            "Scene 2: Guard Clause",
            "Scene 3: Entry Point",
            "Scene 4: Guard Clause",
        ]
    );

    // Chapter markers are never numbered
    let markers: Vec<&str> = script
        .scenes
        .iter()
        .filter(|s| s.title.starts_with("Chapter "))
        .map(|s| s.title.as_str())
        .collect();
    assert_eq!(markers, vec!["Chapter 1", "Chapter 2"]);
}

#[tokio::test(start_paused = true)]
async fn test_assemble_withAlreadyPrefixedTitle_shouldNotRenumber() {
    let raw = "## Scene 7: Custom (10s)\n\nAlready numbered by the model.\n\n---\n\
               ## Fresh (10s)\n\nNeeds a number.\n\n---\n";
    let assembler = assembler(MockProvider::returning(raw), options());
    let script = assembler.assemble(&[sample_source_file()]).await.unwrap();

    let titles: Vec<&str> = script.scenes.iter().map(|s| s.title.as_str()).collect();
    assert!(titles.contains(&"Scene 7: Custom"));
    assert!(titles.contains(&"Scene 1: Fresh"));
}

#[tokio::test(start_paused = true)]
async fn test_assemble_withTitleStartingWithWordScene_shouldStillNumber() {
    // Only a literal "Scene <n>:" prefix marks a title as already numbered
    let raw = "## Scene transitions explained (10s)\n\nHow one scene hands over to the next.\n\n---\n";
    let assembler = assembler(MockProvider::returning(raw), options());
    let script = assembler.assemble(&[sample_source_file()]).await.unwrap();

    let titles: Vec<&str> = script.scenes.iter().map(|s| s.title.as_str()).collect();
    assert!(titles.contains(&"Scene 1: Scene transitions explained"));
}

#[tokio::test(start_paused = true)]
async fn test_assemble_withOversizedFile_shouldReportItSkipped() {
    let mut opts = options();
    opts.max_tokens_per_batch = 30;
    let assembler = assembler(
        MockProvider::returning(sample_markdown_response()),
        opts,
    );

    let huge = SourceFile::new("huge.py", "x = 1\n".repeat(1_000));
    let script = assembler
        .assemble(&[sample_source_file(), huge])
        .await
        .unwrap();

    let skipped = &script.scenes[0];
    assert_eq!(skipped.title, "Skipped Files");
    assert_eq!(skipped.duration, 10);
    assert!(skipped.content.contains("huge.py"));
    assert!(!skipped.content.contains("main.py"));
}

#[tokio::test(start_paused = true)]
async fn test_assemble_withFailingBatch_shouldSkipItsFilesAndContinue() {
    // First batch fails fatally, second succeeds
    let mut opts = options();
    opts.max_tokens_per_batch = 30;
    let provider = MockProvider::scripted(vec![MockStep::AuthError])
        .with_fallback(sample_markdown_response());
    let assembler = assembler(provider, opts);

    let script = assembler
        .assemble(&[sample_source_file(), sample_helper_file()])
        .await
        .unwrap();

    // main.py's batch failed, util.py's batch still produced scenes
    let skipped = &script.scenes[0];
    assert_eq!(skipped.title, "Skipped Files");
    assert!(skipped.content.contains("main.py"));
    assert!(script.scenes.iter().any(|s| s.title == "Chapter 2"));
    assert!(script.scenes.iter().any(|s| s.title.starts_with("Scene 1:")));
    // The failed batch's marker was rolled back
    assert!(!script.scenes.iter().any(|s| s.title == "Chapter 1"));
}

#[tokio::test(start_paused = true)]
async fn test_assemble_withJsonFormat_shouldAdaptPayload() {
    let mut opts = options();
    opts.response_format = ResponseFormat::Json;
    let assembler = assembler(MockProvider::returning(sample_json_response()), opts);

    let script = assembler.assemble(&[sample_source_file()]).await.unwrap();
    assert!(script.scenes.iter().any(|s| s.title == "Scene 1: Entry Point"));
    let scene = script
        .scenes
        .iter()
        .find(|s| s.title == "Scene 1: Entry Point")
        .unwrap();
    assert_eq!(scene.code_highlights[0].file_path, "main.py");
}

#[tokio::test(start_paused = true)]
async fn test_assemble_withMalformedJson_shouldFallBackToMarkdown() {
    let mut opts = options();
    opts.response_format = ResponseFormat::Json;
    // First reply is schema-invalid JSON, the fallback Markdown call succeeds
    let provider = MockProvider::scripted(vec![
        MockStep::Reply("{\"chapters\": [{\"scenes\": []}]}".to_string()),
        MockStep::Reply(sample_markdown_response()),
    ]);
    let counter = provider.call_counter();
    let assembler = assembler(provider, opts);

    let script = assembler.assemble(&[sample_source_file()]).await.unwrap();
    assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 2);
    assert!(script.scenes.iter().any(|s| s.title == "Scene 1: Entry Point"));
}

#[tokio::test(start_paused = true)]
async fn test_assemble_withOverviewEnabled_shouldPrependOverviewScenes() {
    let mut opts = options();
    opts.include_overview = true;
    opts.max_tokens_per_batch = 30;
    // Two batch calls, then the overview call
    let provider = MockProvider::scripted(vec![
        MockStep::Reply(sample_markdown_response()),
        MockStep::Reply(sample_markdown_response()),
        MockStep::Reply(
            "## Project Overview (30s)\n\nTwo small Python modules.\n\n---\n".to_string(),
        ),
    ]);
    let assembler = assembler(provider, opts);

    let script = assembler
        .assemble(&[sample_source_file(), sample_helper_file()])
        .await
        .unwrap();

    assert_eq!(script.scenes[0].title, "Project Overview");
    assert_eq!(script.scenes[0].duration, 30);
}

#[tokio::test(start_paused = true)]
async fn test_assemble_withOverviewFailure_shouldStillReturnScript() {
    let mut opts = options();
    opts.include_overview = true;
    opts.max_tokens_per_batch = 30;
    // Batches succeed, the overview call errors out
    let provider = MockProvider::scripted(vec![
        MockStep::Reply(sample_markdown_response()),
        MockStep::Reply(sample_markdown_response()),
        MockStep::AuthError,
    ]);
    let assembler = assembler(provider, opts);

    let script = assembler
        .assemble(&[sample_source_file(), sample_helper_file()])
        .await
        .unwrap();
    assert!(!script.is_empty());
    assert!(script.scenes.iter().all(|s| s.title != "Project Overview"));
}

#[tokio::test(start_paused = true)]
async fn test_assemble_withSingleFile_shouldSkipOverviewPass() {
    let mut opts = options();
    opts.include_overview = true;
    let provider = MockProvider::scripted(vec![MockStep::Reply(sample_markdown_response())]);
    let counter = provider.call_counter();
    let assembler = assembler(provider, opts);

    assembler.assemble(&[sample_source_file()]).await.unwrap();
    // Only the single batch call, no overview round trip
    assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_assemble_withProgressCallback_shouldReportEachBatch() {
    let mut opts = options();
    opts.max_tokens_per_batch = 30;
    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let seen_clone = seen.clone();

    let assembler = assembler(
        MockProvider::returning(sample_markdown_response()),
        opts,
    )
    .with_progress(Box::new(move |done, total| {
        seen_clone.lock().push((done, total));
    }));

    assembler
        .assemble(&[sample_source_file(), sample_helper_file()])
        .await
        .unwrap();
    assert_eq!(*seen.lock(), vec![(1, 2), (2, 2)]);
}
