/*!
 * Tests for the strict JSON output adapter
 */

use codecast::errors::ScriptError;
use codecast::generation::{JsonScriptAdapter, extract_json_payload};
use serde_json::json;

use crate::common::sample_json_response;

#[test]
fn test_adapt_withValidPayload_shouldFlattenChapters() {
    let payload = extract_json_payload(&sample_json_response()).unwrap();
    let script = JsonScriptAdapter::adapt(&payload).unwrap();

    assert_eq!(script.scenes.len(), 1);
    let scene = &script.scenes[0];
    assert_eq!(scene.title, "Entry Point");
    assert_eq!(scene.duration, 25);
    assert_eq!(scene.content, "The script defines a main function.");
    assert_eq!(scene.code_highlights.len(), 1);
}

#[test]
fn test_adapt_withCodeScene_shouldAttributeToChapterFile() {
    let payload = extract_json_payload(&sample_json_response()).unwrap();
    let script = JsonScriptAdapter::adapt(&payload).unwrap();

    let highlight = &script.scenes[0].code_highlights[0];
    assert_eq!(highlight.file_path, "main.py");
    assert_eq!(highlight.start_line, 1);
    assert_eq!(highlight.end_line, 1);
    assert!(highlight.code.contains("def main():"));
    // The explanation doubles as the highlight description
    assert_eq!(highlight.description, "The script defines a main function.");
}

#[test]
fn test_adapt_withSceneFileField_shouldPreferItOverChapterFiles() {
    let payload = json!({
        "chapters": [{
            "title": "Utilities",
            "files": ["util.py", "other.py"],
            "scenes": [{
                "title": "Adder",
                "duration": 10,
                "explanation": "Adds numbers.",
                "code": "def add(a, b): return a + b",
                "type_of_code": "function",
                "file": "override.py"
            }]
        }]
    });
    let script = JsonScriptAdapter::adapt(&payload).unwrap();
    assert_eq!(script.scenes[0].code_highlights[0].file_path, "override.py");
}

#[test]
fn test_adapt_withEmptyChapterFiles_shouldFallBackToUnknown() {
    let payload = json!({
        "chapters": [{
            "title": "Mystery",
            "files": [],
            "scenes": [{
                "title": "Code",
                "duration": 10,
                "explanation": "Some code.",
                "code": "x = 1",
                "type_of_code": "snippet"
            }]
        }]
    });
    let script = JsonScriptAdapter::adapt(&payload).unwrap();
    assert_eq!(script.scenes[0].code_highlights[0].file_path, "unknown");
}

#[test]
fn test_adapt_withEmptyCode_shouldNotEmitHighlight() {
    let payload = json!({
        "chapters": [{
            "title": "Narration",
            "files": ["main.py"],
            "scenes": [{
                "title": "Overview",
                "duration": 15,
                "explanation": "Pure narration, no code.",
                "code": "",
                "type_of_code": "none"
            }]
        }]
    });
    let script = JsonScriptAdapter::adapt(&payload).unwrap();
    assert!(script.scenes[0].code_highlights.is_empty());
}

#[test]
fn test_adapt_withMissingSceneDuration_shouldNameOffendingScene() {
    let payload = json!({
        "chapters": [{
            "title": "Main Module",
            "files": ["main.py"],
            "scenes": [{
                "title": "Broken",
                "explanation": "No duration here.",
                "code": "",
                "type_of_code": "none"
            }]
        }]
    });
    let err = JsonScriptAdapter::adapt(&payload).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("scene #1"));
    assert!(message.contains("Main Module"));
    assert!(message.contains("duration"));
}

#[test]
fn test_adapt_withZeroDuration_shouldRejectScene() {
    let payload = json!({
        "chapters": [{
            "title": "Main Module",
            "files": ["main.py"],
            "scenes": [{
                "title": "Instant",
                "duration": 0,
                "explanation": "Durations must be positive seconds.",
                "code": "",
                "type_of_code": "none"
            }]
        }]
    });
    let err = JsonScriptAdapter::adapt(&payload).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("scene #1"));
    assert!(message.contains("duration"));
}

#[test]
fn test_adapt_withUntitledChapterMissingFiles_shouldNameByIndex() {
    let payload = json!({"chapters": [{"scenes": []}]});
    let err = JsonScriptAdapter::adapt(&payload).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("#1"));
    assert!(matches!(err, ScriptError::Schema(_)));
}

#[test]
fn test_extractJsonPayload_withProsePadding_shouldStripToObject() {
    let raw = "Of course! Here is the JSON:\n{\"chapters\": []}\nLet me know!";
    let value = extract_json_payload(raw).unwrap();
    assert_eq!(value, json!({"chapters": []}));
}

#[test]
fn test_extractJsonPayload_withTruncatedObject_shouldError() {
    assert!(matches!(
        extract_json_payload("{\"chapters\": ["),
        Err(ScriptError::Payload(_))
    ));
}
