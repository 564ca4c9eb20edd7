/*!
 * Tests for token-budget batch planning
 */

use codecast::generation::{BatchPlanner, HeuristicTokenEstimator, TokenEstimator};
use codecast::script::SourceFile;

/// Estimator that reads the file content as a literal token count
struct FixedEstimator;

impl TokenEstimator for FixedEstimator {
    fn estimate(&self, text: &str) -> usize {
        text.trim().parse().unwrap_or(0)
    }
}

fn file(path: &str, tokens: usize) -> SourceFile {
    SourceFile::new(path, tokens.to_string())
}

#[test]
fn test_plan_withThreeFilesAroundBudget_shouldPartitionAndSkip() {
    let planner = BatchPlanner::new(FixedEstimator, 10_000);
    let plan = planner.plan(&[
        file("a.py", 50),
        file("b.py", 9_980),
        file("c.py", 11_000),
    ]);

    // a alone, b closes a new batch, c is too large for any batch
    assert_eq!(plan.batches.len(), 2);
    assert_eq!(plan.batches[0].file_paths(), vec!["a.py"]);
    assert_eq!(plan.batches[1].file_paths(), vec!["b.py"]);
    assert_eq!(plan.skipped, vec!["c.py"]);
}

#[test]
fn test_plan_withSmallFiles_shouldPackIntoOneBatch() {
    let planner = BatchPlanner::new(FixedEstimator, 1_000);
    let plan = planner.plan(&[file("a.py", 300), file("b.py", 300), file("c.py", 300)]);

    assert_eq!(plan.batches.len(), 1);
    assert_eq!(
        plan.batches[0].file_paths(),
        vec!["a.py", "b.py", "c.py"]
    );
    assert_eq!(plan.batches[0].token_count, 900);
    assert!(plan.skipped.is_empty());
}

#[test]
fn test_plan_withExactBudget_shouldNotOverflow() {
    let planner = BatchPlanner::new(FixedEstimator, 600);
    let plan = planner.plan(&[file("a.py", 300), file("b.py", 300), file("c.py", 1)]);

    // a + b fill the budget exactly, c starts the next batch
    assert_eq!(plan.batches.len(), 2);
    assert_eq!(plan.batches[0].file_paths(), vec!["a.py", "b.py"]);
    assert_eq!(plan.batches[1].file_paths(), vec!["c.py"]);
}

#[test]
fn test_plan_shouldPreserveInputOrder() {
    let planner = BatchPlanner::new(FixedEstimator, 500);
    let plan = planner.plan(&[
        file("z.py", 400),
        file("a.py", 400),
        file("m.py", 400),
    ]);

    let ordered: Vec<String> = plan
        .batches
        .iter()
        .flat_map(|b| b.file_paths())
        .collect();
    assert_eq!(ordered, vec!["z.py", "a.py", "m.py"]);
}

#[test]
fn test_heuristicEstimator_withSourceText_shouldScaleWithLength() {
    let estimator = HeuristicTokenEstimator;
    let short = estimator.estimate("let x = 1;");
    let long = estimator.estimate(&"let x = 1;\n".repeat(100));
    assert!(short >= 1);
    assert!(long > short * 50);
}
