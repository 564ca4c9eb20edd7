/*!
 * Token-budget batch planning.
 *
 * This module groups source files into provider-call batches whose estimated
 * token cost stays within a configured budget. Files whose estimate alone
 * exceeds the budget are skipped outright; a file is never split across
 * batches.
 */

use log::warn;

use crate::script::SourceFile;

/// Estimates the provider-token cost of a piece of text
///
/// The planner only needs a cheap upper-bound estimate, not an exact
/// tokenizer; implementations are free to be approximate.
pub trait TokenEstimator: Send + Sync {
    fn estimate(&self, text: &str) -> usize;
}

/// Character-ratio token estimator
///
/// Assumes roughly four characters per token, which over-counts slightly for
/// dense source code and keeps batches on the safe side of the budget.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicTokenEstimator;

const CHARS_PER_TOKEN: usize = 4;

impl TokenEstimator for HeuristicTokenEstimator {
    fn estimate(&self, text: &str) -> usize {
        text.chars().count().div_ceil(CHARS_PER_TOKEN)
    }
}

/// A token-bounded group of source files sent together in one provider call
///
/// Transient: exists only while a script is being assembled.
#[derive(Debug, Clone)]
pub struct Batch {
    /// Files in input order
    pub files: Vec<SourceFile>,
    /// Estimated token cost of the batch
    pub token_count: usize,
}

impl Batch {
    fn empty() -> Self {
        Batch {
            files: Vec::new(),
            token_count: 0,
        }
    }

    pub fn file_paths(&self) -> Vec<String> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }
}

/// The planner's output: ordered batches plus the files it had to skip
#[derive(Debug, Default)]
pub struct BatchPlan {
    /// Batches in input-file order, each within the token budget
    pub batches: Vec<Batch>,
    /// Paths of files whose estimate alone exceeded the budget
    pub skipped: Vec<String>,
}

/// Splits a file list into token-bounded batches
pub struct BatchPlanner<E: TokenEstimator> {
    estimator: E,
    max_tokens: usize,
}

impl<E: TokenEstimator> BatchPlanner<E> {
    pub fn new(estimator: E, max_tokens: usize) -> Self {
        BatchPlanner {
            estimator,
            max_tokens,
        }
    }

    /// Plan batches over `files` in input order
    ///
    /// Invariants: every batch's token sum is within the budget, every
    /// non-skipped file appears in exactly one batch, and batch order
    /// preserves file input order.
    pub fn plan(&self, files: &[SourceFile]) -> BatchPlan {
        let mut plan = BatchPlan::default();
        let mut current = Batch::empty();

        for file in files {
            let estimate = self.estimator.estimate(&file.content);

            if estimate > self.max_tokens {
                warn!(
                    "Skipping {}: estimated {} tokens exceeds budget of {}",
                    file.path, estimate, self.max_tokens
                );
                plan.skipped.push(file.path.clone());
                continue;
            }

            if !current.files.is_empty() && current.token_count + estimate > self.max_tokens {
                plan.batches.push(std::mem::replace(&mut current, Batch::empty()));
            }

            current.token_count += estimate;
            current.files.push(file.clone());
        }

        if !current.files.is_empty() {
            plan.batches.push(current);
        }

        plan
    }
}
