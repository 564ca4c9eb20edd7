use std::fmt;
use serde::{Deserialize, Serialize};

// @module: Script data model shared across generation and rendering

/// A single source file fetched for explanation
///
/// Produced once per request by a fetcher and consumed read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    // @field: Repository-relative path
    pub path: String,

    // @field: Full file content
    pub content: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        SourceFile {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Slice the file's lines as `[start_line - 1, end_line)` (1-based, inclusive start)
    ///
    /// Out-of-range bounds are clamped; a zero or inverted range yields an
    /// empty string.
    pub fn slice_lines(&self, start_line: u32, end_line: u32) -> String {
        if start_line == 0 || end_line < start_line {
            return String::new();
        }
        let lines: Vec<&str> = self.content.lines().collect();
        let start = (start_line as usize - 1).min(lines.len());
        let end = (end_line as usize).min(lines.len());
        lines[start..end].join("\n")
    }
}

/// A highlighted section of code within a scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeHighlight {
    // @field: Path of the highlighted file
    pub file_path: String,

    // @field: First highlighted line (1-based; 0 means unknown)
    pub start_line: u32,

    // @field: Last highlighted line (inclusive; 0 means unknown)
    pub end_line: u32,

    // @field: Narration for the highlight
    pub description: String,

    // @field: Code excerpt (may be empty)
    #[serde(default)]
    pub code: String,
}

impl CodeHighlight {
    pub fn new(
        file_path: impl Into<String>,
        start_line: u32,
        end_line: u32,
        description: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        CodeHighlight {
            file_path: file_path.into(),
            start_line,
            end_line,
            description: description.into(),
            code: code.into(),
        }
    }

    /// Whether the line range was actually parsed rather than defaulted
    pub fn has_known_range(&self) -> bool {
        self.start_line > 0 && self.end_line >= self.start_line
    }
}

/// A single narrated scene in the explanation script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    // @field: Scene title
    pub title: String,

    // @field: Narration length in seconds
    pub duration: u32,

    // @field: Scene narration text
    pub content: String,

    // @field: Code highlights in playback order
    #[serde(default)]
    pub code_highlights: Vec<CodeHighlight>,
}

impl Scene {
    pub fn new(title: impl Into<String>, duration: u32, content: impl Into<String>) -> Self {
        Scene {
            title: title.into(),
            duration,
            content: content.into(),
            code_highlights: Vec::new(),
        }
    }
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}s, {} highlight(s))",
            self.title,
            self.duration,
            self.code_highlights.len()
        )
    }
}

/// The complete explanation script
///
/// Scene order is playback order. The script is the sole aggregate handed to
/// external collaborators (persistence, rendering) and is never mutated after
/// assembly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    // @field: Scenes in narration order
    pub scenes: Vec<Scene>,
}

impl Script {
    pub fn new(scenes: Vec<Scene>) -> Self {
        Script { scenes }
    }

    /// Total runtime of the script in seconds
    pub fn total_duration(&self) -> u32 {
        self.scenes.iter().map(|s| s.duration).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Render the script in the documented Markdown grammar
    ///
    /// The output round-trips through `MarkdownScriptParser` up to whitespace
    /// normalization of content and descriptions.
    pub fn to_markdown(&self) -> String {
        let mut markdown = String::from("# Code Explanation Script\n\n");

        for scene in &self.scenes {
            markdown.push_str(&format!("## {} ({}s)\n\n", scene.title, scene.duration));
            markdown.push_str(&format!("{}\n\n", scene.content));

            if !scene.code_highlights.is_empty() {
                markdown.push_str("### Code Highlights\n\n");
                for highlight in &scene.code_highlights {
                    markdown.push_str(&format!(
                        "**{}** (lines {}-{}):\n",
                        highlight.file_path, highlight.start_line, highlight.end_line
                    ));
                    if !highlight.code.is_empty() {
                        markdown.push_str(&format!("```\n{}\n```\n", highlight.code));
                    }
                    markdown.push_str(&format!("{}\n\n", highlight.description));
                }
            }

            markdown.push_str("---\n\n");
        }

        markdown
    }
}
