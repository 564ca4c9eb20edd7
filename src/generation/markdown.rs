/*!
 * Markdown script parsing.
 *
 * This module converts raw provider output in the documented Markdown grammar
 * into scenes, using an explicit finite-state machine with one transition
 * function per state. Parsing is deliberately best-effort and never fails:
 * generative models drift from the requested format, and unparsable
 * structural lines degrade to plain narration text instead of aborting.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::script::{CodeHighlight, Scene, SourceFile};

/// Duration applied when a scene header has no parsable positive `(<N>s)` suffix
pub const DEFAULT_SCENE_DURATION: u32 = 20;

// @const: Scene header title/duration suffix, e.g. "Main Loop (25s)"
static DURATION_SUFFIX_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?)\s*\((\d+)s\)\s*$").unwrap());

// @const: Highlight header, e.g. "**main.py** (lines 10-15):"
static HIGHLIGHT_HEADER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\*\*(.+?)\*\*\s*(.*)$").unwrap());

// @const: Line-range suffix of a highlight header
static LINE_RANGE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(lines\s+(\d+)\s*[-\x{2013}]\s*(\d+)\)").unwrap());

/// Parser state, one variant per structural context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// Before the first scene header, or after a `---` terminator
    Outside,
    /// Inside a scene, accumulating narration content
    InSceneBody,
    /// Just after a highlight header, before code or description text
    InHighlightHeader,
    /// Inside a fenced code block, accumulating verbatim lines
    InCodeBlock,
    /// Accumulating the highlight's description text
    InDescription,
}

#[derive(Default)]
struct SceneBuilder {
    title: String,
    duration: u32,
    content_lines: Vec<String>,
    highlights: Vec<CodeHighlight>,
}

#[derive(Default)]
struct HighlightBuilder {
    file_path: String,
    start_line: u32,
    end_line: u32,
    description_lines: Vec<String>,
    code_lines: Vec<String>,
}

/// Best-effort Markdown-to-scenes parser
///
/// Holds the original source files so a highlight header with no fenced code
/// block can fall back to slicing the referenced line range out of the file.
pub struct MarkdownScriptParser<'a> {
    files: &'a [SourceFile],
}

impl<'a> MarkdownScriptParser<'a> {
    pub fn new(files: &'a [SourceFile]) -> Self {
        MarkdownScriptParser { files }
    }

    /// Parse raw Markdown into scenes; never fails
    pub fn parse(&self, raw: &str) -> Vec<Scene> {
        let mut scenes = Vec::new();
        let mut scene: Option<SceneBuilder> = None;
        let mut highlight: Option<HighlightBuilder> = None;
        let mut state = ParseState::Outside;

        for line in raw.lines() {
            state = match state {
                ParseState::Outside => self.step_outside(line, &mut scene),
                ParseState::InSceneBody => {
                    self.step_scene_body(line, &mut scenes, &mut scene, &mut highlight)
                }
                ParseState::InHighlightHeader | ParseState::InDescription => {
                    self.step_description(line, state, &mut scenes, &mut scene, &mut highlight)
                }
                ParseState::InCodeBlock => Self::step_code_block(line, &mut highlight),
            };
        }

        // Anything still open at end of input is flushed
        self.close_highlight(&mut scene, &mut highlight);
        close_scene(&mut scenes, &mut scene);

        scenes
    }

    /// Outside any scene: only a scene header is meaningful, everything else
    /// is discarded
    fn step_outside(&self, line: &str, scene: &mut Option<SceneBuilder>) -> ParseState {
        let trimmed = line.trim();
        if let Some(builder) = parse_scene_header(trimmed) {
            *scene = Some(builder);
            ParseState::InSceneBody
        } else {
            ParseState::Outside
        }
    }

    /// Inside a scene body: headers and rules are control lines, the rest is
    /// narration content
    fn step_scene_body(
        &self,
        line: &str,
        scenes: &mut Vec<Scene>,
        scene: &mut Option<SceneBuilder>,
        highlight: &mut Option<HighlightBuilder>,
    ) -> ParseState {
        let trimmed = line.trim();

        if let Some(builder) = parse_scene_header(trimmed) {
            close_scene(scenes, scene);
            *scene = Some(builder);
            return ParseState::InSceneBody;
        }
        if trimmed == "---" {
            close_scene(scenes, scene);
            return ParseState::Outside;
        }
        if let Some(h) = parse_highlight_header(trimmed) {
            *highlight = Some(h);
            return ParseState::InHighlightHeader;
        }
        if is_section_marker(trimmed) {
            return ParseState::InSceneBody;
        }

        if let Some(s) = scene.as_mut() {
            push_text_line(&mut s.content_lines, trimmed);
        }
        ParseState::InSceneBody
    }

    /// After a highlight header: a fence opens the code block, control lines
    /// close the highlight, anything else is description text
    fn step_description(
        &self,
        line: &str,
        state: ParseState,
        scenes: &mut Vec<Scene>,
        scene: &mut Option<SceneBuilder>,
        highlight: &mut Option<HighlightBuilder>,
    ) -> ParseState {
        let trimmed = line.trim();

        if trimmed.starts_with("```") {
            return ParseState::InCodeBlock;
        }
        if let Some(builder) = parse_scene_header(trimmed) {
            self.close_highlight(scene, highlight);
            close_scene(scenes, scene);
            *scene = Some(builder);
            return ParseState::InSceneBody;
        }
        if trimmed == "---" {
            self.close_highlight(scene, highlight);
            close_scene(scenes, scene);
            return ParseState::Outside;
        }
        if let Some(next) = parse_highlight_header(trimmed) {
            self.close_highlight(scene, highlight);
            *highlight = Some(next);
            return ParseState::InHighlightHeader;
        }
        if is_section_marker(trimmed) {
            return state;
        }

        if let Some(h) = highlight.as_mut() {
            push_text_line(&mut h.description_lines, trimmed);
        }
        ParseState::InDescription
    }

    /// Inside a fenced block: everything accumulates verbatim until the
    /// closing fence
    fn step_code_block(line: &str, highlight: &mut Option<HighlightBuilder>) -> ParseState {
        if line.trim().starts_with("```") {
            return ParseState::InDescription;
        }
        if let Some(h) = highlight.as_mut() {
            h.code_lines.push(line.to_string());
        }
        ParseState::InCodeBlock
    }

    /// Append the open highlight to its scene, synthesizing code from the
    /// original source file when no fenced block was seen
    fn close_highlight(
        &self,
        scene: &mut Option<SceneBuilder>,
        highlight: &mut Option<HighlightBuilder>,
    ) {
        let Some(h) = highlight.take() else {
            return;
        };
        let Some(s) = scene.as_mut() else {
            return;
        };

        let mut code = h.code_lines.join("\n");
        if code.is_empty() && h.start_line > 0 {
            if let Some(file) = self.files.iter().find(|f| f.path == h.file_path) {
                code = file.slice_lines(h.start_line, h.end_line);
            }
        }

        s.highlights.push(CodeHighlight {
            file_path: h.file_path,
            start_line: h.start_line,
            end_line: h.end_line,
            description: h.description_lines.join("\n").trim().to_string(),
            code,
        });
    }
}

fn close_scene(scenes: &mut Vec<Scene>, scene: &mut Option<SceneBuilder>) {
    if let Some(s) = scene.take() {
        scenes.push(Scene {
            title: s.title,
            duration: s.duration,
            content: s.content_lines.join("\n").trim().to_string(),
            code_highlights: s.highlights,
        });
    }
}

/// Recognize `## <title> (<N>s)`; duration defaults when the suffix is
/// missing or unparsable
fn parse_scene_header(trimmed: &str) -> Option<SceneBuilder> {
    let rest = trimmed.strip_prefix("## ")?;
    let (title, duration) = match DURATION_SUFFIX_REGEX.captures(rest) {
        Some(caps) => {
            let title = caps.get(1).map_or("", |m| m.as_str()).trim().to_string();
            // Zero and overflow fall back like a missing suffix
            let duration = caps[2]
                .parse()
                .ok()
                .filter(|&d| d > 0)
                .unwrap_or(DEFAULT_SCENE_DURATION);
            (title, duration)
        }
        None => (rest.trim().to_string(), DEFAULT_SCENE_DURATION),
    };
    Some(SceneBuilder {
        title,
        duration,
        ..SceneBuilder::default()
    })
}

/// Recognize `**<file>** (lines <start>-<end>):`; an unparsable range is the
/// "unknown" 0-0 range, not an error
fn parse_highlight_header(trimmed: &str) -> Option<HighlightBuilder> {
    let caps = HIGHLIGHT_HEADER_REGEX.captures(trimmed)?;
    let file_path = caps[1].trim().to_string();
    let suffix = caps.get(2).map_or("", |m| m.as_str());

    let (start_line, end_line) = match LINE_RANGE_REGEX.captures(suffix) {
        Some(range) => {
            let start = range[1].parse().unwrap_or(0);
            let end = range[2].parse().unwrap_or(0);
            (start, end)
        }
        None => (0, 0),
    };

    Some(HighlightBuilder {
        file_path,
        start_line,
        end_line,
        ..HighlightBuilder::default()
    })
}

fn is_section_marker(trimmed: &str) -> bool {
    trimmed.starts_with("###")
}

fn push_text_line(buffer: &mut Vec<String>, trimmed: &str) {
    // Leading blank lines never start a buffer
    if trimmed.is_empty() && buffer.is_empty() {
        return;
    }
    buffer.push(trimmed.to_string());
}
