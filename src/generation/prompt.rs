/*!
 * Prompt construction for script generation.
 *
 * Builds the system prompt and the per-batch user prompts for both response
 * formats, plus the cross-batch overview prompt.
 */

use std::collections::BTreeMap;

use crate::app_config::{Depth, Proficiency};
use crate::script::SourceFile;

// @const: Scene grammar block shared by the batch and overview prompts; the
// overview runs on a fresh message list, so it must restate the format
const SCENE_FORMAT: &str = "Follow this exact format for each scene:\n\n\
     ## Scene Title (duration in seconds)\n\
     [Scene content here]\n\n\
     ### Code Highlights\n\
     **file_path.py** (lines X-Y):\n\
     [Description of the highlighted code]\n\n\
     ---\n";

/// System prompt guiding the provider, tuned by proficiency level
pub fn system_prompt(proficiency: Proficiency) -> String {
    let base = "You are an expert code explainer. Your task is to generate a script for explaining code.\n\
        Follow these guidelines:\n\
        1. Break down the explanation into scenes (15-30 seconds each)\n\
        2. Each scene should focus on 1-2 concepts\n\
        3. Include specific code highlights for each scene\n\
        4. Use analogies and examples where appropriate\n\
        5. Each scene must have a title and duration\n\
        6. Each code highlight must specify the file path and line numbers";

    let tuning = match proficiency {
        Proficiency::Beginner => {
            "Focus on basic concepts, use simple analogies, and explain everything step by step. \
             Aim for 3-5 scenes per function."
        }
        Proficiency::Intermediate => {
            "Focus on why things work the way they do, with some technical details. \
             Aim for 2-3 scenes per function."
        }
        Proficiency::Expert => {
            "Focus on edge cases, performance implications, and advanced concepts. \
             Aim for 1-2 scenes per function."
        }
    };

    format!("{}\n{}", base, tuning)
}

/// User prompt requesting the Markdown script grammar for one batch
pub fn markdown_batch_prompt(files: &[SourceFile], proficiency: Proficiency, depth: Depth) -> String {
    let mut prompt = format!(
        "Please analyze the following code and generate an explanation script.\n\
         {}\n\
         For example:\n\
         ## Main Function Overview (25s)\n\
         This function handles the core logic of our application. It takes user input, \
         processes it through several steps, and returns a formatted result.\n\n\
         ### Code Highlights\n\
         **main.py** (lines 10-15):\n\
         The function signature and input validation logic ensure we only process valid data.\n\n\
         ---\n\n\
         Now, analyze these files:\n",
        SCENE_FORMAT
    );

    push_parameters(&mut prompt, proficiency, depth);
    push_files(&mut prompt, files);
    prompt
}

/// User prompt requesting the chaptered JSON payload for one batch
pub fn json_batch_prompt(files: &[SourceFile], proficiency: Proficiency, depth: Depth) -> String {
    let mut prompt = String::from(
        "Please analyze the following code and generate an explanation script as JSON.\n\
         Respond with exactly one JSON object matching this schema, and nothing else:\n\n\
         {\n\
           \"chapters\": [\n\
             {\n\
               \"title\": string,\n\
               \"files\": [string],\n\
               \"scenes\": [\n\
                 {\n\
                   \"title\": string,\n\
                   \"duration\": integer,\n\
                   \"explanation\": string,\n\
                   \"code\": string,\n\
                   \"type_of_code\": string\n\
                 }\n\
               ]\n\
             }\n\
           ]\n\
         }\n\n\
         Every field is required. Use an empty string for \"code\" when a scene has no excerpt.\n\n\
         Now, analyze these files:\n",
    );

    push_parameters(&mut prompt, proficiency, depth);
    push_files(&mut prompt, files);
    prompt
}

/// One-shot prompt for the best-effort repository overview
///
/// Carries the full path listing plus a map of already-covered files to
/// their scene titles so the overview does not repeat detail scenes.
pub fn overview_prompt(
    all_paths: &[String],
    covered: &BTreeMap<String, Vec<String>>,
    proficiency: Proficiency,
) -> String {
    let mut prompt = format!(
        "Generate a short high-level overview of this repository as 1-3 scenes.\n\
         Do not repeat detail already covered; introduce the project, its structure, \
         and how the pieces fit together.\n\
         {}\n\
         Repository files:\n",
        SCENE_FORMAT
    );

    for path in all_paths {
        prompt.push_str(&format!("- {}\n", path));
    }

    prompt.push_str("\nFiles already covered, with their scene titles:\n");
    for (path, titles) in covered {
        prompt.push_str(&format!("- {}: {}\n", path, titles.join("; ")));
    }

    prompt.push_str(&format!("\nProficiency Level: {}\n", proficiency));
    prompt
}

fn push_parameters(prompt: &mut String, proficiency: Proficiency, depth: Depth) {
    prompt.push_str(&format!("\nProficiency Level: {}\n", proficiency));
    prompt.push_str(&format!("Depth: {}\n\n", depth));
}

fn push_files(prompt: &mut String, files: &[SourceFile]) {
    for file in files {
        prompt.push_str(&format!("File: {}\n", file.path));
        prompt.push_str(&format!("Content:\n{}\n\n", file.content));
    }
}
