//! Prompts for the upstream narrative call.
//!
//! The narrative is parsed by the deterministic extractor, so the prompt
//! pins the output to three headed sections of bullet items:
//! 1. System prompt (fixed)
//! 2. Study context (study type, image findings)
//! 3. The report text

use radlens_core::AnalysisInput;

use crate::config::CompletionSettings;
use crate::providers::GenerationRequest;

/// System prompt for the narrative generator.
pub const SYSTEM_PROMPT: &str = r#"
You are assisting with structured review of a radiology report.

You restate what the report says. You do not diagnose.
You do not add findings that are not supported by the report or the
supplied image findings.

## Output Format
Respond with exactly three sections, each a heading followed by bullet
items starting with "- ":

FINDINGS:
- one observation per bullet, in the order the report gives them

IMPRESSION:
- the overall interpretation, one bullet per distinct conclusion

RECOMMENDATIONS:
- concrete next steps, at most three

## Wording
- Keep the report's own hedging words ("possible", "probable") when present
- Use "urgent" or "acute" only if the report or image findings justify it
- Mention any disagreement between the report and the image findings
"#;

/// User prompt for one analysis.
pub fn analysis_prompt(input: &AnalysisInput) -> String {
    let mut prompt = format!("Study type: {}\n", input.study_type().label());

    if input.has_images() {
        prompt.push_str("\nImage findings:\n");
        for finding in input.image_findings() {
            prompt.push_str("- ");
            prompt.push_str(finding);
            prompt.push('\n');
        }
    } else {
        prompt.push_str("\nNo images were supplied.\n");
    }

    prompt.push_str("\nReport:\n\"\"\"\n");
    prompt.push_str(input.report_text().trim());
    prompt.push_str("\n\"\"\"\n");

    prompt
}

/// Full generation request for `input`.
pub fn generation_request(
    input: &AnalysisInput,
    settings: &CompletionSettings,
    timeout: std::time::Duration,
) -> GenerationRequest {
    GenerationRequest {
        system: SYSTEM_PROMPT.trim().to_string(),
        prompt: analysis_prompt(input),
        model: settings.model.clone(),
        max_tokens: settings.max_tokens,
        temperature: settings.temperature,
        timeout,
    }
}
