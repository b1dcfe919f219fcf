//! Narrative summary of check results.
//!
//! The language model writes the summary when a credential is configured.
//! Without one, or when the call fails, a fixed Markdown template is rendered
//! from the results alone.

use crate::ServiceResult;
use crate::llm::{ChatModel, ChatRequest, LlmError, LlmSettings};

const CONTEXT_CHARS: usize = 500;
const SUMMARY_TEMPERATURE: f64 = 0.5;

const SUMMARY_SYSTEM_PROMPT: &str = "You are an expert at analyzing plagiarism and AI detection results.
Generate a clear, helpful summary for the user. Include:
1. How much plagiarism was found (percentage if available)
2. How much AI-generated content was detected
3. Which parts look suspicious (if identifiable)
4. What the user should do next (clear recommendations)

Be concise but thorough. Use a friendly, helpful tone.";

/// Produce the user-facing summary. Never fails.
pub async fn summarize(
    text: &str,
    plagiarism: &[ServiceResult],
    ai_detection: &[ServiceResult],
    llm: &dyn ChatModel,
    llm_settings: &LlmSettings,
) -> String {
    if llm_settings.api_key.is_empty() {
        return fallback_summary(plagiarism, ai_detection, None);
    }

    let context = results_context(text, plagiarism, ai_detection);
    let request = ChatRequest {
        base_url: &llm_settings.base_url,
        api_key: &llm_settings.api_key,
        model: &llm_settings.model,
        system: SUMMARY_SYSTEM_PROMPT,
        user: &context,
        temperature: SUMMARY_TEMPERATURE,
    };

    let error = match llm.complete(request).await {
        Ok(summary) if !summary.trim().is_empty() => return summary,
        Ok(_) => LlmError::EmptyResponse,
        Err(e) => e,
    };

    tracing::warn!(error = %error, "summary generation failed, using template");
    fallback_summary(plagiarism, ai_detection, Some(&error.to_string()))
}

/// Render the prompt context sent to the language model.
pub fn results_context(
    text: &str,
    plagiarism: &[ServiceResult],
    ai_detection: &[ServiceResult],
) -> String {
    let preview: String = text.chars().take(CONTEXT_CHARS).collect();
    let mut out = format!("Text being analyzed (first 500 chars): {preview}...\n\n");

    out.push_str("PLAGIARISM CHECK RESULTS:\n");
    push_context_lines(
        &mut out,
        plagiarism,
        "- No plagiarism checkers were enabled or available.\n",
    );

    out.push_str("\nAI DETECTION RESULTS:\n");
    push_context_lines(
        &mut out,
        ai_detection,
        "- No AI detectors were enabled or available.\n",
    );

    out
}

fn push_context_lines(out: &mut String, results: &[ServiceResult], when_empty: &str) {
    if results.is_empty() {
        out.push_str(when_empty);
        return;
    }
    for r in results {
        match r.error() {
            None => {
                let payload = serde_json::to_string(r.payload()).unwrap_or_default();
                out.push_str(&format!("- {}: {}\n", r.service_name(), payload));
            }
            Some(err) => out.push_str(&format!("- {}: Error - {}\n", r.service_name(), err)),
        }
    }
}

/// Deterministic Markdown summary built only from the results.
///
/// `error` adds a note explaining why the language model was not used.
pub fn fallback_summary(
    plagiarism: &[ServiceResult],
    ai_detection: &[ServiceResult],
    error: Option<&str>,
) -> String {
    let mut out = String::from("## Analysis Summary\n\n");

    if let Some(error) = error {
        out.push_str(&format!(
            "*Note: AI summary generation encountered an issue: {error}*\n\n"
        ));
    }

    out.push_str("### Plagiarism Check\n");
    push_category(
        &mut out,
        plagiarism,
        "Check completed",
        "No plagiarism checkers were enabled.\n",
    );

    out.push_str("\n### AI Content Detection\n");
    push_category(
        &mut out,
        ai_detection,
        "Detection completed",
        "No AI detectors were enabled.\n",
    );

    out.push_str("\n### Recommendations\n");
    out.push_str(
        "Review the detailed results from each service to understand the analysis findings.\n",
    );

    out
}

/// Successes first, then failures, each in input order.
fn push_category(out: &mut String, results: &[ServiceResult], done: &str, when_empty: &str) {
    if results.is_empty() {
        out.push_str(when_empty);
        return;
    }
    for r in results.iter().filter(|r| r.is_success()) {
        out.push_str(&format!("- **{}**: {}\n", r.service_name(), done));
    }
    for r in results.iter().filter(|r| !r.is_success()) {
        out.push_str(&format!(
            "- **{}**: {}\n",
            r.service_name(),
            r.error().unwrap_or_default()
        ));
    }
}
