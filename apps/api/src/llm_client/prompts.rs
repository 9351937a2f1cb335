// Shared prompt fragments.
// Each feature that calls the generative backend keeps its own prompts.rs;
// this file holds the pieces they have in common.

/// Closing instruction for prompts that expect a JSON answer.
///
/// Models still wrap answers in code fences or prose now and then, which is
/// why callers parse with `llm_client::extract_json`.
pub const JSON_ONLY_INSTRUCTION: &str = "Ensure the response is valid JSON.";
