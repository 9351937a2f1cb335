// Prompt template for the generative keyword comparison.

use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;

/// One-shot comparison prompt. Both inputs are embedded verbatim.
pub fn build_keyword_comparison_prompt(job_description: &str, resume_text: &str) -> String {
    format!(
        r#"Compare the following job description with the resume text and identify matching and missing keywords:

Job Description:
{job_description}

Resume:
{resume_text}

Please provide the analysis in the following JSON format:
{{
  "matching": ["<array of keywords that appear in both the job description and resume>"],
  "missing": ["<array of important keywords from the job description that are missing in the resume>"],
  "score": <integer match percentage from 0-100>
}}

{JSON_ONLY_INSTRUCTION}"#
    )
}
