// Prompt templates for generative resume analysis.

/// Resume analysis prompt. Replace `{resume_text}` and `{json_instruction}` before sending.
pub const RESUME_ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyze the following resume and provide detailed feedback:

{resume_text}

Please provide the analysis in the following JSON format:
{
  "score": <overall score from 0-100>,
  "contentQuality": <score from 0-100>,
  "atsCompatibility": <score from 0-100>,
  "keywordOptimization": <score from 0-100>,
  "suggestions": [<array of improvement suggestions>],
  "keywords": {
    "present": [<array of keywords present in the resume>],
    "missing": [<array of important keywords missing from the resume>]
  },
  "sections": {
    "summary": {
      "clarity": <score from 0-10>,
      "impact": <score from 0-10>,
      "feedback": "<specific feedback for this section>"
    },
    "experience": {
      "achievementFocus": <score from 0-10>,
      "quantifiableResults": <score from 0-10>,
      "feedback": "<specific feedback for this section>"
    },
    "skills": {
      "relevance": <score from 0-10>,
      "organization": <score from 0-10>,
      "feedback": "<specific feedback for this section>"
    }
  }
}

{json_instruction}"#;

pub fn build_resume_analysis_prompt(resume_text: &str) -> String {
    RESUME_ANALYSIS_PROMPT_TEMPLATE
        .replace("{json_instruction}", crate::llm_client::prompts::JSON_ONLY_INSTRUCTION)
        .replace("{resume_text}", resume_text)
}
