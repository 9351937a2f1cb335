//! Keyword comparison between a job description and resume text.

pub mod comparator;
pub mod handlers;
pub mod models;
pub mod prompts;
