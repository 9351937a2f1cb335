//! Resume analysis: upload validation, forwarding to the analysis service,
//! the result model and the text-only generative path.

pub mod forwarder;
pub mod handlers;
pub mod models;
pub mod prompts;
pub mod text_analyzer;
pub mod upload;
