pub mod editor;
pub mod gemini;
pub mod job_client;
pub mod openai;
pub mod pipeline;
pub mod prompt;
pub mod replicate;
pub mod storage;
