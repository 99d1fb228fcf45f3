//! LookSim generation service
//!
//! HTTP handlers that forward hairstyle edits to Gemini, OpenAI and Replicate,
//! a create-then-poll client for asynchronous provider jobs, and S3 upload of
//! reference images.

pub mod app_state;
pub mod config;
pub mod models;
pub mod routes;
pub mod services;
