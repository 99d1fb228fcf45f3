//! End-to-end tests against a running server with real provider keys
//!
//! These tests require:
//! 1. The API server (or the dev proxy) running
//! 2. REPLICATE_API_TOKEN / GEMINI_API_KEY configured on that server
//!
//! Run with: cargo test --test e2e_test -- --ignored --nocapture
//!
//! Set API_BASE_URL to override default (http://localhost:3000)

mod fixtures;

use fixtures::*;
use serde_json::{json, Value};
use std::time::Duration;

/// Get base URL from env or default to localhost
fn get_base_url() -> String {
    std::env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

fn client() -> reqwest::Client {
    // Longer than the server's own poll window.
    reqwest::Client::builder()
        .timeout(Duration::from_secs(200))
        .build()
        .expect("Failed to build client")
}

#[tokio::test]
#[ignore] // Requires running API server
async fn test_e2e_health_check() {
    let response = client()
        .get(format!("{}/health", get_base_url()))
        .send()
        .await
        .expect("Health check failed");

    assert!(
        response.status().is_success(),
        "Health check returned non-success status: {}",
        response.status()
    );

    let body: Value = response.json().await.expect("Health body was not JSON");
    println!("✓ Health check passed, providers: {}", body["providers"]);
}

#[tokio::test]
#[ignore] // Requires running API server and a Replicate token
async fn test_e2e_replicate_generation() {
    let style = &STYLE_FIXTURES[1];
    println!("Generating style: {}", style.style_id);

    let response = client()
        .post(format!("{}/api/generate-replicate", get_base_url()))
        .json(&json!({
            "image": portrait_data_uri(),
            "prompt": style.prompt,
            "styleId": style.style_id
        }))
        .send()
        .await
        .expect("Request failed");

    let status = response.status();
    let body: Value = response.json().await.expect("Response was not JSON");
    assert!(status.is_success(), "Generation failed ({status}): {body}");
    assert_eq!(body["success"], true);

    let image = body["resultImage"].as_str().expect("resultImage missing");
    assert!(image.starts_with("data:image/"), "not a data URI: {}", &image[..32.min(image.len())]);
    println!("✓ Received {} chars of image data", image.len());
}

#[tokio::test]
#[ignore] // Requires running API server and a Replicate token
async fn test_e2e_hair_png() {
    let style = &STYLE_FIXTURES[0];

    let response = client()
        .post(format!("{}/api/generate-hair-png", get_base_url()))
        .json(&json!({ "stylePrompt": style.prompt, "gender": style.gender }))
        .send()
        .await
        .expect("Request failed");

    let status = response.status();
    let body: Value = response.json().await.expect("Response was not JSON");
    assert!(status.is_success(), "Hair PNG failed ({status}): {body}");
    assert!(body["hairPngUrl"].as_str().unwrap_or_default().starts_with("data:"));
    println!("✓ Hair PNG received, transparent: {}", body["hasTransparency"]);
}
