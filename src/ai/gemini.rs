//! Google Gemini table corrector.

use reqwest::blocking::Client;
use std::time::Duration;

use super::{build_prompt, is_placeholder_key, parse_response, TableCorrector};
use crate::error::{Error, Result};

/// Model used when none is configured.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash-latest";

/// Base URL of the Generative Language API.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Table corrector backed by the Gemini `generateContent` endpoint.
pub struct GeminiCorrector {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiCorrector {
    /// Create a corrector with the default model and a 60 second timeout.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_timeout(api_key, Duration::from_secs(60))
    }

    /// Create a corrector with a custom request timeout.
    pub fn with_timeout(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.into().trim().to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: GEMINI_API_BASE.to_string(),
        })
    }

    /// Use a different model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Send requests to a different API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Model name in use.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Check if a usable API key is configured.
    pub fn has_credentials(&self) -> bool {
        !is_placeholder_key(&self.api_key)
    }

    /// Full `generateContent` URL for the configured model.
    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// JSON request body for one raw table.
    pub fn request_body(raw_table: &str) -> serde_json::Value {
        serde_json::json!({
            "contents": [{ "parts": [{ "text": build_prompt(raw_table) }] }]
        })
    }
}

impl TableCorrector for GeminiCorrector {
    fn correct(&self, raw_table: &str) -> Result<String> {
        if !self.has_credentials() {
            log::warn!("Gemini API key is not set; leaving table unchanged");
            return Ok(raw_table.to_string());
        }

        let resp = self
            .client
            .post(self.endpoint())
            .header("content-type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(raw_table))
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            return Err(Error::Ai(format!("HTTP {}: {}", status.as_u16(), text.trim())));
        }

        let json: serde_json::Value = resp.json()?;
        parse_response(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let corrector = GeminiCorrector::new("key").unwrap();
        assert_eq!(
            corrector.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash-latest:generateContent"
        );

        let corrector = corrector
            .with_model("gemini-2.0-flash")
            .with_base_url("http://localhost:9000/");
        assert_eq!(
            corrector.endpoint(),
            "http://localhost:9000/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_placeholder_key_returns_input() {
        // Unroutable base URL: any request attempt would fail the test.
        let corrector = GeminiCorrector::new("<YOUR_GEMINI_API_KEY>")
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        assert!(!corrector.has_credentials());

        let table = "\\begin{longtable}{l}\nx\n\\end{longtable}";
        assert_eq!(corrector.correct(table).unwrap(), table);
    }

    #[test]
    fn test_request_body_shape() {
        let body = GeminiCorrector::request_body("RAW");
        let text = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(text.ends_with("RAW\n"));
    }
}
