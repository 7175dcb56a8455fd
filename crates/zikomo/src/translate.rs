//! A client for LibreTranslate-compatible translation services.

use std::fmt::{self, Debug};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use zikomo_core::filter::{TranslateError, Translator};

#[derive(Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'static str,
    target: &'a str,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

/// Translates text with a LibreTranslate server.
#[derive(Clone)]
pub struct LibreTranslator {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl LibreTranslator {
    /// Creates a translator for the server at `base_url`.
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key: None,
        }
    }

    /// Sets the API key sent with every request.
    #[inline]
    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

#[async_trait]
impl Translator for LibreTranslator {
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> Result<String, TranslateError> {
        let body = TranslateRequest {
            q: text,
            source: "auto",
            target: target_language,
            format: "text",
            api_key: self.api_key.as_deref(),
        };
        let resp = self
            .client
            .post(format!("{}/translate", self.base_url))
            .json(&body)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|err| TranslateError::new(err.to_string()))?;
        let resp: TranslateResponse = resp
            .json()
            .await
            .map_err(|err| TranslateError::new(err.to_string()))?;
        trace!("translated into `{target_language}`");
        Ok(resp.translated_text)
    }
}

impl Debug for LibreTranslator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibreTranslator")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
