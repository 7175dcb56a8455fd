//! Translation applied to entries before they are emitted.

use std::error::Error;
use std::fmt::{self, Debug, Display};
use std::sync::Arc;

use async_trait::async_trait;

use crate::transcript::{Content, Entry};

/// The error returned by a [`Translator`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TranslateError {
    message: String,
}

impl TranslateError {
    /// Creates a new error with the given message.
    #[inline]
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for TranslateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "translation failed: {}", self.message)
    }
}

impl Error for TranslateError {}

/// A translation service.
#[async_trait]
pub trait Translator: Send + Sync + 'static {
    /// Translates `text` into `target_language`.
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> Result<String, TranslateError>;
}

/// Translates the text of emitted entries into a target language.
///
/// The filter only changes what observers see, the transcript sent to the
/// oracle always keeps the original text. When the translator fails, the
/// original text is emitted instead.
#[derive(Clone)]
pub struct TranslationFilter {
    translator: Arc<dyn Translator>,
    target_language: String,
}

impl TranslationFilter {
    /// Creates a new filter.
    pub fn new<S: Into<String>>(
        translator: Arc<dyn Translator>,
        target_language: S,
    ) -> Self {
        Self {
            translator,
            target_language: target_language.into(),
        }
    }

    /// Returns the target language.
    #[inline]
    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    /// Translates `text`, falling back to `text` itself on failure.
    pub async fn apply(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return text.to_owned();
        }
        match self
            .translator
            .translate(text, &self.target_language)
            .await
        {
            Ok(translated) => translated,
            Err(err) => {
                warn!(
                    "failed to translate into `{}`, emitting the original \
                     text: {err}",
                    self.target_language
                );
                text.to_owned()
            }
        }
    }

    /// Returns the entry as observers should see it.
    ///
    /// Tool results are passed through untouched.
    pub(crate) async fn apply_entry(&self, entry: &Arc<Entry>) -> Arc<Entry> {
        let text = match entry.content() {
            Content::Text(text) => text,
            Content::ToolCalls { text, .. } => text,
            Content::ToolResult(_) => return Arc::clone(entry),
        };
        if text.trim().is_empty() {
            return Arc::clone(entry);
        }
        let translated = self.apply(text).await;
        Arc::new(entry.with_text(translated))
    }
}

impl Debug for TranslationFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationFilter")
            .field("target_language", &self.target_language)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::{Role, Transcript};

    struct Shouting;

    #[async_trait]
    impl Translator for Shouting {
        async fn translate(
            &self,
            text: &str,
            _target_language: &str,
        ) -> Result<String, TranslateError> {
            Ok(text.to_uppercase())
        }
    }

    struct Broken;

    #[async_trait]
    impl Translator for Broken {
        async fn translate(
            &self,
            _text: &str,
            _target_language: &str,
        ) -> Result<String, TranslateError> {
            Err(TranslateError::new("service unreachable"))
        }
    }

    #[tokio::test]
    async fn test_apply() {
        let filter = TranslationFilter::new(Arc::new(Shouting), "fr");
        assert_eq!(filter.apply("bonjour").await, "BONJOUR");
        assert_eq!(filter.apply("  ").await, "  ");
    }

    #[tokio::test]
    async fn test_fallback() {
        let filter = TranslationFilter::new(Arc::new(Broken), "fr");
        assert_eq!(filter.apply("Ndili bwino").await, "Ndili bwino");
    }

    #[tokio::test]
    async fn test_apply_entry() {
        let mut transcript = Transcript::default();
        let entry =
            Arc::clone(transcript.append(Role::User, Content::Text("hi".into())));
        let filter = TranslationFilter::new(Arc::new(Shouting), "fr");
        let translated = filter.apply_entry(&entry).await;
        assert_eq!(translated.seq(), entry.seq());
        assert_eq!(translated.role(), Role::User);
        assert_eq!(translated.text(), "HI");
    }
}
