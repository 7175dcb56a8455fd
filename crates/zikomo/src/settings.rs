//! Settings read from environment variables.

use std::env;
use std::error::Error;
use std::fmt::{self, Debug, Display};
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::time::Duration;

use zikomo_core::AgentConfig;

/// A missing or malformed environment variable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettingsError {
    var: &'static str,
    reason: String,
}

impl SettingsError {
    fn new<S: Into<String>>(var: &'static str, reason: S) -> Self {
        Self {
            var,
            reason: reason.into(),
        }
    }

    /// Returns the name of the offending variable.
    #[inline]
    pub fn var(&self) -> &'static str {
        self.var
    }
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.var, self.reason)
    }
}

impl Error for SettingsError {}

/// Everything the binary needs to start a session.
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    /// `OPENAI_API_KEY`, required.
    pub api_key: String,
    /// `OPENAI_BASE_URL`.
    pub base_url: Option<String>,
    /// `OPENAI_MODEL`.
    pub model: Option<String>,
    /// `ZIKOMO_MAX_STEPS`, `ZIKOMO_TOOL_TIMEOUT_SECS`,
    /// `ZIKOMO_ORACLE_TIMEOUT_SECS` and `ZIKOMO_TARGET_LANGUAGE`.
    pub agent: AgentConfig,
    /// `ZIKOMO_TRANSLATE_URL`.
    pub translate_url: Option<String>,
    /// `ZIKOMO_TRANSLATE_API_KEY`.
    pub translate_api_key: Option<String>,
}

impl Settings {
    /// Reads the settings from the process environment.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads the settings through `lookup`, which returns the value of a
    /// variable if it's set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &'static str| {
            lookup(name).filter(|value| !value.trim().is_empty())
        };

        let Some(api_key) = get("OPENAI_API_KEY") else {
            return Err(SettingsError::new("OPENAI_API_KEY", "not set"));
        };

        let mut agent = AgentConfig::default();
        if let Some(max_steps) = parse::<NonZeroUsize>(&get, "ZIKOMO_MAX_STEPS")?
        {
            agent = agent.with_max_steps(max_steps);
        }
        if let Some(secs) = parse::<u64>(&get, "ZIKOMO_TOOL_TIMEOUT_SECS")? {
            agent = agent.with_tool_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = parse::<u64>(&get, "ZIKOMO_ORACLE_TIMEOUT_SECS")? {
            agent = agent.with_oracle_timeout(Duration::from_secs(secs));
        }
        if let Some(lang) = get("ZIKOMO_TARGET_LANGUAGE") {
            agent = agent.with_target_language(lang.trim());
        }

        Ok(Self {
            api_key,
            base_url: get("OPENAI_BASE_URL"),
            model: get("OPENAI_MODEL"),
            agent,
            translate_url: get("ZIKOMO_TRANSLATE_URL"),
            translate_api_key: get("ZIKOMO_TRANSLATE_API_KEY"),
        })
    }
}

fn parse<T>(
    get: impl Fn(&'static str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, SettingsError>
where
    T: FromStr,
    T::Err: Display,
{
    let Some(value) = get(var) else {
        return Ok(None);
    };
    match value.trim().parse() {
        Ok(value) => Ok(Some(value)),
        Err(err) => Err(SettingsError::new(
            var,
            format!("invalid value `{value}` ({err})"),
        )),
    }
}

impl Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("agent", &self.agent)
            .field("translate_url", &self.translate_url)
            .finish_non_exhaustive()
    }
}
