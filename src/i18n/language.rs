//! Language tags.

use std::fmt;
use std::str::FromStr;

use serde::{
    Deserialize,
    Serialize,
};

use super::I18nError;

/// Longest tag accepted (e.g. `zh-hant-tw` fits comfortably).
const MAX_CODE_LEN: usize = 16;

/// A validated, normalised language tag such as `en`, `hi` or `pt-br`.
///
/// Normalisation lowercases the tag and uses `-` as the subtag separator, so
/// `pt_BR`, `PT-br` and `pt-br` are the same language. Only ASCII letters and
/// digits are allowed in subtags, which also makes the code safe to embed in
/// a URL path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageCode(String);

impl LanguageCode {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Primary subtag (`pt` for `pt-br`).
    #[must_use]
    pub fn primary(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }
}

/// Lowercase and replace `_` with `-`.
fn normalize_language_code(code: &str) -> String {
    code.trim().to_lowercase().replace('_', "-")
}

impl FromStr for LanguageCode {
    type Err = I18nError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let code = normalize_language_code(raw);
        let invalid = || I18nError::InvalidLanguageCode(raw.to_string());

        if code.is_empty() || code.len() > MAX_CODE_LEN {
            return Err(invalid());
        }

        let mut subtags = code.split('-');
        let primary = subtags.next().ok_or_else(invalid)?;
        if !(2..=3).contains(&primary.len()) || !primary.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid());
        }
        if subtags.any(|tag| tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric())) {
            return Err(invalid());
        }

        Ok(Self(code))
    }
}

impl TryFrom<String> for LanguageCode {
    type Error = I18nError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LanguageCode> for String {
    fn from(code: LanguageCode) -> Self {
        code.0
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
