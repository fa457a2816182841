//! Session data and authentication payloads.

use std::fmt;

use serde::{
    Deserialize,
    Serialize,
};
use serde_json::Value;

use crate::types::{
    ValidationError,
    check_email,
};

/// Who is signed in, or nobody.
///
/// Token and user always travel together: the only ways to build a record
/// are [`SessionRecord::anonymous`] and [`SessionRecord::authenticated`], and
/// a record is only ever replaced whole.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Bearer token issued by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    /// Server-defined user object, kept opaque
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<Value>,
}

impl SessionRecord {
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn authenticated(token: impl Into<String>, user: Value) -> Self {
        Self { token: Some(token.into()), user: Some(user) }
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    #[must_use]
    pub const fn user(&self) -> Option<&Value> {
        self.user.as_ref()
    }

    /// True iff a token is present. Validity is the server's business.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        self.token.is_none() && self.user.is_none()
    }

    /// Both halves present, or both absent. Records read back from storage
    /// that fail this check are discarded.
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        self.token.is_some() == self.user.is_some()
    }
}

impl fmt::Debug for SessionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRecord")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("user", &self.user)
            .finish()
    }
}

/// Body of `POST /auth/login`.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Body of `POST /auth/signup`.
#[derive(Clone, Serialize)]
pub struct SignupDetails {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Successful authentication response.
#[derive(Debug, Deserialize)]
pub(crate) struct AuthResponse {
    /// Issued token
    pub(crate) token: String,
    /// User object
    pub(crate) user: Value,
}

impl Credentials {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { email: email.into(), password: password.into() }
    }

    /// Required-field checks done before any request.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        check_email(&self.email, &mut errors);
        if self.password.is_empty() {
            errors.push(ValidationError::new("password", "A password is required"));
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl SignupDetails {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self { name: name.into(), email: email.into(), password: password.into() }
    }

    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(ValidationError::new("name", "A name is required"));
        }
        check_email(&self.email, &mut errors);
        if self.password.is_empty() {
            errors.push(ValidationError::new("password", "A password is required"));
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl fmt::Debug for SignupDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupDetails")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
