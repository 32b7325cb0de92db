use std::fmt;

use serde::{Deserialize, Serialize};

use super::identity::Role;

/// An opaque bearer token. The client never looks inside it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw token, returning `None` for blank input.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            None
        } else {
            Some(Credential(token))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

// Tokens must never end up in logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(<{} chars>)", self.0.len())
    }
}

/// What `/token` and `/google-login` hand back on success.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_credential_is_none() {
        assert!(Credential::new("").is_none());
        assert!(Credential::new("  \n").is_none());
    }

    #[test]
    fn test_credential_trims_and_formats_bearer() {
        let credential = Credential::new(" abc.def \n").expect("non-blank token");
        assert_eq!(credential.as_str(), "abc.def");
        assert_eq!(credential.bearer(), "Bearer abc.def");
    }

    #[test]
    fn test_debug_redacts_token() {
        let credential = Credential::new("secret-token").expect("non-blank token");
        let rendered = format!("{:?}", credential);
        assert!(!rendered.contains("secret-token"));
    }

    #[test]
    fn test_token_grant_decodes() {
        let grant: TokenGrant = serde_json::from_str(
            r#"{"access_token": "tok", "token_type": "bearer", "role": "student"}"#,
        )
        .expect("grant should decode");
        assert_eq!(grant.access_token, "tok");
        assert_eq!(grant.role, Role::Student);
    }
}
