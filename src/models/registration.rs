use serde::{Deserialize, Serialize};

use super::identity::Role;

/// New-account payload for `POST /users/`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
}

impl Registration {
    /// Name of the first required field left blank, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("Email", &self.email),
            ("Password", &self.password),
            ("First name", &self.first_name),
            ("Last name", &self.last_name),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }
}
