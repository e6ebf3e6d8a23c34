use serde::{Deserialize, Serialize};

/// Profile snapshot of the acting user, as last seen by the front-end.
///
/// Every field is overwritten on every upsert (last-write-wins); there is
/// no partial merge of profile fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    /// Stable external identifier
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub language_code: String,
}

impl UserProfile {
    /// Creates a profile with placeholder fields for transports that only
    /// carry the user id.
    pub fn unknown(id: i64) -> Self {
        Self {
            id,
            is_bot: false,
            first_name: "unknown".to_string(),
            last_name: "unknown".to_string(),
            username: "unknown".to_string(),
            language_code: "unknown".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_profile() {
        let user = UserProfile::unknown(42);
        assert_eq!(user.id, 42);
        assert!(!user.is_bot);
        assert_eq!(user.first_name, "unknown");
    }
}
