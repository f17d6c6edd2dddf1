use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Identifier assigned by the store. Never supplied by clients.
pub type UserId = u64;

/// A live user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

/// Input for [`crate::UserStore::create`]. Missing fields are represented as
/// empty strings and rejected by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

impl NewUser {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Partial update. A field that is `None` or empty is left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl UserPatch {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email: None,
        }
    }

    pub fn email(email: impl Into<String>) -> Self {
        Self {
            name: None,
            email: Some(email.into()),
        }
    }

    pub(crate) fn supplied_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|s| !s.is_empty())
    }

    pub(crate) fn supplied_email(&self) -> Option<&str> {
        self.email.as_deref().filter(|s| !s.is_empty())
    }

    /// True when the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.supplied_name().is_none() && self.supplied_email().is_none()
    }
}

/// Parse a path segment into a [`UserId`].
///
/// Only a non-empty run of ASCII digits that fits in a `u64` is accepted.
/// Signs, whitespace, decimals and anything else are rejected.
pub fn parse_user_id(raw: &str) -> Result<UserId, StoreError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(StoreError::invalid_argument("Invalid user ID"));
    }
    raw.parse::<UserId>()
        .map_err(|_| StoreError::invalid_argument("Invalid user ID"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_decimal_ids() {
        assert_eq!(parse_user_id("1"), Ok(1));
        assert_eq!(parse_user_id("0042"), Ok(42));
        assert_eq!(parse_user_id("999"), Ok(999));
    }

    #[test]
    fn rejects_malformed_ids() {
        for raw in ["", "abc", "1.5", "1a", " 1", "1 ", "-1", "+1", "0x10"] {
            assert!(
                matches!(parse_user_id(raw), Err(StoreError::InvalidArgument(_))),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_ids_that_overflow() {
        assert!(parse_user_id("99999999999999999999999").is_err());
    }

    #[test]
    fn empty_strings_do_not_count_as_supplied() {
        let patch = UserPatch {
            name: Some(String::new()),
            email: None,
        };
        assert!(patch.is_empty());
        assert!(!UserPatch::name("X").is_empty());
    }

    #[test]
    fn user_serializes_with_plain_field_names() {
        let user = User {
            id: 7,
            name: "Ada".into(),
            email: "ada@example.com".into(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["name"], "Ada");
        assert_eq!(json["email"], "ada@example.com");
    }
}
