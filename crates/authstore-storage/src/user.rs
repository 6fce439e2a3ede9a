//! Identity record.
//!
//! One [`User`] per account. The record carries credential, OAuth2,
//! confirmation, lockout and recovery state; the store persists and returns
//! it but never interprets it.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

// =============================================================================
// User Type
// =============================================================================

/// A stored account.
///
/// Everything except `key` is optional. `id` is assigned by the backend
/// on first write and never changes afterwards.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Backend-assigned surrogate identifier.
    #[serde(default)]
    pub id: i64,

    /// Primary lookup key (email, or `uid ++ provider` for OAuth2 accounts).
    pub key: String,

    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Password hash. Never the plaintext password.
    #[serde(default, alias = "password_hash", skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth2_uid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth2_provider: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth2_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth2_refresh: Option<String>,

    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub oauth2_expiry: Option<OffsetDateTime>,

    /// Outstanding email confirmation token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirm_token: Option<String>,

    /// Whether the email address has been confirmed.
    #[serde(default)]
    pub confirmed: bool,

    /// Consecutive failed login attempts.
    #[serde(default)]
    pub attempt_number: i64,

    /// Time of the last failed login attempt.
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub attempt_time: Option<OffsetDateTime>,

    /// Lock expiry. A set value means the account is locked until then.
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub locked: Option<OffsetDateTime>,

    /// Outstanding password recovery token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recover_token: Option<String>,

    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub recover_token_expiry: Option<OffsetDateTime>,
}

impl User {
    /// Creates an empty record addressed by `key`.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    /// Returns `true` if the account is locked at `now`.
    #[must_use]
    pub fn is_locked(&self, now: OffsetDateTime) -> bool {
        self.locked.is_some_and(|until| until > now)
    }

    /// Returns `true` if a recovery token is set and has not expired at `now`.
    ///
    /// A token without an expiry never expires.
    #[must_use]
    pub fn has_live_recover_token(&self, now: OffsetDateTime) -> bool {
        self.recover_token.is_some()
            && self.recover_token_expiry.is_none_or(|expiry| expiry > now)
    }
}

// Password hash and tokens never reach logs.
impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redacted<T>(value: &Option<T>) -> &'static str {
            if value.is_some() { "<redacted>" } else { "None" }
        }

        f.debug_struct("User")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &redacted(&self.password))
            .field("oauth2_uid", &self.oauth2_uid)
            .field("oauth2_provider", &self.oauth2_provider)
            .field("oauth2_token", &redacted(&self.oauth2_token))
            .field("oauth2_refresh", &redacted(&self.oauth2_refresh))
            .field("oauth2_expiry", &self.oauth2_expiry)
            .field("confirm_token", &redacted(&self.confirm_token))
            .field("confirmed", &self.confirmed)
            .field("attempt_number", &self.attempt_number)
            .field("attempt_time", &self.attempt_time)
            .field("locked", &self.locked)
            .field("recover_token", &redacted(&self.recover_token))
            .field("recover_token_expiry", &self.recover_token_expiry)
            .finish()
    }
}

// =============================================================================
// User Fields
// =============================================================================

/// The fields of a [`User`], in table column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserField {
    Id,
    Key,
    Name,
    Email,
    Password,
    Oauth2Uid,
    Oauth2Provider,
    Oauth2Token,
    Oauth2Refresh,
    Oauth2Expiry,
    ConfirmToken,
    Confirmed,
    AttemptNumber,
    AttemptTime,
    Locked,
    RecoverToken,
    RecoverTokenExpiry,
}

impl UserField {
    /// Every field, in table column order.
    pub const ALL: [UserField; 17] = [
        Self::Id,
        Self::Key,
        Self::Name,
        Self::Email,
        Self::Password,
        Self::Oauth2Uid,
        Self::Oauth2Provider,
        Self::Oauth2Token,
        Self::Oauth2Refresh,
        Self::Oauth2Expiry,
        Self::ConfirmToken,
        Self::Confirmed,
        Self::AttemptNumber,
        Self::AttemptTime,
        Self::Locked,
        Self::RecoverToken,
        Self::RecoverTokenExpiry,
    ];

    /// Column name in the relational table.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Id => "ID",
            Self::Key => "Key",
            Self::Name => "Name",
            Self::Email => "Email",
            Self::Password => "Password",
            Self::Oauth2Uid => "Oauth2Uid",
            Self::Oauth2Provider => "Oauth2Provider",
            Self::Oauth2Token => "Oauth2Token",
            Self::Oauth2Refresh => "Oauth2Refresh",
            Self::Oauth2Expiry => "Oauth2Expiry",
            Self::ConfirmToken => "ConfirmToken",
            Self::Confirmed => "Confirmed",
            Self::AttemptNumber => "AttemptNumber",
            Self::AttemptTime => "AttemptTime",
            Self::Locked => "Locked",
            Self::RecoverToken => "RecoverToken",
            Self::RecoverTokenExpiry => "RecoverTokenExpiry",
        }
    }

    /// Canonical attribute name.
    #[must_use]
    pub const fn attribute(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Key => "key",
            Self::Name => "name",
            Self::Email => "email",
            Self::Password => "password",
            Self::Oauth2Uid => "oauth2_uid",
            Self::Oauth2Provider => "oauth2_provider",
            Self::Oauth2Token => "oauth2_token",
            Self::Oauth2Refresh => "oauth2_refresh",
            Self::Oauth2Expiry => "oauth2_expiry",
            Self::ConfirmToken => "confirm_token",
            Self::Confirmed => "confirmed",
            Self::AttemptNumber => "attempt_number",
            Self::AttemptTime => "attempt_time",
            Self::Locked => "locked",
            Self::RecoverToken => "recover_token",
            Self::RecoverTokenExpiry => "recover_token_expiry",
        }
    }

    /// Resolves an attribute name to a field.
    ///
    /// Matching ignores case and underscores, so `confirm_token`,
    /// `confirmToken` and `ConfirmToken` all resolve to
    /// [`UserField::ConfirmToken`]. `password_hash` is accepted for
    /// [`UserField::Password`].
    #[must_use]
    pub fn from_attribute_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '_')
            .flat_map(char::to_lowercase)
            .collect();

        if normalized == "passwordhash" {
            return Some(Self::Password);
        }

        Self::ALL
            .into_iter()
            .find(|field| field.column().eq_ignore_ascii_case(&normalized))
    }
}

impl fmt::Display for UserField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.attribute())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_user_new() {
        let user = User::new("a@b.com");
        assert_eq!(user.key, "a@b.com");
        assert_eq!(user.id, 0);
        assert!(!user.confirmed);
        assert!(user.locked.is_none());
    }

    #[test]
    fn test_is_locked() {
        let now = datetime!(2024-05-01 12:00 UTC);
        let mut user = User::new("a@b.com");
        assert!(!user.is_locked(now));

        user.locked = Some(datetime!(2024-05-01 13:00 UTC));
        assert!(user.is_locked(now));

        user.locked = Some(datetime!(2024-05-01 11:00 UTC));
        assert!(!user.is_locked(now));
    }

    #[test]
    fn test_has_live_recover_token() {
        let now = datetime!(2024-05-01 12:00 UTC);
        let mut user = User::new("a@b.com");
        assert!(!user.has_live_recover_token(now));

        user.recover_token = Some("r".to_string());
        assert!(user.has_live_recover_token(now));

        user.recover_token_expiry = Some(datetime!(2024-05-01 11:59 UTC));
        assert!(!user.has_live_recover_token(now));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut user = User::new("a@b.com");
        user.password = Some("$2a$10$hash".to_string());
        user.confirm_token = Some("confirm-secret".to_string());
        user.recover_token = Some("recover-secret".to_string());
        user.oauth2_token = Some("oauth-secret".to_string());

        let debug = format!("{user:?}");
        assert!(debug.contains("a@b.com"));
        assert!(!debug.contains("$2a$10$hash"));
        assert!(!debug.contains("confirm-secret"));
        assert!(!debug.contains("recover-secret"));
        assert!(!debug.contains("oauth-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_field_name_resolution() {
        assert_eq!(
            UserField::from_attribute_name("confirm_token"),
            Some(UserField::ConfirmToken)
        );
        assert_eq!(
            UserField::from_attribute_name("ConfirmToken"),
            Some(UserField::ConfirmToken)
        );
        assert_eq!(
            UserField::from_attribute_name("recoverTokenExpiry"),
            Some(UserField::RecoverTokenExpiry)
        );
        assert_eq!(
            UserField::from_attribute_name("oauth2_uid"),
            Some(UserField::Oauth2Uid)
        );
        assert_eq!(
            UserField::from_attribute_name("passwordHash"),
            Some(UserField::Password)
        );
        assert_eq!(UserField::from_attribute_name("nickname"), None);
    }

    #[test]
    fn test_columns_match_table_layout() {
        let columns: Vec<&str> = UserField::ALL.iter().map(|f| f.column()).collect();
        assert_eq!(
            columns.join(","),
            "ID,Key,Name,Email,Password,Oauth2Uid,Oauth2Provider,Oauth2Token,Oauth2Refresh,\
             Oauth2Expiry,ConfirmToken,Confirmed,AttemptNumber,AttemptTime,Locked,\
             RecoverToken,RecoverTokenExpiry"
        );
    }

    #[test]
    fn test_user_serialization() {
        let mut user = User::new("a@b.com");
        user.email = Some("a@b.com".to_string());
        user.locked = Some(datetime!(2024-05-01 12:00 UTC));

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["key"], "a@b.com");
        assert_eq!(json["locked"], "2024-05-01T12:00:00Z");
        assert!(json.get("confirm_token").is_none());

        let back: User = serde_json::from_value(json).unwrap();
        assert_eq!(back, user);
    }
}
