//! Named-attribute bags and their binding onto [`User`].
//!
//! Callers hand the store a loosely-typed [`Attributes`] bag; backends bind
//! it onto a fresh record with [`Attributes::bind`], which checks every
//! attribute against the record shape and reports all offending fields at
//! once.

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::fmt;

use time::OffsetDateTime;

use crate::StoreResult;
use crate::error::{FieldError, StoreError};
use crate::user::{User, UserField};

/// A single attribute value.
#[derive(Clone, PartialEq, Eq)]
pub enum AttributeValue {
    String(String),
    Integer(i64),
    Bool(bool),
    DateTime(OffsetDateTime),
    /// Explicitly unset. Clears an optional field.
    Null,
}

impl AttributeValue {
    /// Name of the value's type, used in validation messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Integer(_) => "integer",
            Self::Bool(_) => "bool",
            Self::DateTime(_) => "datetime",
            Self::Null => "null",
        }
    }
}

// Values may be password hashes or tokens; only the kind is shown.
impl fmt::Debug for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AttributeValue::{}", self.kind())
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<OffsetDateTime> for AttributeValue {
    fn from(value: OffsetDateTime) -> Self {
        Self::DateTime(value)
    }
}

impl<T: Into<AttributeValue>> From<Option<T>> for AttributeValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// How [`Attributes::bind`] treats attribute names that are not record fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindMode {
    /// Unknown attribute names are validation failures.
    Strict,
    /// Unknown attribute names are skipped.
    #[default]
    IgnoreUnknown,
}

/// A bag of named attributes used to populate a [`User`].
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    values: BTreeMap<String, AttributeValue>,
}

impl Attributes {
    /// Creates an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an attribute, consuming and returning the bag.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets an attribute, returning the previous value under the same name.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Option<AttributeValue> {
        self.values.insert(name.into(), value.into())
    }

    /// Gets an attribute by its exact name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.values.get(name)
    }

    /// Removes an attribute by its exact name.
    pub fn remove(&mut self, name: &str) -> Option<AttributeValue> {
        self.values.remove(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over attributes in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Builds a new record from the bag.
    ///
    /// `id` and `key` attributes are ignored; both are owned by the backend.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` listing every attribute that has the
    /// wrong type for its field, names a field more than once, or (in
    /// [`BindMode::Strict`]) names no field at all.
    pub fn bind(&self, mode: BindMode) -> StoreResult<User> {
        let mut user = User::default();
        let mut failures = Vec::new();
        let mut seen = HashSet::new();

        for (name, value) in &self.values {
            let Some(field) = UserField::from_attribute_name(name) else {
                if mode == BindMode::Strict {
                    failures.push(FieldError::new(name, "unknown attribute"));
                }
                continue;
            };

            if !seen.insert(field) {
                failures.push(FieldError::new(
                    name,
                    format!("{field} is set more than once"),
                ));
                continue;
            }

            if let Err(reason) = assign(&mut user, field, value) {
                failures.push(FieldError::new(name, reason));
            }
        }

        if failures.is_empty() {
            Ok(user)
        } else {
            Err(StoreError::validation(failures))
        }
    }
}

impl fmt::Debug for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

impl<K: Into<String>, V: Into<AttributeValue>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attributes = Self::new();
        for (name, value) in iter {
            attributes.insert(name, value);
        }
        attributes
    }
}

/// The attributes of an existing record, so a caller can read, modify and
/// write it back. `id` and `key` are left out; unset fields are omitted.
impl From<&User> for Attributes {
    fn from(user: &User) -> Self {
        let mut attributes = Self::new();
        let mut set = |field: UserField, value: AttributeValue| {
            if value != AttributeValue::Null {
                attributes.insert(field.attribute(), value);
            }
        };

        set(UserField::Name, user.name.clone().into());
        set(UserField::Email, user.email.clone().into());
        set(UserField::Password, user.password.clone().into());
        set(UserField::Oauth2Uid, user.oauth2_uid.clone().into());
        set(UserField::Oauth2Provider, user.oauth2_provider.clone().into());
        set(UserField::Oauth2Token, user.oauth2_token.clone().into());
        set(UserField::Oauth2Refresh, user.oauth2_refresh.clone().into());
        set(UserField::Oauth2Expiry, user.oauth2_expiry.into());
        set(UserField::ConfirmToken, user.confirm_token.clone().into());
        set(UserField::Confirmed, user.confirmed.into());
        set(UserField::AttemptNumber, user.attempt_number.into());
        set(UserField::AttemptTime, user.attempt_time.into());
        set(UserField::Locked, user.locked.into());
        set(UserField::RecoverToken, user.recover_token.clone().into());
        set(UserField::RecoverTokenExpiry, user.recover_token_expiry.into());

        attributes
    }
}

fn assign(user: &mut User, field: UserField, value: &AttributeValue) -> Result<(), String> {
    match field {
        UserField::Id | UserField::Key => Ok(()),
        UserField::Name => set_string(&mut user.name, value),
        UserField::Email => set_string(&mut user.email, value),
        UserField::Password => set_string(&mut user.password, value),
        UserField::Oauth2Uid => set_string(&mut user.oauth2_uid, value),
        UserField::Oauth2Provider => set_string(&mut user.oauth2_provider, value),
        UserField::Oauth2Token => set_string(&mut user.oauth2_token, value),
        UserField::Oauth2Refresh => set_string(&mut user.oauth2_refresh, value),
        UserField::Oauth2Expiry => set_datetime(&mut user.oauth2_expiry, value),
        UserField::ConfirmToken => set_string(&mut user.confirm_token, value),
        UserField::Confirmed => match value {
            AttributeValue::Bool(confirmed) => {
                user.confirmed = *confirmed;
                Ok(())
            }
            other => Err(mismatch("bool", other)),
        },
        UserField::AttemptNumber => match value {
            AttributeValue::Integer(attempts) => {
                user.attempt_number = *attempts;
                Ok(())
            }
            other => Err(mismatch("integer", other)),
        },
        UserField::AttemptTime => set_datetime(&mut user.attempt_time, value),
        UserField::Locked => set_datetime(&mut user.locked, value),
        UserField::RecoverToken => set_string(&mut user.recover_token, value),
        UserField::RecoverTokenExpiry => set_datetime(&mut user.recover_token_expiry, value),
    }
}

fn set_string(slot: &mut Option<String>, value: &AttributeValue) -> Result<(), String> {
    match value {
        AttributeValue::String(s) => *slot = Some(s.clone()),
        AttributeValue::Null => *slot = None,
        other => return Err(mismatch("string", other)),
    }
    Ok(())
}

fn set_datetime(slot: &mut Option<OffsetDateTime>, value: &AttributeValue) -> Result<(), String> {
    match value {
        AttributeValue::DateTime(dt) => *slot = Some(*dt),
        AttributeValue::Null => *slot = None,
        other => return Err(mismatch("datetime", other)),
    }
    Ok(())
}

fn mismatch(expected: &str, got: &AttributeValue) -> String {
    format!("expected {expected}, got {}", got.kind())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn sample() -> Attributes {
        Attributes::new()
            .with("name", "Ann")
            .with("email", "a@b.com")
            .with("password", "$2a$10$hash")
            .with("confirm_token", "XYZ")
            .with("confirmed", false)
            .with("attempt_number", 2_i64)
            .with("locked", datetime!(2024-05-01 12:00 UTC))
    }

    #[test]
    fn test_bind_populates_fields() {
        let user = sample().bind(BindMode::Strict).unwrap();
        assert_eq!(user.name.as_deref(), Some("Ann"));
        assert_eq!(user.email.as_deref(), Some("a@b.com"));
        assert_eq!(user.password.as_deref(), Some("$2a$10$hash"));
        assert_eq!(user.confirm_token.as_deref(), Some("XYZ"));
        assert!(!user.confirmed);
        assert_eq!(user.attempt_number, 2);
        assert_eq!(user.locked, Some(datetime!(2024-05-01 12:00 UTC)));
        assert!(user.recover_token.is_none());
    }

    #[test]
    fn test_bind_accepts_column_and_camel_case_names() {
        let user = Attributes::new()
            .with("ConfirmToken", "abc")
            .with("recoverTokenExpiry", datetime!(2024-06-01 0:00 UTC))
            .with("Oauth2Provider", "google")
            .with("password_hash", "h")
            .bind(BindMode::Strict)
            .unwrap();

        assert_eq!(user.confirm_token.as_deref(), Some("abc"));
        assert_eq!(
            user.recover_token_expiry,
            Some(datetime!(2024-06-01 0:00 UTC))
        );
        assert_eq!(user.oauth2_provider.as_deref(), Some("google"));
        assert_eq!(user.password.as_deref(), Some("h"));
    }

    #[test]
    fn test_bind_ignores_backend_owned_fields() {
        let user = Attributes::new()
            .with("id", 99_i64)
            .with("key", "spoofed@b.com")
            .bind(BindMode::Strict)
            .unwrap();
        assert_eq!(user.id, 0);
        assert!(user.key.is_empty());
    }

    #[test]
    fn test_bind_lists_every_offending_field() {
        let err = Attributes::new()
            .with("confirmed", "yes")
            .with("attempt_number", true)
            .with("locked", "tomorrow")
            .with("nickname", "annie")
            .bind(BindMode::Strict)
            .unwrap_err();

        assert!(err.is_validation());
        let mut fields: Vec<&str> = err.field_errors().iter().map(|f| f.field.as_str()).collect();
        fields.sort_unstable();
        assert_eq!(
            fields,
            vec!["attempt_number", "confirmed", "locked", "nickname"]
        );
        let confirmed = err
            .field_errors()
            .iter()
            .find(|f| f.field == "confirmed")
            .unwrap();
        assert_eq!(confirmed.reason, "expected bool, got string");
    }

    #[test]
    fn test_ignore_unknown_skips_unrecognised_names() {
        let user = Attributes::new()
            .with("email", "a@b.com")
            .with("confirm_password", "1234")
            .bind(BindMode::IgnoreUnknown)
            .unwrap();
        assert_eq!(user.email.as_deref(), Some("a@b.com"));
    }

    #[test]
    fn test_ignore_unknown_still_rejects_type_mismatch() {
        let err = Attributes::new()
            .with("confirmed", 1_i64)
            .bind(BindMode::IgnoreUnknown)
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_bind_rejects_field_set_twice() {
        let err = Attributes::new()
            .with("confirm_token", "a")
            .with("ConfirmToken", "b")
            .bind(BindMode::IgnoreUnknown)
            .unwrap_err();
        assert_eq!(err.field_errors().len(), 1);
    }

    #[test]
    fn test_null_clears_optional_but_not_required_fields() {
        let user = Attributes::new()
            .with("email", AttributeValue::Null)
            .bind(BindMode::Strict)
            .unwrap();
        assert!(user.email.is_none());

        let err = Attributes::new()
            .with("confirmed", AttributeValue::Null)
            .bind(BindMode::Strict)
            .unwrap_err();
        assert_eq!(err.field_errors()[0].reason, "expected bool, got null");
    }

    #[test]
    fn test_attributes_from_user_rebinds_to_same_record() {
        let mut user = sample().bind(BindMode::Strict).unwrap();
        user.id = 7;
        user.key = "a@b.com".to_string();

        let mut rebound = Attributes::from(&user).bind(BindMode::Strict).unwrap();
        rebound.id = user.id;
        rebound.key = user.key.clone();
        assert_eq!(rebound, user);
    }

    #[test]
    fn test_debug_hides_values() {
        let debug = format!("{:?}", sample());
        assert!(debug.contains("password"));
        assert!(!debug.contains("$2a$10$hash"));
        assert!(!debug.contains("XYZ"));
    }

    #[test]
    fn test_from_iterator() {
        let attributes: Attributes = [("name", "Ann"), ("email", "a@b.com")]
            .into_iter()
            .collect();
        assert_eq!(attributes.len(), 2);
        assert_eq!(
            attributes.get("name"),
            Some(&AttributeValue::String("Ann".to_string()))
        );
    }
}
