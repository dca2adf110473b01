use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Serialize, Serializer};

use crate::domain::validation::ValidationError;

/// Country calling code every canonical number starts with.
pub const COUNTRY_CODE: &str = "62";

/// Suffix the messaging client expects after the number in a chat id.
pub const CHAT_ID_SUFFIX: &str = "@c.us";

static CANONICAL_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^62\d{9,12}$").expect("canonical number pattern compiles")
});

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Phone number in canonical international form (`62` + 9..=12 digits).
///
/// Construct through [`PhoneNumber::parse`]; [`PhoneNumber::normalize`] and
/// [`PhoneNumber::is_valid`] are the underlying pure helpers.
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// JSON field name carrying the number (`number`).
    pub const FIELD: &'static str = "number";

    /// Strip every non-digit and rewrite a leading `0` to the country code.
    ///
    /// Input that already carries a country code keeps it untouched, so the
    /// operation is idempotent on canonical numbers. Never fails: garbage
    /// normalizes to a string that [`PhoneNumber::is_valid`] rejects.
    pub fn normalize(raw: &str) -> String {
        let digits = raw
            .chars()
            .filter(char::is_ascii_digit)
            .collect::<String>();

        match digits.strip_prefix('0') {
            Some(rest) => format!("{COUNTRY_CODE}{rest}"),
            None => digits,
        }
    }

    /// Whether `raw` normalizes to a canonical Indonesian number.
    pub fn is_valid(raw: &str) -> bool {
        CANONICAL_NUMBER.is_match(&Self::normalize(raw))
    }

    /// Normalize and validate `raw`.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, ValidationError> {
        let raw = raw.as_ref();
        if raw.trim().is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }

        let normalized = Self::normalize(raw);
        if !CANONICAL_NUMBER.is_match(&normalized) {
            return Err(ValidationError::InvalidPhoneNumber {
                input: raw.to_owned(),
            });
        }
        Ok(Self(normalized))
    }

    /// Borrow the canonical digits.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Chat id addressing this number on the messaging client.
    pub fn chat_id(&self) -> ChatId {
        ChatId(format!("{}{CHAT_ID_SUFFIX}", self.0))
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for PhoneNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Message body (`message`).
///
/// Invariant: non-empty. The value is kept exactly as provided, whitespace included.
pub struct MessageText(String);

impl MessageText {
    /// JSON field name carrying the body (`message`).
    pub const FIELD: &'static str = "message";

    /// Create validated message text.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(value))
    }

    /// Borrow the message text as provided.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters, as logged for each dispatch.
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }
}

impl Serialize for MessageText {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Messaging-client chat address, e.g. `6281234567890@c.us`.
///
/// Invariant: not blank. Ids built from a [`PhoneNumber`] always carry the
/// `@c.us` suffix; ids received from the client are kept verbatim.
pub struct ChatId(String);

impl ChatId {
    pub const FIELD: &'static str = "chat_id";

    /// Accept a chat id reported by the messaging client.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<PhoneNumber> for ChatId {
    fn from(value: PhoneNumber) -> Self {
        value.chat_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_rewrites_leading_zero() {
        assert_eq!(PhoneNumber::normalize("081234567890"), "6281234567890");
        assert_eq!(PhoneNumber::normalize("0812-3456-7890"), "6281234567890");
    }

    #[test]
    fn normalize_is_idempotent_on_canonical_numbers() {
        let once = PhoneNumber::normalize("6281234567890");
        assert_eq!(once, "6281234567890");
        assert_eq!(PhoneNumber::normalize(&once), once);
    }

    #[test]
    fn normalize_strips_formatting_but_keeps_foreign_prefix() {
        assert_eq!(PhoneNumber::normalize("+62 812 3456 7890"), "6281234567890");
        assert_eq!(PhoneNumber::normalize("+7 925 123-45-67"), "79251234567");
        assert_eq!(PhoneNumber::normalize("not-a-number"), "");
    }

    #[test]
    fn is_valid_enforces_prefix_and_length() {
        assert!(PhoneNumber::is_valid("6281234567890"));
        assert!(PhoneNumber::is_valid("081234567890"));
        assert!(PhoneNumber::is_valid("62812345678"));
        assert!(PhoneNumber::is_valid("62812345678901"));
        assert!(!PhoneNumber::is_valid("123"));
        assert!(!PhoneNumber::is_valid("6212345"));
        assert!(!PhoneNumber::is_valid("628123456789012"));
        assert!(!PhoneNumber::is_valid("79251234567"));
    }

    #[test]
    fn parse_returns_canonical_number_or_error() {
        let number = PhoneNumber::parse(" 0812 3456 7890 ").unwrap();
        assert_eq!(number.as_str(), "6281234567890");
        assert_eq!(number.to_string(), "6281234567890");

        assert_eq!(
            PhoneNumber::parse("   "),
            Err(ValidationError::Empty {
                field: PhoneNumber::FIELD
            })
        );
        assert_eq!(
            PhoneNumber::parse("123"),
            Err(ValidationError::InvalidPhoneNumber {
                input: "123".to_owned()
            })
        );
    }

    #[test]
    fn chat_id_appends_client_suffix() {
        let number = PhoneNumber::parse("081234567890").unwrap();
        assert_eq!(number.chat_id().as_str(), "6281234567890@c.us");

        let incoming = ChatId::new("6281234567890@c.us").unwrap();
        assert_eq!(incoming, ChatId::from(number));

        let group = ChatId::new(" 120363025246125486@g.us").unwrap();
        assert_eq!(group.as_str(), " 120363025246125486@g.us");
        assert!(ChatId::new("").is_err());
        assert!(ChatId::new("  ").is_err());
    }

    #[test]
    fn message_text_rejects_only_empty_and_preserves_whitespace() {
        let msg = MessageText::new(" hi ").unwrap();
        assert_eq!(msg.as_str(), " hi ");
        assert_eq!(msg.char_len(), 4);

        let spaces = MessageText::new(" ").unwrap();
        assert_eq!(spaces.as_str(), " ");
        assert!(MessageText::new("").is_err());
    }
}
