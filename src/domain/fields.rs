use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\p{L}\p{N}][\p{L}\p{N} '.\-]*$").expect("constant regex pattern is valid")
});

static PROPERTY_NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\p{L}\p{N}][\p{L}\p{N} '.\-&#/,]*$").expect("constant regex pattern is valid")
});

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^[A-Za-z0-9](?:[A-Za-z0-9+_.\-]*[A-Za-z0-9])?",
        r"@",
        r"(?:[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?\.)*",
        r"[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])$"
    ))
    .expect("constant regex pattern is valid")
});

/// Why a raw value could not become a field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("value is blank")]
    Blank,
    #[error("{0}")]
    Constraint(&'static str),
}

fn non_blank(raw: &str) -> Result<&str, FieldError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Err(FieldError::Blank)
    } else {
        Ok(trimmed)
    }
}

/// Case-insensitive identity key shared by contact and property names.
pub fn identity_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Looser key under which names differing only in whitespace collide.
pub fn similarity_key(raw: &str) -> String {
    raw.chars()
        .filter(|ch| !ch.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Name(String);

impl Name {
    pub const CONSTRAINT: &'static str = concat!(
        "names may contain letters, digits, spaces, apostrophes, hyphens and periods, ",
        "and must start with a letter or digit"
    );

    pub fn parse(raw: &str) -> Result<Self, FieldError> {
        let value = non_blank(raw)?;
        if NAME_PATTERN.is_match(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(FieldError::Constraint(Self::CONSTRAINT))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn key(&self) -> String {
        identity_key(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    pub const CONSTRAINT: &'static str = "phone numbers contain only digits and are at least 3 long";

    pub fn parse(raw: &str) -> Result<Self, FieldError> {
        let value = non_blank(raw)?;
        if value.len() >= 3 && value.chars().all(|ch| ch.is_ascii_digit()) {
            Ok(Self(value.to_string()))
        } else {
            Err(FieldError::Constraint(Self::CONSTRAINT))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    pub const CONSTRAINT: &'static str =
        "emails take the form local-part@domain with a top-level label of at least 2 characters";

    pub fn parse(raw: &str) -> Result<Self, FieldError> {
        let value = non_blank(raw)?;
        let top_label_ok = value
            .rsplit_once('.')
            .is_some_and(|(_, last)| last.len() >= 2 && !last.contains('@'));
        if EMAIL_PATTERN.is_match(value) && top_label_ok {
            Ok(Self(value.to_string()))
        } else {
            Err(FieldError::Constraint(Self::CONSTRAINT))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn parse(raw: &str) -> Result<Self, FieldError> {
        Ok(Self(non_blank(raw)?.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Listing(String);

impl Listing {
    pub fn parse(raw: &str) -> Result<Self, FieldError> {
        Ok(Self(non_blank(raw)?.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Tag(String);

impl Tag {
    pub const CONSTRAINT: &'static str = "tags are a single word of letters and digits";

    pub fn parse(raw: &str) -> Result<Self, FieldError> {
        let value = non_blank(raw)?;
        if value.chars().all(char::is_alphanumeric) {
            Ok(Self(value.to_string()))
        } else {
            Err(FieldError::Constraint(Self::CONSTRAINT))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PropertyName(String);

impl PropertyName {
    pub const CONSTRAINT: &'static str = concat!(
        "property names may contain letters, digits, spaces and ' . - & # / , ",
        "and must start with a letter or digit"
    );

    pub fn parse(raw: &str) -> Result<Self, FieldError> {
        let value = non_blank(raw)?;
        if PROPERTY_NAME_PATTERN.is_match(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(FieldError::Constraint(Self::CONSTRAINT))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn key(&self) -> String {
        identity_key(&self.0)
    }

    pub fn similarity_key(&self) -> String {
        similarity_key(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Price(u64);

impl Price {
    pub const CONSTRAINT: &'static str = "prices are positive whole numbers";

    pub fn new(value: u64) -> Result<Self, FieldError> {
        if value == 0 {
            Err(FieldError::Constraint(Self::CONSTRAINT))
        } else {
            Ok(Self(value))
        }
    }

    pub fn parse_number(value: &serde_json::Number) -> Result<Self, FieldError> {
        match value.as_u64() {
            Some(amount) => Self::new(amount),
            None => Err(FieldError::Constraint(Self::CONSTRAINT)),
        }
    }

    pub fn parse(raw: &str) -> Result<Self, FieldError> {
        let value = non_blank(raw)?;
        if !value.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(FieldError::Constraint(Self::CONSTRAINT));
        }
        let amount = value
            .parse::<u64>()
            .map_err(|_| FieldError::Constraint(Self::CONSTRAINT))?;
        Self::new(amount)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(Name, Phone, Email, Address, Listing, Tag, PropertyName);

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
