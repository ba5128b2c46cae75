//! Slot extraction from free-form operation text.
//!
//! Every field has its own pattern and the patterns never share state, so the
//! fields may appear in any order. Patterns are case-insensitive and run on the
//! trimmed text without lower-casing it, which keeps names and emails intact.

use std::sync::LazyLock;

use regex::Regex;
use roster_core::domain::user::UserId;
use serde::Serialize;

// A name stops at the next recognised field keyword or at end of input.
static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)named?\s+([^,]+?)(?:\s+with|$|\s+age|\s+email|\s+phone|\s+role)")
        .expect("Invalid regex")
});
static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)email\s+([^\s,]+)").expect("Invalid regex"));
static AGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)age\s+([0-9]+)").expect("Invalid regex"));
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)phone\s+([0-9+\-]+)").expect("Invalid regex"));
static ROLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)role\s+["']?([^"']+?)["']?(?:\s+|$)"#).expect("Invalid regex")
});
static ADDRESS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)address\s+["']?([^"']+?)["']?(?:\s+|$)"#).expect("Invalid regex")
});

static USER_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)id[=:]?\s*([0-9]+)").expect("Invalid regex"));
// Lookup grammar is looser than the create grammar: `email=`, `email:` and quotes.
static LOOKUP_EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)email[=:]?\s*["']?([^"',\s]+)["']?"#).expect("Invalid regex")
});

/// Fields found in a response. Absent fields are `None`, never empty strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl ExtractedParams {
    /// Present fields in canonical order as `(field, raw value)` pairs.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let mut entries = Vec::new();
        if let Some(name) = &self.name {
            entries.push(("name", name.clone()));
        }
        if let Some(email) = &self.email {
            entries.push(("email", email.clone()));
        }
        if let Some(age) = self.age {
            entries.push(("age", age.to_string()));
        }
        if let Some(phone) = &self.phone {
            entries.push(("phone", phone.clone()));
        }
        if let Some(role) = &self.role {
            entries.push(("role", role.clone()));
        }
        if let Some(address) = &self.address {
            entries.push(("address", address.clone()));
        }
        entries
    }

    pub fn field_names(&self) -> Vec<&'static str> {
        self.entries().into_iter().map(|(field, _)| field).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

pub fn extract_parameters(text: &str) -> ExtractedParams {
    let text = text.trim();

    ExtractedParams {
        name: capture(&NAME_PATTERN, text),
        email: capture(&EMAIL_PATTERN, text),
        // Digit runs that overflow are dropped, not reported.
        age: capture(&AGE_PATTERN, text).and_then(|raw| raw.parse::<u32>().ok()),
        phone: capture(&PHONE_PATTERN, text),
        role: capture(&ROLE_PATTERN, text),
        address: capture(&ADDRESS_PATTERN, text),
    }
}

/// First `id` followed by digits, allowing `id=42` and `id: 42`. Zero is not an id.
pub fn extract_user_id(text: &str) -> Option<UserId> {
    capture(&USER_ID_PATTERN, text)
        .and_then(|raw| raw.parse::<i64>().ok())
        .and_then(UserId::from_raw)
}

pub fn extract_email(text: &str) -> Option<String> {
    capture(&LOOKUP_EMAIL_PATTERN, text)
}

fn capture(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|value| value.as_str().trim().to_string())
        .filter(|value| !value.is_empty())
}
