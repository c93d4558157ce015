//! User write-path pipeline: normalize, then validate, then persist.
//!
//! Normalization runs strictly before validation because validation reads
//! the normalized values. The steps here are pure; the services layer wires
//! them to storage (uniqueness checks, role fallback, the insert itself).

pub mod audit;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

pub const NAME_MIN: usize = 2;
pub const NAME_MAX: usize = 16;

/// Field-keyed validation messages, in insertion order.
///
/// An empty collection means the record is valid. Serializes as an object
/// mapping each field to its list of messages.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FieldErrors {
    entries: Vec<(String, Vec<String>)>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        let message = message.into();
        if let Some((_, messages)) = self.entries.iter_mut().find(|(f, _)| f == field) {
            messages.push(message);
        } else {
            self.entries.push((field.to_string(), vec![message]));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, messages)| messages.as_slice())
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(f, _)| f.as_str())
    }
}

impl Serialize for FieldErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (field, messages) in &self.entries {
            map.serialize_entry(field, messages)?;
        }
        map.end()
    }
}

/// Canonical stored form of a display name: lowercased, then title-cased
/// per whitespace-separated word. Applied on creation only.
pub fn normalize_name(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut at_word_start = true;
    for ch in lowered.chars() {
        if ch.is_whitespace() {
            at_word_start = true;
            out.push(ch);
        } else if at_word_start {
            out.extend(ch.to_uppercase());
            at_word_start = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Canonical stored form of an email address. Applied on create and update
/// whenever an email is present.
pub fn normalize_email(raw: &str) -> String {
    raw.to_lowercase()
}

/// Presence and length checks for an already-normalized name. Uniqueness is
/// a storage concern and is appended by the caller.
pub fn validate_name(name: &str, errors: &mut FieldErrors) {
    if name.trim().is_empty() {
        errors.add("name", "can't be blank");
        return;
    }
    let len = name.chars().count();
    if len < NAME_MIN {
        errors.add(
            "name",
            format!("is too short (minimum is {NAME_MIN} characters)"),
        );
    }
    if len > NAME_MAX {
        errors.add(
            "name",
            format!("is too long (maximum is {NAME_MAX} characters)"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_title_cased() {
        assert_eq!(normalize_name("john smith"), "John Smith");
        assert_eq!(normalize_name("JOHN SMITH"), "John Smith");
        assert_eq!(normalize_name("jOhN sMiTh"), "John Smith");
    }

    #[test]
    fn name_keeps_interior_whitespace() {
        assert_eq!(normalize_name("mary  jane"), "Mary  Jane");
    }

    #[test]
    fn name_single_word() {
        assert_eq!(normalize_name("ann"), "Ann");
    }

    #[test]
    fn email_is_lowercased() {
        assert_eq!(normalize_email("Foo@Bar.COM"), "foo@bar.com");
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut errors = FieldErrors::new();
        validate_name("", &mut errors);
        assert_eq!(errors.get("name"), Some(&["can't be blank".to_string()][..]));
    }

    #[test]
    fn whitespace_name_is_blank() {
        let mut errors = FieldErrors::new();
        validate_name("   ", &mut errors);
        assert!(!errors.is_empty());
    }

    #[test]
    fn short_name_is_rejected() {
        let mut errors = FieldErrors::new();
        validate_name("A", &mut errors);
        assert_eq!(
            errors.get("name"),
            Some(&["is too short (minimum is 2 characters)".to_string()][..])
        );
    }

    #[test]
    fn long_name_is_rejected() {
        let mut errors = FieldErrors::new();
        validate_name("Abcdefghijklmnopq", &mut errors);
        assert!(errors.get("name").unwrap()[0].starts_with("is too long"));
    }

    #[test]
    fn boundary_lengths_pass() {
        for name in ["Ab", "Abcdefghijklmnop"] {
            let mut errors = FieldErrors::new();
            validate_name(name, &mut errors);
            assert!(errors.is_empty(), "{name} should be valid");
        }
    }

    #[test]
    fn length_counts_chars_not_bytes() {
        // 16 multibyte chars, more than 16 bytes
        let name = "Éééééééééééééééé";
        assert_eq!(name.chars().count(), 16);
        let mut errors = FieldErrors::new();
        validate_name(name, &mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn errors_accumulate_per_field() {
        let mut errors = FieldErrors::new();
        errors.add("name", "first");
        errors.add("name", "second");
        errors.add("email", "third");
        assert_eq!(errors.get("name").unwrap().len(), 2);
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["name", "email"]);
    }

    #[test]
    fn errors_serialize_as_field_map() {
        let mut errors = FieldErrors::new();
        errors.add("name", "has already been taken");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["name"][0], "has already been taken");
    }
}
