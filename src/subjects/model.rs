//! Subject records and the request shapes front ends hand to the store.

use serde::{Deserialize, Serialize};

/// A post category: display name, description and lower-cased keywords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// Stable identifier assigned on creation. Records imported or written
    /// by older tools may not carry one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Subject {
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }
}

/// Creation request as received from a front end. Every field is required;
/// a missing one is reported as malformed input rather than a parse error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewSubject {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Raw comma-separated keyword list.
    pub keywords: Option<String>,
}

/// Partial update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Raw comma-separated keyword list, re-parsed like on creation.
    pub keywords: Option<String>,
}

impl SubjectPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.keywords.is_none()
    }

    pub(crate) fn apply(self, subject: &mut Subject) {
        if let Some(name) = self.name {
            subject.name = name;
        }
        if let Some(description) = self.description {
            subject.description = description;
        }
        if let Some(raw) = self.keywords {
            subject.keywords = parse_keywords(&raw);
        }
    }
}

/// Split a comma-separated list into trimmed, lower-cased, non-empty keywords.
pub fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|keyword| !keyword.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keywords() {
        assert_eq!(parse_keywords("AI, Space, Gadgets"), vec!["ai", "space", "gadgets"]);
    }

    #[test]
    fn test_parse_keywords_drops_empty_fragments() {
        assert_eq!(parse_keywords(" Rust ,, ,Tokio,"), vec!["rust", "tokio"]);
        assert!(parse_keywords("").is_empty());
        assert!(parse_keywords(" , ").is_empty());
    }

    #[test]
    fn test_matches_name_ignores_case() {
        let subject = Subject {
            id: None,
            name: "Tech".to_string(),
            description: String::new(),
            keywords: vec![],
        };
        assert!(subject.matches_name("tech"));
        assert!(subject.matches_name("TECH"));
        assert!(!subject.matches_name("Technology"));
    }

    #[test]
    fn test_patch_applies_present_fields_only() {
        let mut subject = Subject {
            id: Some("abc".to_string()),
            name: "Tech".to_string(),
            description: "Technology posts".to_string(),
            keywords: vec!["ai".to_string()],
        };
        let patch = SubjectPatch {
            description: Some("Gadgets and more".to_string()),
            keywords: Some("Phones, Laptops".to_string()),
            ..Default::default()
        };
        patch.apply(&mut subject);

        assert_eq!(subject.name, "Tech");
        assert_eq!(subject.description, "Gadgets and more");
        assert_eq!(subject.keywords, vec!["phones", "laptops"]);
        assert_eq!(subject.id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_subject_without_id_serializes_legacy_shape() {
        let subject = Subject {
            id: None,
            name: "Tech".to_string(),
            description: "Technology posts".to_string(),
            keywords: vec!["ai".to_string()],
        };
        let value = serde_json::to_value(&subject).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"name": "Tech", "description": "Technology posts", "keywords": ["ai"]})
        );
    }
}
