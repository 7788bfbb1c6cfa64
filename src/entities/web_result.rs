// 🔎 Web Result Entity - one entry on the results page
//
// A result is either organic (paginated in the main list) or sponsored
// (eligible to be promoted as the single featured entry).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::StoreError;

// ============================================================================
// RESULT KIND
// ============================================================================

/// Placement tag of a result. Decides where it is shown, not only how.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    #[default]
    Organic,
    Sponsored,
}

impl ResultKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultKind::Organic => "organic",
            ResultKind::Sponsored => "sponsored",
        }
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResultKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "organic" => Ok(ResultKind::Organic),
            "sponsored" => Ok(ResultKind::Sponsored),
            other => Err(StoreError::store(format!("unknown result type: {other}"))),
        }
    }
}

// ============================================================================
// WEB RESULT
// ============================================================================

/// A single listing entry as returned by the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebResult {
    /// Assigned by the store on insert, never reused or changed
    pub id: String,

    /// Category the admin filed this entry under
    #[serde(default)]
    pub category_id: Option<String>,

    /// Short label, usually a domain ("example.com")
    pub name: String,

    pub title: String,
    pub description: String,

    /// Absent means the entry is not clickable
    #[serde(default)]
    pub link: Option<String>,

    /// Absent renders a placeholder
    #[serde(default)]
    pub logo_url: Option<String>,

    #[serde(rename = "type")]
    pub kind: ResultKind,

    pub display_order: i64,
}

impl WebResult {
    pub fn is_sponsored(&self) -> bool {
        self.kind == ResultKind::Sponsored
    }

    pub fn is_clickable(&self) -> bool {
        self.link.is_some()
    }

    /// Build a stored record from a draft and the id the store assigned.
    pub fn from_draft(id: String, draft: &ResultDraft) -> Self {
        WebResult {
            id,
            category_id: draft.category_id.clone(),
            name: draft.name.clone(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            link: draft.link.clone(),
            logo_url: draft.logo_url.clone(),
            kind: draft.kind,
            display_order: draft.display_order,
        }
    }
}

// ============================================================================
// RESULT DRAFT (what the admin form saves)
// ============================================================================

/// Record contents without an id, ready to be inserted or written over an
/// existing row.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResultDraft {
    #[serde(default)]
    pub category_id: Option<String>,
    pub name: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: ResultKind,
    #[serde(default)]
    pub display_order: i64,
}

impl ResultDraft {
    /// Blank optional fields become null, as the admin form saves them.
    pub fn normalized(mut self) -> Self {
        self.category_id = self.category_id.filter(|v| !v.is_empty());
        self.link = self.link.filter(|v| !v.is_empty());
        self.logo_url = self.logo_url.filter(|v| !v.is_empty());
        self
    }
}

/// Empty optional inputs are stored as null.
pub fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Parse the display order field the way a number input is read: the
/// leading integer wins, anything unparseable becomes 0.
pub fn parse_display_order(input: &str) -> i64 {
    let trimmed = input.trim_start();
    let mut end = 0;
    for (i, c) in trimmed.char_indices() {
        let sign = i == 0 && (c == '-' || c == '+');
        if c.is_ascii_digit() || sign {
            end = i + c.len_utf8();
        } else {
            break;
        }
    }

    trimmed[..end].parse::<i64>().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_str() {
        assert_eq!("organic".parse::<ResultKind>().unwrap(), ResultKind::Organic);
        assert_eq!("sponsored".parse::<ResultKind>().unwrap(), ResultKind::Sponsored);
        assert!("Sponsored".parse::<ResultKind>().is_err());
        assert_eq!(ResultKind::Sponsored.to_string(), "sponsored");
    }

    #[test]
    fn test_kind_serializes_as_type_field() {
        let result = WebResult {
            id: "1".to_string(),
            category_id: None,
            name: "alpha.com".to_string(),
            title: "Alpha Loans".to_string(),
            description: "Fast loans".to_string(),
            link: None,
            logo_url: None,
            kind: ResultKind::Sponsored,
            display_order: 0,
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["type"], "sponsored");
        assert!(json["link"].is_null());
        assert!(!result.is_clickable());
        assert!(result.is_sponsored());
    }

    #[test]
    fn test_non_empty_maps_blank_to_none() {
        assert_eq!(non_empty(""), None);
        assert_eq!(non_empty(" "), Some(" ".to_string()));
        assert_eq!(non_empty("https://a.com"), Some("https://a.com".to_string()));
    }

    #[test]
    fn test_parse_display_order() {
        assert_eq!(parse_display_order("12"), 12);
        assert_eq!(parse_display_order("12abc"), 12);
        assert_eq!(parse_display_order("-3"), -3);
        assert_eq!(parse_display_order("  7"), 7);
        assert_eq!(parse_display_order("abc"), 0);
        assert_eq!(parse_display_order(""), 0);
        assert_eq!(parse_display_order("-"), 0);
    }

    #[test]
    fn test_draft_defaults_to_organic() {
        let draft: ResultDraft = serde_json::from_str(
            r#"{"name":"a.com","title":"A","description":"d"}"#,
        )
        .unwrap();

        assert_eq!(draft.kind, ResultKind::Organic);
        assert_eq!(draft.display_order, 0);
        assert_eq!(draft.link, None);
    }

    #[test]
    fn test_normalized_drops_blank_optionals() {
        let draft = ResultDraft {
            category_id: Some(String::new()),
            link: Some(String::new()),
            logo_url: Some("https://a.com/a.png".to_string()),
            ..ResultDraft::default()
        }
        .normalized();

        assert_eq!(draft.category_id, None);
        assert_eq!(draft.link, None);
        assert_eq!(draft.logo_url.as_deref(), Some("https://a.com/a.png"));
    }
}
