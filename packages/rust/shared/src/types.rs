//! Core domain types for CheckIO.

use serde::{Deserialize, Serialize};

use crate::error::{CheckIoError, Result};

// ---------------------------------------------------------------------------
// CategoryId
// ---------------------------------------------------------------------------

/// An upstream category identifier. Existence is only ever checked upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub i64);

impl std::fmt::Display for CategoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CategoryId {
    type Err = CheckIoError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| CheckIoError::validation(format!("invalid category id '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// FeaturedCategoryConfig
// ---------------------------------------------------------------------------

/// How a category is chosen when an asset is assigned to someone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentMode {
    /// The person assigning picks a category.
    #[default]
    Select,
    /// Only the featured categories may be assigned.
    Fixed,
}

impl AssignmentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Fixed => "fixed",
        }
    }
}

impl std::fmt::Display for AssignmentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AssignmentMode {
    type Err = CheckIoError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "select" => Ok(Self::Select),
            "fixed" => Ok(Self::Fixed),
            other => Err(CheckIoError::validation(format!(
                "unknown assignment mode '{other}': expected 'select' or 'fixed'"
            ))),
        }
    }
}

/// The singleton featured-category record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturedCategoryConfig {
    #[serde(default)]
    pub mode: AssignmentMode,
    /// Featured category ids, in the order the administrator entered them.
    #[serde(default)]
    pub allowed_category_ids: Vec<CategoryId>,
}

impl FeaturedCategoryConfig {
    /// Whether `id` is one of the featured categories.
    pub fn allows(&self, id: CategoryId) -> bool {
        self.allowed_category_ids.contains(&id)
    }

    /// Featured ids with repeats removed, first appearance kept.
    pub fn distinct_category_ids(&self) -> Vec<CategoryId> {
        let mut seen = std::collections::HashSet::new();
        self.allowed_category_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Display projection
// ---------------------------------------------------------------------------

/// One projected column: a header label and the dotted path it reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayPropertySpec {
    pub label: String,
    pub path: String,
}

impl DisplayPropertySpec {
    pub fn new(label: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
        }
    }
}

/// A resolved label/value pair for one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyValue {
    pub label: String,
    pub value: String,
}

/// An upstream asset flattened for tabular display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectedAsset {
    pub id: i64,
    pub assigned_to_name: Option<String>,
    pub assigned_to_type: Option<String>,
    pub category_name: String,
    pub properties: Vec<PropertyValue>,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Access flags for the current operator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Session {
    pub authenticated: bool,
    pub is_admin: bool,
}

impl Session {
    pub fn require_authenticated(&self) -> Result<()> {
        if !self.authenticated {
            return Err(CheckIoError::PermissionDenied(
                "not logged in to the asset directory".into(),
            ));
        }
        Ok(())
    }

    /// Admin-only actions also require an authenticated session.
    pub fn require_admin(&self) -> Result<()> {
        self.require_authenticated()?;
        if !self.is_admin {
            return Err(CheckIoError::PermissionDenied(
                "You do not have permission to access this page.".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_serializes_lowercase_mode() {
        let config = FeaturedCategoryConfig {
            mode: AssignmentMode::Fixed,
            allowed_category_ids: vec![CategoryId(3), CategoryId(9)],
        };
        let json = serde_json::to_string(&config).expect("serialize");
        assert_eq!(json, r#"{"mode":"fixed","allowed_category_ids":[3,9]}"#);

        let parsed: FeaturedCategoryConfig = serde_json::from_str("{}").expect("deserialize");
        assert_eq!(parsed, FeaturedCategoryConfig::default());
        assert_eq!(parsed.mode, AssignmentMode::Select);
    }

    #[test]
    fn distinct_ids_keep_first_appearance() {
        let config = FeaturedCategoryConfig {
            mode: AssignmentMode::Select,
            allowed_category_ids: [5, 2, 5, 7, 2].into_iter().map(CategoryId).collect(),
        };
        assert_eq!(
            config.distinct_category_ids(),
            vec![CategoryId(5), CategoryId(2), CategoryId(7)]
        );
        assert!(config.allows(CategoryId(7)));
        assert!(!config.allows(CategoryId(1)));
    }

    #[test]
    fn mode_parsing() {
        assert_eq!("Fixed".parse::<AssignmentMode>().unwrap(), AssignmentMode::Fixed);
        assert_eq!(" select ".parse::<AssignmentMode>().unwrap(), AssignmentMode::Select);
        assert!("sometimes".parse::<AssignmentMode>().is_err());
    }

    #[test]
    fn category_id_parsing() {
        assert_eq!("42".parse::<CategoryId>().unwrap(), CategoryId(42));
        let err = "abc".parse::<CategoryId>().unwrap_err();
        assert!(err.to_string().contains("invalid category id"));
    }

    #[test]
    fn admin_requires_login_and_flag() {
        let anonymous = Session::default();
        let err = anonymous.require_admin().unwrap_err();
        assert!(err.to_string().contains("not logged in"));

        let staff = Session {
            authenticated: true,
            is_admin: false,
        };
        assert!(staff.require_authenticated().is_ok());
        assert!(staff.require_admin().unwrap_err().to_string().contains("permission"));

        let admin = Session {
            authenticated: true,
            is_admin: true,
        };
        assert!(admin.require_admin().is_ok());
    }
}
