use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;
use utoipa::ToSchema;

use regex::Regex;

const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";

static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_REGEX.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("Invalid email regex pattern"))
}

/// Store-assigned identifier of an item.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, ToSchema,
)]
#[serde(transparent)]
pub struct ItemId(pub i64);

impl ItemId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ItemId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    Pending,
    Processed,
}

impl ItemStatus {
    pub const ALL: [ItemStatus; 2] = [Self::Pending, Self::Processed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processed => "processed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processed" => Some(Self::Processed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub description: String,
    pub status: ItemStatus,
    pub email: String,
}

impl Item {
    /// Marks the item as processed. Already processed items stay processed.
    pub fn mark_processed(&mut self) {
        self.status = ItemStatus::Processed;
    }

    pub fn is_processed(&self) -> bool {
        self.status == ItemStatus::Processed
    }
}

/// Item fields without an identifier, as accepted by `ItemStore::insert`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewItem {
    pub name: String,
    pub description: String,
    pub status: ItemStatus,
    pub email: String,
}

impl NewItem {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            status: ItemStatus::default(),
            email: email.into(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_status(mut self, status: ItemStatus) -> Self {
        self.status = status;
        self
    }

    pub fn into_item(self, id: ItemId) -> Item {
        Item {
            id,
            name: self.name,
            description: self.description,
            status: self.status,
            email: self.email,
        }
    }
}

/// Field name to message, ordered by field for stable responses.
pub type ValidationErrors = BTreeMap<String, String>;

/// Request body for creating or replacing an item.
///
/// Every field is optional on the wire so that missing fields surface as
/// validation messages instead of deserialization failures.
#[derive(Debug, Clone, Serialize, Deserialize, Default, ToSchema)]
#[serde(default)]
pub struct ItemRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ItemStatus>,
    pub email: Option<String>,
}

impl ItemRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if is_blank(self.name.as_deref()) {
            errors.insert("name".to_string(), "Name cannot be blank".to_string());
        }

        match self.email.as_deref() {
            email if is_blank(email) => {
                errors.insert("email".to_string(), "Email is required".to_string());
            }
            Some(email) if !email_regex().is_match(email) => {
                errors.insert("email".to_string(), "Email format is invalid".to_string());
            }
            _ => {}
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validates and converts into insertable fields.
    pub fn into_new_item(self) -> Result<NewItem, ValidationErrors> {
        self.validate()?;
        Ok(NewItem {
            name: self.name.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            status: self.status.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
        })
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}
