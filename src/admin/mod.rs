//! Catalog administration registry.
//!
//! Every record type is registered with a [`ModelAdmin`] describing the
//! change-list columns, the filters the change list accepts, how the edit
//! form is grouped and which child records are edited inline. The admin
//! endpoints read this registry instead of hard-coding per-model behaviour.

pub mod filters;
pub mod site;

use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppError;

pub use filters::{DueBackFilter, InstanceFilter};
pub use site::AdminSite;

/// Record types managed through the admin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AdminModel {
    Author,
    Book,
    BookInstance,
    Genre,
    Language,
}

impl AdminModel {
    pub const ALL: [AdminModel; 5] = [
        AdminModel::Author,
        AdminModel::Book,
        AdminModel::BookInstance,
        AdminModel::Genre,
        AdminModel::Language,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AdminModel::Author => "author",
            AdminModel::Book => "book",
            AdminModel::BookInstance => "bookinstance",
            AdminModel::Genre => "genre",
            AdminModel::Language => "language",
        }
    }
}

impl std::fmt::Display for AdminModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AdminModel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AdminModel::ALL
            .into_iter()
            .find(|model| model.as_str() == s)
            .ok_or_else(|| AppError::NotFound(format!("No admin registered for model {}", s)))
    }
}

/// Layout of an inline editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum InlineType {
    Tabular,
}

/// Child records edited within the parent's form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct InlineAdmin {
    pub model: AdminModel,
    pub inline_type: InlineType,
    /// Blank rows offered for new children
    pub extra: usize,
}

impl InlineAdmin {
    pub fn tabular(model: AdminModel) -> Self {
        Self {
            model,
            inline_type: InlineType::Tabular,
            extra: 3,
        }
    }
}

/// A named group of form fields. Each line holds one or more fields shown side by side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Fieldset {
    pub name: Option<String>,
    pub fields: Vec<Vec<String>>,
}

impl Fieldset {
    /// Unnamed fieldset, one field per line
    pub fn new(fields: &[&str]) -> Self {
        Self {
            name: None,
            fields: fields.iter().map(|f| vec![f.to_string()]).collect(),
        }
    }

    #[must_use]
    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Append a line holding several fields
    #[must_use]
    pub fn line(mut self, fields: &[&str]) -> Self {
        self.fields.push(fields.iter().map(|f| f.to_string()).collect());
        self
    }

    /// Every field in the set, in display order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().flatten().map(String::as_str)
    }
}

/// How a record type is presented in the admin
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ModelAdmin {
    pub model: AdminModel,
    pub verbose_name: String,
    pub verbose_name_plural: String,
    pub list_display: Vec<String>,
    pub list_filter: Vec<String>,
    pub list_per_page: usize,
    pub fieldsets: Vec<Fieldset>,
    pub inlines: Vec<InlineAdmin>,
}

impl ModelAdmin {
    pub fn new(model: AdminModel, verbose_name: &str) -> Self {
        Self {
            model,
            verbose_name: verbose_name.to_string(),
            verbose_name_plural: format!("{}s", verbose_name),
            list_display: Vec::new(),
            list_filter: Vec::new(),
            list_per_page: 100,
            fieldsets: Vec::new(),
            inlines: Vec::new(),
        }
    }

    #[must_use]
    pub fn list_display(mut self, fields: &[&str]) -> Self {
        self.list_display = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    #[must_use]
    pub fn list_filter(mut self, fields: &[&str]) -> Self {
        self.list_filter = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    #[must_use]
    pub fn fieldsets(mut self, fieldsets: Vec<Fieldset>) -> Self {
        self.fieldsets = fieldsets;
        self
    }

    #[must_use]
    pub fn inlines(mut self, inlines: Vec<InlineAdmin>) -> Self {
        self.inlines = inlines;
        self
    }

    pub fn has_filter(&self, field: &str) -> bool {
        self.list_filter.iter().any(|f| f == field)
    }

    /// Keep only the change-list columns of a serialized record. `pk` is
    /// always kept so rows can link to their change form.
    pub fn project(&self, record: serde_json::Value) -> serde_json::Value {
        let serde_json::Value::Object(mut fields) = record else {
            return record;
        };

        let mut row = serde_json::Map::new();
        if let Some(pk) = fields.get("id") {
            row.insert("pk".to_string(), pk.clone());
        }
        for column in &self.list_display {
            let value = fields.remove(column).unwrap_or(serde_json::Value::Null);
            row.insert(column.clone(), value);
        }
        serde_json::Value::Object(row)
    }
}
