//! Catalog admin registrations

use indexmap::IndexMap;
use serde::Serialize;
use utoipa::ToSchema;

use super::{AdminModel, Fieldset, InlineAdmin, ModelAdmin};

/// All registered `ModelAdmin`s, in registration order
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdminSite {
    #[schema(value_type = Object)]
    pub models: IndexMap<AdminModel, ModelAdmin>,
}

impl AdminSite {
    pub fn new() -> Self {
        Self {
            models: IndexMap::new(),
        }
    }

    pub fn register(&mut self, admin: ModelAdmin) {
        self.models.insert(admin.model, admin);
    }

    pub fn get(&self, model: AdminModel) -> Option<&ModelAdmin> {
        self.models.get(&model)
    }

    /// Registry for the catalog record types
    pub fn catalog() -> Self {
        let mut site = Self::new();

        site.register(
            ModelAdmin::new(AdminModel::Author, "author")
                .list_display(&["last_name", "first_name", "date_of_birth", "date_of_death"])
                .fieldsets(vec![Fieldset::new(&["first_name", "last_name"])
                    .line(&["date_of_birth", "date_of_death"])])
                .inlines(vec![InlineAdmin::tabular(AdminModel::Book)]),
        );

        site.register(
            ModelAdmin::new(AdminModel::Book, "book")
                .list_display(&["title", "author", "display_genre", "language"])
                .inlines(vec![InlineAdmin::tabular(AdminModel::BookInstance)]),
        );

        site.register(
            ModelAdmin::new(AdminModel::BookInstance, "book instance")
                .list_display(&["id", "book", "imprint", "due_back"])
                .list_filter(&["status", "due_back", "borrower"])
                .fieldsets(vec![
                    Fieldset::new(&["book", "imprint", "id"]),
                    Fieldset::new(&["status", "due_back", "borrower"]).named("Availability"),
                ]),
        );

        site.register(ModelAdmin::new(AdminModel::Genre, "genre").list_display(&["name"]));

        site.register(ModelAdmin::new(AdminModel::Language, "language").list_display(&["name"]));

        site
    }
}

impl Default for AdminSite {
    fn default() -> Self {
        Self::catalog()
    }
}
