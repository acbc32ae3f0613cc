//! Catalog administration: change lists, change forms and record edits
//! driven by the `AdminSite` registry.

use std::{collections::HashMap, sync::Arc};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    admin::{
        filters::{check_params, instance_filter},
        AdminModel, AdminSite, Fieldset, InstanceFilter, ModelAdmin,
    },
    error::{AppError, AppResult},
    models::{
        admin_row::BookInstanceAdminRow,
        author::AuthorInput,
        book::{display_genre, BookInput},
        book_instance::BookInstanceInput,
        genre::GenreInput,
        language::LanguageInput,
    },
    pagination::{PageMeta, PageQuery, Paginator},
    repository::Repository,
};

/// Admin change list: one page of rows projected on `list_display`
#[derive(Debug, Serialize, ToSchema)]
pub struct ChangeList {
    pub model: AdminModel,
    pub columns: Vec<String>,
    pub filters: Vec<String>,
    #[schema(value_type = Vec<Object>)]
    pub rows: Vec<Value>,
    pub page: PageMeta,
}

/// Records edited inline in a parent's form
#[derive(Debug, Serialize, ToSchema)]
pub struct InlineRecords {
    pub model: AdminModel,
    #[schema(value_type = Vec<Object>)]
    pub records: Vec<Value>,
}

/// Admin change form: the record, its field grouping and its inline children
#[derive(Debug, Serialize, ToSchema)]
pub struct ChangeForm {
    pub model: AdminModel,
    pub fieldsets: Vec<Fieldset>,
    #[schema(value_type = Object)]
    pub record: Value,
    pub inlines: Vec<InlineRecords>,
}

/// Primary key of an admin-managed record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordId {
    Int(i32),
    Uuid(Uuid),
}

impl RecordId {
    fn parse(model: AdminModel, raw: &str) -> AppResult<Self> {
        let not_found = || AppError::NotFound(format!("{} with id {} not found", model, raw));
        match model {
            AdminModel::BookInstance => raw.parse().map(RecordId::Uuid).map_err(|_| not_found()),
            _ => raw.parse().map(RecordId::Int).map_err(|_| not_found()),
        }
    }

    fn int(self) -> i32 {
        match self {
            RecordId::Int(id) => id,
            RecordId::Uuid(_) => 0,
        }
    }

    fn uuid(self) -> Uuid {
        match self {
            RecordId::Uuid(id) => id,
            RecordId::Int(_) => Uuid::nil(),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> AppResult<Value> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(format!("Failed to serialize record: {}", e)))
}

/// Decode and validate a create/update payload
fn parse_input<T: DeserializeOwned + Validate>(payload: Value) -> AppResult<T> {
    let input: T = serde_json::from_value(payload).map_err(|e| AppError::Validation(e.to_string()))?;
    input.validate()?;
    Ok(input)
}

#[derive(Clone)]
pub struct AdminService {
    repository: Repository,
    site: Arc<AdminSite>,
}

impl AdminService {
    pub fn new(repository: Repository, site: AdminSite) -> Self {
        Self {
            repository,
            site: Arc::new(site),
        }
    }

    pub fn site(&self) -> &AdminSite {
        &self.site
    }

    pub fn model_admin(&self, model: AdminModel) -> AppResult<&ModelAdmin> {
        self.site
            .get(model)
            .ok_or_else(|| AppError::NotFound(format!("No admin registered for model {}", model)))
    }

    // =========================================================================
    // READ
    // =========================================================================

    pub async fn change_list(&self, model: AdminModel, params: &HashMap<String, String>) -> AppResult<ChangeList> {
        let admin = self.model_admin(model)?;
        check_params(admin, params)?;

        let page = PageQuery { page: params.get("page").cloned() }.number()?;
        let per_page = admin.list_per_page;

        let (rows, meta) = match model {
            AdminModel::Author => {
                let meta = Paginator::new(self.repository.authors.count().await? as usize, per_page).page(page)?;
                let rows = self.repository.authors.list(meta.offset() as i64, per_page as i64).await?;
                (rows.iter().map(to_json).collect::<AppResult<Vec<_>>>()?, meta)
            }
            AdminModel::Book => {
                let meta = Paginator::new(self.repository.books.count().await? as usize, per_page).page(page)?;
                let rows = self
                    .repository
                    .books
                    .list_admin_rows(meta.offset() as i64, per_page as i64)
                    .await?;
                (rows.iter().map(to_json).collect::<AppResult<Vec<_>>>()?, meta)
            }
            AdminModel::BookInstance => {
                let filter: InstanceFilter = instance_filter(params)?;
                let total = self.repository.book_instances.count_filtered(&filter).await?;
                let meta = Paginator::new(total as usize, per_page).page(page)?;
                let rows = self
                    .repository
                    .book_instances
                    .list_filtered(&filter, meta.offset() as i64, per_page as i64)
                    .await?;
                let rows = rows
                    .into_iter()
                    .map(BookInstanceAdminRow::from)
                    .map(|row| to_json(&row))
                    .collect::<AppResult<Vec<_>>>()?;
                (rows, meta)
            }
            AdminModel::Genre => {
                let meta = Paginator::new(self.repository.genres.count().await? as usize, per_page).page(page)?;
                let rows = self.repository.genres.list(meta.offset() as i64, per_page as i64).await?;
                (rows.iter().map(to_json).collect::<AppResult<Vec<_>>>()?, meta)
            }
            AdminModel::Language => {
                let meta =
                    Paginator::new(self.repository.languages.count().await? as usize, per_page).page(page)?;
                let rows = self.repository.languages.list(meta.offset() as i64, per_page as i64).await?;
                (rows.iter().map(to_json).collect::<AppResult<Vec<_>>>()?, meta)
            }
        };

        Ok(ChangeList {
            model,
            columns: admin.list_display.clone(),
            filters: admin.list_filter.clone(),
            rows: rows.into_iter().map(|row| admin.project(row)).collect(),
            page: meta,
        })
    }

    pub async fn change_form(&self, model: AdminModel, raw_id: &str) -> AppResult<ChangeForm> {
        let admin = self.model_admin(model)?;
        let id = RecordId::parse(model, raw_id)?;
        let record = self.get_record(model, id).await?;

        let mut inlines = Vec::with_capacity(admin.inlines.len());
        for inline in &admin.inlines {
            let records = self.inline_records(model, id, inline.model).await?;
            inlines.push(InlineRecords {
                model: inline.model,
                records,
            });
        }

        Ok(ChangeForm {
            model,
            fieldsets: admin.fieldsets.clone(),
            record,
            inlines,
        })
    }

    async fn get_record(&self, model: AdminModel, id: RecordId) -> AppResult<Value> {
        match model {
            AdminModel::Author => to_json(&self.repository.authors.get_by_id(id.int()).await?),
            AdminModel::Book => {
                let book = self.repository.books.get_by_id(id.int()).await?;
                let genres = self.repository.genres.list_for_book(book.id).await?;
                let mut record = to_json(&book)?;
                record["genre_ids"] = to_json(&genres.iter().map(|g| g.id).collect::<Vec<_>>())?;
                record["display_genre"] = Value::String(display_genre(&genres));
                Ok(record)
            }
            AdminModel::BookInstance => to_json(&self.repository.book_instances.get_by_id(id.uuid()).await?),
            AdminModel::Genre => to_json(&self.repository.genres.get_by_id(id.int()).await?),
            AdminModel::Language => to_json(&self.repository.languages.get_by_id(id.int()).await?),
        }
    }

    async fn inline_records(&self, parent: AdminModel, id: RecordId, child: AdminModel) -> AppResult<Vec<Value>> {
        match (parent, child) {
            (AdminModel::Author, AdminModel::Book) => self
                .repository
                .books
                .list_by_author(id.int())
                .await?
                .iter()
                .map(to_json)
                .collect(),
            (AdminModel::Book, AdminModel::BookInstance) => self
                .repository
                .book_instances
                .list_for_book(id.int())
                .await?
                .iter()
                .map(to_json)
                .collect(),
            _ => Err(AppError::Internal(format!(
                "No inline relation from {} to {}",
                parent, child
            ))),
        }
    }

    // =========================================================================
    // WRITE
    // =========================================================================

    pub async fn create(&self, model: AdminModel, payload: Value) -> AppResult<Value> {
        self.model_admin(model)?;
        let record = match model {
            AdminModel::Author => {
                let input: AuthorInput = parse_input(payload)?;
                to_json(&self.repository.authors.create(&input).await?)?
            }
            AdminModel::Book => {
                let input: BookInput = parse_input(payload)?;
                self.check_book_references(&input).await?;
                to_json(&self.repository.books.create(&input).await?)?
            }
            AdminModel::BookInstance => {
                let input: BookInstanceInput = parse_input(payload)?;
                self.check_instance_references(&input).await?;
                to_json(&self.repository.book_instances.create(&input).await?)?
            }
            AdminModel::Genre => {
                let input: GenreInput = parse_input(payload)?;
                to_json(&self.repository.genres.create(&input).await?)?
            }
            AdminModel::Language => {
                let input: LanguageInput = parse_input(payload)?;
                to_json(&self.repository.languages.create(&input).await?)?
            }
        };

        tracing::info!(model = %model, id = %record["id"], "Admin created record");
        Ok(record)
    }

    pub async fn update(&self, model: AdminModel, raw_id: &str, payload: Value) -> AppResult<Value> {
        self.model_admin(model)?;
        let id = RecordId::parse(model, raw_id)?;
        let record = match model {
            AdminModel::Author => {
                let input: AuthorInput = parse_input(payload)?;
                to_json(&self.repository.authors.update(id.int(), &input).await?)?
            }
            AdminModel::Book => {
                let input: BookInput = parse_input(payload)?;
                self.check_book_references(&input).await?;
                to_json(&self.repository.books.update(id.int(), &input).await?)?
            }
            AdminModel::BookInstance => {
                let input: BookInstanceInput = parse_input(payload)?;
                self.check_instance_references(&input).await?;
                to_json(&self.repository.book_instances.update(id.uuid(), &input).await?)?
            }
            AdminModel::Genre => {
                let input: GenreInput = parse_input(payload)?;
                to_json(&self.repository.genres.update(id.int(), &input).await?)?
            }
            AdminModel::Language => {
                let input: LanguageInput = parse_input(payload)?;
                to_json(&self.repository.languages.update(id.int(), &input).await?)?
            }
        };

        tracing::info!(model = %model, id = %raw_id, "Admin updated record");
        Ok(record)
    }

    pub async fn delete(&self, model: AdminModel, raw_id: &str) -> AppResult<()> {
        self.model_admin(model)?;
        match (model, RecordId::parse(model, raw_id)?) {
            (AdminModel::BookInstance, RecordId::Uuid(id)) => self.repository.book_instances.delete(id).await?,
            (AdminModel::Author, RecordId::Int(id)) => self.repository.authors.delete(id).await?,
            (AdminModel::Book, RecordId::Int(id)) => self.repository.books.delete(id).await?,
            (AdminModel::Genre, RecordId::Int(id)) => self.repository.genres.delete(id).await?,
            (AdminModel::Language, RecordId::Int(id)) => self.repository.languages.delete(id).await?,
            _ => return Err(AppError::NotFound(format!("{} with id {} not found", model, raw_id))),
        }

        tracing::info!(model = %model, id = %raw_id, "Admin deleted record");
        Ok(())
    }

    async fn check_book_references(&self, input: &BookInput) -> AppResult<()> {
        if !self.repository.authors.exists(input.author_id).await? {
            return Err(AppError::Validation(format!("Author {} does not exist", input.author_id)));
        }
        if !self.repository.languages.exists(input.language_id).await? {
            return Err(AppError::Validation(format!("Language {} does not exist", input.language_id)));
        }

        let mut genre_ids = input.genre_ids.clone();
        genre_ids.sort_unstable();
        genre_ids.dedup();
        if self.repository.genres.count_existing(&genre_ids).await? != genre_ids.len() as i64 {
            return Err(AppError::Validation("Unknown genre id".to_string()));
        }
        Ok(())
    }

    async fn check_instance_references(&self, input: &BookInstanceInput) -> AppResult<()> {
        if !self.repository.books.exists(input.book_id).await? {
            return Err(AppError::Validation(format!("Book {} does not exist", input.book_id)));
        }
        if let Some(borrower_id) = input.borrower_id {
            if !self.repository.users.exists(borrower_id).await? {
                return Err(AppError::Validation(format!("User {} does not exist", borrower_id)));
            }
        }
        Ok(())
    }
}
