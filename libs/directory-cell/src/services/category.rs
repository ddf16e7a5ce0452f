use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{DatabaseClient, Query};

use crate::models::{Category, CategoryRequest, DirectoryError, CATEGORIES, DOCTORS, HOSPITALS};
use crate::services::text::{optional_text, required_text};

type Result<T> = std::result::Result<T, DirectoryError>;

#[derive(Deserialize)]
struct CategoryRefs {
    id: Uuid,
    #[serde(default)]
    category_ids: Vec<Uuid>,
}

pub struct CategoryService {
    db: DatabaseClient,
}

impl CategoryService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: DatabaseClient::new(config),
        }
    }

    async fn ensure_unique_name(&self, name: &str, except: Option<Uuid>) -> Result<()> {
        let mut query = Query::new().eq("name", name);
        if let Some(id) = except {
            query = query.neq("id", id);
        }
        if self.db.exists(CATEGORIES, &query).await? {
            return Err(DirectoryError::validation("name", "Category with this name already exists."));
        }
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<Category>> {
        Ok(self.db.select(CATEGORIES, &Query::new().order("name.asc")).await?)
    }

    pub async fn get(&self, category_id: Uuid) -> Result<Category> {
        self.db
            .select_one(CATEGORIES, &Query::new().eq("id", category_id))
            .await?
            .ok_or(DirectoryError::CategoryNotFound)
    }

    pub async fn create(&self, request: CategoryRequest) -> Result<Category> {
        let name = required_text("name", request.name, 100)?;
        let description = optional_text("description", request.description, 500)?;

        self.ensure_unique_name(&name, None).await?;

        let category: Category = self
            .db
            .insert(
                CATEGORIES,
                &json!({
                    "id": Uuid::new_v4(),
                    "name": name,
                    "description": description
                }),
            )
            .await?;

        info!("Category {} created: {}", category.id, category.name);
        Ok(category)
    }

    pub async fn update(&self, category_id: Uuid, request: CategoryRequest) -> Result<Category> {
        debug!("Updating category: {}", category_id);

        let mut update_data = Map::new();
        if let Some(name) = request.name {
            let name = required_text("name", Some(name), 100)?;
            self.ensure_unique_name(&name, Some(category_id)).await?;
            update_data.insert("name".to_string(), json!(name));
        }
        if let Some(description) = optional_text("description", request.description, 500)? {
            update_data.insert("description".to_string(), json!(description));
        }

        if update_data.is_empty() {
            return self.get(category_id).await;
        }

        let mut rows: Vec<Category> = self
            .db
            .update(CATEGORIES, &Query::new().eq("id", category_id), Value::Object(update_data))
            .await?;

        if rows.is_empty() {
            return Err(DirectoryError::CategoryNotFound);
        }
        Ok(rows.swap_remove(0))
    }

    pub async fn delete(&self, category_id: Uuid) -> Result<()> {
        let removed: Vec<Value> = self
            .db
            .delete(CATEGORIES, &Query::new().eq("id", category_id))
            .await?;

        if removed.is_empty() {
            return Err(DirectoryError::CategoryNotFound);
        }

        self.release_references(category_id).await?;
        info!("Category {} deleted", category_id);
        Ok(())
    }

    /// Drops the category from the doctors and hospitals that still point at it.
    async fn release_references(&self, category_id: Uuid) -> Result<()> {
        let doctors: Vec<Value> = self
            .db
            .update(
                DOCTORS,
                &Query::new().eq("category_id", category_id),
                json!({ "category_id": null }),
            )
            .await?;

        let hospitals: Vec<CategoryRefs> = self
            .db
            .select(
                HOSPITALS,
                &Query::new().contains("category_ids", category_id).select("id,category_ids"),
            )
            .await?;
        for hospital in &hospitals {
            let remaining: Vec<Uuid> = hospital
                .category_ids
                .iter()
                .copied()
                .filter(|id| *id != category_id)
                .collect();
            let _: Vec<Value> = self
                .db
                .update(
                    HOSPITALS,
                    &Query::new().eq("id", hospital.id),
                    json!({ "category_ids": remaining }),
                )
                .await?;
        }

        debug!(
            "Category {} released from {} doctors and {} hospitals",
            category_id,
            doctors.len(),
            hospitals.len()
        );
        Ok(())
    }
}
