use std::collections::BTreeSet;

use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use review_cell::{aggregate_reviews, summary_for, ReviewService};
use shared_config::AppConfig;
use shared_database::{DatabaseClient, Query};
use shared_models::entity::EntityType;
use shared_utils::media::{FileUpload, MediaStorage};

use crate::models::{
    DirectoryError, Doctor, Hospital, HospitalDetail, HospitalListQuery, HospitalRequest, Rated,
    CATEGORIES, DOCTORS, HOSPITALS,
};
use crate::services::entity::{purge_dependents, replace_image};
use crate::services::text::{optional_email, optional_text, required_text};
use crate::services::working_time::WorkingTimeService;

type Result<T> = std::result::Result<T, DirectoryError>;

pub struct HospitalService {
    db: DatabaseClient,
    reviews: ReviewService,
    working_times: WorkingTimeService,
    media: MediaStorage,
}

impl HospitalService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: DatabaseClient::new(config),
            reviews: ReviewService::new(config),
            working_times: WorkingTimeService::new(config),
            media: MediaStorage::new(config),
        }
    }

    async fn ensure_categories_exist(&self, category_ids: &[Uuid]) -> Result<Vec<Uuid>> {
        let unique: Vec<Uuid> = category_ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        if unique.is_empty() {
            return Ok(unique);
        }

        let found = self
            .db
            .count(CATEGORIES, &Query::new().in_list("id", &unique))
            .await?;
        if found != unique.len() {
            return Err(DirectoryError::validation("category_ids", "One or more categories do not exist."));
        }
        Ok(unique)
    }

    pub async fn list(&self, filter: &HospitalListQuery) -> Result<Vec<Rated<Hospital>>> {
        let mut query = Query::new().order("name.asc");
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.ilike("name", search);
        }
        if let Some(city) = filter.city.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.ilike("location->>city", city);
        }
        if let Some(category_id) = filter.category_id {
            query = query.contains("category_ids", category_id);
        }

        let hospitals: Vec<Hospital> = self.db.select(HOSPITALS, &query).await?;

        let ids: Vec<Uuid> = hospitals.iter().map(|h| h.id).collect();
        let reviews = self.reviews.reviews_for_entities(EntityType::Hospital, &ids).await?;
        let aggregates = aggregate_reviews(&reviews);

        Ok(hospitals
            .into_iter()
            .map(|hospital| Rated {
                reviews: summary_for(&aggregates, &hospital.id),
                item: hospital,
            })
            .collect())
    }

    pub async fn get(&self, hospital_id: Uuid) -> Result<Hospital> {
        self.db
            .select_one(HOSPITALS, &Query::new().eq("id", hospital_id))
            .await?
            .ok_or(DirectoryError::HospitalNotFound)
    }

    pub async fn detail(&self, hospital_id: Uuid) -> Result<HospitalDetail> {
        debug!("Fetching hospital detail: {}", hospital_id);

        let hospital = self.get(hospital_id).await?;
        let working_times = self.working_times.for_entity(EntityType::Hospital, hospital_id).await?;
        let reviews = self.reviews.reviews_for_entity(EntityType::Hospital, hospital_id).await?;
        let specialists: Vec<Doctor> = self
            .db
            .select(DOCTORS, &Query::new().eq("hospital_id", hospital_id).order("name.asc"))
            .await?;

        Ok(HospitalDetail {
            summary: review_cell::services::summarize(reviews.iter().map(|r| r.rating)),
            hospital,
            working_times,
            reviews,
            specialists,
        })
    }

    pub async fn create(&self, request: HospitalRequest) -> Result<Hospital> {
        let name = required_text("name", request.name, 255)?;
        let category_ids = self
            .ensure_categories_exist(request.category_ids.as_deref().unwrap_or_default())
            .await?;

        let now = Utc::now().to_rfc3339();
        let document = json!({
            "id": Uuid::new_v4(),
            "name": name,
            "description": optional_text("description", request.description, 1000)?,
            "category_ids": category_ids,
            "location": request.location,
            "phone_number": optional_text("phone_number", request.phone_number, 15)?,
            "email": optional_email(request.email)?,
            "website": optional_text("website", request.website, 255)?,
            "image": null,
            "is_favorite": false,
            "created_at": now,
            "updated_at": now
        });

        let hospital: Hospital = self.db.insert(HOSPITALS, &document).await?;
        self.working_times.seed_defaults(EntityType::Hospital, hospital.id).await?;

        info!("Hospital {} created: {}", hospital.id, hospital.name);
        Ok(hospital)
    }

    pub async fn update(&self, hospital_id: Uuid, request: HospitalRequest) -> Result<Hospital> {
        debug!("Updating hospital: {}", hospital_id);

        let mut update_data = Map::new();
        if let Some(name) = request.name {
            update_data.insert("name".to_string(), json!(required_text("name", Some(name), 255)?));
        }
        if let Some(description) = optional_text("description", request.description, 1000)? {
            update_data.insert("description".to_string(), json!(description));
        }
        if let Some(category_ids) = request.category_ids {
            let category_ids = self.ensure_categories_exist(&category_ids).await?;
            update_data.insert("category_ids".to_string(), json!(category_ids));
        }
        if let Some(location) = request.location {
            update_data.insert("location".to_string(), json!(location));
        }
        if let Some(phone_number) = optional_text("phone_number", request.phone_number, 15)? {
            update_data.insert("phone_number".to_string(), json!(phone_number));
        }
        if let Some(email) = optional_email(request.email)? {
            update_data.insert("email".to_string(), json!(email));
        }
        if let Some(website) = optional_text("website", request.website, 255)? {
            update_data.insert("website".to_string(), json!(website));
        }
        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let mut rows: Vec<Hospital> = self
            .db
            .update(HOSPITALS, &Query::new().eq("id", hospital_id), Value::Object(update_data))
            .await?;

        if rows.is_empty() {
            return Err(DirectoryError::HospitalNotFound);
        }
        Ok(rows.swap_remove(0))
    }

    /// Deletes the hospital, detaches its doctors and removes its dependent records.
    pub async fn delete(&self, hospital_id: Uuid) -> Result<()> {
        let removed: Vec<Hospital> = self
            .db
            .delete(HOSPITALS, &Query::new().eq("id", hospital_id))
            .await?;

        let Some(hospital) = removed.into_iter().next() else {
            return Err(DirectoryError::HospitalNotFound);
        };

        let _: Vec<Value> = self
            .db
            .update(
                DOCTORS,
                &Query::new().eq("hospital_id", hospital_id),
                json!({ "hospital_id": null }),
            )
            .await?;
        purge_dependents(&self.db, EntityType::Hospital, hospital_id).await?;
        if let Some(image) = hospital.image {
            self.media.remove(&image).await;
        }

        info!("Hospital {} deleted", hospital_id);
        Ok(())
    }

    pub async fn upload_image(&self, hospital_id: Uuid, upload: &FileUpload) -> Result<Hospital> {
        let existing = self.get(hospital_id).await?;
        replace_image(&self.db, &self.media, EntityType::Hospital, hospital_id, existing.image, upload).await
    }
}
