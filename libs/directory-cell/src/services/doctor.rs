use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use review_cell::services::summarize;
use review_cell::{aggregate_reviews, summary_for, ReviewService};
use shared_config::AppConfig;
use shared_database::{DatabaseClient, Query};
use shared_models::entity::EntityType;
use shared_utils::media::{FileUpload, MediaStorage};

use crate::models::{
    Category, DirectoryError, Doctor, DoctorDetail, DoctorListQuery, DoctorRequest, Hospital, Rated,
    APPOINTMENTS, CATEGORIES, DOCTORS, DOCTOR_PACKAGES, HOSPITALS,
};
use crate::services::entity::{purge_dependents, replace_image};
use crate::services::text::{optional_email, optional_text, required_text};
use crate::services::working_time::WorkingTimeService;

type Result<T> = std::result::Result<T, DirectoryError>;

pub struct DoctorService {
    db: DatabaseClient,
    reviews: ReviewService,
    working_times: WorkingTimeService,
    media: MediaStorage,
}

impl DoctorService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: DatabaseClient::new(config),
            reviews: ReviewService::new(config),
            working_times: WorkingTimeService::new(config),
            media: MediaStorage::new(config),
        }
    }

    async fn ensure_references(&self, category_id: Option<Uuid>, hospital_id: Option<Uuid>) -> Result<()> {
        if let Some(category_id) = category_id {
            if !self.db.exists(CATEGORIES, &Query::new().eq("id", category_id)).await? {
                return Err(DirectoryError::validation("category_id", "Category not found."));
            }
        }
        if let Some(hospital_id) = hospital_id {
            if !self.db.exists(HOSPITALS, &Query::new().eq("id", hospital_id)).await? {
                return Err(DirectoryError::validation("hospital_id", "Hospital not found."));
            }
        }
        Ok(())
    }

    pub async fn list(&self, filter: &DoctorListQuery) -> Result<Vec<Rated<Doctor>>> {
        let mut query = Query::new().order("name.asc");
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.ilike("name", search);
        }
        if let Some(category_id) = filter.category_id {
            query = query.eq("category_id", category_id);
        }
        if let Some(hospital_id) = filter.hospital_id {
            query = query.eq("hospital_id", hospital_id);
        }

        let doctors: Vec<Doctor> = self.db.select(DOCTORS, &query).await?;

        let ids: Vec<Uuid> = doctors.iter().map(|d| d.id).collect();
        let reviews = self.reviews.reviews_for_entities(EntityType::Doctor, &ids).await?;
        let aggregates = aggregate_reviews(&reviews);

        Ok(doctors
            .into_iter()
            .map(|doctor| Rated {
                reviews: summary_for(&aggregates, &doctor.id),
                item: doctor,
            })
            .collect())
    }

    pub async fn get(&self, doctor_id: Uuid) -> Result<Doctor> {
        self.db
            .select_one(DOCTORS, &Query::new().eq("id", doctor_id))
            .await?
            .ok_or(DirectoryError::DoctorNotFound)
    }

    pub async fn detail(&self, doctor_id: Uuid) -> Result<DoctorDetail> {
        debug!("Fetching doctor detail: {}", doctor_id);

        let doctor = self.get(doctor_id).await?;
        let working_times = self.working_times.for_entity(EntityType::Doctor, doctor_id).await?;
        let reviews = self.reviews.reviews_for_entity(EntityType::Doctor, doctor_id).await?;

        let category: Option<Category> = match doctor.category_id {
            Some(id) => self.db.select_one(CATEGORIES, &Query::new().eq("id", id)).await?,
            None => None,
        };
        let hospital: Option<Hospital> = match doctor.hospital_id {
            Some(id) => self.db.select_one(HOSPITALS, &Query::new().eq("id", id)).await?,
            None => None,
        };

        Ok(DoctorDetail {
            summary: summarize(reviews.iter().map(|r| r.rating)),
            doctor,
            working_times,
            reviews,
            category,
            hospital,
        })
    }

    pub async fn create(&self, request: DoctorRequest) -> Result<Doctor> {
        let name = required_text("name", request.name, 100)?;
        self.ensure_references(request.category_id, request.hospital_id).await?;

        let now = Utc::now().to_rfc3339();
        let document = json!({
            "id": Uuid::new_v4(),
            "name": name,
            "category_id": request.category_id,
            "hospital_id": request.hospital_id,
            "qualification": optional_text("qualification", request.qualification, 255)?,
            "experience_years": request.experience_years,
            "about": optional_text("about", request.about, 1000)?,
            "gender": optional_text("gender", request.gender, 10)?,
            "phone_number": optional_text("phone_number", request.phone_number, 15)?,
            "email": optional_email(request.email)?,
            "location": optional_text("location", request.location, 255)?,
            "image": null,
            "is_favorite": false,
            "created_at": now,
            "updated_at": now
        });

        let doctor: Doctor = self.db.insert(DOCTORS, &document).await?;
        self.working_times.seed_defaults(EntityType::Doctor, doctor.id).await?;

        info!("Doctor {} created: {}", doctor.id, doctor.name);
        Ok(doctor)
    }

    pub async fn update(&self, doctor_id: Uuid, request: DoctorRequest) -> Result<Doctor> {
        debug!("Updating doctor: {}", doctor_id);

        self.ensure_references(request.category_id, request.hospital_id).await?;

        let mut update_data = Map::new();
        if let Some(name) = request.name {
            update_data.insert("name".to_string(), json!(required_text("name", Some(name), 100)?));
        }
        if let Some(category_id) = request.category_id {
            update_data.insert("category_id".to_string(), json!(category_id));
        }
        if let Some(hospital_id) = request.hospital_id {
            update_data.insert("hospital_id".to_string(), json!(hospital_id));
        }
        if let Some(qualification) = optional_text("qualification", request.qualification, 255)? {
            update_data.insert("qualification".to_string(), json!(qualification));
        }
        if let Some(experience_years) = request.experience_years {
            update_data.insert("experience_years".to_string(), json!(experience_years));
        }
        if let Some(about) = optional_text("about", request.about, 1000)? {
            update_data.insert("about".to_string(), json!(about));
        }
        if let Some(gender) = optional_text("gender", request.gender, 10)? {
            update_data.insert("gender".to_string(), json!(gender));
        }
        if let Some(phone_number) = optional_text("phone_number", request.phone_number, 15)? {
            update_data.insert("phone_number".to_string(), json!(phone_number));
        }
        if let Some(email) = optional_email(request.email)? {
            update_data.insert("email".to_string(), json!(email));
        }
        if let Some(location) = optional_text("location", request.location, 255)? {
            update_data.insert("location".to_string(), json!(location));
        }
        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let mut rows: Vec<Doctor> = self
            .db
            .update(DOCTORS, &Query::new().eq("id", doctor_id), Value::Object(update_data))
            .await?;

        if rows.is_empty() {
            return Err(DirectoryError::DoctorNotFound);
        }
        Ok(rows.swap_remove(0))
    }

    async fn has_appointments(&self, doctor_id: Uuid) -> Result<bool> {
        let packages: Vec<Value> = self
            .db
            .select(DOCTOR_PACKAGES, &Query::new().eq("doctor_id", doctor_id).select("id"))
            .await?;
        let package_ids: Vec<&str> = packages.iter().filter_map(|p| p["id"].as_str()).collect();
        if package_ids.is_empty() {
            return Ok(false);
        }

        Ok(self
            .db
            .exists(APPOINTMENTS, &Query::new().in_list("package_id", &package_ids))
            .await?)
    }

    pub async fn delete(&self, doctor_id: Uuid) -> Result<()> {
        if self.has_appointments(doctor_id).await? {
            return Err(DirectoryError::DoctorHasAppointments);
        }

        let removed: Vec<Doctor> = self
            .db
            .delete(DOCTORS, &Query::new().eq("id", doctor_id))
            .await?;

        let Some(doctor) = removed.into_iter().next() else {
            return Err(DirectoryError::DoctorNotFound);
        };

        purge_dependents(&self.db, EntityType::Doctor, doctor_id).await?;
        let packages: Vec<Value> = self
            .db
            .delete(DOCTOR_PACKAGES, &Query::new().eq("doctor_id", doctor_id))
            .await?;
        debug!("Removed {} packages of doctor {}", packages.len(), doctor_id);

        if let Some(image) = doctor.image {
            self.media.remove(&image).await;
        }

        info!("Doctor {} deleted", doctor_id);
        Ok(())
    }

    pub async fn upload_image(&self, doctor_id: Uuid, upload: &FileUpload) -> Result<Doctor> {
        let existing = self.get(doctor_id).await?;
        replace_image(&self.db, &self.media, EntityType::Doctor, doctor_id, existing.image, upload).await
    }
}
