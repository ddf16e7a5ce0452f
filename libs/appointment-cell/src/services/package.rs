use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use directory_cell::DOCTORS;
use shared_config::AppConfig;
use shared_database::{DatabaseClient, Query};

use crate::models::{
    AppointmentError, DoctorPackage, PackageListQuery, PackageRequest, APPOINTMENTS, DEFAULT_DURATION_MINUTES,
    DOCTOR_PACKAGES,
};

type Result<T> = std::result::Result<T, AppointmentError>;

fn checked_duration(minutes: i64) -> Result<u32> {
    u32::try_from(minutes)
        .ok()
        .filter(|m| *m > 0)
        .ok_or_else(|| AppointmentError::validation("duration_minutes", "Duration must be a positive number of minutes."))
}

fn checked_amount(amount: i64) -> Result<i64> {
    if amount < 0 {
        return Err(AppointmentError::validation("amount", "Amount cannot be negative."));
    }
    Ok(amount)
}

pub struct PackageService {
    db: DatabaseClient,
}

impl PackageService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: DatabaseClient::new(config),
        }
    }

    async fn ensure_doctor(&self, doctor_id: Uuid) -> Result<()> {
        if !self.db.exists(DOCTORS, &Query::new().eq("id", doctor_id)).await? {
            return Err(AppointmentError::validation("doctor_id", "Doctor not found."));
        }
        Ok(())
    }

    pub async fn list(&self, filter: &PackageListQuery) -> Result<Vec<DoctorPackage>> {
        let mut query = Query::new().order("amount.asc");
        if let Some(doctor_id) = filter.doctor_id {
            query = query.eq("doctor_id", doctor_id);
        }
        Ok(self.db.select(DOCTOR_PACKAGES, &query).await?)
    }

    pub async fn get(&self, package_id: Uuid) -> Result<DoctorPackage> {
        self.db
            .select_one(DOCTOR_PACKAGES, &Query::new().eq("id", package_id))
            .await?
            .ok_or(AppointmentError::PackageNotFound)
    }

    pub async fn create(&self, request: PackageRequest) -> Result<DoctorPackage> {
        let doctor_id = request
            .doctor_id
            .ok_or_else(|| AppointmentError::validation("doctor_id", "This field is required."))?;
        let package = request
            .package
            .ok_or_else(|| AppointmentError::validation("package", "This field is required."))?;
        let duration_minutes = checked_duration(request.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES))?;
        let amount = checked_amount(request.amount.unwrap_or(0))?;

        self.ensure_doctor(doctor_id).await?;

        let now = Utc::now().to_rfc3339();
        let document = json!({
            "id": Uuid::new_v4(),
            "doctor_id": doctor_id,
            "duration_minutes": duration_minutes,
            "package": package,
            "amount": amount,
            "created_at": now,
            "updated_at": now
        });

        let created: DoctorPackage = self.db.insert(DOCTOR_PACKAGES, &document).await?;
        info!("Package {} created for doctor {}", created.id, doctor_id);
        Ok(created)
    }

    pub async fn update(&self, package_id: Uuid, request: PackageRequest) -> Result<DoctorPackage> {
        debug!("Updating package: {}", package_id);

        let mut update_data = Map::new();
        if let Some(doctor_id) = request.doctor_id {
            self.ensure_doctor(doctor_id).await?;
            update_data.insert("doctor_id".to_string(), json!(doctor_id));
        }
        if let Some(duration) = request.duration_minutes {
            update_data.insert("duration_minutes".to_string(), json!(checked_duration(duration)?));
        }
        if let Some(package) = request.package {
            update_data.insert("package".to_string(), json!(package));
        }
        if let Some(amount) = request.amount {
            update_data.insert("amount".to_string(), json!(checked_amount(amount)?));
        }
        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let mut rows: Vec<DoctorPackage> = self
            .db
            .update(DOCTOR_PACKAGES, &Query::new().eq("id", package_id), Value::Object(update_data))
            .await?;

        if rows.is_empty() {
            return Err(AppointmentError::PackageNotFound);
        }
        Ok(rows.swap_remove(0))
    }

    /// Packages with appointments stay, since appointments resolve their doctor through them.
    pub async fn delete(&self, package_id: Uuid) -> Result<()> {
        if self
            .db
            .exists(APPOINTMENTS, &Query::new().eq("package_id", package_id))
            .await?
        {
            return Err(AppointmentError::PackageInUse);
        }

        let removed: Vec<Value> = self
            .db
            .delete(DOCTOR_PACKAGES, &Query::new().eq("id", package_id))
            .await?;

        if removed.is_empty() {
            return Err(AppointmentError::PackageNotFound);
        }

        info!("Package {} deleted", package_id);
        Ok(())
    }
}
