use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use directory_cell::{Doctor, DOCTORS};
use patient_cell::{Patient, PatientError, PatientService, PATIENTS};
use shared_config::AppConfig;
use shared_database::{DatabaseClient, Query};
use shared_models::auth::AuthUser;

use crate::models::{
    Appointment, AppointmentDetail, AppointmentError, AppointmentListQuery, AppointmentStatus,
    BookAppointmentRequest, DoctorPackage, UpdateAppointmentRequest, APPOINTMENTS, DOCTOR_PACKAGES,
};
use crate::services::booking_id::generate_booking_id;
use crate::services::package::PackageService;

type Result<T> = std::result::Result<T, AppointmentError>;

const MAX_NOTES_LENGTH: usize = 500;
const MAX_REASON_LENGTH: usize = 500;
const BOOKING_ID_ATTEMPTS: usize = 5;

fn checked_schedule(scheduled_at: DateTime<Utc>, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    if scheduled_at <= now {
        return Err(AppointmentError::validation("scheduled_at", "Appointment time must be in the future."));
    }
    Ok(scheduled_at)
}

fn checked_text(field: &str, value: Option<String>, max: usize) -> Result<Option<String>> {
    match value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        Some(v) if v.chars().count() > max => Err(AppointmentError::validation(
            field,
            format!("Ensure this field has no more than {} characters.", max),
        )),
        other => Ok(other),
    }
}

/// Status guard for lifecycle moves. A second cancel is reported on its own.
pub fn ensure_transition(current: AppointmentStatus, next: AppointmentStatus) -> Result<()> {
    if current == AppointmentStatus::Cancelled && next == AppointmentStatus::Cancelled {
        return Err(AppointmentError::AlreadyCancelled);
    }
    if !current.can_transition_to(next) {
        return Err(AppointmentError::InvalidStatusTransition(current));
    }
    Ok(())
}

pub struct AppointmentService {
    db: DatabaseClient,
    patients: PatientService,
    packages: PackageService,
}

impl AppointmentService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: DatabaseClient::new(config),
            patients: PatientService::new(config),
            packages: PackageService::new(config),
        }
    }

    async fn unique_booking_id(&self) -> Result<String> {
        for _ in 0..BOOKING_ID_ATTEMPTS {
            let candidate = generate_booking_id(Utc::now());
            if !self.db.exists(APPOINTMENTS, &Query::new().eq("booking_id", &candidate)).await? {
                return Ok(candidate);
            }
            warn!("Booking id collision on {}, retrying", candidate);
        }
        Err(AppointmentError::validation("booking_id", "Could not allocate a booking id, please retry."))
    }

    /// Callers other than administrators only reach appointments of their own patients.
    async fn authorize(&self, appointment: &Appointment, caller: &AuthUser) -> Result<()> {
        if caller.is_admin {
            return Ok(());
        }
        match self.patients.get_patient(appointment.patient_id, caller).await {
            Ok(_) => Ok(()),
            Err(PatientError::Database(e)) => Err(e.into()),
            Err(_) => Err(AppointmentError::Forbidden),
        }
    }

    async fn owned_patient_ids(&self, caller: &AuthUser) -> Result<Vec<Uuid>> {
        let owned: Vec<Value> = self
            .db
            .select(PATIENTS, &Query::new().eq("user_id", &caller.id).select("id"))
            .await?;

        Ok(owned
            .iter()
            .filter_map(|row| row.get("id").and_then(Value::as_str))
            .filter_map(|id| Uuid::parse_str(id).ok())
            .collect())
    }

    pub async fn book(&self, request: BookAppointmentRequest, caller: &AuthUser) -> Result<Appointment> {
        let patient_id = request
            .patient_id
            .ok_or_else(|| AppointmentError::validation("patient_id", "This field is required."))?;
        let package_id = request
            .package_id
            .ok_or_else(|| AppointmentError::validation("package_id", "This field is required."))?;
        let scheduled_at = request
            .scheduled_at
            .ok_or_else(|| AppointmentError::validation("scheduled_at", "This field is required."))?;

        let now = Utc::now();
        let scheduled_at = checked_schedule(scheduled_at, now)?;
        let notes = checked_text("notes", request.notes, MAX_NOTES_LENGTH)?;

        let patient = self.patients.get_patient(patient_id, caller).await?;
        let package = self.packages.get(package_id).await?;

        let booking_id = self.unique_booking_id().await?;
        let document = json!({
            "id": Uuid::new_v4(),
            "booking_id": booking_id,
            "patient_id": patient.id,
            "package_id": package.id,
            "doctor_id": package.doctor_id,
            "scheduled_at": scheduled_at.to_rfc3339(),
            "notes": notes,
            "status": AppointmentStatus::Upcoming,
            "cancellation_reason": null,
            "cancelled_at": null,
            "completed_at": null,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let appointment: Appointment = self.db.insert(APPOINTMENTS, &document).await?;
        info!(
            "Appointment {} booked for patient {} with doctor {}",
            appointment.booking_id, patient.id, package.doctor_id
        );
        Ok(appointment)
    }

    pub async fn list(&self, filter: &AppointmentListQuery, caller: &AuthUser) -> Result<Vec<Appointment>> {
        let mut query = Query::new().order("scheduled_at.asc");
        if let Some(status) = filter.status {
            query = query.eq("status", status);
        }

        if let Some(patient_id) = filter.patient_id {
            if !caller.is_admin {
                self.patients.get_patient(patient_id, caller).await?;
            }
            query = query.eq("patient_id", patient_id);
        } else if !caller.is_admin {
            let owned = self.owned_patient_ids(caller).await?;
            if owned.is_empty() {
                return Ok(Vec::new());
            }
            query = query.in_list("patient_id", &owned);
        }

        Ok(self.db.select(APPOINTMENTS, &query).await?)
    }

    pub async fn get(&self, appointment_id: Uuid, caller: &AuthUser) -> Result<Appointment> {
        debug!("Fetching appointment: {}", appointment_id);

        let appointment: Appointment = self
            .db
            .select_one(APPOINTMENTS, &Query::new().eq("id", appointment_id))
            .await?
            .ok_or(AppointmentError::NotFound)?;

        self.authorize(&appointment, caller).await?;
        Ok(appointment)
    }

    pub async fn by_booking_id(&self, booking_id: &str, caller: &AuthUser) -> Result<AppointmentDetail> {
        let appointment: Appointment = self
            .db
            .select_one(APPOINTMENTS, &Query::new().eq("booking_id", booking_id.trim()))
            .await?
            .ok_or(AppointmentError::NotFound)?;

        self.authorize(&appointment, caller).await?;
        self.inline(appointment).await
    }

    pub async fn detail(&self, appointment_id: Uuid, caller: &AuthUser) -> Result<AppointmentDetail> {
        let appointment = self.get(appointment_id, caller).await?;
        self.inline(appointment).await
    }

    /// The doctor is resolved through the package, not the stored `doctor_id`.
    async fn inline(&self, appointment: Appointment) -> Result<AppointmentDetail> {
        let patient: Option<Patient> = self
            .db
            .select_one(PATIENTS, &Query::new().eq("id", appointment.patient_id))
            .await?;
        let package: Option<DoctorPackage> = self
            .db
            .select_one(DOCTOR_PACKAGES, &Query::new().eq("id", appointment.package_id))
            .await?;
        let doctor: Option<Doctor> = match &package {
            Some(package) => self.db.select_one(DOCTORS, &Query::new().eq("id", package.doctor_id)).await?,
            None => None,
        };

        Ok(AppointmentDetail {
            appointment,
            patient,
            package,
            doctor,
        })
    }

    async fn write_upcoming(&self, appointment_id: Uuid, changes: Map<String, Value>) -> Result<Appointment> {
        let mut rows: Vec<Appointment> = self
            .db
            .update(
                APPOINTMENTS,
                &Query::new()
                    .eq("id", appointment_id)
                    .eq("status", AppointmentStatus::Upcoming),
                Value::Object(changes),
            )
            .await?;

        if rows.is_empty() {
            return Err(AppointmentError::NotFound);
        }
        Ok(rows.swap_remove(0))
    }

    /// Explains a guarded write that matched nothing: the appointment either left
    /// the upcoming state after it was read, or it is gone.
    async fn left_upcoming(&self, appointment_id: Uuid, caller: &AuthUser) -> AppointmentError {
        match self.get(appointment_id, caller).await {
            Ok(current) => AppointmentError::InvalidStatusTransition(current.status),
            Err(e) => e,
        }
    }

    pub async fn update(
        &self,
        appointment_id: Uuid,
        request: UpdateAppointmentRequest,
        caller: &AuthUser,
    ) -> Result<Appointment> {
        let existing = self.get(appointment_id, caller).await?;
        if existing.status != AppointmentStatus::Upcoming {
            return Err(AppointmentError::InvalidStatusTransition(existing.status));
        }

        let mut update_data = Map::new();
        if let Some(scheduled_at) = request.scheduled_at {
            let scheduled_at = checked_schedule(scheduled_at, Utc::now())?;
            update_data.insert("scheduled_at".to_string(), json!(scheduled_at.to_rfc3339()));
        }
        if let Some(notes) = checked_text("notes", request.notes, MAX_NOTES_LENGTH)? {
            update_data.insert("notes".to_string(), json!(notes));
        }
        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let updated = match self.write_upcoming(appointment_id, update_data).await {
            Err(AppointmentError::NotFound) => return Err(self.left_upcoming(appointment_id, caller).await),
            other => other?,
        };
        info!("Appointment {} updated", updated.booking_id);
        Ok(updated)
    }

    pub async fn cancel(&self, appointment_id: Uuid, reason: Option<String>, caller: &AuthUser) -> Result<Appointment> {
        let existing = self.get(appointment_id, caller).await?;
        ensure_transition(existing.status, AppointmentStatus::Cancelled)?;

        let reason = checked_text("reason", reason, MAX_REASON_LENGTH)?;
        let now = Utc::now().to_rfc3339();

        let mut update_data = Map::new();
        update_data.insert("status".to_string(), json!(AppointmentStatus::Cancelled));
        update_data.insert("cancellation_reason".to_string(), json!(reason));
        update_data.insert("cancelled_at".to_string(), json!(now));
        update_data.insert("updated_at".to_string(), json!(now));

        // A concurrent cancel leaves nothing in the upcoming state to patch
        let cancelled = self
            .write_upcoming(appointment_id, update_data)
            .await
            .map_err(|e| match e {
                AppointmentError::NotFound => AppointmentError::AlreadyCancelled,
                other => other,
            })?;

        info!("Appointment {} cancelled", cancelled.booking_id);
        Ok(cancelled)
    }

    pub async fn complete(&self, appointment_id: Uuid, caller: &AuthUser) -> Result<Appointment> {
        if !caller.is_admin {
            return Err(AppointmentError::AdminRequired);
        }

        let existing = self.get(appointment_id, caller).await?;
        ensure_transition(existing.status, AppointmentStatus::Completed)?;

        let now = Utc::now().to_rfc3339();
        let mut update_data = Map::new();
        update_data.insert("status".to_string(), json!(AppointmentStatus::Completed));
        update_data.insert("completed_at".to_string(), json!(now));
        update_data.insert("updated_at".to_string(), json!(now));

        let completed = match self.write_upcoming(appointment_id, update_data).await {
            Err(AppointmentError::NotFound) => return Err(self.left_upcoming(appointment_id, caller).await),
            other => other?,
        };
        info!("Appointment {} completed", completed.booking_id);
        Ok(completed)
    }

    pub async fn delete(&self, appointment_id: Uuid, caller: &AuthUser) -> Result<()> {
        self.get(appointment_id, caller).await?;

        let removed: Vec<Value> = self
            .db
            .delete(APPOINTMENTS, &Query::new().eq("id", appointment_id))
            .await?;

        if removed.is_empty() {
            return Err(AppointmentError::NotFound);
        }

        info!("Appointment {} deleted", appointment_id);
        Ok(())
    }
}
