use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use auth_cell::models::USERS;
use auth_cell::User;
use shared_config::AppConfig;
use shared_database::{DatabaseClient, Query};
use shared_models::auth::AuthUser;

use crate::models::{
    BookingFor, CreatePatientRequest, Patient, PatientError, UpdatePatientRequest, APPOINTMENTS, PATIENTS,
};

type Result<T> = std::result::Result<T, PatientError>;

/// Name, gender and age as copied from the owning account.
#[derive(Debug, Clone, PartialEq)]
pub struct Demographics {
    pub name: String,
    pub gender: Option<String>,
    pub age: Option<String>,
}

impl Demographics {
    pub fn from_user(user: &User) -> Self {
        Self {
            name: user.username.clone(),
            gender: user.gender.clone(),
            age: user.age_on(Utc::now().date_naive()).map(|age| age.to_string()),
        }
    }

    fn write_into(self, document: &mut Map<String, Value>) {
        document.insert("name".to_string(), json!(self.name));
        document.insert("gender".to_string(), json!(self.gender));
        document.insert("age".to_string(), json!(self.age));
    }
}

fn checked_text(field: &str, value: Option<String>, max: usize) -> Result<Option<String>> {
    match value {
        Some(text) if text.chars().count() > max => Err(PatientError::validation(
            field,
            format!("Ensure this field has no more than {} characters.", max),
        )),
        other => Ok(other),
    }
}

fn caller_id(caller: &AuthUser) -> Result<Uuid> {
    Uuid::parse_str(&caller.id).map_err(|_| PatientError::OwnerNotFound)
}

pub struct PatientService {
    db: DatabaseClient,
}

impl PatientService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: DatabaseClient::new(config),
        }
    }

    async fn owner(&self, user_id: Uuid) -> Result<User> {
        self.db
            .select_one(USERS, &Query::new().eq("id", user_id))
            .await?
            .ok_or(PatientError::OwnerNotFound)
    }

    pub async fn create_patient(&self, request: CreatePatientRequest, caller: &AuthUser) -> Result<Patient> {
        let owner_id = match request.user_id {
            Some(user_id) if caller.is_admin => user_id,
            _ => caller_id(caller)?,
        };
        let booking_for = request.booking_for.unwrap_or_default();

        debug!("Creating {:?} patient for user {}", booking_for, owner_id);

        let owner = self.owner(owner_id).await?;
        let problem_description = checked_text("problem_description", request.problem_description, 500)?;

        let mut document = Map::new();
        match booking_for {
            BookingFor::Myself => Demographics::from_user(&owner).write_into(&mut document),
            BookingFor::Other => {
                let name = match request.name.map(|n| n.trim().to_string()) {
                    Some(name) if !name.is_empty() => name,
                    _ => return Err(PatientError::validation("name", "Name is required when booking for someone else.")),
                };
                Demographics {
                    name: checked_text("name", Some(name), 100)?.unwrap_or_default(),
                    gender: checked_text("gender", request.gender, 10)?,
                    age: checked_text("age", request.age, 10)?,
                }
                .write_into(&mut document);
            }
        }

        let now = Utc::now().to_rfc3339();
        document.insert("id".to_string(), json!(Uuid::new_v4()));
        document.insert("user_id".to_string(), json!(owner.id));
        document.insert("booking_for".to_string(), json!(booking_for));
        document.insert("problem_description".to_string(), json!(problem_description));
        document.insert("created_at".to_string(), json!(now));
        document.insert("updated_at".to_string(), json!(now));

        let patient: Patient = self.db.insert(PATIENTS, &Value::Object(document)).await?;
        info!("Patient {} created for user {}", patient.id, owner.id);

        Ok(patient)
    }

    pub async fn list_patients(&self, caller: &AuthUser, user_id: Option<Uuid>) -> Result<Vec<Patient>> {
        let mut query = Query::new().order("created_at.desc");

        if caller.is_admin {
            if let Some(user_id) = user_id {
                query = query.eq("user_id", user_id);
            }
        } else {
            query = query.eq("user_id", caller_id(caller)?);
        }

        Ok(self.db.select(PATIENTS, &query).await?)
    }

    /// Loads a patient the caller is allowed to see.
    pub async fn get_patient(&self, patient_id: Uuid, caller: &AuthUser) -> Result<Patient> {
        debug!("Fetching patient: {}", patient_id);

        let patient: Patient = self
            .db
            .select_one(PATIENTS, &Query::new().eq("id", patient_id))
            .await?
            .ok_or(PatientError::NotFound)?;

        if !caller.can_access(&patient.user_id.to_string()) {
            return Err(PatientError::Forbidden);
        }

        Ok(patient)
    }

    pub async fn update_patient(
        &self,
        patient_id: Uuid,
        request: UpdatePatientRequest,
        caller: &AuthUser,
    ) -> Result<Patient> {
        let existing = self.get_patient(patient_id, caller).await?;
        let booking_for = request.booking_for.unwrap_or(existing.booking_for);

        debug!("Updating patient {} ({:?})", patient_id, booking_for);

        let mut update_data = Map::new();
        match booking_for {
            BookingFor::Myself => {
                let owner = self.owner(existing.user_id).await?;
                Demographics::from_user(&owner).write_into(&mut update_data);
            }
            BookingFor::Other => {
                if let Some(name) = request.name {
                    let name = name.trim().to_string();
                    if name.is_empty() {
                        return Err(PatientError::validation("name", "Name is required when booking for someone else."));
                    }
                    update_data.insert("name".to_string(), json!(checked_text("name", Some(name), 100)?));
                } else if existing.name.as_deref().map_or(true, str::is_empty) {
                    return Err(PatientError::validation("name", "Name is required when booking for someone else."));
                }
                if let Some(gender) = checked_text("gender", request.gender, 10)? {
                    update_data.insert("gender".to_string(), json!(gender));
                }
                if let Some(age) = checked_text("age", request.age, 10)? {
                    update_data.insert("age".to_string(), json!(age));
                }
            }
        }

        if let Some(problem_description) = checked_text("problem_description", request.problem_description, 500)? {
            update_data.insert("problem_description".to_string(), json!(problem_description));
        }
        update_data.insert("booking_for".to_string(), json!(booking_for));
        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let mut rows: Vec<Patient> = self
            .db
            .update(PATIENTS, &Query::new().eq("id", patient_id), Value::Object(update_data))
            .await?;

        if rows.is_empty() {
            return Err(PatientError::NotFound);
        }
        Ok(rows.swap_remove(0))
    }

    pub async fn delete_patient(&self, patient_id: Uuid, caller: &AuthUser) -> Result<()> {
        self.get_patient(patient_id, caller).await?;

        if self
            .db
            .exists(APPOINTMENTS, &Query::new().eq("patient_id", patient_id))
            .await?
        {
            return Err(PatientError::HasAppointments);
        }

        let removed: Vec<Value> = self
            .db
            .delete(PATIENTS, &Query::new().eq("id", patient_id))
            .await?;

        if removed.is_empty() {
            return Err(PatientError::NotFound);
        }

        info!("Patient {} deleted", patient_id);
        Ok(())
    }

    pub async fn patients_for_user(&self, user_id: Uuid, caller: &AuthUser) -> Result<Vec<Patient>> {
        if !caller.can_access(&user_id.to_string()) {
            return Err(PatientError::Forbidden);
        }

        let patients: Vec<Patient> = self
            .db
            .select(PATIENTS, &Query::new().eq("user_id", user_id).order("created_at.desc"))
            .await?;

        if patients.is_empty() {
            return Err(PatientError::NoneForUser);
        }
        Ok(patients)
    }
}
