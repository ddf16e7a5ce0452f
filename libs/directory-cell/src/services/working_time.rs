use serde_json::{json, Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{DatabaseClient, Query};
use shared_models::entity::EntityType;
use shared_utils::validation::parse_clock_time;

use crate::models::{DirectoryError, Weekday, WorkingTime, WorkingTimeQuery, WorkingTimeRequest, WORKING_TIMES};

type Result<T> = std::result::Result<T, DirectoryError>;

pub const DEFAULT_START_TIME: &str = "09:00";
pub const DEFAULT_END_TIME: &str = "17:00";

/// Validates an `HH:MM` pair and requires the window to end after it starts.
pub fn validate_window(start_time: &str, end_time: &str) -> Result<()> {
    let start = parse_clock_time("start_time", start_time)
        .map_err(|_| DirectoryError::validation("start_time", "Time must be in HH:MM format."))?;
    let end = parse_clock_time("end_time", end_time)
        .map_err(|_| DirectoryError::validation("end_time", "Time must be in HH:MM format."))?;

    if start >= end {
        return Err(DirectoryError::validation("end_time", "End time must be after start time."));
    }
    Ok(())
}

/// Seven daily 09:00-17:00 slots for a freshly created doctor or hospital.
pub fn default_schedule(entity_id: Uuid, entity_type: EntityType) -> Vec<Value> {
    Weekday::ALL
        .iter()
        .map(|day| {
            json!({
                "id": Uuid::new_v4(),
                "entity_id": entity_id,
                "entity_type": entity_type,
                "day": day,
                "start_time": DEFAULT_START_TIME,
                "end_time": DEFAULT_END_TIME
            })
        })
        .collect()
}

pub struct WorkingTimeService {
    db: DatabaseClient,
}

impl WorkingTimeService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: DatabaseClient::new(config),
        }
    }

    pub async fn list(&self, filter: &WorkingTimeQuery) -> Result<Vec<WorkingTime>> {
        let mut query = Query::new();
        if let Some(entity_id) = filter.entity_id {
            query = query.eq("entity_id", entity_id);
        }
        if let Some(entity_type) = filter.entity_type {
            query = query.eq("entity_type", entity_type);
        }
        Ok(self.db.select(WORKING_TIMES, &query).await?)
    }

    pub async fn for_entity(&self, entity_type: EntityType, entity_id: Uuid) -> Result<Vec<WorkingTime>> {
        self.list(&WorkingTimeQuery {
            entity_id: Some(entity_id),
            entity_type: Some(entity_type),
        })
        .await
    }

    pub async fn seed_defaults(&self, entity_type: EntityType, entity_id: Uuid) -> Result<Vec<WorkingTime>> {
        let rows: Vec<WorkingTime> = self
            .db
            .insert_many(WORKING_TIMES, &default_schedule(entity_id, entity_type))
            .await?;
        debug!("Seeded {} working times for {} {}", rows.len(), entity_type.label(), entity_id);
        Ok(rows)
    }

    pub async fn create(&self, request: WorkingTimeRequest) -> Result<WorkingTime> {
        let entity_id = request
            .entity_id
            .ok_or_else(|| DirectoryError::validation("entity_id", "This field is required."))?;
        let entity_type = request
            .entity_type
            .ok_or_else(|| DirectoryError::validation("entity_type", "This field is required."))?;
        let day = request
            .day
            .ok_or_else(|| DirectoryError::validation("day", "This field is required."))?;
        let start_time = request
            .start_time
            .ok_or_else(|| DirectoryError::validation("start_time", "This field is required."))?;
        let end_time = request
            .end_time
            .ok_or_else(|| DirectoryError::validation("end_time", "This field is required."))?;

        validate_window(&start_time, &end_time)?;

        let owner_exists = self
            .db
            .exists(entity_type.collection(), &Query::new().eq("id", entity_id))
            .await?;
        if !owner_exists {
            return Err(DirectoryError::not_found(entity_type));
        }

        let working_time: WorkingTime = self
            .db
            .insert(
                WORKING_TIMES,
                &json!({
                    "id": Uuid::new_v4(),
                    "entity_id": entity_id,
                    "entity_type": entity_type,
                    "day": day,
                    "start_time": start_time,
                    "end_time": end_time
                }),
            )
            .await?;

        info!("Working time {} created for {} {}", working_time.id, entity_type.label(), entity_id);
        Ok(working_time)
    }

    pub async fn get(&self, working_time_id: Uuid) -> Result<WorkingTime> {
        self.db
            .select_one(WORKING_TIMES, &Query::new().eq("id", working_time_id))
            .await?
            .ok_or(DirectoryError::WorkingTimeNotFound)
    }

    pub async fn update(&self, working_time_id: Uuid, request: WorkingTimeRequest) -> Result<WorkingTime> {
        let existing = self.get(working_time_id).await?;

        let start_time = request.start_time.unwrap_or(existing.start_time);
        let end_time = request.end_time.unwrap_or(existing.end_time);
        validate_window(&start_time, &end_time)?;

        let mut update_data = Map::new();
        update_data.insert("day".to_string(), json!(request.day.unwrap_or(existing.day)));
        update_data.insert("start_time".to_string(), json!(start_time));
        update_data.insert("end_time".to_string(), json!(end_time));

        let mut rows: Vec<WorkingTime> = self
            .db
            .update(WORKING_TIMES, &Query::new().eq("id", working_time_id), Value::Object(update_data))
            .await?;

        if rows.is_empty() {
            return Err(DirectoryError::WorkingTimeNotFound);
        }
        Ok(rows.swap_remove(0))
    }

    pub async fn delete(&self, working_time_id: Uuid) -> Result<()> {
        let removed: Vec<Value> = self
            .db
            .delete(WORKING_TIMES, &Query::new().eq("id", working_time_id))
            .await?;

        if removed.is_empty() {
            return Err(DirectoryError::WorkingTimeNotFound);
        }
        info!("Working time {} deleted", working_time_id);
        Ok(())
    }
}
