use std::collections::BTreeMap;

use serde::Deserialize;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{DatabaseClient, Query};

use crate::models::{DirectoryCounts, DirectoryError, CATEGORIES, DOCTORS, HOSPITALS};

#[derive(Debug, Deserialize)]
struct DoctorCategory {
    category_id: Option<Uuid>,
}

/// Tallies doctors by category; uncategorised doctors are not listed.
fn per_category(rows: &[DoctorCategory]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for category_id in rows.iter().filter_map(|row| row.category_id) {
        *counts.entry(category_id.to_string()).or_insert(0) += 1;
    }
    counts
}

pub struct CountService {
    db: DatabaseClient,
}

impl CountService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: DatabaseClient::new(config),
        }
    }

    pub async fn counts(&self) -> Result<DirectoryCounts, DirectoryError> {
        let categories = self.db.count(CATEGORIES, &Query::new()).await?;
        let hospitals = self.db.count(HOSPITALS, &Query::new()).await?;
        let doctors: Vec<DoctorCategory> = self
            .db
            .select(DOCTORS, &Query::new().select("id,category_id"))
            .await?;

        Ok(DirectoryCounts {
            categories,
            hospitals,
            doctors: doctors.len(),
            doctors_per_category: per_category(&doctors),
        })
    }
}
