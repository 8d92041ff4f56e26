use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::required;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Road {
    pub id: Uuid,
    pub name: String,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubRoad {
    pub id: Uuid,
    pub name: String,
    pub road_id: Uuid,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct RoadInput {
    pub name: String,
}

impl RoadInput {
    pub fn validate(&self) -> Result<(), String> {
        required(&self.name, "name")
    }
}

#[derive(Debug, Deserialize)]
pub struct SubRoadInput {
    pub name: String,
    pub road_id: Uuid,
}

impl SubRoadInput {
    pub fn validate(&self) -> Result<(), String> {
        required(&self.name, "name")
    }
}
