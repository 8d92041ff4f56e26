use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::required;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LampStatus {
    Working,
    Broken,
}

impl Default for LampStatus {
    fn default() -> Self {
        LampStatus::Working
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadLamp {
    pub id: Uuid,
    pub lamp_number: String,
    pub road_id: Uuid,
    pub sub_road_id: Uuid,
    pub address_id: Uuid,
    pub status: LampStatus,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct LampInput {
    pub lamp_number: String,
    pub road_id: Uuid,
    pub sub_road_id: Uuid,
    pub address_id: Uuid,
    #[serde(default)]
    pub status: LampStatus,
}

impl LampInput {
    pub fn validate(&self) -> Result<(), String> {
        required(&self.lamp_number, "lamp_number")
    }
}

#[derive(Debug, Deserialize)]
pub struct LampStatusInput {
    pub status: LampStatus,
}
