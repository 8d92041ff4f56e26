use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::required;

/// A numbered address under a road. `sub_road_id = None` marks a main-road
/// address, attached directly to the road; those form a set disjoint from
/// sub-road addresses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    pub id: Uuid,
    pub address: String,
    pub road_id: Uuid,
    pub sub_road_id: Option<Uuid>,
    pub member: Option<String>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct AddressInput {
    pub address: String,
    pub road_id: Uuid,
    #[serde(default)]
    pub sub_road_id: Option<Uuid>,
    #[serde(default)]
    pub member: Option<String>,
}

impl AddressInput {
    pub fn validate(&self) -> Result<(), String> {
        required(&self.address, "address")
    }
}
