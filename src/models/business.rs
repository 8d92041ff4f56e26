use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::required;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Business {
    pub id: Uuid,
    pub business_name: String,
    pub business_owner: String,
    pub business_type: String,
    pub business_address: Option<String>,
    pub business_phone: Option<String>,
    pub road_id: Uuid,
    pub sub_road_id: Option<Uuid>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct BusinessInput {
    pub business_name: String,
    pub business_owner: String,
    pub business_type: String,
    #[serde(default)]
    pub business_address: Option<String>,
    #[serde(default)]
    pub business_phone: Option<String>,
    pub road_id: Uuid,
    #[serde(default)]
    pub sub_road_id: Option<Uuid>,
}

impl BusinessInput {
    pub fn validate(&self) -> Result<(), String> {
        required(&self.business_name, "business_name")?;
        required(&self.business_owner, "business_owner")?;
        required(&self.business_type, "business_type")
    }
}
