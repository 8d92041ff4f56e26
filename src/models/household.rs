use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::member::MemberInput;
use super::required;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResidentType {
    Permanent,
    Rent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WasteDisposal {
    LocalCouncil,
    Home,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Household {
    pub id: Uuid,
    pub address_id: Uuid,
    pub assessment_number: String,
    pub resident_type: ResidentType,
    pub waste_disposal: WasteDisposal,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct HomeDetails {
    pub assessment_number: String,
    pub resident_type: ResidentType,
    pub waste_disposal: WasteDisposal,
}

impl HomeDetails {
    pub fn validate(&self) -> Result<(), String> {
        required(&self.assessment_number, "assessment_number")
    }
}

/// Registration payload: one household plus its initial members, written
/// atomically.
#[derive(Debug, Deserialize)]
pub struct HouseholdInput {
    pub address_id: Uuid,
    pub home_details: HomeDetails,
    #[serde(default)]
    pub members: Vec<MemberInput>,
}
