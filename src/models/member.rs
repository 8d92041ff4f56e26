use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::required;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberType {
    Permanent,
    Temporary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,
    pub household_id: Uuid,
    pub full_name: String,
    pub name_with_initial: String,
    pub member_type: MemberType,
    pub nic: String,
    pub gender: String,
    pub age: i64,
    pub occupation: String,
    #[serde(default)]
    pub school_name: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub university_name: Option<String>,
    #[serde(default)]
    pub other_occupation: Option<String>,
    #[serde(default)]
    pub offers_receiving: Vec<String>,
    pub is_disabled: bool,
    pub land_house_status: String,
    #[serde(default)]
    pub whatsapp_number: Option<String>,
    pub is_drug_user: bool,
    pub is_thief: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const AGE_MIN: i64 = 0;
pub const AGE_MAX: i64 = 150;

/// Member payload as accepted from the client. `offers_receiving` arrives in
/// whatever shape the form produced (array, lone string, or nothing) and is
/// normalized before storage.
#[derive(Debug, Deserialize)]
pub struct MemberInput {
    pub full_name: String,
    pub name_with_initial: String,
    pub member_type: MemberType,
    pub nic: String,
    pub gender: String,
    pub age: i64,
    pub occupation: String,
    #[serde(default)]
    pub school_name: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub university_name: Option<String>,
    #[serde(default)]
    pub other_occupation: Option<String>,
    #[serde(default)]
    pub offers_receiving: Option<Value>,
    #[serde(default)]
    pub is_disabled: bool,
    #[serde(default)]
    pub land_house_status: String,
    #[serde(default)]
    pub whatsapp_number: Option<String>,
    #[serde(default)]
    pub is_drug_user: bool,
    #[serde(default)]
    pub is_thief: bool,
}

impl MemberInput {
    pub fn validate(&self) -> Result<(), String> {
        required(&self.full_name, "full_name")?;
        required(&self.name_with_initial, "name_with_initial")?;
        required(&self.nic, "nic")?;
        required(&self.gender, "gender")?;
        required(&self.occupation, "occupation")?;
        if !(AGE_MIN..=AGE_MAX).contains(&self.age) {
            return Err(format!("age must be between {} and {}", AGE_MIN, AGE_MAX));
        }
        Ok(())
    }

    /// Singleton coercion: a bare value becomes a one-element array, then
    /// empty/non-string entries are dropped.
    pub fn normalized_offers(&self) -> Vec<String> {
        let items: Vec<Value> = match &self.offers_receiving {
            None | Some(Value::Null) => vec![],
            Some(Value::Array(items)) => items.clone(),
            Some(other) => vec![other.clone()],
        };

        items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) if !s.trim().is_empty() => Some(s),
                _ => None,
            })
            .collect()
    }
}
