use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::required;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DevelopmentStatus {
    Undeveloped,
    InProgress,
    Developed,
}

impl Default for DevelopmentStatus {
    fn default() -> Self {
        DevelopmentStatus::Undeveloped
    }
}

/// A road-development project: a sub-sub-road segment tracked with paving
/// cost estimates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevelopmentProject {
    pub id: Uuid,
    pub name: String,
    pub road_id: Uuid,
    pub parent_sub_road_id: Uuid,
    pub width: f64,
    pub height: f64,
    pub square_feet: f64,
    pub cost_per_sq_ft: f64,
    pub total_cost: f64,
    pub development_status: DevelopmentStatus,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

/// Client payload. `square_feet`/`total_cost` are never accepted from the
/// caller; they are recomputed from the three scalars on every write.
#[derive(Debug, Deserialize)]
pub struct DevelopmentInput {
    pub name: String,
    pub road_id: Uuid,
    pub parent_sub_road_id: Uuid,
    pub width: f64,
    pub height: f64,
    pub cost_per_sq_ft: f64,
    #[serde(default)]
    pub development_status: DevelopmentStatus,
}

impl DevelopmentInput {
    pub fn validate(&self) -> Result<(), String> {
        required(&self.name, "name")?;
        for (value, field) in [
            (self.width, "width"),
            (self.height, "height"),
            (self.cost_per_sq_ft, "cost_per_sq_ft"),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("{} must be a positive number", field));
            }
        }
        Ok(())
    }

    pub fn square_feet(&self) -> f64 {
        self.width * self.height
    }

    pub fn total_cost(&self) -> f64 {
        self.square_feet() * self.cost_per_sq_ft
    }
}

/// Aggregate summary over active projects, grouped by development status.
#[derive(Debug, Default, Serialize, PartialEq)]
pub struct DevelopmentStats {
    #[serde(rename = "totalProjects")]
    pub total_projects: i64,
    #[serde(rename = "developedProjects")]
    pub developed_projects: i64,
    #[serde(rename = "undevelopedProjects")]
    pub undeveloped_projects: i64,
    #[serde(rename = "inProgressProjects")]
    pub in_progress_projects: i64,
    #[serde(rename = "totalEstimatedCost")]
    pub total_estimated_cost: f64,
}

impl DevelopmentStats {
    pub fn from_projects<'a>(projects: impl Iterator<Item = &'a DevelopmentProject>) -> Self {
        let mut stats = Self::default();
        for project in projects {
            stats.total_projects += 1;
            stats.total_estimated_cost += project.total_cost;
            match project.development_status {
                DevelopmentStatus::Developed => stats.developed_projects += 1,
                DevelopmentStatus::Undeveloped => stats.undeveloped_projects += 1,
                DevelopmentStatus::InProgress => stats.in_progress_projects += 1,
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(width: f64, height: f64, cost: f64) -> DevelopmentInput {
        DevelopmentInput {
            name: "Lane segment".to_string(),
            road_id: Uuid::new_v4(),
            parent_sub_road_id: Uuid::new_v4(),
            width,
            height,
            cost_per_sq_ft: cost,
            development_status: DevelopmentStatus::default(),
        }
    }

    #[test]
    fn derived_fields_recompute_exactly() {
        let i = input(10.0, 20.0, 5.0);
        assert_eq!(i.square_feet(), 200.0);
        assert_eq!(i.total_cost(), 1000.0);
    }

    #[test]
    fn non_positive_dimensions_rejected() {
        assert!(input(0.0, 20.0, 5.0).validate().is_err());
        assert!(input(10.0, -1.0, 5.0).validate().is_err());
        assert!(input(10.0, 20.0, f64::NAN).validate().is_err());
        assert!(input(10.0, 20.0, 5.0).validate().is_ok());
    }

    #[test]
    fn stats_reduce_by_status() {
        let a = DevelopmentProject {
            id: Uuid::new_v4(),
            name: "a".into(),
            road_id: Uuid::new_v4(),
            parent_sub_road_id: Uuid::new_v4(),
            width: 10.0,
            height: 10.0,
            square_feet: 100.0,
            cost_per_sq_ft: 2.0,
            total_cost: 200.0,
            development_status: DevelopmentStatus::Developed,
            is_deleted: false,
            created_at: Utc::now(),
        };
        let b = DevelopmentProject {
            development_status: DevelopmentStatus::InProgress,
            total_cost: 50.0,
            ..a.clone()
        };

        let stats = DevelopmentStats::from_projects([&a, &b].into_iter());
        assert_eq!(stats.total_projects, 2);
        assert_eq!(stats.developed_projects, 1);
        assert_eq!(stats.in_progress_projects, 1);
        assert_eq!(stats.undeveloped_projects, 0);
        assert_eq!(stats.total_estimated_cost, 250.0);
    }
}
