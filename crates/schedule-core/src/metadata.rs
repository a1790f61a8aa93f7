use crate::error::ScheduleError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleMetadata {
    pub project_name: String,
    #[serde(default)]
    pub project_description: String,
    pub project_start_date: NaiveDate,
    /// Fixed project finish. When absent the latest early finish is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_end_date: Option<NaiveDate>,
    /// Status date used for at-risk flags and cash-flow reporting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of_date: Option<NaiveDate>,
}

impl ScheduleMetadata {
    pub fn starting(project_start_date: NaiveDate) -> Self {
        Self {
            project_start_date,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ScheduleError> {
        if let Some(end) = self.project_end_date {
            if self.project_start_date > end {
                return Err(ScheduleError::InvalidMetadata(format!(
                    "project start date {} must be on or before project end date {}",
                    self.project_start_date, end
                )));
            }
        }
        Ok(())
    }
}

impl Default for ScheduleMetadata {
    fn default() -> Self {
        Self {
            project_name: "New Project".to_string(),
            project_description: "No description".to_string(),
            project_start_date: NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid default date"),
            project_end_date: None,
            as_of_date: None,
        }
    }
}
