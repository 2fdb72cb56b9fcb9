use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::error::AppError;

pub const DAY_NAMES: [&str; 7] = [
    "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
];

/// Monday = 0 .. Sunday = 6.
pub fn day_of_week(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_monday() as u8
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Doctor {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub specialty: String,
    pub location: Option<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    pub consultation_fee: Option<f64>,
    pub bio: Option<String>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl Doctor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn display_name(&self) -> String {
        format!("Dr. {}", self.full_name())
    }

    pub fn speaks(&self, language: &str) -> bool {
        self.languages
            .iter()
            .any(|spoken| spoken.eq_ignore_ascii_case(language.trim()))
    }

    /// Case-insensitive filter used by directory search; verified doctors only.
    pub fn matches(&self, filters: &DoctorSearchFilters) -> bool {
        if !self.is_verified {
            return false;
        }
        if let Some(specialty) = filters.specialty.as_deref() {
            if !self.specialty.eq_ignore_ascii_case(specialty.trim()) {
                return false;
            }
        }
        if let Some(location) = filters.location.as_deref() {
            let needle = location.trim().to_lowercase();
            let found = self
                .location
                .as_deref()
                .map(|l| l.to_lowercase().contains(&needle))
                .unwrap_or(false);
            if !found {
                return false;
            }
        }
        if let Some(language) = filters.language.as_deref() {
            if !self.speaks(language) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DoctorSearchFilters {
    pub specialty: Option<String>,
    pub location: Option<String>,
    pub language: Option<String>,
    pub limit: Option<usize>,
}

/// A doctor's recurring weekly open-hours window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailabilityTemplate {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl AvailabilityTemplate {
    pub fn overlaps(&self, start: NaiveTime, end: NaiveTime) -> bool {
        self.start_time < end && self.end_time > start
    }

    pub fn day_name(&self) -> &'static str {
        DAY_NAMES[usize::from(self.day_of_week % 7)]
    }
}

/// Validated template ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTemplate {
    pub doctor_id: Uuid,
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTemplateRequest {
    pub day_of_week: u8,
    /// `HH:MM` or `HH:MM:SS`, 24-hour.
    pub start_time: String,
    pub end_time: String,
}

pub fn parse_clock_time(raw: &str) -> Result<NaiveTime, DoctorError> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| DoctorError::InvalidTimeRange(format!("'{}' is not a valid time of day", raw)))
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Availability template not found")]
    TemplateNotFound,

    #[error("Invalid time range: {0}")]
    InvalidTimeRange(String),

    #[error("Availability overlaps an existing active window for that day")]
    TemplateOverlap,

    #[error("Only the owning doctor may change this schedule")]
    OwnershipViolation,

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound | DoctorError::TemplateNotFound => AppError::NotFound(err.to_string()),
            DoctorError::InvalidTimeRange(msg) => AppError::BadRequest(msg),
            DoctorError::TemplateOverlap => AppError::Conflict(err.to_string()),
            DoctorError::OwnershipViolation => AppError::Forbidden(err.to_string()),
            DoctorError::Store(e) => AppError::Database(e.to_string()),
        }
    }
}
