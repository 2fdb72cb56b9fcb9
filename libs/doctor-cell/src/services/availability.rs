use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{
    day_of_week, parse_clock_time, AvailabilityTemplate, CreateTemplateRequest, DoctorError,
    NewTemplate,
};
use crate::store::DoctorStore;

pub struct AvailabilityService {
    store: Arc<dyn DoctorStore>,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn DoctorStore>) -> Self {
        Self { store }
    }

    /// Create a weekly window. Rejected before storage if it overlaps an active one.
    pub async fn create_template(
        &self,
        actor_id: Uuid,
        doctor_id: Uuid,
        request: CreateTemplateRequest,
    ) -> Result<AvailabilityTemplate, DoctorError> {
        debug!("Creating availability for doctor: {}", doctor_id);

        if actor_id != doctor_id {
            warn!("User {} attempted to edit schedule of doctor {}", actor_id, doctor_id);
            return Err(DoctorError::OwnershipViolation);
        }

        if request.day_of_week > 6 {
            return Err(DoctorError::InvalidTimeRange(
                "Day of week must be between 0 (Monday) and 6 (Sunday)".to_string(),
            ));
        }

        let start_time = parse_clock_time(&request.start_time)?;
        let end_time = parse_clock_time(&request.end_time)?;
        if start_time >= end_time {
            return Err(DoctorError::InvalidTimeRange(
                "Start time must be before end time".to_string(),
            ));
        }

        self.store.get_doctor(doctor_id).await?.ok_or(DoctorError::NotFound)?;

        let existing = self.store.list_active_templates(doctor_id, request.day_of_week).await?;
        if existing.iter().any(|t| t.overlaps(start_time, end_time)) {
            return Err(DoctorError::TemplateOverlap);
        }

        let template = self
            .store
            .insert_template(NewTemplate {
                doctor_id,
                day_of_week: request.day_of_week,
                start_time,
                end_time,
            })
            .await
            .map_err(|e| if e.is_conflict() { DoctorError::TemplateOverlap } else { e.into() })?;

        info!(
            "Availability {} created for doctor {}: {} {} - {}",
            template.id,
            doctor_id,
            template.day_name(),
            template.start_time.format("%H:%M"),
            template.end_time.format("%H:%M")
        );
        Ok(template)
    }

    pub async fn list_templates(&self, doctor_id: Uuid) -> Result<Vec<AvailabilityTemplate>, DoctorError> {
        Ok(self.store.list_templates(doctor_id).await?)
    }

    /// Active windows that apply to the weekday of `date`.
    pub async fn active_templates_for_date(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<AvailabilityTemplate>, DoctorError> {
        Ok(self.store.list_active_templates(doctor_id, day_of_week(date)).await?)
    }

    pub async fn delete_template(
        &self,
        actor_id: Uuid,
        doctor_id: Uuid,
        template_id: Uuid,
    ) -> Result<(), DoctorError> {
        debug!("Deleting availability: {}", template_id);

        let template = self
            .store
            .get_template(template_id)
            .await?
            .filter(|t| t.doctor_id == doctor_id)
            .ok_or(DoctorError::TemplateNotFound)?;

        if template.doctor_id != actor_id {
            warn!("User {} attempted to delete availability {}", actor_id, template_id);
            return Err(DoctorError::OwnershipViolation);
        }

        self.store.delete_template(template_id).await?;
        info!("Availability {} deleted for doctor {}", template_id, doctor_id);
        Ok(())
    }
}
