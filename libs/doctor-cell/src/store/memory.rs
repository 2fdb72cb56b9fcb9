use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use shared_database::StoreError;

use super::DoctorStore;
use crate::models::{AvailabilityTemplate, Doctor, DoctorSearchFilters, NewTemplate};

#[derive(Default)]
pub struct InMemoryDoctorStore {
    doctors: RwLock<HashMap<Uuid, Doctor>>,
    templates: RwLock<Vec<AvailabilityTemplate>>,
}

impl InMemoryDoctorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn upsert_doctor(&self, doctor: Doctor) {
        self.doctors.write().await.insert(doctor.id, doctor);
    }

    /// Inserts a template as-is, skipping the overlap check. Used to load legacy schedules.
    pub async fn insert_template_unchecked(&self, template: AvailabilityTemplate) {
        self.templates.write().await.push(template);
    }
}

#[async_trait]
impl DoctorStore for InMemoryDoctorStore {
    async fn get_doctor(&self, doctor_id: Uuid) -> Result<Option<Doctor>, StoreError> {
        Ok(self.doctors.read().await.get(&doctor_id).cloned())
    }

    async fn search_doctors(&self, filters: &DoctorSearchFilters) -> Result<Vec<Doctor>, StoreError> {
        let doctors = self.doctors.read().await;
        let mut found: Vec<Doctor> = doctors
            .values()
            .filter(|doctor| doctor.matches(filters))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.last_name.cmp(&b.last_name).then(a.first_name.cmp(&b.first_name)));
        if let Some(limit) = filters.limit {
            found.truncate(limit);
        }
        Ok(found)
    }

    async fn list_templates(&self, doctor_id: Uuid) -> Result<Vec<AvailabilityTemplate>, StoreError> {
        let mut templates: Vec<AvailabilityTemplate> = self
            .templates
            .read()
            .await
            .iter()
            .filter(|t| t.doctor_id == doctor_id)
            .cloned()
            .collect();
        templates.sort_by_key(|t| (t.day_of_week, t.start_time));
        Ok(templates)
    }

    async fn list_active_templates(
        &self,
        doctor_id: Uuid,
        day_of_week: u8,
    ) -> Result<Vec<AvailabilityTemplate>, StoreError> {
        let mut templates: Vec<AvailabilityTemplate> = self
            .templates
            .read()
            .await
            .iter()
            .filter(|t| t.doctor_id == doctor_id && t.day_of_week == day_of_week && t.is_active)
            .cloned()
            .collect();
        templates.sort_by_key(|t| t.start_time);
        Ok(templates)
    }

    async fn get_template(&self, template_id: Uuid) -> Result<Option<AvailabilityTemplate>, StoreError> {
        Ok(self
            .templates
            .read()
            .await
            .iter()
            .find(|t| t.id == template_id)
            .cloned())
    }

    async fn insert_template(&self, template: NewTemplate) -> Result<AvailabilityTemplate, StoreError> {
        let mut templates = self.templates.write().await;

        let overlapping = templates.iter().any(|existing| {
            existing.doctor_id == template.doctor_id
                && existing.day_of_week == template.day_of_week
                && existing.is_active
                && existing.overlaps(template.start_time, template.end_time)
        });
        if overlapping {
            return Err(StoreError::Conflict("availability window overlaps".to_string()));
        }

        let stored = AvailabilityTemplate {
            id: Uuid::new_v4(),
            doctor_id: template.doctor_id,
            day_of_week: template.day_of_week,
            start_time: template.start_time,
            end_time: template.end_time,
            is_active: true,
            created_at: Utc::now(),
        };
        templates.push(stored.clone());
        Ok(stored)
    }

    async fn delete_template(&self, template_id: Uuid) -> Result<(), StoreError> {
        let mut templates = self.templates.write().await;
        let before = templates.len();
        templates.retain(|t| t.id != template_id);
        if templates.len() == before {
            return Err(StoreError::NotFound(format!("template {}", template_id)));
        }
        Ok(())
    }
}
