use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{StoreError, SupabaseClient};

use super::DoctorStore;
use crate::models::{AvailabilityTemplate, Doctor, DoctorSearchFilters, NewTemplate};

const DOCTORS: &str = "/rest/v1/doctors";
const TEMPLATES: &str = "/rest/v1/doctor_availability";

/// PostgREST-backed store. Template overlap is enforced by an exclusion constraint.
pub struct SupabaseDoctorStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseDoctorStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    async fn fetch<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, StoreError> {
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, path, Some(self.supabase.service_token()), None)
            .await?;

        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(StoreError::from))
            .collect()
    }
}

#[async_trait]
impl DoctorStore for SupabaseDoctorStore {
    async fn get_doctor(&self, doctor_id: Uuid) -> Result<Option<Doctor>, StoreError> {
        let path = format!("{}?id=eq.{}", DOCTORS, doctor_id);
        Ok(self.fetch::<Doctor>(&path).await?.into_iter().next())
    }

    async fn search_doctors(&self, filters: &DoctorSearchFilters) -> Result<Vec<Doctor>, StoreError> {
        let mut query_parts = vec!["is_verified=eq.true".to_string()];

        if let Some(specialty) = filters.specialty.as_deref() {
            query_parts.push(format!("specialty=ilike.{}", urlencoding::encode(specialty.trim())));
        }
        if let Some(location) = filters.location.as_deref() {
            query_parts.push(format!("location=ilike.*{}*", urlencoding::encode(location.trim())));
        }

        let path = format!("{}?{}&order=last_name.asc,first_name.asc", DOCTORS, query_parts.join("&"));
        debug!("Searching doctors: {}", path);

        // Language arrays are matched case-insensitively here rather than in SQL.
        let mut doctors: Vec<Doctor> = self
            .fetch::<Doctor>(&path)
            .await?
            .into_iter()
            .filter(|doctor| doctor.matches(filters))
            .collect();

        if let Some(limit) = filters.limit {
            doctors.truncate(limit);
        }
        Ok(doctors)
    }

    async fn list_templates(&self, doctor_id: Uuid) -> Result<Vec<AvailabilityTemplate>, StoreError> {
        let path = format!(
            "{}?doctor_id=eq.{}&order=day_of_week.asc,start_time.asc",
            TEMPLATES, doctor_id
        );
        self.fetch(&path).await
    }

    async fn list_active_templates(
        &self,
        doctor_id: Uuid,
        day_of_week: u8,
    ) -> Result<Vec<AvailabilityTemplate>, StoreError> {
        let path = format!(
            "{}?doctor_id=eq.{}&day_of_week=eq.{}&is_active=eq.true&order=start_time.asc",
            TEMPLATES, doctor_id, day_of_week
        );
        self.fetch(&path).await
    }

    async fn get_template(&self, template_id: Uuid) -> Result<Option<AvailabilityTemplate>, StoreError> {
        let path = format!("{}?id=eq.{}", TEMPLATES, template_id);
        Ok(self.fetch::<AvailabilityTemplate>(&path).await?.into_iter().next())
    }

    async fn insert_template(&self, template: NewTemplate) -> Result<AvailabilityTemplate, StoreError> {
        let body = json!({
            "doctor_id": template.doctor_id,
            "day_of_week": template.day_of_week,
            "start_time": template.start_time.format("%H:%M:%S").to_string(),
            "end_time": template.end_time.format("%H:%M:%S").to_string(),
            "is_active": true
        });

        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                TEMPLATES,
                Some(self.supabase.service_token()),
                Some(body),
                Some(SupabaseClient::representation_headers()),
            )
            .await?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Backend("insert returned no rows".to_string()))?;
        Ok(serde_json::from_value(row)?)
    }

    async fn delete_template(&self, template_id: Uuid) -> Result<(), StoreError> {
        let path = format!("{}?id=eq.{}", TEMPLATES, template_id);
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &path,
                Some(self.supabase.service_token()),
                None,
                Some(SupabaseClient::representation_headers()),
            )
            .await?;

        if rows.is_empty() {
            return Err(StoreError::NotFound(format!("template {}", template_id)));
        }
        Ok(())
    }
}
