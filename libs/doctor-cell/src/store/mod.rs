use async_trait::async_trait;
use uuid::Uuid;

use shared_database::StoreError;

use crate::models::{AvailabilityTemplate, Doctor, DoctorSearchFilters, NewTemplate};

mod memory;
mod supabase;

pub use memory::InMemoryDoctorStore;
pub use supabase::SupabaseDoctorStore;

/// Persistence boundary for doctor profiles and their availability templates.
#[async_trait]
pub trait DoctorStore: Send + Sync {
    async fn get_doctor(&self, doctor_id: Uuid) -> Result<Option<Doctor>, StoreError>;

    /// Verified doctors matching the filters, ordered by last name.
    async fn search_doctors(&self, filters: &DoctorSearchFilters) -> Result<Vec<Doctor>, StoreError>;

    /// Every template of a doctor, ordered by day then start time.
    async fn list_templates(&self, doctor_id: Uuid) -> Result<Vec<AvailabilityTemplate>, StoreError>;

    async fn list_active_templates(
        &self,
        doctor_id: Uuid,
        day_of_week: u8,
    ) -> Result<Vec<AvailabilityTemplate>, StoreError>;

    async fn get_template(&self, template_id: Uuid) -> Result<Option<AvailabilityTemplate>, StoreError>;

    /// Fails with `StoreError::Conflict` if the window overlaps an active one.
    async fn insert_template(&self, template: NewTemplate) -> Result<AvailabilityTemplate, StoreError>;

    async fn delete_template(&self, template_id: Uuid) -> Result<(), StoreError>;
}
