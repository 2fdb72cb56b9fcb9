use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::models::{Doctor, DoctorError, DoctorSearchFilters};
use crate::store::DoctorStore;

const MAX_SEARCH_RESULTS: usize = 100;

pub struct DoctorService {
    store: Arc<dyn DoctorStore>,
}

impl DoctorService {
    pub fn new(store: Arc<dyn DoctorStore>) -> Self {
        Self { store }
    }

    /// Directory search over verified doctors.
    pub async fn search_doctors(&self, mut filters: DoctorSearchFilters) -> Result<Vec<Doctor>, DoctorError> {
        filters.limit = Some(filters.limit.unwrap_or(MAX_SEARCH_RESULTS).min(MAX_SEARCH_RESULTS));
        debug!("Searching doctors with filters: {:?}", filters);

        Ok(self.store.search_doctors(&filters).await?)
    }

    /// A doctor who may be shown and booked. Unverified profiles read as missing.
    pub async fn get_verified_doctor(&self, doctor_id: Uuid) -> Result<Doctor, DoctorError> {
        match self.store.get_doctor(doctor_id).await? {
            Some(doctor) if doctor.is_verified => Ok(doctor),
            Some(_) => {
                debug!("Doctor {} exists but is not verified", doctor_id);
                Err(DoctorError::NotFound)
            }
            None => Err(DoctorError::NotFound),
        }
    }

    /// Any doctor profile regardless of verification, for names in notifications.
    pub async fn get_doctor(&self, doctor_id: Uuid) -> Result<Doctor, DoctorError> {
        self.store
            .get_doctor(doctor_id)
            .await?
            .ok_or(DoctorError::NotFound)
    }
}
