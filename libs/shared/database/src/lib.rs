pub mod error;
pub mod supabase;

pub use error::StoreError;
pub use supabase::{SupabaseClient, SupabaseError};
