//! Supabase vector engine over PostgREST.

mod backend;
mod config;

pub use backend::SupabaseBackend;
pub use config::{DEFAULT_QUERY_NAME, DEFAULT_TABLE, SupabaseConfig};
