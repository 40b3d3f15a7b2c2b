//! Services wired into the application state

pub mod persistence;
pub mod supabase;

pub use persistence::{PersistenceWriter, WriteOutcome};
pub use supabase::SupabaseAuthenticator;
