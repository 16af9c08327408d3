#[cfg(feature = "db")]
pub mod libsql_records;
pub mod memory_records;
pub mod memory_store;
pub mod supabase_store;
