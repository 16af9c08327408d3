pub mod deletion;
pub mod merge_use_case;
pub mod migrate_use_case;
pub mod ports;
pub mod presign_use_case;
pub mod transaction;
pub mod upload_use_case;
