pub mod db;
pub mod manifest_index;
pub mod migrations;

// Re-export commonly used items
pub use db::{get_db_conn, init_db, init_schema, DB_PATH};
pub use manifest_index::{
    files_for_title, is_built, rebuild_from_str, rebuild_from_yaml, row_count, search_title,
    ManifestHit,
};
