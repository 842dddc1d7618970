use rusqlite::Connection;
use std::sync::OnceLock;

use crate::migrations;

pub static DB_PATH: OnceLock<String> = OnceLock::new();

/// Базовая схема: индекс community-манифеста.
/// Таблица пересоздаётся целиком при конвертации манифеста,
/// поэтому здесь только IF NOT EXISTS для свежей установки.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Индекс манифеста (большой YAML, сконвертированный один раз)
        CREATE TABLE IF NOT EXISTS manifest_games (
            title TEXT PRIMARY KEY,        -- точное название из манифеста
            title_lower TEXT NOT NULL,     -- для регистронезависимого substring-поиска
            files TEXT NOT NULL            -- кандидаты путей + метаданные (JSON)
        );

        CREATE INDEX IF NOT EXISTS idx_manifest_title_lower ON manifest_games(title_lower);
        "#,
    )?;
    Ok(())
}

pub fn init_db(db_path: &str) -> rusqlite::Result<()> {
    let conn = Connection::open(db_path)?;
    init_schema(&conn)?;

    // Run versioned migrations
    migrations::run_migrations(&conn)?;

    Ok(())
}

pub fn get_db_conn() -> rusqlite::Result<Connection> {
    let db_path = DB_PATH.get().expect("DB path not initialized");
    Connection::open(db_path)
}
