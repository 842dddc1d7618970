//! Manifest index - конвертация community-манифеста в SQLite
//!
//! Сырой YAML-манифест тяжёлый (десятки тысяч игр, несколько мегабайт).
//! Парсим его ровно один раз, складываем в индексированную таблицу и
//! дальше ищем только через SQL. Конвертация выполняется одной
//! транзакцией: читатели никогда не видят наполовину построенный индекс.

use chrono::Utc;
use rusqlite::{params, Connection};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use razgon_core::{RazgonError, Result};

/// Сколько строк копим перед сбросом в таблицу
const INSERT_BATCH_SIZE: usize = 500;

/// Корень манифеста: games -> title -> данные игры
#[derive(Debug, Deserialize)]
struct ManifestDocument {
    #[serde(default)]
    games: BTreeMap<String, ManifestGame>,
}

/// Из данных игры нас интересует только карта файлов.
/// Метаданные кандидатов (when/tags/os) остаются непрозрачным blob'ом.
#[derive(Debug, Deserialize, Default)]
struct ManifestGame {
    #[serde(default)]
    files: BTreeMap<String, serde_json::Value>,
}

/// Результат поиска по индексу
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestHit {
    /// Точное название из манифеста
    pub title: String,
    /// Сериализованная карта кандидатов (JSON)
    pub files: String,
}

/// Индекс уже построен? Непустая таблица + запись в manifest_meta.
pub fn is_built(conn: &Connection) -> Result<bool> {
    let meta_rows: i64 =
        conn.query_row("SELECT COUNT(*) FROM manifest_meta", [], |row| row.get(0))?;
    if meta_rows == 0 {
        return Ok(false);
    }
    let games: i64 =
        conn.query_row("SELECT COUNT(*) FROM manifest_games", [], |row| row.get(0))?;
    Ok(games > 0)
}

pub fn row_count(conn: &Connection) -> Result<u64> {
    let count: i64 =
        conn.query_row("SELECT COUNT(*) FROM manifest_games", [], |row| row.get(0))?;
    Ok(count as u64)
}

/// Прочитать сырой манифест с диска и перестроить индекс
pub fn rebuild_from_yaml(conn: &mut Connection, yaml_path: &Path) -> Result<u64> {
    let text = std::fs::read_to_string(yaml_path)?;
    rebuild_from_str(conn, &text, &yaml_path.to_string_lossy())
}

/// Перестроить индекс из текста манифеста.
///
/// Вся конвертация — одна транзакция: drop/create таблицы, вставка
/// батчами по 500 строк, индекс по title_lower, строка метаданных.
/// Ошибка на любом шаге откатывает всё к прежнему видимому состоянию.
pub fn rebuild_from_str(conn: &mut Connection, yaml_text: &str, source: &str) -> Result<u64> {
    let doc: ManifestDocument = serde_yaml::from_str(yaml_text)
        .map_err(|e| RazgonError::ManifestConversion(e.to_string()))?;

    log::info!(
        "Manifest: converting {} titles into the index",
        doc.games.len()
    );

    let tx = conn.transaction()?;
    tx.execute_batch(
        r#"
        DROP TABLE IF EXISTS manifest_games;
        CREATE TABLE manifest_games (
            title TEXT PRIMARY KEY,
            title_lower TEXT NOT NULL,
            files TEXT NOT NULL
        );
        "#,
    )?;

    let mut inserted: u64 = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO manifest_games (title, title_lower, files) VALUES (?1, ?2, ?3)",
        )?;

        let mut batch: Vec<(String, String, String)> = Vec::with_capacity(INSERT_BATCH_SIZE);
        for (title, game) in doc.games {
            let files = serde_json::to_string(&game.files)?;
            let lower = title.to_lowercase();
            batch.push((title, lower, files));

            if batch.len() >= INSERT_BATCH_SIZE {
                for (title, lower, files) in batch.drain(..) {
                    stmt.execute(params![title, lower, files])?;
                    inserted += 1;
                }
                log::debug!("Manifest: {} rows inserted", inserted);
            }
        }
        for (title, lower, files) in batch.drain(..) {
            stmt.execute(params![title, lower, files])?;
            inserted += 1;
        }
    }

    tx.execute(
        "CREATE INDEX idx_manifest_title_lower ON manifest_games(title_lower)",
        [],
    )?;
    tx.execute(
        r#"
        INSERT OR REPLACE INTO manifest_meta (id, converted_at, row_count, source_path)
        VALUES (1, ?1, ?2, ?3)
        "#,
        params![Utc::now().to_rfc3339(), inserted as i64, source],
    )?;
    tx.commit()?;

    log::info!("Manifest: conversion complete, {} rows", inserted);
    Ok(inserted)
}

/// Регистронезависимый substring-поиск по названию. Первая строка, как и
/// в остальных уровнях резолвера: больше одной игры на запрос не нужно.
pub fn search_title(conn: &Connection, needle: &str) -> Result<Option<ManifestHit>> {
    let pattern = format!("%{}%", needle.to_lowercase());
    let mut stmt = conn.prepare(
        "SELECT title, files FROM manifest_games WHERE title_lower LIKE ?1 LIMIT 1",
    )?;

    let hit = stmt
        .query_map(params![pattern], |row| {
            Ok(ManifestHit {
                title: row.get(0)?,
                files: row.get(1)?,
            })
        })?
        .next()
        .transpose()?;

    Ok(hit)
}

/// Payload кандидатов для точного названия (нужен тестам детерминизма
/// и отладочной выгрузке)
pub fn files_for_title(conn: &Connection, title: &str) -> Result<Option<String>> {
    let mut stmt = conn.prepare("SELECT files FROM manifest_games WHERE title = ?1")?;
    let files = stmt
        .query_map(params![title], |row| row.get::<_, String>(0))?
        .next()
        .transpose()?;
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use crate::migrations::run_migrations;

    const SAMPLE: &str = r#"
games:
  "Witch Hollow":
    files:
      "<winAppData>/WitchHollow/settings.ini":
        tags:
          - config
      "<home>/Documents/WitchHollow/save.dat":
        tags:
          - save
  "Iron Harvest City":
    files:
      "<winLocalAppData>/IronHarvest/prefs.json":
        when:
          - os: windows
  "Empty Entry": {}
"#;

    fn fresh_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn conversion_builds_index() {
        let mut conn = fresh_conn();
        assert!(!is_built(&conn).unwrap());

        let rows = rebuild_from_str(&mut conn, SAMPLE, "test").unwrap();
        assert_eq!(rows, 3);
        assert!(is_built(&conn).unwrap());
        assert_eq!(row_count(&conn).unwrap(), 3);
    }

    #[test]
    fn conversion_is_deterministic() {
        let mut a = fresh_conn();
        let mut b = fresh_conn();

        rebuild_from_str(&mut a, SAMPLE, "test").unwrap();
        rebuild_from_str(&mut b, SAMPLE, "test").unwrap();

        assert_eq!(row_count(&a).unwrap(), row_count(&b).unwrap());
        for title in ["Witch Hollow", "Iron Harvest City", "Empty Entry"] {
            assert_eq!(
                files_for_title(&a, title).unwrap(),
                files_for_title(&b, title).unwrap(),
                "files payload differs for {}",
                title
            );
        }
    }

    #[test]
    fn rebuild_replaces_previous_index() {
        let mut conn = fresh_conn();
        rebuild_from_str(&mut conn, SAMPLE, "test").unwrap();

        let smaller = r#"
games:
  "Solo Game":
    files:
      "<home>/.solo/config.ini": {}
"#;
        let rows = rebuild_from_str(&mut conn, smaller, "test").unwrap();
        assert_eq!(rows, 1);
        assert_eq!(row_count(&conn).unwrap(), 1);
        assert!(files_for_title(&conn, "Witch Hollow").unwrap().is_none());
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let mut conn = fresh_conn();
        rebuild_from_str(&mut conn, SAMPLE, "test").unwrap();

        let hit = search_title(&conn, "witch").unwrap().unwrap();
        assert_eq!(hit.title, "Witch Hollow");
        assert!(hit.files.contains("settings.ini"));

        let hit = search_title(&conn, "IRON HARVEST").unwrap().unwrap();
        assert_eq!(hit.title, "Iron Harvest City");

        assert!(search_title(&conn, "no such game").unwrap().is_none());
    }

    #[test]
    fn malformed_yaml_leaves_previous_index_visible() {
        let mut conn = fresh_conn();
        rebuild_from_str(&mut conn, SAMPLE, "test").unwrap();

        let err = rebuild_from_str(&mut conn, "games: [not, a, mapping", "test");
        assert!(err.is_err());

        // Старый индекс не тронут
        assert!(is_built(&conn).unwrap());
        assert_eq!(row_count(&conn).unwrap(), 3);
    }
}
