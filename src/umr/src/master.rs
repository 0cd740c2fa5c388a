//! Master game database edits.
//!
//! `master/master.mdb` holds the game's static tables. The only one this
//! tool touches is `dress_data`, for the live-dress unlock: every base
//! dress row is cloned into an "alternate" variant (id + 89) that the live
//! theater accepts, and the live-usage flags are switched on everywhere.

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MasterError {
    #[error("master database not found at {0}")]
    Missing(PathBuf),

    #[error("unexpected dress_data schema: {0}")]
    Schema(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Outcome of a live-dress unlock run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlockSummary {
    /// Alternate dress rows inserted (rows already present are skipped)
    pub cloned: usize,
    /// Rows whose live-usage flags were updated
    pub unlocked: usize,
}

/// Read-write handle on the master database
pub struct MasterDb {
    conn: Connection,
}

/// Offset added to a base dress id to form its alternate variant
const ALT_DRESS_OFFSET: i64 = 89;

/// `body_type_sub` / `head_sub_id` marking an alternate variant
const ALT_SUB_ID: i64 = 90;

impl MasterDb {
    /// Open the master database at `path`
    pub fn open(path: &Path) -> Result<Self, MasterError> {
        if !path.is_file() {
            return Err(MasterError::Missing(path.to_path_buf()));
        }
        let conn = Connection::open(path)?;
        Ok(MasterDb { conn })
    }

    #[cfg(test)]
    fn from_connection(conn: Connection) -> Self {
        MasterDb { conn }
    }

    /// Clone base dress rows into live-theater variants and unlock live
    /// usage on every dress.
    ///
    /// `alt_head_codes` lists the character codes that ship an
    /// alternate-head prefab; only those clones get `head_sub_id` 90.
    /// Running this twice is harmless: existing clone ids are skipped.
    pub fn unlock_live_dresses(
        &mut self,
        alt_head_codes: &[String],
    ) -> Result<UnlockSummary, MasterError> {
        let alt_heads: HashSet<&str> = alt_head_codes.iter().map(String::as_str).collect();

        let columns = self.dress_columns()?;
        let id_idx = column_index(&columns, "id")?;
        let body_sub_idx = column_index(&columns, "body_type_sub")?;
        let head_sub_idx = column_index(&columns, "head_sub_id")?;

        let select = format!(
            "SELECT {} FROM dress_data WHERE id > 100000 AND id < 200000 AND id % 100 = 1",
            columns.join(", ")
        );

        let tx = self.conn.transaction()?;
        let mut cloned = 0usize;

        {
            let base_rows: Vec<Vec<Value>> = {
                let mut stmt = tx.prepare(&select)?;
                let rows = stmt.query_map([], |row| {
                    let mut values = Vec::with_capacity(columns.len());
                    for i in 0..columns.len() {
                        values.push(row.get::<_, Value>(i)?);
                    }
                    Ok(values)
                })?;
                rows.collect::<Result<_, _>>()?
            };

            let placeholders: Vec<String> =
                (1..=columns.len()).map(|i| format!("?{i}")).collect();
            let insert = format!(
                "INSERT OR IGNORE INTO dress_data ({}) VALUES ({})",
                columns.join(", "),
                placeholders.join(", ")
            );
            let mut insert_stmt = tx.prepare(&insert)?;

            for mut values in base_rows {
                let base_id = match &values[id_idx] {
                    Value::Integer(id) => *id,
                    _ => {
                        return Err(MasterError::Schema(
                            "dress_data.id is not an integer".into(),
                        ))
                    }
                };
                let alt_id = base_id + ALT_DRESS_OFFSET;

                values[id_idx] = Value::Integer(alt_id);
                values[body_sub_idx] = Value::Integer(ALT_SUB_ID);

                // "100190" -> character code "1001"
                let code = (alt_id / 100).to_string();
                values[head_sub_idx] = if alt_heads.contains(code.as_str()) {
                    Value::Integer(ALT_SUB_ID)
                } else {
                    Value::Integer(0)
                };

                cloned += insert_stmt.execute(params_from_iter(values.iter()))?;
            }
        }

        let unlocked = tx.execute(
            "UPDATE dress_data SET use_live = 1, use_live_theater = 1 \
             WHERE use_live != 1 OR use_live_theater != 1",
            [],
        )?;

        tx.commit()?;

        Ok(UnlockSummary { cloned, unlocked })
    }

    /// Column names of `dress_data`, in table order
    fn dress_columns(&self) -> Result<Vec<String>, MasterError> {
        let mut stmt = self.conn.prepare("PRAGMA table_info(dress_data)")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<Vec<_>, _>>()?;

        if names.is_empty() {
            return Err(MasterError::Schema("dress_data table is missing".into()));
        }
        Ok(names)
    }
}

fn column_index(columns: &[String], name: &str) -> Result<usize, MasterError> {
    columns
        .iter()
        .position(|c| c == name)
        .ok_or_else(|| MasterError::Schema(format!("dress_data.{name} column is missing")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> MasterDb {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE dress_data (
                id INTEGER PRIMARY KEY,
                condition_type INTEGER, have_mini INTEGER, general_purpose INTEGER,
                costume_type INTEGER, chara_id INTEGER, use_gender INTEGER,
                body_shape INTEGER, body_type INTEGER, body_type_sub INTEGER,
                body_setting INTEGER, use_race INTEGER, use_live INTEGER,
                use_live_theater INTEGER, use_home INTEGER, use_dress_change INTEGER,
                is_wet INTEGER, is_dirt INTEGER, head_sub_id INTEGER,
                use_season INTEGER, dress_color_main INTEGER, dress_color_sub INTEGER,
                color_num INTEGER, disp_order INTEGER, tail_model_id INTEGER,
                tail_model_sub_id INTEGER, mini_mayu_shader_type INTEGER,
                start_time TEXT, end_time TEXT
            );",
        )
        .unwrap();
        MasterDb::from_connection(conn)
    }

    fn insert_dress(db: &MasterDb, id: i64, chara_id: i64) {
        db.conn
            .execute(
                "INSERT INTO dress_data VALUES (
                    ?1, 1, 1, 0, 1, ?2, 1, 1, 1, 0, 0, 1, 0, 0, 1, 1,
                    0, 0, 0, 0, 1, 2, 3, 10, 1, 0, 0, '2021-01-01', '2099-12-31'
                )",
                [id, chara_id],
            )
            .unwrap();
    }

    fn dress_count(db: &MasterDb) -> i64 {
        db.conn
            .query_row("SELECT COUNT(*) FROM dress_data", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_unlock_clones_base_dresses() {
        let mut db = test_db();
        insert_dress(&db, 100101, 1001);
        insert_dress(&db, 104601, 1046);
        // Not a base dress: sub-id 02
        insert_dress(&db, 100102, 1001);

        let summary = db
            .unlock_live_dresses(&["1046".to_string()])
            .unwrap();

        assert_eq!(summary.cloned, 2);
        assert_eq!(dress_count(&db), 5);

        let (body_sub, head_sub): (i64, i64) = db
            .conn
            .query_row(
                "SELECT body_type_sub, head_sub_id FROM dress_data WHERE id = 104690",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(body_sub, 90);
        assert_eq!(head_sub, 90);

        // 1001 ships no alternate head
        let head_sub: i64 = db
            .conn
            .query_row(
                "SELECT head_sub_id FROM dress_data WHERE id = 100190",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(head_sub, 0);
    }

    #[test]
    fn test_unlock_sets_live_flags() {
        let mut db = test_db();
        insert_dress(&db, 100101, 1001);

        db.unlock_live_dresses(&[]).unwrap();

        let locked: i64 = db
            .conn
            .query_row(
                "SELECT COUNT(*) FROM dress_data WHERE use_live != 1 OR use_live_theater != 1",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(locked, 0);
    }

    #[test]
    fn test_unlock_is_idempotent() {
        let mut db = test_db();
        insert_dress(&db, 100101, 1001);

        let first = db.unlock_live_dresses(&[]).unwrap();
        assert_eq!(first.cloned, 1);

        let second = db.unlock_live_dresses(&[]).unwrap();
        assert_eq!(second.cloned, 0);
        assert_eq!(dress_count(&db), 2);
    }

    #[test]
    fn test_missing_table_is_reported() {
        let conn = Connection::open_in_memory().unwrap();
        let mut db = MasterDb::from_connection(conn);
        let err = db.unlock_live_dresses(&[]).unwrap_err();
        assert!(matches!(err, MasterError::Schema(_)));
    }
}
