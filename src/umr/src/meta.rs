//! Asset metadata index lookups.
//!
//! The game ships a SQLite database (`meta`) whose table `a` maps asset
//! paths (`n`) to the hash names (`h`) of the bundle files under `dat/`.
//! The index is read-only for this tool.

use rusqlite::{Connection, OpenFlags, OptionalExtension};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetaError {
    #[error("metadata index not found at {0}")]
    Missing(PathBuf),

    #[error("asset path not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// A successful path-to-hash resolution.
///
/// `path` is the row that actually matched; it differs from the requested
/// path when the fuzzy dress-sub-id fallback kicked in.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub hash: String,
    pub path: String,
}

/// Read-only handle on the metadata index
pub struct MetaDb {
    conn: Connection,
}

impl MetaDb {
    /// Open the index database at `path`
    pub fn open(path: &Path) -> Result<Self, MetaError> {
        if !path.is_file() {
            return Err(MetaError::Missing(path.to_path_buf()));
        }
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        Ok(MetaDb { conn })
    }

    /// Resolve an asset path to its bundle hash.
    ///
    /// When the exact path is absent and `dress_id` has the `XXXX_YY` form,
    /// a second query widens the sub-id to `XXXX_%`; some characters only
    /// ship a subset of dress variants and the base variant stands in.
    pub fn bundle_hash(
        &self,
        asset_path: &str,
        dress_id: Option<&str>,
    ) -> Result<Resolved, MetaError> {
        if let Some(resolved) = self.lookup_exact(asset_path)? {
            return Ok(resolved);
        }

        if let Some(id) = dress_id {
            if let Some((code, _sub)) = id.split_once('_') {
                let widened = asset_path.replace(id, &format!("{code}_%"));
                let mut stmt = self
                    .conn
                    .prepare_cached("SELECT h, n FROM a WHERE n LIKE ?1 LIMIT 1")?;
                let row = stmt
                    .query_row([&widened], |row| {
                        Ok(Resolved {
                            hash: row.get(0)?,
                            path: row.get(1)?,
                        })
                    })
                    .optional()?;
                if let Some(resolved) = row {
                    return Ok(resolved);
                }
            }
        }

        Err(MetaError::NotFound(asset_path.to_string()))
    }

    /// Resolve an exact asset path, or `None` if absent
    pub fn try_bundle_hash(&self, asset_path: &str) -> Result<Option<Resolved>, MetaError> {
        self.lookup_exact(asset_path)
    }

    fn lookup_exact(&self, asset_path: &str) -> Result<Option<Resolved>, MetaError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT h FROM a WHERE n = ?1")?;
        let hash: Option<String> = stmt
            .query_row([asset_path], |row| row.get(0))
            .optional()?;
        Ok(hash.map(|hash| Resolved {
            hash,
            path: asset_path.to_string(),
        }))
    }

    /// Every live-stage camera bundle (`cutt/cutt_son*/son*_camera`)
    pub fn camera_bundles(&self) -> Result<Vec<Resolved>, MetaError> {
        let mut stmt = self
            .conn
            .prepare("SELECT h, n FROM a WHERE n LIKE 'cutt/cutt_son%/son%_camera' ORDER BY n")?;
        let rows = stmt.query_map([], |row| {
            Ok(Resolved {
                hash: row.get(0)?,
                path: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Character codes that ship an alternate-head prefab (`pfb_chr____90`).
    ///
    /// Used by the live-dress unlock to decide which cloned dress rows get
    /// a dedicated head sub-id.
    pub fn alt_head_codes(&self) -> Result<Vec<String>, MetaError> {
        let mut stmt = self
            .conn
            .prepare("SELECT n FROM a WHERE n LIKE '%pfb_chr1____90'")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut codes = Vec::new();
        for name in rows {
            let name = name?;
            // ".../pfb_chr<XXXX>_90" -> "<XXXX>"
            if name.len() >= 7 {
                codes.push(name[name.len() - 7..name.len() - 3].to_string());
            }
        }
        Ok(codes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db(rows: &[(&str, &str)]) -> (tempfile::TempDir, MetaDb) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta");

        let conn = Connection::open(&path).unwrap();
        conn.execute("CREATE TABLE a (n TEXT PRIMARY KEY, h TEXT NOT NULL)", [])
            .unwrap();
        for (n, h) in rows {
            conn.execute("INSERT INTO a (n, h) VALUES (?1, ?2)", [n, h])
                .unwrap();
        }
        drop(conn);

        let db = MetaDb::open(&path).unwrap();
        (dir, db)
    }

    #[test]
    fn test_exact_lookup() {
        let (_dir, db) = test_db(&[("3d/chara/body/bdy1046_01/pfb_bdy1046_01", "ab01")]);

        let resolved = db
            .bundle_hash("3d/chara/body/bdy1046_01/pfb_bdy1046_01", Some("1046_01"))
            .unwrap();
        assert_eq!(resolved.hash, "ab01");
        assert_eq!(resolved.path, "3d/chara/body/bdy1046_01/pfb_bdy1046_01");
    }

    #[test]
    fn test_fuzzy_dress_fallback() {
        let (_dir, db) = test_db(&[("3d/chara/body/bdy1046_00/pfb_bdy1046_00", "cd02")]);

        // 1046_01 does not exist; the base 1046_00 variant stands in
        let resolved = db
            .bundle_hash("3d/chara/body/bdy1046_01/pfb_bdy1046_01", Some("1046_01"))
            .unwrap();
        assert_eq!(resolved.hash, "cd02");
        assert_eq!(resolved.path, "3d/chara/body/bdy1046_00/pfb_bdy1046_00");
    }

    #[test]
    fn test_not_found_names_path() {
        let (_dir, db) = test_db(&[]);

        let err = db.bundle_hash("3d/chara/tail/tail9999_01/pfb", None).unwrap_err();
        match err {
            MetaError::NotFound(path) => assert!(path.contains("tail9999")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_camera_bundles() {
        let (_dir, db) = test_db(&[
            ("cutt/cutt_son1001/son1001_camera", "11aa"),
            ("cutt/cutt_son1002/son1002_camera", "22bb"),
            ("3d/chara/body/bdy1046_00/pfb_bdy1046_00", "cd02"),
        ]);

        let cameras = db.camera_bundles().unwrap();
        assert_eq!(cameras.len(), 2);
        assert_eq!(cameras[0].hash, "11aa");
        assert_eq!(cameras[1].path, "cutt/cutt_son1002/son1002_camera");
    }

    #[test]
    fn test_alt_head_codes() {
        let (_dir, db) = test_db(&[
            ("3d/chara/head/chr1046_90/pfb_chr1046_90", "33cc"),
            ("3d/chara/head/chr1046_00/pfb_chr1046_00", "44dd"),
        ]);

        assert_eq!(db.alt_head_codes().unwrap(), vec!["1046".to_string()]);
    }

    #[test]
    fn test_missing_index() {
        let dir = tempfile::tempdir().unwrap();
        let err = MetaDb::open(&dir.path().join("meta")).unwrap_err();
        assert!(matches!(err, MetaError::Missing(_)));
    }
}
