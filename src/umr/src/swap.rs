//! The swap engine.
//!
//! Every menu action reduces to the same sequence: resolve asset paths to
//! bundle hashes through the metadata index, load the bundle(s), replace
//! the relevant payload, back up the original, write the result over the
//! target slot. [`Swapper`] owns the open databases and the backup store
//! and exposes one method per operation.

use std::fs;
use std::path::{Path, PathBuf};

use serde_value::Value;
use thiserror::Error;

use crate::assets::{self, IdError};
use crate::backup::{BackupError, BackupStore};
use crate::bundle::{tree, Bundle, BundleError};
use crate::crypto::{self, CryptoError};
use crate::master::{MasterDb, MasterError, UnlockSummary};
use crate::meta::{MetaDb, MetaError, Resolved};
use crate::paths::GameDirs;
use crate::texture::{self, TextureError, TextureFormat};

#[derive(Debug, Error)]
pub enum SwapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Id(#[from] IdError),

    #[error("metadata error: {0}")]
    Meta(#[from] MetaError),

    #[error("master database error: {0}")]
    Master(#[from] MasterError),

    #[error("backup error: {0}")]
    Backup(#[from] BackupError),

    #[error("bundle error: {0}")]
    Bundle(#[from] BundleError),

    #[error("cipher error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("texture error: {0}")]
    Texture(#[from] TextureError),

    #[error("ids must have equal length for in-place patching ({0:?} vs {1:?})")]
    IdLengthMismatch(String, String),

    #[error("tail rig families differ: target uses {target}, donor uses {donor}; cross-family swaps corrupt the rig")]
    TailFamilyMismatch { target: u8, donor: u8 },

    #[error("no tail model found for {0}")]
    TailNotFound(String),

    #[error("expected {0} data not present in bundle")]
    SceneDataMissing(&'static str),

    #[error("texture directory not found: {0} (run the export step first)")]
    TexturesNotExported(PathBuf),
}

/// One completed bundle replacement within a swap
#[derive(Debug, Clone)]
pub struct ReplacedPair {
    pub target_path: String,
    pub donor_path: String,
    /// Identifier occurrences patched inside the donor payload
    pub occurrences: usize,
}

/// Outcome of an identifier swap over a bundle group
#[derive(Debug, Default)]
pub struct SwapReport {
    pub replaced: Vec<ReplacedPair>,
    /// Asset paths with no row in the metadata index
    pub skipped: Vec<String>,
}

impl SwapReport {
    pub fn merge(&mut self, other: SwapReport) {
        self.replaced.extend(other.replaced);
        self.skipped.extend(other.skipped);
    }
}

/// Outcome of a live-blur clearing run
#[derive(Debug, Default)]
pub struct BlurReport {
    pub cleared: Vec<String>,
    /// Camera bundles that could not be edited, with the reason
    pub failed: Vec<(String, String)>,
}

/// Outcome of a texture export
#[derive(Debug)]
pub struct ExportReport {
    /// False when an export tree already existed and was left alone
    pub fresh: bool,
    pub dir: PathBuf,
    pub exported: Vec<String>,
    /// Textures whose format could not be decoded
    pub skipped: Vec<String>,
}

/// Outcome of a texture import
#[derive(Debug, Default)]
pub struct ImportReport {
    pub updated: Vec<String>,
    pub bundles_written: usize,
}

/// Which of the two gate attendants the intro replacement targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateKind {
    Tazuna,
    Yayoi,
}

impl GateKind {
    pub fn code(self) -> &'static str {
        match self {
            GateKind::Tazuna => "001",
            GateKind::Yayoi => "002",
        }
    }
}

/// Texture group selector for export/import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureGroup {
    Body,
    Head,
}

impl TextureGroup {
    fn dir_prefix(self) -> &'static str {
        match self {
            TextureGroup::Body => "body",
            TextureGroup::Head => "head",
        }
    }

    fn bundles(self, id: &str) -> Vec<String> {
        match self {
            TextureGroup::Body => vec![assets::body_texture_bundle(id)],
            TextureGroup::Head => assets::head_texture_bundles(id),
        }
    }
}

/// Owns the open databases, the backup store, and the cipher setting
pub struct Swapper {
    game: GameDirs,
    meta: MetaDb,
    store: BackupStore,
    work_dir: PathBuf,
    encrypted: bool,
}

/// Backup-store key for the master database
const MASTER_BACKUP_KEY: &str = "master.mdb";

impl Swapper {
    /// Open the metadata index and backup store.
    ///
    /// On encrypted installs the index is deciphered into the work
    /// directory first; the on-disk original is never touched.
    pub fn new(game: GameDirs, work_dir: &Path, encrypted: bool) -> Result<Self, SwapError> {
        fs::create_dir_all(work_dir)?;
        let store = BackupStore::open(&work_dir.join("backup"))?;

        let meta_path = game.meta_path();
        let meta = if encrypted {
            if !meta_path.is_file() {
                return Err(MetaError::Missing(meta_path).into());
            }
            let mut data = fs::read(&meta_path)?;
            crypto::crypt_meta(&mut data);
            let deciphered = work_dir.join("meta");
            fs::write(&deciphered, &data)?;
            MetaDb::open(&deciphered)?
        } else {
            MetaDb::open(&meta_path)?
        };

        Ok(Swapper {
            game,
            meta,
            store,
            work_dir: work_dir.to_path_buf(),
            encrypted,
        })
    }

    pub fn backups(&self) -> &BackupStore {
        &self.store
    }

    pub fn game(&self) -> &GameDirs {
        &self.game
    }

    // === Identifier swaps ===

    /// Load the donor's body model under the target's slots
    pub fn swap_body(&mut self, target_id: &str, donor_id: &str) -> Result<SwapReport, SwapError> {
        assets::check_model_id(target_id)?;
        assets::check_model_id(donor_id)?;
        self.swap_group(
            &assets::body_paths(target_id),
            &assets::body_paths(donor_id),
            target_id,
            donor_id,
        )
    }

    /// Load the donor's head model under the target's slots
    pub fn swap_head(&mut self, target_id: &str, donor_id: &str) -> Result<SwapReport, SwapError> {
        assets::check_model_id(target_id)?;
        assets::check_model_id(donor_id)?;
        self.swap_group(
            &assets::head_paths(target_id),
            &assets::head_paths(donor_id),
            target_id,
            donor_id,
        )
    }

    /// Full model swap: head group, then body group
    pub fn swap_model(&mut self, target_id: &str, donor_id: &str) -> Result<SwapReport, SwapError> {
        let mut report = self.swap_head(target_id, donor_id)?;
        report.merge(self.swap_body(target_id, donor_id)?);
        Ok(report)
    }

    /// Swap tail models between two characters.
    ///
    /// Tails exist in two rig families; each character ships exactly one.
    /// Cross-family swaps are rejected because the donor mesh cannot bind
    /// to the target's rig.
    pub fn swap_tail(
        &mut self,
        target_code: &str,
        donor_code: &str,
    ) -> Result<SwapReport, SwapError> {
        assets::check_chara_code(target_code)?;
        assets::check_chara_code(donor_code)?;

        let target_family = self
            .tail_family(target_code)?
            .ok_or_else(|| SwapError::TailNotFound(target_code.to_string()))?;
        let donor_family = self
            .tail_family(donor_code)?
            .ok_or_else(|| SwapError::TailNotFound(donor_code.to_string()))?;

        if target_family != donor_family {
            return Err(SwapError::TailFamilyMismatch {
                target: target_family,
                donor: donor_family,
            });
        }

        self.swap_group(
            &assets::tail_paths(target_code, target_family),
            &assets::tail_paths(donor_code, donor_family),
            target_code,
            donor_code,
        )
    }

    /// Load the donor dress's victory animation under the target's slot
    pub fn swap_race_result(
        &mut self,
        target_dress: &str,
        donor_dress: &str,
    ) -> Result<SwapReport, SwapError> {
        assets::check_dress_id(target_dress)?;
        assets::check_dress_id(donor_dress)?;
        self.swap_group(
            &assets::race_result_paths(target_dress),
            &assets::race_result_paths(donor_dress),
            target_dress,
            donor_dress,
        )
    }

    /// Which rig family (1 or 2) a character's tail ships in
    fn tail_family(&self, code: &str) -> Result<Option<u8>, SwapError> {
        for family in [1u8, 2] {
            let group = assets::tail_paths(code, family);
            if self.meta.try_bundle_hash(&group[0])?.is_some() {
                return Ok(Some(family));
            }
        }
        Ok(None)
    }

    /// Pairwise identifier swap over two equally sized path groups.
    ///
    /// For each pair the *donor* bundle is loaded, every occurrence of the
    /// donor id is patched to the target id, and the result is written
    /// over the *target* slot's file (after backing it up). Pairs whose
    /// paths have no metadata row are skipped and reported.
    fn swap_group(
        &mut self,
        target_paths: &[String],
        donor_paths: &[String],
        target_id: &str,
        donor_id: &str,
    ) -> Result<SwapReport, SwapError> {
        if target_id.len() != donor_id.len() {
            return Err(SwapError::IdLengthMismatch(
                target_id.to_string(),
                donor_id.to_string(),
            ));
        }

        let mut report = SwapReport::default();

        for (target_path, donor_path) in target_paths.iter().zip(donor_paths) {
            let Some(target) = self.resolve_or_skip(target_path, target_id, &mut report)? else {
                continue;
            };
            let Some(donor) = self.resolve_or_skip(donor_path, donor_id, &mut report)? else {
                continue;
            };

            // Indexed but not downloaded yet: skip, like a missing row
            let raw = match self.read_bundle_bytes(&donor.hash) {
                Ok(raw) => raw,
                Err(SwapError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                    report.skipped.push(donor.path);
                    continue;
                }
                Err(e) => return Err(e),
            };
            let mut bundle = Bundle::from_bytes(&raw)?;
            let occurrences = bundle.patch_bytes(donor_id.as_bytes(), target_id.as_bytes())?;
            self.write_bundle_bytes(&target.hash, bundle.to_bytes()?)?;

            report.replaced.push(ReplacedPair {
                target_path: target.path,
                donor_path: donor.path,
                occurrences,
            });
        }

        Ok(report)
    }

    fn resolve_or_skip(
        &self,
        asset_path: &str,
        id: &str,
        report: &mut SwapReport,
    ) -> Result<Option<Resolved>, SwapError> {
        match self.meta.bundle_hash(asset_path, Some(id)) {
            Ok(resolved) => Ok(Some(resolved)),
            Err(MetaError::NotFound(path)) => {
                report.skipped.push(path);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    // === Cut-scene edits ===

    /// Point the home-screen gate intro at a different dress
    pub fn set_gate_character(&mut self, dress_id: &str, kind: GateKind) -> Result<(), SwapError> {
        assets::check_dress_id(dress_id)?;
        let (chara, cloth) = split_dress_id(dress_id)?;

        let resolved = self
            .meta
            .bundle_hash(&assets::gate_intro_path(kind.code()), None)?;

        let raw = self.read_bundle_bytes(&resolved.hash)?;
        let mut bundle = Bundle::from_bytes(&raw)?;

        let edited = bundle.edit_behaviours(|name, value| {
            if !name.contains("runtime_gac_chr_start_00") {
                return Ok(false);
            }
            Ok(set_character_keys(value, chara, cloth, None))
        })?;

        if edited == 0 {
            return Err(SwapError::SceneDataMissing("gate intro"));
        }

        self.write_bundle_bytes(&resolved.hash, bundle.to_bytes()?)
    }

    /// Rewrite the target dress's skill cut-in to use the donor's
    /// character, dress, and physics-spring bindings
    pub fn swap_cutin(
        &mut self,
        target_dress: &str,
        donor_dress: &str,
    ) -> Result<(), SwapError> {
        assets::check_dress_id(target_dress)?;
        assets::check_dress_id(donor_dress)?;

        let donor_res = self
            .meta
            .bundle_hash(&assets::cutin_skill_path(donor_dress), None)?;
        let target_res = self
            .meta
            .bundle_hash(&assets::cutin_skill_path(target_dress), None)?;

        // Read the donor's character keys first
        let donor_raw = self.read_bundle_bytes(&donor_res.hash)?;
        let donor_bundle = Bundle::from_bytes(&donor_raw)?;

        let mut donor_cloth: Option<i64> = None;
        let mut donor_springs: Option<Vec<Value>> = None;

        donor_bundle.visit_behaviours(|name, value| {
            if !name.contains("runtime_crd") {
                return Ok(());
            }
            let Some(list) = tree::get_seq(value, "_characterList") else {
                return Ok(());
            };
            for character in list {
                let Some(keys) = tree::get(character, "_characterKeys") else {
                    continue;
                };
                if let Some(cloth) = tree::get_i64(keys, "_selectClothId") {
                    donor_cloth = Some(cloth);
                }
                if let Some(entries) = tree::get_seq(keys, "thisList") {
                    for entry in entries {
                        if has_enabled_springs(entry) {
                            if let Some(names) = tree::get_seq(entry, "_targetCySpringNameList") {
                                donor_springs = Some(names.to_vec());
                            }
                        }
                    }
                }
            }
            Ok(())
        })?;

        let cloth = donor_cloth.ok_or(SwapError::SceneDataMissing("skill cut-in"))?;
        let chara = cloth / 100;

        let target_raw = self.read_bundle_bytes(&target_res.hash)?;
        let mut bundle = Bundle::from_bytes(&target_raw)?;

        let edited = bundle.edit_behaviours(|name, value| {
            if !name.contains("runtime_crd") {
                return Ok(false);
            }
            let changed = set_character_keys(value, chara, cloth, Some(0));
            if let Some(spring_names) = &donor_springs {
                if let Some(list) = tree::get_seq_mut(value, "_characterList") {
                    for character in list {
                        let Some(keys) = tree::get_mut(character, "_characterKeys") else {
                            continue;
                        };
                        let Some(entries) = tree::get_seq_mut(keys, "thisList") else {
                            continue;
                        };
                        for entry in entries {
                            if has_enabled_springs(entry) {
                                tree::set_seq(
                                    entry,
                                    "_enableCySpringList",
                                    vec![Value::I32(1); spring_names.len()],
                                );
                                tree::set_seq(
                                    entry,
                                    "_targetCySpringNameList",
                                    spring_names.clone(),
                                );
                            }
                        }
                    }
                }
            }
            Ok(changed)
        })?;

        if edited == 0 {
            return Err(SwapError::SceneDataMissing("skill cut-in"));
        }

        self.write_bundle_bytes(&target_res.hash, bundle.to_bytes()?)
    }

    /// Flatten the depth-of-field and blur tracks of live-stage cameras.
    ///
    /// With `song_id`, only that song's camera is edited; otherwise every
    /// camera bundle in the index. Per-bundle failures are reported but do
    /// not abort the run.
    pub fn clear_live_blur(&mut self, song_id: Option<&str>) -> Result<BlurReport, SwapError> {
        let target_path = song_id.map(assets::camera_path);
        let cameras = self.meta.camera_bundles()?;

        let mut report = BlurReport::default();

        for camera in cameras {
            if let Some(wanted) = &target_path {
                if &camera.path != wanted {
                    continue;
                }
            }

            match self.clear_camera_blur(&camera) {
                Ok(true) => report.cleared.push(camera.path),
                Ok(false) => report
                    .failed
                    .push((camera.path, "no camera key data found".to_string())),
                Err(e) => report.failed.push((camera.path, e.to_string())),
            }
        }

        Ok(report)
    }

    fn clear_camera_blur(&mut self, camera: &Resolved) -> Result<bool, SwapError> {
        let raw = self.read_bundle_bytes(&camera.hash)?;
        let mut bundle = Bundle::from_bytes(&raw)?;

        let edited = bundle.edit_behaviours(|_, value| {
            let Some(dof) = tree::get_mut(value, "postEffectDOFKeys") else {
                return Ok(false);
            };
            let Some(list) = tree::get_seq_mut(dof, "thisList") else {
                return Ok(false);
            };
            if list.is_empty() {
                return Ok(false);
            }

            list.truncate(1);
            write_neutral_dof_key(&mut list[0]);

            if let Some(bloom) = tree::get_mut(value, "postEffectBloomDiffusionKeys") {
                tree::set_seq(bloom, "thisList", Vec::new());
            }
            if let Some(radial) = tree::get_mut(value, "radialBlurKeys") {
                tree::set_seq(radial, "thisList", Vec::new());
            }
            Ok(true)
        })?;

        if edited == 0 {
            return Ok(false);
        }

        self.write_bundle_bytes(&camera.hash, bundle.to_bytes()?)?;
        Ok(true)
    }

    // === Master database ===

    /// Unlock every dress for live stages (see [`MasterDb`])
    pub fn unlock_live_dresses(&mut self) -> Result<UnlockSummary, SwapError> {
        let master_path = self.game.master_path();
        self.store.preserve(MASTER_BACKUP_KEY, &master_path)?;

        let alt_heads = self.meta.alt_head_codes()?;
        let mut master = MasterDb::open(&master_path)?;
        Ok(master.unlock_live_dresses(&alt_heads)?)
    }

    // === Textures ===

    /// PNG export tree for a character's texture group
    pub fn texture_dir(&self, group: TextureGroup, id: &str) -> PathBuf {
        self.work_dir
            .join("textures")
            .join(format!("{}_{}", group.dir_prefix(), assets::chara_code(id)))
    }

    /// Decode a character's textures to PNG for editing.
    ///
    /// An existing export tree is left alone unless `force` is set, so an
    /// edit-in-progress survives repeated menu visits.
    pub fn export_textures(
        &mut self,
        group: TextureGroup,
        id: &str,
        force: bool,
    ) -> Result<ExportReport, SwapError> {
        assets::check_model_id(id)?;

        let dir = self.texture_dir(group, id);
        if dir.is_dir() && !force {
            return Ok(ExportReport {
                fresh: false,
                dir,
                exported: Vec::new(),
                skipped: Vec::new(),
            });
        }
        if dir.is_dir() {
            fs::remove_dir_all(&dir)?;
        }
        fs::create_dir_all(&dir)?;

        let mut exported = Vec::new();
        let mut skipped = Vec::new();

        for asset_path in group.bundles(id) {
            let resolved = match self.meta.bundle_hash(&asset_path, Some(id)) {
                Ok(resolved) => resolved,
                Err(MetaError::NotFound(_)) => continue,
                Err(e) => return Err(e.into()),
            };

            let raw = self.read_bundle_bytes(&resolved.hash)?;
            let bundle = Bundle::from_bytes(&raw)?;

            for tex in bundle.textures()? {
                let format = TextureFormat::from_id(tex.format);
                let rgba = match texture::decode(format, &tex.data, tex.width, tex.height) {
                    Ok(rgba) => rgba,
                    Err(TextureError::Unsupported(_)) => {
                        skipped.push(tex.name);
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                };
                texture::save_png(
                    &rgba,
                    tex.width,
                    tex.height,
                    &dir.join(format!("{}.png", tex.name)),
                )?;
                exported.push(tex.name);
            }
        }

        Ok(ExportReport {
            fresh: true,
            dir,
            exported,
            skipped,
        })
    }

    /// Re-import edited PNGs into their texture slots and write the
    /// bundles back. PNGs must keep the slot's dimensions; payloads are
    /// re-encoded as plain RGBA32.
    pub fn import_textures(
        &mut self,
        group: TextureGroup,
        id: &str,
    ) -> Result<ImportReport, SwapError> {
        assets::check_model_id(id)?;

        let dir = self.texture_dir(group, id);
        if !dir.is_dir() {
            return Err(SwapError::TexturesNotExported(dir));
        }

        let mut report = ImportReport::default();

        for asset_path in group.bundles(id) {
            let resolved = match self.meta.bundle_hash(&asset_path, Some(id)) {
                Ok(resolved) => resolved,
                Err(MetaError::NotFound(_)) => continue,
                Err(e) => return Err(e.into()),
            };

            let raw = self.read_bundle_bytes(&resolved.hash)?;
            let mut bundle = Bundle::from_bytes(&raw)?;
            let mut touched = false;

            for tex in bundle.textures()? {
                let png = dir.join(format!("{}.png", tex.name));
                if !png.is_file() {
                    continue;
                }
                let rgba = texture::load_png(&png, tex.width, tex.height)?;
                bundle.replace_texture(tex.path_id, &rgba, tex.width, tex.height)?;
                report.updated.push(tex.name);
                touched = true;
            }

            if touched {
                self.write_bundle_bytes(&resolved.hash, bundle.to_bytes()?)?;
                report.bundles_written += 1;
            }
        }

        Ok(report)
    }

    // === Restore ===

    /// Copy every backed-up file over its modified counterpart
    pub fn restore_all(&mut self) -> Result<Vec<String>, SwapError> {
        Ok(self.store.restore_all()?)
    }

    // === Bundle I/O ===

    fn read_bundle_bytes(&self, hash: &str) -> Result<Vec<u8>, SwapError> {
        let path = self.game.bundle_path(hash);
        let mut data = fs::read(&path)?;
        if self.encrypted {
            crypto::crypt_bundle(&mut data, hash)?;
        }
        Ok(data)
    }

    /// Back up the current on-disk file, then replace it.
    ///
    /// The full output buffer is assembled (and enciphered) before the
    /// write, so a failing operation never leaves a half-written bundle.
    fn write_bundle_bytes(&mut self, hash: &str, mut data: Vec<u8>) -> Result<(), SwapError> {
        let path = self.game.bundle_path(hash);
        self.store.preserve(hash, &path)?;

        if self.encrypted {
            crypto::crypt_bundle(&mut data, hash)?;
        }
        fs::write(&path, &data)?;
        Ok(())
    }
}

/// "100101" -> (1001, 100101)
fn split_dress_id(dress_id: &str) -> Result<(i64, i64), SwapError> {
    let cloth: i64 = dress_id
        .parse()
        .map_err(|_| IdError::Dress(dress_id.to_string()))?;
    Ok((cloth / 100, cloth))
}

/// Set `_selectCharaId` / `_selectClothId` (and optionally
/// `_selectHeadId`) on every entry of a scene's `_characterList`
fn set_character_keys(value: &mut Value, chara: i64, cloth: i64, head: Option<i32>) -> bool {
    let Some(list) = tree::get_seq_mut(value, "_characterList") else {
        return false;
    };

    let mut changed = false;
    for character in list {
        let Some(keys) = tree::get_mut(character, "_characterKeys") else {
            continue;
        };
        tree::set_i32(keys, "_selectCharaId", chara as i32);
        tree::set_i32(keys, "_selectClothId", cloth as i32);
        if let Some(head) = head {
            tree::set_i32(keys, "_selectHeadId", head);
        }
        changed = true;
    }
    changed
}

fn has_enabled_springs(entry: &Value) -> bool {
    tree::get_seq(entry, "_enableCySpringList").is_some_and(|s| !s.is_empty())
}

/// Overwrite a DOF key with values that keep the whole stage in focus
fn write_neutral_dof_key(key: &mut Value) {
    tree::set_i32(key, "frame", 0);
    tree::set_i32(key, "attribute", 327_680);
    tree::set_i32(key, "interpolateType", 0);
    if let Value::Map(map) = key {
        map.insert(
            Value::String("curve".to_string()),
            tree::map(vec![
                ("m_Curve", Value::Seq(Vec::new())),
                ("m_PreInfinity", Value::I32(2)),
                ("m_PostInfinity", Value::I32(2)),
                ("m_RotationOrder", Value::I32(4)),
            ]),
        );
    }
    tree::set_i32(key, "easingType", 0);
    tree::set_f32(key, "forcalSize", 30.0);
    tree::set_f32(key, "blurSpread", 20.0);
    tree::set_i32(key, "charactor", 1);
    tree::set_i32(key, "dofBlurType", 3);
    tree::set_i32(key, "dofQuality", 1);
    tree::set_f32(key, "dofForegroundSize", 0.0);
    tree::set_f32(key, "dofFgBlurSpread", 1.0);
    tree::set_f32(key, "dofFocalPoint", 1.0);
    tree::set_f32(key, "dofSmoothness", 1.0);
    tree::set_f32(key, "BallBlurPowerFactor", 0.0);
    tree::set_f32(key, "BallBlurBrightnessThreshhold", 0.0);
    tree::set_f32(key, "BallBlurBrightnessIntensity", 1.0);
    tree::set_f32(key, "BallBlurSpread", 0.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    /// Fake game tree: meta index (optionally enciphered), master.mdb,
    /// empty dat/ shards
    struct Fixture {
        _dir: tempfile::TempDir,
        game_root: PathBuf,
        work: PathBuf,
    }

    fn build_fixture(meta_rows: &[(&str, &str)], encrypted: bool) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let game_root = dir.path().join("umamusume");
        fs::create_dir_all(game_root.join("dat")).unwrap();
        fs::create_dir_all(game_root.join("master")).unwrap();

        let meta_path = game_root.join("meta");
        {
            let conn = Connection::open(&meta_path).unwrap();
            conn.execute("CREATE TABLE a (n TEXT PRIMARY KEY, h TEXT NOT NULL)", [])
                .unwrap();
            for (n, h) in meta_rows {
                conn.execute("INSERT INTO a (n, h) VALUES (?1, ?2)", [n, h])
                    .unwrap();
            }
        }
        if encrypted {
            let mut data = fs::read(&meta_path).unwrap();
            crypto::crypt_meta(&mut data);
            fs::write(&meta_path, &data).unwrap();
        }

        {
            let conn = Connection::open(game_root.join("master").join("master.mdb")).unwrap();
            conn.execute_batch(
                "CREATE TABLE dress_data (
                    id INTEGER PRIMARY KEY, condition_type INTEGER, have_mini INTEGER,
                    general_purpose INTEGER, costume_type INTEGER, chara_id INTEGER,
                    use_gender INTEGER, body_shape INTEGER, body_type INTEGER,
                    body_type_sub INTEGER, body_setting INTEGER, use_race INTEGER,
                    use_live INTEGER, use_live_theater INTEGER, use_home INTEGER,
                    use_dress_change INTEGER, is_wet INTEGER, is_dirt INTEGER,
                    head_sub_id INTEGER, use_season INTEGER, dress_color_main INTEGER,
                    dress_color_sub INTEGER, color_num INTEGER, disp_order INTEGER,
                    tail_model_id INTEGER, tail_model_sub_id INTEGER,
                    mini_mayu_shader_type INTEGER, start_time TEXT, end_time TEXT
                );
                INSERT INTO dress_data VALUES (
                    100101, 1, 1, 0, 1, 1001, 1, 1, 1, 0, 0, 1, 0, 0, 1, 1,
                    0, 0, 0, 0, 1, 2, 3, 10, 1, 0, 0, '2021-01-01', '2099-12-31'
                );",
            )
            .unwrap();
        }

        let work = dir.path().join("work");
        Fixture {
            _dir: dir,
            game_root,
            work,
        }
    }

    fn swapper(fixture: &Fixture, encrypted: bool) -> Swapper {
        Swapper::new(
            GameDirs::new(&fixture.game_root),
            &fixture.work,
            encrypted,
        )
        .unwrap()
    }

    #[test]
    fn test_open_plain_install() {
        let fixture = build_fixture(&[], false);
        let swapper = swapper(&fixture, false);
        assert!(swapper.backups().is_empty());
    }

    #[test]
    fn test_open_encrypted_install_deciphers_meta() {
        let fixture = build_fixture(
            &[("3d/chara/tail/tail1046_01/pfb_tail1046_01", "ab01")],
            true,
        );
        let swapper = swapper(&fixture, true);

        // Lookups go through the deciphered copy in the work dir
        assert_eq!(swapper.tail_family("1046").unwrap(), Some(1));
        assert!(fixture.work.join("meta").is_file());
    }

    #[test]
    fn test_id_validation_happens_first() {
        let fixture = build_fixture(&[], false);
        let mut swapper = swapper(&fixture, false);

        assert!(matches!(
            swapper.swap_body("1046", "1098_00").unwrap_err(),
            SwapError::Id(IdError::Model(_))
        ));
        assert!(matches!(
            swapper.swap_tail("1046_01", "1098").unwrap_err(),
            SwapError::Id(IdError::Chara(_))
        ));
        assert!(matches!(
            swapper.swap_race_result("1001", "109801").unwrap_err(),
            SwapError::Id(IdError::Dress(_))
        ));
    }

    #[test]
    fn test_tail_family_mismatch_rejected() {
        let fixture = build_fixture(
            &[
                ("3d/chara/tail/tail1046_01/pfb_tail1046_01", "ab01"),
                ("3d/chara/tail/tail1098_02/pfb_tail1098_02", "cd02"),
            ],
            false,
        );
        let mut swapper = swapper(&fixture, false);

        let err = swapper.swap_tail("1046", "1098").unwrap_err();
        assert!(matches!(
            err,
            SwapError::TailFamilyMismatch {
                target: 1,
                donor: 2
            }
        ));
    }

    #[test]
    fn test_tail_missing_rejected() {
        let fixture = build_fixture(&[], false);
        let mut swapper = swapper(&fixture, false);

        assert!(matches!(
            swapper.swap_tail("1046", "1098").unwrap_err(),
            SwapError::TailNotFound(code) if code == "1046"
        ));
    }

    #[test]
    fn test_swap_reports_all_skipped() {
        // No meta rows at all: every path skips, nothing is replaced
        let fixture = build_fixture(&[], false);
        let mut swapper = swapper(&fixture, false);

        let report = swapper.swap_body("1046_01", "1098_00").unwrap();
        assert!(report.replaced.is_empty());
        assert!(!report.skipped.is_empty());
    }

    #[test]
    fn test_unlock_backs_up_master() {
        let fixture = build_fixture(&[], false);
        let mut swapper = swapper(&fixture, false);

        let summary = swapper.unlock_live_dresses().unwrap();
        assert_eq!(summary.cloned, 1);
        assert!(swapper.backups().contains("master.mdb"));

        // Restore brings back the pre-unlock database
        swapper.restore_all().unwrap();
        let conn =
            Connection::open(fixture.game_root.join("master").join("master.mdb")).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM dress_data", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_import_requires_export_tree() {
        let fixture = build_fixture(&[], false);
        let mut swapper = swapper(&fixture, false);

        assert!(matches!(
            swapper.import_textures(TextureGroup::Body, "1046_01").unwrap_err(),
            SwapError::TexturesNotExported(_)
        ));
    }

    #[test]
    fn test_gate_kind_codes() {
        assert_eq!(GateKind::Tazuna.code(), "001");
        assert_eq!(GateKind::Yayoi.code(), "002");
    }

    #[test]
    fn test_split_dress_id() {
        assert_eq!(split_dress_id("100101").unwrap(), (1001, 100101));
    }

    #[test]
    fn test_neutral_dof_key_fields() {
        let mut key = tree::map(vec![("frame", Value::I32(99))]);
        write_neutral_dof_key(&mut key);

        assert_eq!(tree::get_i64(&key, "frame"), Some(0));
        assert_eq!(tree::get_i64(&key, "attribute"), Some(327_680));
        assert_eq!(tree::get_i64(&key, "dofBlurType"), Some(3));
        assert!(tree::get(&key, "curve").is_some());
    }
}
