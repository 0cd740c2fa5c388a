//! Asset path tables.
//!
//! The metadata index is keyed by full asset paths; each swap works over a
//! fixed group of paths derived from a character or dress identifier.
//! The formats in play:
//!
//! - model id `XXXX_YY` (character code + dress sub-id), e.g. `1046_01`
//! - character code `XXXX`, e.g. `1046` (tails)
//! - dress id `XXXXYY` (six digits), e.g. `100101` (cut-scenes)

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdError {
    #[error("{0:?} is not a model id (expected XXXX_YY, e.g. 1046_01)")]
    Model(String),

    #[error("{0:?} is not a character code (expected XXXX, e.g. 1046)")]
    Chara(String),

    #[error("{0:?} is not a dress id (expected six digits, e.g. 100101)")]
    Dress(String),
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Validate a model id (`XXXX_YY`)
pub fn check_model_id(id: &str) -> Result<(), IdError> {
    let valid = matches!(id.split_once('_'), Some((code, sub))
        if code.len() == 4 && sub.len() == 2 && all_digits(code) && all_digits(sub));
    if valid {
        Ok(())
    } else {
        Err(IdError::Model(id.to_string()))
    }
}

/// Validate a character code (`XXXX`)
pub fn check_chara_code(id: &str) -> Result<(), IdError> {
    if id.len() == 4 && all_digits(id) {
        Ok(())
    } else {
        Err(IdError::Chara(id.to_string()))
    }
}

/// Validate a dress id (`XXXXYY`)
pub fn check_dress_id(id: &str) -> Result<(), IdError> {
    if id.len() == 6 && all_digits(id) {
        Ok(())
    } else {
        Err(IdError::Dress(id.to_string()))
    }
}

/// Bundle group for a character's body model
pub fn body_paths(id: &str) -> Vec<String> {
    vec![
        format!("3d/chara/body/bdy{id}/pfb_bdy{id}"),
        format!("3d/chara/body/bdy{id}/textures/tex_bdy{id}_diff"),
        format!("3d/chara/body/bdy{id}/textures/tex_bdy{id}_shad_c"),
        format!("3d/chara/body/bdy{id}/textures/tex_bdy{id}_base"),
        format!("3d/chara/body/bdy{id}/textures/tex_bdy{id}_ctrl"),
    ]
}

/// Bundle group for a character's head model
pub fn head_paths(id: &str) -> Vec<String> {
    vec![
        format!("3d/chara/head/chr{id}/pfb_chr{id}"),
        format!("3d/chara/head/chr{id}/textures/tex_chr{id}_face_diff"),
        format!("3d/chara/head/chr{id}/textures/tex_chr{id}_cheek0"),
        format!("3d/chara/head/chr{id}/textures/tex_chr{id}_cheek1"),
        format!("3d/chara/head/chr{id}/textures/tex_chr{id}_eye0"),
    ]
}

/// Bundle group for a tail model in one of the two rig families.
///
/// `family` is 1 or 2; characters ship their tail under exactly one.
pub fn tail_paths(code: &str, family: u8) -> Vec<String> {
    vec![
        format!("3d/chara/tail/tail{code}_0{family}/pfb_tail{code}_0{family}"),
        format!("3d/chara/tail/tail{code}_0{family}/textures/tex_tail{code}_0{family}_diff"),
        format!("3d/chara/tail/tail{code}_0{family}/textures/tex_tail{code}_0{family}_shad_c"),
    ]
}

/// Cut-scene bundle for the home-screen gate intro.
///
/// `kind` selects which of the two gate attendants is replaced
/// (`001` or `002`).
pub fn gate_intro_path(kind: &str) -> String {
    format!("cutt/cutt_gac_chr_start_{kind}/gac_chr_start_{kind}")
}

/// Cut-scene bundle for a dress's skill cut-in
pub fn cutin_skill_path(dress_id: &str) -> String {
    format!("cutt/cutt_crd{dress_id}/crd{dress_id}")
}

/// Bundle group for a dress's race-result (victory) animation
pub fn race_result_paths(dress_id: &str) -> Vec<String> {
    vec![
        format!("cutt/cutt_crd_result_{dress_id}/crd_result_{dress_id}"),
        format!("3d/motion/race/result/chara/chr{dress_id}/anm_res_chr{dress_id}"),
    ]
}

/// Texture bundle holding a body's material textures
pub fn body_texture_bundle(id: &str) -> String {
    format!("3d/chara/body/bdy{id}/textures/tex_bdy{id}_diff")
}

/// Texture bundles holding a head's material textures
pub fn head_texture_bundles(id: &str) -> Vec<String> {
    vec![
        format!("3d/chara/head/chr{id}/textures/tex_chr{id}_face_diff"),
        format!("3d/chara/head/chr{id}/textures/tex_chr{id}_cheek0"),
        format!("3d/chara/head/chr{id}/textures/tex_chr{id}_eye0"),
    ]
}

/// Live-stage camera bundle for one song
pub fn camera_path(song_id: &str) -> String {
    format!("cutt/cutt_son{song_id}/son{song_id}_camera")
}

/// Character code part of a model or dress id (`1046_01` -> `1046`,
/// `104601` -> `1046`)
pub fn chara_code(id: &str) -> &str {
    &id[..id.len().min(4)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_validation() {
        assert!(check_model_id("1046_01").is_ok());
        assert!(check_model_id("1046").is_err());
        assert!(check_model_id("104_601").is_err());
        assert!(check_model_id("abcd_ef").is_err());

        assert!(check_chara_code("1046").is_ok());
        assert!(check_chara_code("1046_01").is_err());

        assert!(check_dress_id("100101").is_ok());
        assert!(check_dress_id("1001").is_err());
    }

    #[test]
    fn test_body_paths_use_id() {
        let paths = body_paths("1046_01");
        assert_eq!(paths[0], "3d/chara/body/bdy1046_01/pfb_bdy1046_01");
        assert!(paths.iter().all(|p| p.contains("1046_01")));
    }

    #[test]
    fn test_group_sizes_match_for_swaps() {
        // Swap pairs path lists elementwise; both sides must line up
        assert_eq!(body_paths("1046_01").len(), body_paths("1098_00").len());
        assert_eq!(head_paths("1046_01").len(), head_paths("1098_00").len());
        assert_eq!(tail_paths("1046", 1).len(), tail_paths("1098", 2).len());
        assert_eq!(
            race_result_paths("100101").len(),
            race_result_paths("109801").len()
        );
    }

    #[test]
    fn test_cutscene_paths() {
        assert_eq!(
            gate_intro_path("001"),
            "cutt/cutt_gac_chr_start_001/gac_chr_start_001"
        );
        assert_eq!(cutin_skill_path("100101"), "cutt/cutt_crd100101/crd100101");
        assert_eq!(camera_path("1001"), "cutt/cutt_son1001/son1001_camera");
    }

    #[test]
    fn test_chara_code() {
        assert_eq!(chara_code("1046_01"), "1046");
        assert_eq!(chara_code("100101"), "1001");
        assert_eq!(chara_code("10"), "10");
    }
}
