//! Asset bundle access.
//!
//! All UnityFS binary structure (container blocks, serialized files, type
//! trees) is owned by `rabex`; this module confines its surface to the
//! three operations the swap engine needs: raw identifier patching,
//! MonoBehaviour type-tree edits, and Texture2D payload access. Everything
//! else in the crate works on [`Bundle`] and plain bytes.

use std::io::Cursor;

use memchr::memmem;
use rabex::files::bundlefile::{BundleFile, CompressionType, ExtractionConfig};
use rabex::files::SerializedFile;
use rabex::objects::ClassId;
use rabex::serde_typetree;
use serde_value::Value;
use thiserror::Error;

pub mod tree;

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bundle parse error: {0}")]
    Parse(#[from] rabex::Error),

    #[error("bundle has no serialized file entry")]
    NoSerializedFile,

    #[error("replacement length mismatch: {old} vs {new} bytes")]
    LengthMismatch { old: usize, new: usize },

    #[error("object {path_id} has no type tree")]
    NoTypeTree { path_id: i64 },

    #[error("texture object {path_id} is malformed: {reason}")]
    BadTexture { path_id: i64, reason: &'static str },

    #[error("resource file {0} not present in bundle")]
    ResourceMissing(String),
}

/// A texture slot found inside a bundle
#[derive(Debug, Clone)]
pub struct TextureInfo {
    pub path_id: i64,
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Raw `TextureFormat` id as serialized
    pub format: i32,
    /// Payload bytes, already pulled from the resource file if streamed
    pub data: Vec<u8>,
}

/// An asset bundle held fully in memory.
///
/// The container is unpacked on open; entries are plain `(name, bytes)`
/// pairs. The serialized-file entry is only parsed when an operation
/// actually needs object structure.
pub struct Bundle {
    entries: Vec<(String, Vec<u8>)>,
    main: usize,
}

impl Bundle {
    /// Parse a bundle from its (deciphered) file bytes
    pub fn from_bytes(raw: &[u8]) -> Result<Self, BundleError> {
        let mut reader = Cursor::new(raw);
        let archive = BundleFile::from_reader(&mut reader, &ExtractionConfig::default())?;

        let mut entries = Vec::new();
        for info in archive.files() {
            let data = archive.read_file(&mut reader, &info.path)?;
            entries.push((info.path.clone(), data));
        }

        let main = entries
            .iter()
            .position(|(name, _)| !is_resource_name(name))
            .ok_or(BundleError::NoSerializedFile)?;

        Ok(Bundle { entries, main })
    }

    /// Repack the container
    pub fn to_bytes(&self) -> Result<Vec<u8>, BundleError> {
        let mut out = Vec::new();
        BundleFile::write(&mut out, &self.entries, CompressionType::Lz4hc)?;
        Ok(out)
    }

    /// Replace every occurrence of `old` with `new` across all entry
    /// payloads. Both byte strings must have equal length so serialized
    /// offsets stay valid; returns the number of replacements made.
    pub fn patch_bytes(&mut self, old: &[u8], new: &[u8]) -> Result<usize, BundleError> {
        if old.len() != new.len() {
            return Err(BundleError::LengthMismatch {
                old: old.len(),
                new: new.len(),
            });
        }

        let mut total = 0;
        for (_, data) in &mut self.entries {
            total += patch_slice(data, old, new);
        }
        Ok(total)
    }

    /// Visit every MonoBehaviour that carries a type tree, read-only.
    ///
    /// The callback receives the object's `m_Name` and its value graph.
    pub fn visit_behaviours<F>(&self, mut visit: F) -> Result<(), BundleError>
    where
        F: FnMut(&str, &Value) -> Result<(), BundleError>,
    {
        let data = &self.entries[self.main].1;
        let mut cursor = Cursor::new(&data[..]);
        let serialized = SerializedFile::from_reader(&mut cursor)?;

        for obj in serialized.objects() {
            if obj.class_id() != ClassId::MonoBehaviour {
                continue;
            }
            let Some(tt) = serialized.typetree_of(obj)? else {
                continue;
            };
            let value: Value = serde_typetree::from_slice(serialized.object_data(obj, data), &tt)?;
            let name = tree::get_str(&value, "m_Name").unwrap_or_default().to_string();
            visit(&name, &value)?;
        }

        Ok(())
    }

    /// Edit MonoBehaviours in place.
    ///
    /// The callback returns `true` when it changed the value graph; edited
    /// objects are reserialized through their type tree and the serialized
    /// file is rebuilt. Returns the number of objects rewritten.
    pub fn edit_behaviours<F>(&mut self, mut edit: F) -> Result<usize, BundleError>
    where
        F: FnMut(&str, &mut Value) -> Result<bool, BundleError>,
    {
        self.edit_objects(ClassId::MonoBehaviour, |value| {
            let name = tree::get_str(value, "m_Name").unwrap_or_default().to_string();
            edit(&name, value)
        })
    }

    /// Every Texture2D slot in the bundle, with payload bytes resolved
    /// from the resource entry when streamed
    pub fn textures(&self) -> Result<Vec<TextureInfo>, BundleError> {
        let data = &self.entries[self.main].1;
        let mut cursor = Cursor::new(&data[..]);
        let serialized = SerializedFile::from_reader(&mut cursor)?;

        let mut found = Vec::new();
        for obj in serialized.objects() {
            if obj.class_id() != ClassId::Texture2D {
                continue;
            }
            let path_id = obj.path_id();
            let Some(tt) = serialized.typetree_of(obj)? else {
                continue;
            };
            let value: Value = serde_typetree::from_slice(serialized.object_data(obj, data), &tt)?;
            found.push(self.texture_from_value(path_id, &value)?);
        }

        Ok(found)
    }

    /// Overwrite one texture slot with plain RGBA32 pixels.
    ///
    /// Dimensions must match the existing slot; the payload is inlined
    /// (any stream-data reference is cleared) and the mip chain collapses
    /// to the single provided level.
    pub fn replace_texture(
        &mut self,
        path_id: i64,
        rgba: &[u8],
        width: u32,
        height: u32,
    ) -> Result<(), BundleError> {
        let data = self.entries[self.main].1.clone();
        let mut cursor = Cursor::new(&data[..]);
        let mut serialized = SerializedFile::from_reader(&mut cursor)?;

        let mut rebuilt: Option<Vec<u8>> = None;
        for obj in serialized.objects() {
            if obj.class_id() != ClassId::Texture2D || obj.path_id() != path_id {
                continue;
            }
            let tt = serialized
                .typetree_of(obj)?
                .ok_or(BundleError::NoTypeTree { path_id })?;
            let mut value: Value =
                serde_typetree::from_slice(serialized.object_data(obj, &data), &tt)?;

            let slot_w = tree::get_i64(&value, "m_Width").unwrap_or(0) as u32;
            let slot_h = tree::get_i64(&value, "m_Height").unwrap_or(0) as u32;
            if (slot_w, slot_h) != (width, height) {
                return Err(BundleError::BadTexture {
                    path_id,
                    reason: "dimensions do not match the existing slot",
                });
            }

            tree::set_i32(&mut value, "m_TextureFormat", crate::texture::FORMAT_RGBA32);
            tree::set_i32(&mut value, "m_MipCount", 1);
            tree::set_i32(&mut value, "m_CompleteImageSize", rgba.len() as i32);
            tree::set_bytes(&mut value, "image data", rgba.to_vec());
            if let Some(stream) = tree::get_mut(&mut value, "m_StreamData") {
                tree::set_i64(stream, "offset", 0);
                tree::set_i32(stream, "size", 0);
                tree::set_str(stream, "path", "");
            }

            rebuilt = Some(serde_typetree::to_vec(&value, &tt)?);
            break;
        }

        if let Some(bytes) = rebuilt {
            serialized.set_object_data(path_id, bytes)?;
        } else {
            return Err(BundleError::BadTexture {
                path_id,
                reason: "no Texture2D with this path id",
            });
        }

        self.entries[self.main].1 = serialized.to_bytes()?;
        Ok(())
    }

    fn edit_objects<F>(&mut self, class: ClassId, mut edit: F) -> Result<usize, BundleError>
    where
        F: FnMut(&mut Value) -> Result<bool, BundleError>,
    {
        let data = self.entries[self.main].1.clone();
        let mut cursor = Cursor::new(&data[..]);
        let mut serialized = SerializedFile::from_reader(&mut cursor)?;

        let mut edited = 0;
        let mut replacements = Vec::new();
        for obj in serialized.objects() {
            if obj.class_id() != class {
                continue;
            }
            let Some(tt) = serialized.typetree_of(obj)? else {
                continue;
            };
            let mut value: Value =
                serde_typetree::from_slice(serialized.object_data(obj, &data), &tt)?;
            if edit(&mut value)? {
                replacements.push((obj.path_id(), serde_typetree::to_vec(&value, &tt)?));
            }
        }

        for (path_id, bytes) in replacements {
            serialized.set_object_data(path_id, bytes)?;
            edited += 1;
        }

        if edited > 0 {
            self.entries[self.main].1 = serialized.to_bytes()?;
        }
        Ok(edited)
    }

    fn texture_from_value(&self, path_id: i64, value: &Value) -> Result<TextureInfo, BundleError> {
        let name = tree::get_str(value, "m_Name")
            .unwrap_or_default()
            .to_string();
        let width = tree::get_i64(value, "m_Width").unwrap_or(0) as u32;
        let height = tree::get_i64(value, "m_Height").unwrap_or(0) as u32;
        let format = tree::get_i64(value, "m_TextureFormat").unwrap_or(0) as i32;

        let inline = tree::get(value, "image data")
            .and_then(tree::as_bytes)
            .unwrap_or_default();

        let data = if inline.is_empty() {
            let stream = tree::get(value, "m_StreamData").ok_or(BundleError::BadTexture {
                path_id,
                reason: "neither inline data nor stream data present",
            })?;
            let offset = tree::get_i64(stream, "offset").unwrap_or(0) as usize;
            let size = tree::get_i64(stream, "size").unwrap_or(0) as usize;
            let res_path = tree::get_str(stream, "path").unwrap_or_default();
            self.resource_slice(res_path, offset, size, path_id)?
        } else {
            inline
        };

        Ok(TextureInfo {
            path_id,
            name,
            width,
            height,
            format,
            data,
        })
    }

    fn resource_slice(
        &self,
        res_path: &str,
        offset: usize,
        size: usize,
        path_id: i64,
    ) -> Result<Vec<u8>, BundleError> {
        // Stream paths look like "archive:/CAB-xxxx/CAB-xxxx.resS"
        let file_name = res_path.rsplit('/').next().unwrap_or(res_path);
        let entry = self
            .entries
            .iter()
            .find(|(name, _)| name == file_name || name.ends_with(file_name))
            .ok_or_else(|| BundleError::ResourceMissing(file_name.to_string()))?;

        let end = offset.checked_add(size).filter(|&end| end <= entry.1.len());
        let Some(end) = end else {
            return Err(BundleError::BadTexture {
                path_id,
                reason: "stream data range exceeds resource file",
            });
        };
        Ok(entry.1[offset..end].to_vec())
    }
}

fn is_resource_name(name: &str) -> bool {
    name.ends_with(".resS") || name.ends_with(".resource")
}

/// Replace every occurrence of `old` with `new` in `buf`, in place.
///
/// Caller guarantees equal lengths; returns the occurrence count.
pub(crate) fn patch_slice(buf: &mut [u8], old: &[u8], new: &[u8]) -> usize {
    debug_assert_eq!(old.len(), new.len());

    let positions: Vec<usize> = memmem::find_iter(buf, old).collect();
    for &pos in &positions {
        buf[pos..pos + new.len()].copy_from_slice(new);
    }
    positions.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_slice_replaces_all() {
        let mut buf = b"tex_bdy1046_01 and pfb_bdy1046_01".to_vec();
        let count = patch_slice(&mut buf, b"1046_01", b"1098_00");
        assert_eq!(count, 2);
        assert_eq!(&buf, b"tex_bdy1098_00 and pfb_bdy1098_00");
    }

    #[test]
    fn test_patch_slice_no_match() {
        let mut buf = b"nothing here".to_vec();
        assert_eq!(patch_slice(&mut buf, b"1046_01", b"1098_00"), 0);
        assert_eq!(&buf, b"nothing here");
    }

    #[test]
    fn test_patch_slice_adjacent_matches() {
        let mut buf = b"abab".to_vec();
        assert_eq!(patch_slice(&mut buf, b"ab", b"cd"), 2);
        assert_eq!(&buf, b"cdcd");
    }

    #[test]
    fn test_resource_name_detection() {
        assert!(is_resource_name("CAB-0011.resS"));
        assert!(is_resource_name("CAB-0011.resource"));
        assert!(!is_resource_name("CAB-0011"));
    }
}
