//! # umr
//!
//! Model swapper library for Uma Musume asset bundles.
//!
//! This library provides functionality to:
//! - Resolve asset paths to hash-named bundle files through the game's
//!   SQLite metadata index
//! - Patch character/dress identifiers inside bundle payloads so one
//!   character's model loads under another's identity
//! - Edit cut-scene MonoBehaviour parameters (gate intro, skill cut-in,
//!   live camera blur) through bundle type trees
//! - Export and re-import character textures as PNG
//! - Keep pre-modification backups and restore them
//!
//! Bundle binary structure (UnityFS container, serialized files, type
//! trees) is handled entirely by `rabex`; see [`bundle`] for the adapter.
//!
//! ## Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use umr::{GameDirs, Swapper};
//!
//! let game = GameDirs::detect().ok_or("game data directory not found")?;
//! let mut swapper = Swapper::new(game, "work".as_ref(), false)?;
//!
//! // Load 1098's body model under 1046_01's slots
//! let report = swapper.swap_body("1046_01", "1098_00")?;
//! println!("{} bundles replaced", report.replaced.len());
//!
//! // Put everything back
//! swapper.restore_all()?;
//! # Ok(())
//! # }
//! ```

pub mod assets;
pub mod backup;
pub mod bundle;
pub mod crypto;
pub mod master;
pub mod meta;
pub mod paths;
pub mod swap;
pub mod texture;

// Re-export commonly used items
#[doc(inline)]
pub use backup::{hash_file, BackupError, BackupStore};
#[doc(inline)]
pub use bundle::{Bundle, BundleError};
#[doc(inline)]
pub use crypto::{crypt_bundle, crypt_meta, derive_bundle_key, CryptoError};
#[doc(inline)]
pub use master::{MasterDb, MasterError, UnlockSummary};
#[doc(inline)]
pub use meta::{MetaDb, MetaError, Resolved};
#[doc(inline)]
pub use paths::GameDirs;
#[doc(inline)]
pub use swap::{
    BlurReport, ExportReport, GateKind, ImportReport, SwapError, SwapReport, Swapper,
    TextureGroup,
};
#[doc(inline)]
pub use texture::{TextureError, TextureFormat};
