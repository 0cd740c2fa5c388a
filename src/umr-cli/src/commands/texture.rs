//! Texture export/import handlers.
//!
//! Both menu items are two-phase: the first visit decodes the character's
//! textures to PNG for editing; once an export tree exists, the next
//! visit offers to import the edited files back into the bundles.

use anyhow::Result;
use umr::{Swapper, TextureGroup};

use crate::menu::prompt;

pub fn body(swapper: &mut Swapper) -> Result<()> {
    handle(swapper, TextureGroup::Body)
}

pub fn head(swapper: &mut Swapper) -> Result<()> {
    handle(swapper, TextureGroup::Head)
}

fn handle(swapper: &mut Swapper, group: TextureGroup) -> Result<()> {
    let id = prompt("Model id (e.g. 1046_01)")?;

    let dir = swapper.texture_dir(group, &id);
    if !dir.is_dir() {
        return export(swapper, group, &id, false);
    }

    println!("Export tree already exists: {}", dir.display());
    match prompt("[i]mport edited PNGs, [e]xport fresh copies, or cancel")?.as_str() {
        "i" | "I" => import(swapper, group, &id),
        "e" | "E" => export(swapper, group, &id, true),
        _ => {
            println!("Cancelled");
            Ok(())
        }
    }
}

fn export(swapper: &mut Swapper, group: TextureGroup, id: &str, force: bool) -> Result<()> {
    let report = swapper.export_textures(group, id, force)?;

    for name in &report.exported {
        println!("✓ exported {name}.png");
    }
    for name in &report.skipped {
        println!("⚠ {name}: format not decodable, skipped");
    }

    if report.exported.is_empty() {
        println!("✗ No textures found for {id}");
    } else {
        println!(
            "✓ {} texture(s) written to {}",
            report.exported.len(),
            report.dir.display()
        );
        println!("Edit the PNGs (keep their dimensions), then pick this option again to import");
    }
    Ok(())
}

fn import(swapper: &mut Swapper, group: TextureGroup, id: &str) -> Result<()> {
    let report = swapper.import_textures(group, id)?;

    for name in &report.updated {
        println!("✓ updated {name}");
    }

    if report.updated.is_empty() {
        println!("✗ No matching PNGs found to import");
    } else {
        println!(
            "✓ {} texture(s) imported across {} bundle(s)",
            report.updated.len(),
            report.bundles_written
        );
    }
    Ok(())
}
