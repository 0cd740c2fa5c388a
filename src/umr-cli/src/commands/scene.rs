//! Cut-scene edit handlers (gate intro, skill cut-in, live blur)

use anyhow::{bail, Result};
use umr::{GateKind, Swapper};

use crate::menu::prompt;

pub fn gate_character(swapper: &mut Swapper) -> Result<()> {
    let dress = prompt("Dress id to appear at the gate (e.g. 100101)")?;
    let kind = match prompt("Which attendant to replace, 1=Tazuna 2=Yayoi")?.as_str() {
        "1" | "" => GateKind::Tazuna,
        "2" => GateKind::Yayoi,
        other => bail!("Unknown attendant: {other}"),
    };

    swapper.set_gate_character(&dress, kind)?;
    println!("✓ Gate intro now uses dress {dress}");
    Ok(())
}

pub fn cutin(swapper: &mut Swapper) -> Result<()> {
    let target = prompt("Target dress id (whose cut-in slot, e.g. 100101)")?;
    let donor = prompt("Donor dress id (whose appearance, e.g. 109801)")?;

    swapper.swap_cutin(&target, &donor)?;
    println!("✓ Skill cut-in of {target} now shows {donor}");
    Ok(())
}

pub fn clear_blur(swapper: &mut Swapper) -> Result<()> {
    let song = prompt("Song id (empty = all songs, e.g. 1001)")?;
    let song = if song.is_empty() { None } else { Some(song.as_str()) };

    let report = swapper.clear_live_blur(song)?;

    for path in &report.cleared {
        println!("✓ cleared {path}");
    }
    for (path, reason) in &report.failed {
        println!("⚠ {path}: {reason}");
    }

    if report.cleared.is_empty() && report.failed.is_empty() {
        println!("✗ No camera bundles matched");
    } else {
        println!("✓ {} camera(s) cleared", report.cleared.len());
    }
    Ok(())
}
