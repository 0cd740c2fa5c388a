//! Master database handlers

use anyhow::Result;
use umr::Swapper;

use crate::menu::confirm;

pub fn unlock_dresses(swapper: &mut Swapper) -> Result<()> {
    if !confirm("This edits master.mdb (a backup is kept). Continue?")? {
        println!("Cancelled");
        return Ok(());
    }

    let summary = swapper.unlock_live_dresses()?;
    println!(
        "✓ {} dress variant(s) added, {} row(s) unlocked for live stages",
        summary.cloned, summary.unlocked
    );
    Ok(())
}
