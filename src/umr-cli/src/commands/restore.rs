//! Restore-all handler

use anyhow::Result;
use umr::Swapper;

pub fn all(swapper: &mut Swapper) -> Result<()> {
    if swapper.backups().is_empty() {
        println!("Nothing to restore: the backup store is empty");
        return Ok(());
    }

    let restored = swapper.restore_all()?;
    for key in &restored {
        println!("✓ restored {key}");
    }
    println!("✓ {} file(s) restored", restored.len());
    Ok(())
}
