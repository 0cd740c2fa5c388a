//! Identifier swap handlers (body, head, full model, tail, victory
//! animation)

use anyhow::Result;
use umr::Swapper;

use super::print_report;
use crate::menu::prompt;

pub fn body(swapper: &mut Swapper) -> Result<()> {
    let target = prompt("Target model id (e.g. 1046_01)")?;
    let donor = prompt("Donor model id (e.g. 1098_00)")?;

    let report = swapper.swap_body(&target, &donor)?;
    print_report(&report);
    Ok(())
}

pub fn head(swapper: &mut Swapper) -> Result<()> {
    let target = prompt("Target model id (e.g. 1046_01)")?;
    let donor = prompt("Donor model id (e.g. 1098_00)")?;

    let report = swapper.swap_head(&target, &donor)?;
    print_report(&report);
    Ok(())
}

pub fn model(swapper: &mut Swapper) -> Result<()> {
    let target = prompt("Target model id (e.g. 1046_01)")?;
    let donor = prompt("Donor model id (e.g. 1098_00)")?;

    let report = swapper.swap_model(&target, &donor)?;
    print_report(&report);
    Ok(())
}

pub fn tail(swapper: &mut Swapper) -> Result<()> {
    let target = prompt("Target character code (e.g. 1046)")?;
    let donor = prompt("Donor character code (e.g. 1098)")?;

    let report = swapper.swap_tail(&target, &donor)?;
    print_report(&report);

    if !report.replaced.is_empty() {
        println!("⚠ Note: target and donor cannot appear in the same race after a tail swap");
    }
    Ok(())
}

pub fn race_result(swapper: &mut Swapper) -> Result<()> {
    let target = prompt("Target dress id (e.g. 100101)")?;
    let donor = prompt("Donor dress id (e.g. 109801)")?;

    let report = swapper.swap_race_result(&target, &donor)?;
    print_report(&report);
    Ok(())
}
