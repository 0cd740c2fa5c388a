//! The interactive menu loop.
//!
//! Prints the numbered action list, reads a choice, dispatches to the
//! matching handler, and loops. Handler errors are printed and the menu
//! re-prompts; only choice 99 leaves the loop.

use std::io::{self, Write};

use anyhow::{Context, Result};
use umr::Swapper;

use crate::commands;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    SwapBody,
    SwapHead,
    SwapModel,
    SwapTail,
    GateCharacter,
    SwapCutin,
    SwapRaceResult,
    UnlockDresses,
    ClearLiveBlur,
    BodyTextures,
    HeadTextures,
    RestoreAll,
    Exit,
}

impl Choice {
    /// Map a menu number to its action
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Choice::SwapBody),
            "2" => Some(Choice::SwapHead),
            "3" => Some(Choice::SwapModel),
            "4" => Some(Choice::SwapTail),
            "5" => Some(Choice::GateCharacter),
            "6" => Some(Choice::SwapCutin),
            "7" => Some(Choice::SwapRaceResult),
            "8" => Some(Choice::UnlockDresses),
            "9" => Some(Choice::ClearLiveBlur),
            "10" => Some(Choice::BodyTextures),
            "11" => Some(Choice::HeadTextures),
            "98" => Some(Choice::RestoreAll),
            "99" => Some(Choice::Exit),
            _ => None,
        }
    }
}

fn print_menu() {
    println!();
    println!("=== umr - model swapper ===");
    println!("  1. Swap body model");
    println!("  2. Swap head model");
    println!("  3. Swap full model (head + body)");
    println!("  4. Swap tail model");
    println!("  5. Set gate-intro character");
    println!("  6. Swap skill cut-in");
    println!("  7. Swap victory animation");
    println!("  8. Unlock all live dresses");
    println!("  9. Clear live camera blur");
    println!(" 10. Export / import body textures");
    println!(" 11. Export / import head textures");
    println!(" 98. Restore all modifications");
    println!(" 99. Exit");
}

/// Read one trimmed line from stdin; `None` on end of input
fn read_line() -> Result<Option<String>> {
    let mut input = String::new();
    let bytes = io::stdin()
        .read_line(&mut input)
        .context("Failed to read input")?;

    if bytes == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}

/// Print a prompt and read one trimmed line from stdin
pub fn prompt(label: &str) -> Result<String> {
    print!("{label}: ");
    io::stdout().flush()?;

    read_line()?.context("Input stream closed")
}

/// Yes/no confirmation, defaulting to no
pub fn confirm(label: &str) -> Result<bool> {
    let answer = prompt(&format!("{label} [y/N]"))?;
    Ok(answer.eq_ignore_ascii_case("y"))
}

/// Run the menu loop until the user exits
pub fn run(swapper: &mut Swapper) -> Result<()> {
    loop {
        print_menu();
        print!("Choice: ");
        io::stdout().flush()?;

        // End of input behaves like choice 99
        let Some(input) = read_line()? else {
            return Ok(());
        };

        let Some(choice) = Choice::parse(&input) else {
            if !input.is_empty() {
                eprintln!("Unknown choice: {input}");
            }
            continue;
        };

        if choice == Choice::Exit {
            return Ok(());
        }

        // Per-action failures never abort the loop
        if let Err(e) = dispatch(swapper, choice) {
            eprintln!("✗ {e:#}");
        }
    }
}

fn dispatch(swapper: &mut Swapper, choice: Choice) -> Result<()> {
    match choice {
        Choice::SwapBody => commands::swap::body(swapper),
        Choice::SwapHead => commands::swap::head(swapper),
        Choice::SwapModel => commands::swap::model(swapper),
        Choice::SwapTail => commands::swap::tail(swapper),
        Choice::GateCharacter => commands::scene::gate_character(swapper),
        Choice::SwapCutin => commands::scene::cutin(swapper),
        Choice::SwapRaceResult => commands::swap::race_result(swapper),
        Choice::UnlockDresses => commands::db::unlock_dresses(swapper),
        Choice::ClearLiveBlur => commands::scene::clear_blur(swapper),
        Choice::BodyTextures => commands::texture::body(swapper),
        Choice::HeadTextures => commands::texture::head(swapper),
        Choice::RestoreAll => commands::restore::all(swapper),
        Choice::Exit => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_choices() {
        assert_eq!(Choice::parse("1"), Some(Choice::SwapBody));
        assert_eq!(Choice::parse(" 11 "), Some(Choice::HeadTextures));
        assert_eq!(Choice::parse("98"), Some(Choice::RestoreAll));
        assert_eq!(Choice::parse("99"), Some(Choice::Exit));
    }

    #[test]
    fn test_parse_rejects_everything_else() {
        assert_eq!(Choice::parse("0"), None);
        assert_eq!(Choice::parse("12"), None);
        assert_eq!(Choice::parse("97"), None);
        assert_eq!(Choice::parse("body"), None);
        assert_eq!(Choice::parse(""), None);
    }
}
