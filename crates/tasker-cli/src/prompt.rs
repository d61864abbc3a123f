//! Interactive prompts
//!
//! Used only in human output mode; JSON and quiet runs never block on stdin.

use anyhow::Result;
use std::io::{self, BufRead, Write};

/// Prompt for confirmation
///
/// Returns true if user confirms, false otherwise.
/// In non-interactive mode (no TTY), returns false.
pub fn confirm(prompt: &str) -> Result<bool> {
    // Check if stdin is a TTY
    if !atty::is(atty::Stream::Stdin) {
        return Ok(false);
    }

    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let answer = read_answer(&mut io::stdin().lock())?;
    Ok(is_yes(&answer))
}

/// Prompt with a default value, returns None if user keeps default
///
/// Entering a single `-` returns `Some("")`, which clears optional fields.
pub fn prompt_with_default(prompt: &str, default: &str) -> Result<Option<String>> {
    if default.is_empty() {
        print!("{}: ", prompt);
    } else {
        print!("{} [{}]: ", prompt, default);
    }
    io::stdout().flush()?;

    let answer = read_answer(&mut io::stdin().lock())?;
    Ok(interpret_edit_answer(&answer))
}

fn read_answer(reader: &mut impl BufRead) -> Result<String> {
    let mut input = String::new();
    reader.read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn is_yes(answer: &str) -> bool {
    let answer = answer.to_lowercase();
    answer == "y" || answer == "yes"
}

fn interpret_edit_answer(answer: &str) -> Option<String> {
    match answer {
        "" => None,
        "-" => Some(String::new()),
        other => Some(other.to_string()),
    }
}
