// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal color support shared by help text and table rendering.

use clap::builder::styling::{Ansi256Color, Color, Style, Styles};
use std::io::IsTerminal;

pub mod codes {
    /// Section headers and column headers: pastel cyan / steel blue.
    pub const HEADER: u8 = 74;
    /// Commands and literal values: light grey.
    pub const LITERAL: u8 = 250;
    /// Descriptions and context: medium grey.
    pub const CONTEXT: u8 = 245;
    /// Muted / secondary text: darker grey.
    pub const MUTED: u8 = 240;
}

const RESET: &str = "\x1b[0m";

fn fg256(code: u8) -> String {
    format!("\x1b[38;5;{code}m")
}

/// Determine if color output should be enabled.
///
/// Priority: `NO_COLOR=1` disables, `COLOR=1` forces, otherwise a TTY check.
pub fn should_colorize() -> bool {
    if std::env::var("NO_COLOR").is_ok_and(|v| v == "1") {
        return false;
    }
    if std::env::var("COLOR").is_ok_and(|v| v == "1") {
        return true;
    }
    std::io::stdout().is_terminal()
}

/// Build clap `Styles` using the same palette as table/help rendering.
pub fn styles() -> Styles {
    if !should_colorize() {
        return Styles::plain();
    }
    Styles::styled()
        .usage(Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(codes::HEADER)))))
        .header(Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(codes::HEADER)))))
        .literal(Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(codes::LITERAL)))))
        .placeholder(Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(codes::CONTEXT)))))
}

/// Unconditionally wrap `text` in the header color.
pub fn apply_header(text: &str) -> String {
    format!("{}{text}{}", fg256(codes::HEADER), RESET)
}

/// Unconditionally wrap `text` in the muted color.
pub fn apply_muted(text: &str) -> String {
    format!("{}{text}{}", fg256(codes::MUTED), RESET)
}

/// Colorize a phase/status word: green for healthy, yellow for
/// in-progress, red for terminal-bad. Unrecognized words pass through.
pub fn apply_status(text: &str) -> String {
    let lower = text.trim().to_lowercase();
    let code = match lower.as_str() {
        "normal" | "active" | "true" => "\x1b[32m",
        "warning" | "grace" => "\x1b[33m",
        "terminating" | "terminated" | "false" => "\x1b[31m",
        _ => return text.to_string(),
    };
    format!("{code}{text}{RESET}")
}

#[cfg(test)]
#[path = "color_tests.rs"]
mod tests;
