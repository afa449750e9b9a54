//! Ayu color theme and styling functions for qdmr CLI output.
//!
//! Uses the Ayu Dark color palette. Only things that need attention get a
//! strong color: unresolved references are red, a stale preview is yellow.
//! Step numbers and back-references use the accent colors.

use owo_colors::OwoColorize;
use qdmr_core::resolver::INVALID_REFERENCE;
use qdmr_core::step::{Step, StepId};
use qdmr_core::store::{PreviewLine, PreviewState};
use qdmr_core::token::Token;

use crate::terminal::supports_color;

// ---------------------------------------------------------------------------
// Ayu Dark color palette (RGB values)
// ---------------------------------------------------------------------------

const PASS: (u8, u8, u8) = (0xc2, 0xd9, 0x4c); // #c2d94c - bright green
const WARN: (u8, u8, u8) = (0xff, 0xb4, 0x54); // #ffb454 - bright yellow
const FAIL: (u8, u8, u8) = (0xf0, 0x71, 0x78); // #f07178 - bright red
const MUTED: (u8, u8, u8) = (0x6c, 0x76, 0x80); // #6c7680 - muted gray
const ACCENT: (u8, u8, u8) = (0x59, 0xc2, 0xff); // #59c2ff - bright blue
const REFERENCE: (u8, u8, u8) = (0xd2, 0xa6, 0xff); // #d2a6ff - purple

// ---------------------------------------------------------------------------
// Icons
// ---------------------------------------------------------------------------

pub const ICON_PASS: &str = "\u{2713}"; // ✓
pub const ICON_WARN: &str = "\u{26A0}"; // ⚠
pub const ICON_FAIL: &str = "\u{2716}"; // ✖

/// Placeholder shown for a step that has no content yet.
pub const EMPTY_STEP: &str = "(empty)";

pub const SEPARATOR_LIGHT: &str = "\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}";

// ---------------------------------------------------------------------------
// Helper: apply truecolor only when color is supported
// ---------------------------------------------------------------------------

fn color_str(s: &str, rgb: (u8, u8, u8)) -> String {
    if supports_color() {
        s.truecolor(rgb.0, rgb.1, rgb.2).to_string()
    } else {
        s.to_string()
    }
}

fn color_bold_str(s: &str, rgb: (u8, u8, u8)) -> String {
    if supports_color() {
        s.truecolor(rgb.0, rgb.1, rgb.2).bold().to_string()
    } else {
        s.to_string()
    }
}

// ---------------------------------------------------------------------------
// Core semantic render helpers
// ---------------------------------------------------------------------------

/// Renders text with pass (green) styling.
pub fn render_pass(s: &str) -> String {
    color_str(s, PASS)
}

/// Renders text with warning (yellow) styling.
pub fn render_warn(s: &str) -> String {
    color_str(s, WARN)
}

/// Renders text with fail (red) styling.
pub fn render_fail(s: &str) -> String {
    color_str(s, FAIL)
}

/// Renders text with muted (gray) styling.
pub fn render_muted(s: &str) -> String {
    color_str(s, MUTED)
}

/// Renders text in bold.
pub fn render_bold(s: &str) -> String {
    if supports_color() {
        s.bold().to_string()
    } else {
        s.to_string()
    }
}

/// Renders a section header in uppercase with accent color and bold.
pub fn render_category(s: &str) -> String {
    color_bold_str(&s.to_uppercase(), ACCENT)
}

pub fn render_separator() -> String {
    render_muted(SEPARATOR_LIGHT)
}

pub fn render_pass_icon() -> String {
    color_str(ICON_PASS, PASS)
}

pub fn render_warn_icon() -> String {
    color_str(ICON_WARN, WARN)
}

pub fn render_fail_icon() -> String {
    color_str(ICON_FAIL, FAIL)
}

// ---------------------------------------------------------------------------
// Decomposition rendering
// ---------------------------------------------------------------------------

/// Renders a step number as `n.` in bold accent.
pub fn render_step_number(id: StepId) -> String {
    color_bold_str(&format!("{id}."), ACCENT)
}

/// Renders one token; back-references are purple, literals plain.
pub fn render_token(token: &Token) -> String {
    match token {
        Token::StepReference { label, .. } => color_str(label, REFERENCE),
        Token::Literal(text) => text.clone(),
    }
}

/// Renders the raw tokens of a step, or a muted placeholder when it is empty.
pub fn render_step_tokens(step: &Step) -> String {
    match step.tokens() {
        Some(tokens) if !tokens.is_empty() => tokens
            .iter()
            .map(render_token)
            .collect::<Vec<_>>()
            .join(" "),
        _ => render_muted(EMPTY_STEP),
    }
}

/// Renders a display string, highlighting every unresolved reference in red.
pub fn render_display(display: &str) -> String {
    if !display.contains(INVALID_REFERENCE) {
        return display.to_string();
    }
    display
        .split(INVALID_REFERENCE)
        .collect::<Vec<_>>()
        .join(&render_fail(INVALID_REFERENCE))
}

/// Renders one preview line as `n. <display>`.
pub fn render_preview_line(line: &PreviewLine) -> String {
    let body = match line.display.as_deref() {
        Some(display) => render_display(display),
        None => render_muted(EMPTY_STEP),
    };
    format!("{} {}", render_step_number(line.id), body)
}

/// Renders the preview state: green when current, yellow while editing.
pub fn render_preview_state(state: PreviewState) -> String {
    match state {
        PreviewState::Previewed => render_pass("previewed"),
        PreviewState::Editing => render_warn("editing"),
    }
}

/// Shortens `s` to at most `max` characters, ending in `...` when cut.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = s.chars().take(keep).collect();
    out.push_str("...");
    out
}
