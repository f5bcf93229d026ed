// src/services/normalize.rs

//! Canonical form for extracted text.
//!
//! The normalized string is both what subscribers see and what the content
//! checksum is computed from, so cosmetic markup differences must vanish here.

use std::sync::OnceLock;

use regex::Regex;

/// Spaced en-dash as it appears in copy-pasted page content.
const SPACED_EN_DASH: &str = " \u{2013} ";
const SPACED_HYPHEN: &str = " - ";

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\s\p{Zs}]+").expect("static regex"))
}

/// Normalize extracted text.
///
/// Collapses whitespace runs (including Unicode space separators such as
/// NBSP) to one ASCII space, trims both ends and rewrites `" – "` to `" - "`.
pub fn normalize(text: &str) -> String {
    let collapsed = whitespace_run().replace_all(text, " ");
    let mut result = collapsed.trim().to_string();

    // Adjacent dashes share a space, so a single pass can leave a new
    // match behind ("a – – b" -> "a - – b").
    while result.contains(SPACED_EN_DASH) {
        result = result.replace(SPACED_EN_DASH, SPACED_HYPHEN);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(normalize("  Elternabend\n\t 18:00   Uhr "), "Elternabend 18:00 Uhr");
    }

    #[test]
    fn test_unicode_space_separators() {
        assert_eq!(normalize("8:00\u{00A0}Uhr\u{2009}Sport"), "8:00 Uhr Sport");
        assert_eq!(normalize("\u{3000}Fest\u{202F}"), "Fest");
    }

    #[test]
    fn test_en_dash_rewritten() {
        assert_eq!(normalize("08:00 – 12:00 Uhr"), "08:00 - 12:00 Uhr");
        // Only the spaced form is rewritten.
        assert_eq!(normalize("08:00–12:00"), "08:00–12:00");
    }

    #[test]
    fn test_dash_after_whitespace_collapse() {
        assert_eq!(normalize("08:00\n –\u{00A0}12:00"), "08:00 - 12:00");
    }

    #[test]
    fn test_adjacent_dashes() {
        assert_eq!(normalize("a – – b"), "a - - b");
    }

    #[test]
    fn test_empty_and_blank() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \n\u{00A0} "), "");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "",
            "  plain  ",
            "a – – – b",
            "x\u{00A0}–\u{00A0}y",
            " – leading",
            "trailing – ",
            "Sommerfest\r\n\r\n  15:00 – 18:00\tUhr",
            "–\u{2003}–\u{2003}–",
        ];
        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {s:?}");
        }
    }
}
