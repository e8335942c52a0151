//! WebVTT caption parsing.
//!
//! yt-dlp delivers captions as .vtt files; the pipeline only needs the plain
//! spoken text. Auto-generated tracks repeat lines across cues, so duplicate
//! lines are dropped.

use regex::Regex;
use std::collections::HashSet;

/// Parse VTT subtitle content to plain text.
pub fn parse_vtt(content: &str) -> String {
    let timestamp_line = Regex::new(r"^\d{2}:\d{2}").expect("Invalid regex");
    let cue_timing_line = Regex::new(r"^[\d\s:\.>-]+$").expect("Invalid regex");
    let inline_tag = Regex::new(r"<[^>]+>").expect("Invalid regex");

    let mut seen = HashSet::new();
    let mut text_lines = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("WEBVTT") {
            continue;
        }
        if line.starts_with("Kind:") || line.starts_with("Language:") {
            continue;
        }
        if timestamp_line.is_match(line) || cue_timing_line.is_match(line) {
            continue;
        }

        let clean = inline_tag.replace_all(line, "");
        let clean = clean.trim();

        if !clean.is_empty() && seen.insert(clean.to_string()) {
            text_lines.push(clean.to_string());
        }
    }

    text_lines.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
WEBVTT
Kind: captions
Language: en

00:00:01.000 --> 00:00:03.000
<c>Hello</c> and welcome

00:00:03.000 --> 00:00:05.000
Hello and welcome

00:00:05.000 --> 00:00:08.000
to this <b>Rust</b> tutorial
";

    #[test]
    fn test_strips_headers_and_timestamps() {
        let text = parse_vtt(SAMPLE);
        assert!(!text.contains("WEBVTT"));
        assert!(!text.contains("00:00"));
        assert!(!text.contains("Kind:"));
    }

    #[test]
    fn test_removes_tags_and_duplicates() {
        let text = parse_vtt(SAMPLE);
        assert_eq!(text, "Hello and welcome to this Rust tutorial");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse_vtt(""), "");
        assert_eq!(parse_vtt("WEBVTT\n\n"), "");
    }
}
