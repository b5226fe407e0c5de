//! # Bracket Parsing
//!
//! Splits paragraph text around optional clauses.
//!
//! An inline clause looks like this:
//!
//! ```text
//! The tenant [Optional(pets):Pets clause:] [may keep [small] pets ]in the unit.
//! ^^^^^^^^^^ ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^ ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^
//!  before            marker prefix            bracketed body          after
//! ```
//!
//! The body is found by balanced bracket matching, so nested bracketed
//! sub-clauses never end the match early. Both entry points are pure and never
//! fail: text without a (terminated) clause simply yields no match.

use std::sync::OnceLock;

use regex::Regex;

const MARKER_PATTERN: &str = r"\[Optional\(([^\]]+?)\):[^\]]*:\]\s*\[";

fn marker_regex() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| Regex::new(MARKER_PATTERN).expect("marker pattern is a valid regex"))
}

/// An inline optional clause located inside paragraph text.
///
/// All offsets are byte offsets into the parsed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineMatch<'a> {
    /// Text preceding the marker prefix.
    pub before_content: &'a str,
    /// Clause body with any trailing whitespace run removed.
    pub inside_content: &'a str,
    /// Text following the balancing closing bracket.
    pub after_content: &'a str,
    /// Trailing whitespace run lifted out of the body.
    pub space_before_bracket: &'a str,
    /// Label written inside `Optional( … )`.
    pub label: &'a str,
    /// Offset of the marker's opening `[`.
    pub prefix_start: usize,
    /// Offset just past the bracket that opens the body.
    pub prefix_end: usize,
    /// Offset just past the balancing closing bracket.
    pub clause_end: usize,
}

impl<'a> InlineMatch<'a> {
    /// The full clause: marker prefix, body and closing bracket.
    pub fn matched_span(&self, text: &'a str) -> &'a str {
        &text[self.prefix_start..self.clause_end]
    }

    /// The marker prefix up to and including the body's opening bracket.
    pub fn prefix(&self, text: &'a str) -> &'a str {
        &text[self.prefix_start..self.prefix_end]
    }
}

/// Locate the first inline optional clause in `text`.
///
/// Returns `None` when there is no marker or when the body's opening bracket
/// is never balanced before the end of the text.
pub fn parse_inline_option(text: &str) -> Option<InlineMatch<'_>> {
    let captures = marker_regex().captures(text)?;
    let whole = captures.get(0)?;
    let label = captures.get(1).map_or("", |m| m.as_str());

    let prefix_start = whole.start();
    let prefix_end = whole.end();
    let body = &text[prefix_end..];

    let closing = find_balancing_bracket(body)?;
    let inside = &body[..closing];
    let after_content = &body[closing + 1..];

    let inside_content = inside.trim_end();
    let space_before_bracket = &inside[inside_content.len()..];

    Some(InlineMatch {
        before_content: &text[..prefix_start],
        inside_content,
        after_content,
        space_before_bracket,
        label,
        prefix_start,
        prefix_end,
        clause_end: prefix_end + closing + 1,
    })
}

/// Offset of the `]` that closes an already opened bracket, if any.
fn find_balancing_bracket(body: &str) -> Option<usize> {
    let mut depth = 1usize;
    for (idx, ch) in body.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Text of a paragraph governed as a whole by one option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionInfoSplit<'a> {
    pub inside_content: &'a str,
    pub after_content: &'a str,
    pub space_before_bracket: &'a str,
    pub has_closing_bracket: bool,
}

/// Split paragraph text at its first `" ]"`.
///
/// One option governs the whole paragraph, so no balancing is involved. Text
/// without the sequence is entirely inside the option.
pub fn parse_option_info(text: &str) -> OptionInfoSplit<'_> {
    match text.find(" ]") {
        Some(idx) => OptionInfoSplit {
            inside_content: &text[..idx],
            after_content: &text[idx + 2..],
            space_before_bracket: " ",
            has_closing_bracket: true,
        },
        None => OptionInfoSplit {
            inside_content: text,
            after_content: "",
            space_before_bracket: "",
            has_closing_bracket: false,
        },
    }
}
