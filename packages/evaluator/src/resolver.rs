//! # Option State Resolver
//!
//! Decides which pieces of a clause are visible for an option's state, and
//! where synthetic marker text and closing brackets go.
//!
//! | state                          | before | marker | inside | bracket | after |
//! |--------------------------------|--------|--------|--------|---------|-------|
//! | hidden                         | yes    |        |        |         | yes   |
//! | active choice                  | yes    |        | yes    |         | yes   |
//! | default, preview               | yes    |        | yes    |         | yes   |
//! | default, interactive           | yes    | yes    | yes    | yes     | yes   |
//! | default, interactive, parent shown | yes | yes   | yes    |         | yes   |
//!
//! Resolution is a pure function of its inputs, which is what lets the
//! evaluator memoize it.

use optclause_parser::{parse_inline_option, InlineMatch, OptionDescriptor, OptionInfoSplit};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::option_state::{OptionState, OptionStore};
use crate::provider::{format_text_items, DefaultTextProvider};

/// Where a content fragment came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "slot", rename_all = "snake_case")]
pub enum ContentSlot {
    Before { clause: usize },
    Inside { clause: usize, option_id: String },
    After { clause: usize },
}

impl ContentSlot {
    /// Stable id of the content piece within paragraph `node_id`.
    pub fn content_id(&self, node_id: &str) -> String {
        match self {
            ContentSlot::Before { clause } => format!("{node_id}-before-{clause}"),
            ContentSlot::Inside { clause, .. } => format!("{node_id}-inline-{clause}"),
            ContentSlot::After { clause } => format!("{node_id}-after-{clause}"),
        }
    }
}

/// An ordered piece of a resolved paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Fragment {
    /// Editable document text.
    Content { slot: ContentSlot, text: String },
    /// Synthetic begin marker.
    MarkerText { text: String },
    /// Whitespace captured in front of a synthetic bracket.
    Spacing { text: String },
    /// Synthetic closing bracket.
    Bracket,
}

impl Fragment {
    pub fn text(&self) -> &str {
        match self {
            Fragment::Content { text, .. }
            | Fragment::MarkerText { text }
            | Fragment::Spacing { text } => text,
            Fragment::Bracket => "]",
        }
    }
}

/// Rendering inputs that do not come from the option itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ResolveContext {
    pub preview_only: bool,
    /// An ancestor option is an active choice and already suppresses brackets.
    pub parent_option_id_shown: bool,
}

/// How an option renders, given its state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderVariant {
    Hidden,
    Active { choice: String },
    Default { interactive: bool, bracket: bool },
}

pub fn classify(state: &OptionState, ctx: ResolveContext) -> RenderVariant {
    match state {
        OptionState::Hidden => RenderVariant::Hidden,
        OptionState::Choice(choice) => RenderVariant::Active {
            choice: choice.clone(),
        },
        OptionState::Default => {
            let interactive = !ctx.preview_only;
            RenderVariant::Default {
                interactive,
                bracket: interactive && !ctx.parent_option_id_shown,
            }
        }
    }
}

/// The text pieces of one clause, whichever parser produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClauseParts<'a> {
    pub before: &'a str,
    pub inside: &'a str,
    pub after: &'a str,
    pub space_before_bracket: &'a str,
    pub has_closing_bracket: bool,
}

impl<'a> From<&InlineMatch<'a>> for ClauseParts<'a> {
    fn from(m: &InlineMatch<'a>) -> Self {
        Self {
            before: m.before_content,
            inside: m.inside_content,
            after: m.after_content,
            space_before_bracket: m.space_before_bracket,
            has_closing_bracket: true,
        }
    }
}

impl<'a> From<OptionInfoSplit<'a>> for ClauseParts<'a> {
    fn from(split: OptionInfoSplit<'a>) -> Self {
        Self {
            before: "",
            inside: split.inside_content,
            after: split.after_content,
            space_before_bracket: split.space_before_bracket,
            has_closing_bracket: split.has_closing_bracket,
        }
    }
}

fn push_content(out: &mut Vec<Fragment>, slot: ContentSlot, text: &str) {
    if !text.is_empty() {
        out.push(Fragment::Content {
            slot,
            text: text.to_string(),
        });
    }
}

/// Emit everything of one clause except its trailing `after` text.
///
/// `request_marker` is the caller's first-of-list gate for the begin marker.
#[allow(clippy::too_many_arguments)]
pub fn resolve_clause(
    option: &OptionDescriptor,
    clause: usize,
    state: &OptionState,
    parts: &ClauseParts<'_>,
    ctx: ResolveContext,
    request_marker: bool,
    provider: &dyn DefaultTextProvider,
    out: &mut Vec<Fragment>,
) {
    push_content(out, ContentSlot::Before { clause }, parts.before);

    let inside = ContentSlot::Inside {
        clause,
        option_id: option.id.clone(),
    };

    match classify(state, ctx) {
        RenderVariant::Hidden => {}
        RenderVariant::Active { .. } => push_content(out, inside, parts.inside),
        RenderVariant::Default {
            interactive,
            bracket,
        } => {
            if interactive && request_marker {
                let marker = format_text_items(&provider.begin_text(option));
                if !marker.is_empty() {
                    out.push(Fragment::MarkerText { text: marker });
                }
            }
            push_content(out, inside, parts.inside);
            if bracket && parts.has_closing_bracket {
                if !parts.space_before_bracket.is_empty() {
                    out.push(Fragment::Spacing {
                        text: parts.space_before_bracket.to_string(),
                    });
                }
                out.push(Fragment::Bracket);
            }
        }
    }
}

/// Resolve a single clause including its trailing text.
pub fn resolve_option(
    option: &OptionDescriptor,
    state: &OptionState,
    parts: &ClauseParts<'_>,
    ctx: ResolveContext,
    request_marker: bool,
    provider: &dyn DefaultTextProvider,
) -> Vec<Fragment> {
    let mut out = Vec::new();
    resolve_clause(option, 0, state, parts, ctx, request_marker, provider, &mut out);
    push_content(&mut out, ContentSlot::After { clause: 0 }, parts.after);
    out
}

/// Resolve every top-level inline clause of `raw_text`, left to right.
///
/// Returns `None` when the text holds no terminated clause, in which case the
/// paragraph renders as plain content. Clauses nested inside a body stay part
/// of that body. A clause whose label names none of `options` keeps its
/// leading text and is otherwise skipped.
pub fn resolve_inline_options(
    raw_text: &str,
    options: &[OptionDescriptor],
    store: &dyn OptionStore,
    ctx: ResolveContext,
    provider: &dyn DefaultTextProvider,
) -> Option<Vec<Fragment>> {
    let mut out = Vec::new();
    let mut working = raw_text;
    let mut clause = 0usize;

    while let Some(m) = parse_inline_option(working) {
        let parts = ClauseParts::from(&m);
        match options.iter().find(|option| option.id == m.label) {
            Some(option) => {
                let state = store.state_of(&option.id);
                resolve_clause(option, clause, &state, &parts, ctx, true, provider, &mut out);
            }
            None => {
                debug!(label = %m.label, "Skipping clause without a matching option");
                push_content(&mut out, ContentSlot::Before { clause }, parts.before);
            }
        }
        working = m.after_content;
        clause += 1;
    }

    if clause == 0 {
        return None;
    }

    push_content(&mut out, ContentSlot::After { clause: clause - 1 }, working);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::option_state::OptionStateMap;
    use crate::provider::TemplateTextProvider;

    fn provider() -> TemplateTextProvider {
        TemplateTextProvider::new("<", "")
    }

    fn kinds(fragments: &[Fragment]) -> Vec<String> {
        fragments
            .iter()
            .map(|f| match f {
                Fragment::Content { slot, text } => match slot {
                    ContentSlot::Before { .. } => format!("before:{text}"),
                    ContentSlot::Inside { .. } => format!("inside:{text}"),
                    ContentSlot::After { .. } => format!("after:{text}"),
                },
                Fragment::MarkerText { text } => format!("marker:{text}"),
                Fragment::Spacing { text } => format!("space:{text:?}"),
                Fragment::Bracket => "bracket".to_string(),
            })
            .collect()
    }

    #[test]
    fn test_classify_default_preview() {
        let ctx = ResolveContext {
            preview_only: true,
            parent_option_id_shown: false,
        };
        assert_eq!(
            classify(&OptionState::Default, ctx),
            RenderVariant::Default {
                interactive: false,
                bracket: false
            }
        );
    }

    #[test]
    fn test_attached_option_requires_closing_bracket() {
        let option = OptionDescriptor::new("a");
        let parts = ClauseParts {
            before: "",
            inside: "whole paragraph",
            after: "",
            space_before_bracket: "",
            has_closing_bracket: false,
        };

        let out = resolve_option(
            &option,
            &OptionState::Default,
            &parts,
            ResolveContext::default(),
            false,
            &provider(),
        );
        assert_eq!(kinds(&out), vec!["inside:whole paragraph"]);
    }

    #[test]
    fn test_marker_gate() {
        let option = OptionDescriptor::new("a");
        let parts = ClauseParts {
            before: "",
            inside: "x",
            after: "",
            space_before_bracket: "",
            has_closing_bracket: true,
        };
        let ctx = ResolveContext::default();

        let gated = resolve_option(&option, &OptionState::Default, &parts, ctx, false, &provider());
        assert_eq!(kinds(&gated), vec!["inside:x", "bracket"]);

        let open = resolve_option(&option, &OptionState::Default, &parts, ctx, true, &provider());
        assert_eq!(kinds(&open), vec!["marker:<", "inside:x", "bracket"]);
    }

    #[test]
    fn test_sequential_inline_clauses() {
        let text = "A [Optional(x):m:] [one ] B [Optional(y):m:] [two] C";
        let options = vec![OptionDescriptor::new("x"), OptionDescriptor::new("y")];
        let store = OptionStateMap::new().with("y", "hidden");

        let out =
            resolve_inline_options(text, &options, &store, ResolveContext::default(), &provider())
                .unwrap();

        assert_eq!(
            kinds(&out),
            vec![
                "before:A ",
                "marker:<",
                "inside:one",
                "space:\" \"",
                "bracket",
                "before: B ",
                "after: C",
            ]
        );
        assert_eq!(
            out.last(),
            Some(&Fragment::Content {
                slot: ContentSlot::After { clause: 1 },
                text: " C".to_string()
            })
        );
    }

    #[test]
    fn test_unknown_label_is_skipped() {
        let text = "Keep [Optional(ghost):m:] [dropped] tail";
        let options = vec![OptionDescriptor::new("real")];
        let store = OptionStateMap::new();

        let out =
            resolve_inline_options(text, &options, &store, ResolveContext::default(), &provider())
                .unwrap();
        assert_eq!(kinds(&out), vec!["before:Keep ", "after: tail"]);
    }

    #[test]
    fn test_no_clause_means_plain() {
        let options = vec![OptionDescriptor::new("a")];
        let store = OptionStateMap::new();
        assert!(resolve_inline_options(
            "no marker [Optional(a):m:] [unterminated",
            &options,
            &store,
            ResolveContext::default(),
            &provider()
        )
        .is_none());
    }
}
