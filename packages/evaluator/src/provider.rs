//! Synthetic begin/end marker text for options shown in their default state.

use optclause_parser::OptionDescriptor;
use serde::{Deserialize, Serialize};

/// One renderable piece of marker text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum TextItem {
    Plain(String),
    /// Pre-rendered markup, passed through untouched.
    Markup(String),
}

impl TextItem {
    pub fn as_str(&self) -> &str {
        match self {
            TextItem::Plain(text) | TextItem::Markup(text) => text,
        }
    }
}

/// Join a marker sequence into a single string.
pub fn format_text_items(items: &[TextItem]) -> String {
    items.iter().map(TextItem::as_str).collect()
}

/// Supplies the marker text drawn around options in their default state.
///
/// Either sequence may be empty.
pub trait DefaultTextProvider: std::fmt::Debug {
    fn begin_text(&self, option: &OptionDescriptor) -> Vec<TextItem>;

    fn end_text(&self, option: &OptionDescriptor) -> Vec<TextItem>;
}

/// Marker text built from templates.
///
/// `{id}` and `{name}` are substituted from the option. An option may carry
/// its own `beginText` / `endText` metadata, which takes precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateTextProvider {
    begin: String,
    end: String,
}

pub const DEFAULT_BEGIN_TEMPLATE: &str = "[{name}: ";
pub const DEFAULT_END_TEMPLATE: &str = " [end {name}]";

impl TemplateTextProvider {
    pub fn new(begin: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            begin: begin.into(),
            end: end.into(),
        }
    }

    fn expand(template: &str, option: &OptionDescriptor) -> Vec<TextItem> {
        if template.is_empty() {
            return Vec::new();
        }
        let text = template
            .replace("{id}", &option.id)
            .replace("{name}", option.display_name());
        vec![TextItem::Plain(text)]
    }

    fn from_metadata(option: &OptionDescriptor, key: &str) -> Option<Vec<TextItem>> {
        option
            .meta_str(key)
            .map(|markup| vec![TextItem::Markup(markup.to_string())])
    }
}

impl Default for TemplateTextProvider {
    fn default() -> Self {
        Self::new(DEFAULT_BEGIN_TEMPLATE, DEFAULT_END_TEMPLATE)
    }
}

impl DefaultTextProvider for TemplateTextProvider {
    fn begin_text(&self, option: &OptionDescriptor) -> Vec<TextItem> {
        Self::from_metadata(option, "beginText").unwrap_or_else(|| Self::expand(&self.begin, option))
    }

    fn end_text(&self, option: &OptionDescriptor) -> Vec<TextItem> {
        Self::from_metadata(option, "endText").unwrap_or_else(|| Self::expand(&self.end, option))
    }
}
