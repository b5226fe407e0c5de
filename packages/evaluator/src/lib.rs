//! # Optclause Evaluator
//!
//! Turns a paragraph tree plus the current option states into a rendered
//! tree with numbering, markers, brackets and deferred footers.
//!
//! - [`option_state`]: option values and the store they are read from
//! - [`resolver`]: the per-clause visibility decision table
//! - [`status`]: render status and the context handed down the tree
//! - [`evaluator`]: the depth-first render walk
//! - [`cache`]: memoized clause resolution

pub mod cache;
pub mod evaluator;
pub mod leaf;
pub mod option_state;
pub mod provider;
pub mod resolver;
pub mod status;
pub mod vdom;

pub use cache::{FragmentCache, FragmentKey, DEFAULT_CACHE_CAPACITY};
pub use evaluator::{Evaluator, RenderOptions, RenderState};
pub use leaf::{LeafRenderer, LeafRequest, TextLeafRenderer};
pub use option_state::{state_signature, OptionState, OptionStateMap, OptionStore};
pub use provider::{
    format_text_items, DefaultTextProvider, TemplateTextProvider, TextItem,
    DEFAULT_BEGIN_TEMPLATE, DEFAULT_END_TEMPLATE,
};
pub use resolver::{
    classify, resolve_clause, resolve_inline_options, resolve_option, ClauseParts, ContentSlot,
    Fragment, RenderVariant, ResolveContext,
};
pub use status::{
    child_numbering, BracketFlags, CriticalRenderStatus, FooterRenderStatus, ParagraphLayout,
    ParentInfo, RenderStatus, RenderingMode, StatusTable,
};
pub use vdom::{
    ListInfo, NodeContext, NumberingUpdate, OptionSubscription, RenderNode, RenderedDocument,
};
