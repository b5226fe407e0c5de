//! # Optclause Editor
//!
//! Live rendering of a contract document while its options are edited.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ parser: JSON → paragraph tree               │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ evaluator: tree + option states → rendered  │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: RenderSession                       │
//! │  - option observer registry                 │
//! │  - numbering change broadcasts              │
//! │  - dirty propagation from common ancestor   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Document is source of truth**: the rendered tree is a derived view
//! 2. **Explicit wiring**: the registry and broadcaster are owned by the
//!    session, nothing is global
//! 3. **Minimal re-render**: a change re-renders the smallest subtree holding
//!    every affected paragraph
//!
//! ## Usage
//!
//! ```rust,ignore
//! use optclause_editor::RenderSession;
//! use optclause_evaluator::OptionState;
//!
//! let mut session = RenderSession::from_json_str(source)?;
//! session.subscribe_all_numbering(|node, numbering| println!("{node} -> {numbering}"));
//! session.render();
//!
//! let dirty = session.set_option_state("pets", OptionState::Hidden);
//! println!("{}", session.rendered().to_plain_text());
//! ```

mod broadcast;
mod errors;
mod registry;
mod session;

pub use broadcast::{NumberingBroadcaster, NumberingCallback, SubscriberId};
pub use errors::{EditorError, EditorResult};
pub use registry::{OptionObserverRegistry, Subscription};
pub use session::{lowest_common_ancestor, RenderSession};

// Re-export common types for convenience
pub use optclause_evaluator::{OptionState, OptionStateMap, RenderOptions, RenderedDocument};
pub use optclause_parser::Document;
