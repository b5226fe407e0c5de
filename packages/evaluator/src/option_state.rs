//! Option states and the store they are read from.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Current value of an option.
///
/// Serialized as a bare string: `"default"`, `"hidden"`, or a choice id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OptionState {
    #[default]
    Default,
    Hidden,
    /// An active non-default selection, usually an alternative wording.
    Choice(String),
}

impl OptionState {
    pub fn parse(value: &str) -> Self {
        match value {
            "" | "default" => OptionState::Default,
            "hidden" => OptionState::Hidden,
            choice => OptionState::Choice(choice.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            OptionState::Default => "default",
            OptionState::Hidden => "hidden",
            OptionState::Choice(choice) => choice,
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, OptionState::Default)
    }

    pub fn is_hidden(&self) -> bool {
        matches!(self, OptionState::Hidden)
    }

    /// Non-default and not hidden.
    pub fn is_active_choice(&self) -> bool {
        matches!(self, OptionState::Choice(_))
    }
}

impl From<String> for OptionState {
    fn from(value: String) -> Self {
        OptionState::parse(&value)
    }
}

impl From<&str> for OptionState {
    fn from(value: &str) -> Self {
        OptionState::parse(value)
    }
}

impl From<OptionState> for String {
    fn from(state: OptionState) -> Self {
        state.as_str().to_string()
    }
}

impl FromStr for OptionState {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(OptionState::parse(s))
    }
}

impl fmt::Display for OptionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read access to the process-wide option states.
pub trait OptionStore {
    fn get(&self, option_id: &str) -> Option<OptionState>;

    /// State of `option_id`, absent entries read as [`OptionState::Default`].
    fn state_of(&self, option_id: &str) -> OptionState {
        self.get(option_id).unwrap_or_default()
    }
}

impl OptionStore for HashMap<String, OptionState> {
    fn get(&self, option_id: &str) -> Option<OptionState> {
        HashMap::get(self, option_id).cloned()
    }
}

/// In-memory option states, ordered by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionStateMap {
    states: BTreeMap<String, OptionState>,
}

impl OptionStateMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a state. Returns `false` when the effective state did not change.
    pub fn set(&mut self, option_id: impl Into<String>, state: OptionState) -> bool {
        let option_id = option_id.into();
        if self.state_of(&option_id) == state {
            return false;
        }
        if state.is_default() {
            self.states.remove(&option_id);
        } else {
            self.states.insert(option_id, state);
        }
        true
    }

    pub fn with(mut self, option_id: impl Into<String>, state: impl Into<OptionState>) -> Self {
        self.set(option_id, state.into());
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionState)> {
        self.states.iter().map(|(id, state)| (id.as_str(), state))
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl OptionStore for OptionStateMap {
    fn get(&self, option_id: &str) -> Option<OptionState> {
        self.states.get(option_id).cloned()
    }
}

/// Deterministic `id:state|id:state` signature of the given options.
pub fn state_signature<'a>(
    store: &dyn OptionStore,
    option_ids: impl IntoIterator<Item = &'a str>,
) -> String {
    option_ids
        .into_iter()
        .map(|id| format!("{}:{}", id, store.state_of(id)))
        .collect::<Vec<_>>()
        .join("|")
}
