//! Nondeterministic finite automaton model.
//!
//! [`Automaton`] is a plain container: it deliberately permits states that
//! violate the usual NDFA invariants (transitions referencing unknown states,
//! `q0 ∉ Q`, `F ⊄ Q`). Detecting those is the job of [`crate::validate`].
//!
//! Alphabet, states and final states are kept as ordered vectors so that
//! diagnostics follow submission order. The `add_*` helpers refuse
//! duplicates; the `set_*` helpers store what they are given.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Decode an explicit `null` the same way as an absent field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// A single transition `(start, symbol, end)`.
///
/// On the wire the fields are named `StartQ`, `V` and `EndQ`; missing or
/// `null` fields decode as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transition {
    /// Source state.
    #[serde(rename = "StartQ", default, deserialize_with = "null_as_default")]
    pub start: String,
    /// Input symbol.
    #[serde(rename = "V", default, deserialize_with = "null_as_default")]
    pub symbol: String,
    /// Target state.
    #[serde(rename = "EndQ", default, deserialize_with = "null_as_default")]
    pub end: String,
}

impl Transition {
    /// Create a new transition.
    pub fn new(start: impl Into<String>, symbol: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            symbol: symbol.into(),
            end: end.into(),
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} --{}--> {}", self.start, self.symbol, self.end)
    }
}

/// An NDFA description as submitted by a client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Automaton {
    /// Alphabet `V`.
    #[serde(rename = "V", default, deserialize_with = "null_as_default")]
    pub v: Vec<String>,
    /// States `Q`.
    #[serde(rename = "Q", default, deserialize_with = "null_as_default")]
    pub q: Vec<String>,
    /// Initial state `q0`; empty means unset.
    #[serde(rename = "q0", default, deserialize_with = "null_as_default")]
    pub q0: String,
    /// Transition relation `Phi`, in submission order. Duplicates are kept.
    #[serde(rename = "Phi", default, deserialize_with = "null_as_default")]
    pub phi: Vec<Transition>,
    /// Accepting states `F`.
    #[serde(rename = "F", default, deserialize_with = "null_as_default")]
    pub f: Vec<String>,
}

fn push_unique(list: &mut Vec<String>, item: String) {
    if !list.contains(&item) {
        list.push(item);
    }
}

fn remove_item(list: &mut Vec<String>, item: &str) {
    if let Some(pos) = list.iter().position(|s| s == item) {
        list.remove(pos);
    }
}

impl Automaton {
    /// Create an empty automaton.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the alphabet.
    pub fn set_alphabet<I, S>(&mut self, symbols: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.v = symbols.into_iter().map(Into::into).collect();
        self
    }

    /// Add a symbol to the alphabet unless it is already present.
    pub fn add_symbol(&mut self, symbol: impl Into<String>) -> &mut Self {
        push_unique(&mut self.v, symbol.into());
        self
    }

    /// Remove a symbol from the alphabet. Transitions using it are kept.
    pub fn remove_symbol(&mut self, symbol: &str) -> &mut Self {
        remove_item(&mut self.v, symbol);
        self
    }

    /// Replace the state set.
    pub fn set_states<I, S>(&mut self, states: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.q = states.into_iter().map(Into::into).collect();
        self
    }

    /// Add a state unless it is already present.
    pub fn add_state(&mut self, state: impl Into<String>) -> &mut Self {
        push_unique(&mut self.q, state.into());
        self
    }

    /// Remove a state and everything that refers to it.
    ///
    /// Drops transitions starting or ending at `state`, removes it from `F`
    /// and unsets `q0` if it was the initial state.
    pub fn remove_state(&mut self, state: &str) -> &mut Self {
        remove_item(&mut self.q, state);
        self.phi.retain(|t| t.start != state && t.end != state);
        remove_item(&mut self.f, state);
        if self.q0 == state {
            self.q0.clear();
        }
        self
    }

    /// Set the initial state. An empty string unsets it.
    pub fn set_initial_state(&mut self, state: impl Into<String>) -> &mut Self {
        self.q0 = state.into();
        self
    }

    /// Replace the accepting states.
    pub fn set_final_states<I, S>(&mut self, states: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.f = states.into_iter().map(Into::into).collect();
        self
    }

    /// Add an accepting state unless it is already present.
    pub fn add_final_state(&mut self, state: impl Into<String>) -> &mut Self {
        push_unique(&mut self.f, state.into());
        self
    }

    /// Remove an accepting state.
    pub fn remove_final_state(&mut self, state: &str) -> &mut Self {
        remove_item(&mut self.f, state);
        self
    }

    /// Append a transition.
    pub fn add_transition(
        &mut self,
        start: impl Into<String>,
        symbol: impl Into<String>,
        end: impl Into<String>,
    ) -> &mut Self {
        self.phi.push(Transition::new(start, symbol, end));
        self
    }

    /// Append several transitions, preserving their order.
    pub fn add_transitions<I>(&mut self, transitions: I) -> &mut Self
    where
        I: IntoIterator<Item = Transition>,
    {
        self.phi.extend(transitions);
        self
    }

    /// Remove every transition structurally equal to `(start, symbol, end)`.
    pub fn remove_transition(&mut self, start: &str, symbol: &str, end: &str) -> &mut Self {
        self.phi
            .retain(|t| !(t.start == start && t.symbol == symbol && t.end == end));
        self
    }

    /// Remove every transition leaving `state`.
    pub fn remove_transitions_from(&mut self, state: &str) -> &mut Self {
        self.phi.retain(|t| t.start != state);
        self
    }

    /// Remove every transition entering `state`.
    pub fn remove_transitions_to(&mut self, state: &str) -> &mut Self {
        self.phi.retain(|t| t.end != state);
        self
    }

    /// Transitions leaving `state`, in relation order.
    pub fn transitions_from<'a>(&'a self, state: &'a str) -> impl Iterator<Item = &'a Transition> + 'a {
        self.phi.iter().filter(move |t| t.start == state)
    }

    /// Transitions entering `state`, in relation order.
    pub fn transitions_to<'a>(&'a self, state: &'a str) -> impl Iterator<Item = &'a Transition> + 'a {
        self.phi.iter().filter(move |t| t.end == state)
    }

    /// Whether `state` is a member of `Q`.
    pub fn has_state(&self, state: &str) -> bool {
        self.q.iter().any(|s| s == state)
    }

    /// Whether `symbol` is a member of `V`.
    pub fn has_symbol(&self, symbol: &str) -> bool {
        self.v.iter().any(|s| s == symbol)
    }

    /// Whether an initial state has been set.
    pub fn has_initial_state(&self) -> bool {
        !self.q0.is_empty()
    }

    /// Reset to the empty automaton.
    pub fn clear(&mut self) -> &mut Self {
        self.v.clear();
        self.q.clear();
        self.q0.clear();
        self.phi.clear();
        self.f.clear();
        self
    }
}

/// Serialized with `V`, `Q` and `F` sorted for readability; `Phi` keeps its order.
impl Serialize for Automaton {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Wire<'a> {
            #[serde(rename = "V")]
            v: Vec<&'a str>,
            #[serde(rename = "Q")]
            q: Vec<&'a str>,
            q0: &'a str,
            #[serde(rename = "Phi")]
            phi: &'a [Transition],
            #[serde(rename = "F")]
            f: Vec<&'a str>,
        }

        fn sorted(list: &[String]) -> Vec<&str> {
            let mut out: Vec<&str> = list.iter().map(String::as_str).collect();
            out.sort_unstable();
            out
        }

        Wire {
            v: sorted(&self.v),
            q: sorted(&self.q),
            q0: &self.q0,
            phi: &self.phi,
            f: sorted(&self.f),
        }
        .serialize(serializer)
    }
}

impl fmt::Display for Automaton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NDFA(V={:?}, Q={:?}, q0='{}', Phi=[{} transitions], F={:?})",
            self.v,
            self.q,
            self.q0,
            self.phi.len(),
            self.f
        )
    }
}
