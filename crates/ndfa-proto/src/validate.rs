//! Structural validation of submitted automata.
//!
//! A [`Validator`] is an ordered list of [`Check`]s. Every check runs on every
//! input, regardless of what earlier checks reported, and appends its
//! diagnostics to a shared list. The standard pipeline is:
//!
//! 1. alphabet is non-empty
//! 2. state set is non-empty
//! 3. an initial state is set
//! 4. the initial state is a member of `Q`
//! 5. every accepting state is a member of `Q` (one diagnostic per offender)
//!
//! Transition membership (endpoints in `Q`, symbol in `V`) is not part of the
//! standard pipeline. [`Validator::strict`] appends [`TransitionMembership`]
//! for deployments that want it.

use std::collections::HashSet;

use crate::automaton::Automaton;
use crate::envelope::{Requester, ValidationRequest, ValidationResult};

/// One structural rule.
///
/// Implementations must be pure: the same automaton always yields the same
/// diagnostics, in the same order.
pub trait Check: Send + Sync {
    /// Short identifier, used in logs.
    fn name(&self) -> &'static str;

    /// Append zero or more diagnostics for `automaton`.
    fn run(&self, automaton: &Automaton, diagnostics: &mut Vec<String>);
}

/// `V` must not be empty.
pub struct AlphabetNotEmpty;

impl Check for AlphabetNotEmpty {
    fn name(&self) -> &'static str {
        "alphabet_not_empty"
    }

    fn run(&self, automaton: &Automaton, diagnostics: &mut Vec<String>) {
        if automaton.v.is_empty() {
            diagnostics.push("alphabet must not be empty".to_string());
        }
    }
}

/// `Q` must not be empty.
pub struct StatesNotEmpty;

impl Check for StatesNotEmpty {
    fn name(&self) -> &'static str {
        "states_not_empty"
    }

    fn run(&self, automaton: &Automaton, diagnostics: &mut Vec<String>) {
        if automaton.q.is_empty() {
            diagnostics.push("states must not be empty".to_string());
        }
    }
}

/// `q0` must be set.
pub struct InitialStateSet;

impl Check for InitialStateSet {
    fn name(&self) -> &'static str {
        "initial_state_set"
    }

    fn run(&self, automaton: &Automaton, diagnostics: &mut Vec<String>) {
        if !automaton.has_initial_state() {
            diagnostics.push("initial state is not set".to_string());
        }
    }
}

/// A set `q0` must be a member of `Q`.
pub struct InitialStateKnown;

impl Check for InitialStateKnown {
    fn name(&self) -> &'static str {
        "initial_state_known"
    }

    fn run(&self, automaton: &Automaton, diagnostics: &mut Vec<String>) {
        if automaton.has_initial_state() && !automaton.has_state(&automaton.q0) {
            diagnostics.push(format!("initial state '{}' not found in Q", automaton.q0));
        }
    }
}

/// Every member of `F` must be a member of `Q`.
pub struct FinalStatesKnown;

impl Check for FinalStatesKnown {
    fn name(&self) -> &'static str {
        "final_states_known"
    }

    fn run(&self, automaton: &Automaton, diagnostics: &mut Vec<String>) {
        for state in &automaton.f {
            if !automaton.has_state(state) {
                diagnostics.push(format!("final state '{state}' not found in Q"));
            }
        }
    }
}

/// Every transition must start and end in `Q` and use a symbol from `V`.
///
/// Reports in `Phi` order; for each transition: start, symbol, end.
pub struct TransitionMembership;

impl Check for TransitionMembership {
    fn name(&self) -> &'static str {
        "transition_membership"
    }

    fn run(&self, automaton: &Automaton, diagnostics: &mut Vec<String>) {
        let states: HashSet<&str> = automaton.q.iter().map(String::as_str).collect();
        let symbols: HashSet<&str> = automaton.v.iter().map(String::as_str).collect();

        for (index, t) in automaton.phi.iter().enumerate() {
            if !states.contains(t.start.as_str()) {
                diagnostics.push(format!(
                    "transition {index} ({t}): start state '{}' not found in Q",
                    t.start
                ));
            }
            if !symbols.contains(t.symbol.as_str()) {
                diagnostics.push(format!(
                    "transition {index} ({t}): symbol '{}' not found in V",
                    t.symbol
                ));
            }
            if !states.contains(t.end.as_str()) {
                diagnostics.push(format!(
                    "transition {index} ({t}): end state '{}' not found in Q",
                    t.end
                ));
            }
        }
    }
}

/// An ordered pipeline of checks.
pub struct Validator {
    checks: Vec<Box<dyn Check>>,
}

impl Validator {
    /// A validator with no checks. Every automaton passes.
    pub fn empty() -> Self {
        Self { checks: Vec::new() }
    }

    /// The five standard structural checks.
    pub fn standard() -> Self {
        Self::empty()
            .with_check(AlphabetNotEmpty)
            .with_check(StatesNotEmpty)
            .with_check(InitialStateSet)
            .with_check(InitialStateKnown)
            .with_check(FinalStatesKnown)
    }

    /// The standard checks followed by [`TransitionMembership`].
    pub fn strict() -> Self {
        Self::standard().with_check(TransitionMembership)
    }

    /// Append a check to the end of the pipeline.
    pub fn with_check(mut self, check: impl Check + 'static) -> Self {
        self.checks.push(Box::new(check));
        self
    }

    /// Names of the configured checks, in run order.
    pub fn check_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.checks.iter().map(|c| c.name())
    }

    /// Run every check and collect the diagnostics.
    pub fn diagnose(&self, automaton: &Automaton) -> Vec<String> {
        let mut diagnostics = Vec::new();
        for check in &self.checks {
            check.run(automaton, &mut diagnostics);
        }
        diagnostics
    }

    /// Validate `automaton` on behalf of `requester`.
    pub fn validate(&self, automaton: &Automaton, requester: Requester) -> ValidationResult {
        ValidationResult::from_diagnostics(
            requester.id,
            requester.id_task,
            self.diagnose(automaton),
        )
    }

    /// Validate a decoded request.
    pub fn validate_request(&self, request: &ValidationRequest) -> ValidationResult {
        self.validate(&request.automaton, request.requester)
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.check_names()).finish()
    }
}

/// Validate with the standard pipeline.
pub fn validate(automaton: &Automaton, requester: Requester) -> ValidationResult {
    Validator::standard().validate(automaton, requester)
}
