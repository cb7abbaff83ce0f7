//! The director: a read-only observer that may nudge a stuck user.
//!
//! Strategies implement [`Director`] and are handed to the engine as a
//! trait object, so swapping the heuristic never touches the turn logic.

use std::fmt;

use crate::constants::DIRECTOR_TURN_THRESHOLD;
use crate::persona::Persona;
use crate::session::SessionState;

/// A steering suggestion shown to the user, never to the model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hint(pub String);

impl Hint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Hint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Inspects a session after a reply and optionally emits a [`Hint`].
///
/// The engine passes its bound persona alongside the session because hint
/// text names the persona's title and focus, which the session only knows
/// by id.
pub trait Director: Send + Sync {
    fn analyze(&self, persona: &Persona, state: &SessionState) -> Option<Hint>;
}

/// Fires once the conversation has dragged past the turn threshold and
/// the latest message is a question asking for help.
#[derive(Clone, Debug)]
pub struct HelpRequestDirector {
    turn_threshold: u32,
}

impl HelpRequestDirector {
    pub fn new() -> Self {
        Self {
            turn_threshold: DIRECTOR_TURN_THRESHOLD,
        }
    }

    pub fn with_threshold(turn_threshold: u32) -> Self {
        Self { turn_threshold }
    }
}

impl Default for HelpRequestDirector {
    fn default() -> Self {
        Self::new()
    }
}

impl Director for HelpRequestDirector {
    fn analyze(&self, persona: &Persona, state: &SessionState) -> Option<Hint> {
        if state.turn_count() <= self.turn_threshold {
            return None;
        }
        let last = state.last_message()?.content().to_lowercase();
        if last.contains('?') && last.contains("help") {
            return Some(Hint(format!(
                "Hint: Try asking the {} about '{}' constraints.",
                persona.title, persona.focus
            )));
        }
        None
    }
}

/// Never intervenes.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentDirector;

impl Director for SilentDirector {
    fn analyze(&self, _persona: &Persona, _state: &SessionState) -> Option<Hint> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::PersonaRegistry;

    fn state_with(turns: u32, last: &str) -> SessionState {
        let mut state = SessionState::new("s-1", "ceo");
        for i in 1..turns {
            state.push_user(format!("message {i}"));
            state.push_assistant("noted");
        }
        state.push_user(last);
        state
    }

    fn ceo() -> Persona {
        PersonaRegistry::builtin().lookup("ceo").unwrap().clone()
    }

    #[test]
    fn fires_after_five_turns_on_a_help_question() {
        let state = state_with(6, "can you help?");
        assert_eq!(state.turn_count(), 6);
        let hint = HelpRequestDirector::new().analyze(&ceo(), &state);
        assert_eq!(
            hint,
            Some(Hint(
                "Hint: Try asking the CEO about 'Brand Autonomy' constraints.".to_string()
            ))
        );
    }

    #[test]
    fn stays_quiet_early_in_the_conversation() {
        let state = state_with(4, "can you help?");
        assert_eq!(HelpRequestDirector::new().analyze(&ceo(), &state), None);
    }

    #[test]
    fn stays_quiet_without_a_help_question() {
        let state = state_with(6, "thanks");
        assert_eq!(HelpRequestDirector::new().analyze(&ceo(), &state), None);

        let state = state_with(6, "I need help.");
        assert_eq!(HelpRequestDirector::new().analyze(&ceo(), &state), None);
    }

    #[test]
    fn matching_ignores_case() {
        let state = state_with(7, "HELP me out here?");
        assert!(HelpRequestDirector::new().analyze(&ceo(), &state).is_some());
    }

    #[test]
    fn hint_names_the_active_persona() {
        let chro = PersonaRegistry::builtin().lookup("chro").unwrap().clone();
        let state = state_with(6, "help?");
        let hint = HelpRequestDirector::new().analyze(&chro, &state).unwrap();
        assert_eq!(
            hint.as_str(),
            "Hint: Try asking the CHRO about 'Competency Framework' constraints."
        );
    }

    #[test]
    fn analysis_leaves_state_untouched() {
        let state = state_with(6, "can you help?");
        let before = state.history().len();
        let _ = HelpRequestDirector::new().analyze(&ceo(), &state);
        assert_eq!(state.history().len(), before);
        assert_eq!(state.turn_count(), 6);
    }

    #[test]
    fn silent_director_never_fires() {
        let state = state_with(9, "can you help?");
        assert_eq!(SilentDirector.analyze(&ceo(), &state), None);
    }
}
