//! Conversation engine: one persona, many sessions.
//!
//! The engine owns no session data. Callers pass `&mut SessionState` into
//! [`ConversationEngine::run_turn`], so the borrow checker already gives
//! each session at most one in-flight turn while a single engine (cheap to
//! clone, `Send + Sync`) serves any number of sessions.
//!
//! Collaborator failures never escape a turn. Retrieval failures degrade
//! to an empty context; generation failures turn into a fixed reply chosen
//! by error kind. Neither is retried.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::EngineSettings;
use crate::constants::{GENERIC_APOLOGY_REPLY, RATE_LIMITED_REPLY};
use crate::director::{Director, Hint};
use crate::error::{GenerationError, InvalidPersonaError, RetrievalError};
use crate::generation::Generator;
use crate::persona::{Persona, PersonaRegistry};
use crate::prompt;
use crate::retrieval::Retriever;
use crate::session::SessionState;

/// What one turn produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnResult {
    pub assistant_message: String,
    /// Retrieved background text; empty when retrieval failed or found nothing.
    pub context_used: String,
    pub director_hint: Option<Hint>,
}

/// A persona bound to its collaborators.
#[derive(Clone)]
pub struct ConversationEngine {
    persona: Persona,
    registry: Arc<PersonaRegistry>,
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn Generator>,
    director: Arc<dyn Director>,
    settings: EngineSettings,
}

impl ConversationEngine {
    /// Bind `persona_id` from `registry`. Unknown ids are fatal here.
    pub fn new(
        persona_id: &str,
        registry: Arc<PersonaRegistry>,
        retriever: Arc<dyn Retriever>,
        generator: Arc<dyn Generator>,
        director: Arc<dyn Director>,
        settings: EngineSettings,
    ) -> Result<Self, InvalidPersonaError> {
        let persona = registry.lookup(persona_id)?.clone();
        Ok(Self {
            persona,
            registry,
            retriever,
            generator,
            director,
            settings,
        })
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Same collaborators, different persona.
    pub fn with_persona(&self, persona_id: &str) -> Result<Self, InvalidPersonaError> {
        let mut engine = self.clone();
        engine.persona = self.registry.lookup(persona_id)?.clone();
        Ok(engine)
    }

    /// Run one user turn against `state`.
    ///
    /// A session carrying history from another persona is reset first.
    pub async fn run_turn(&self, user_text: &str, state: &mut SessionState) -> TurnResult {
        if state.persona_id() != self.persona.id {
            info!(
                session_id = state.session_id(),
                from = state.persona_id(),
                to = %self.persona.id,
                "persona changed; resetting session"
            );
            state.reset(self.persona.id.as_str());
        }

        state.push_user(user_text);
        let turn = state.turn_count();

        let context_used = match self.retrieve(user_text).await {
            Ok(context) => context,
            Err(err) => {
                warn!(
                    session_id = state.session_id(),
                    turn,
                    error = %err,
                    "retrieval failed; continuing without context"
                );
                String::new()
            }
        };

        let full_prompt = prompt::assemble(
            &self.persona,
            &context_used,
            state.history(),
            self.settings.history_window,
        );

        let assistant_message = match self.generator.generate(&full_prompt).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(
                    session_id = state.session_id(),
                    turn,
                    rate_limited = err.is_rate_limited(),
                    error = %err,
                    "generation failed; replying with fallback"
                );
                fallback_reply(&err).to_string()
            }
        };

        state.push_assistant(assistant_message.as_str());

        let director_hint = self.director.analyze(&self.persona, state);
        if let Some(hint) = &director_hint {
            info!(session_id = state.session_id(), turn, hint = %hint, "director intervened");
        }

        TurnResult {
            assistant_message,
            context_used,
            director_hint,
        }
    }

    async fn retrieve(&self, query: &str) -> Result<String, RetrievalError> {
        let vector = self.retriever.embed(query).await?;
        let snippets = self.retriever.search(&vector, self.settings.top_k).await?;
        Ok(snippets.join("\n\n"))
    }
}

/// User-facing text for a failed generation.
pub fn fallback_reply(err: &GenerationError) -> &'static str {
    match err {
        GenerationError::RateLimited(_) => RATE_LIMITED_REPLY,
        GenerationError::Other(_) => GENERIC_APOLOGY_REPLY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::director::{HelpRequestDirector, SilentDirector};
    use async_trait::async_trait;
    use std::sync::Mutex;

    type Calls = Arc<Mutex<Vec<String>>>;

    struct StubRetriever {
        calls: Calls,
        snippets: Result<Vec<String>, String>,
    }

    #[async_trait]
    impl Retriever for StubRetriever {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
            self.calls.lock().unwrap().push(format!("embed:{text}"));
            Ok(vec![0.1, 0.2])
        }

        async fn search(&self, _v: &[f32], top_k: usize) -> Result<Vec<String>, RetrievalError> {
            self.calls.lock().unwrap().push(format!("search:{top_k}"));
            self.snippets
                .clone()
                .map_err(RetrievalError::NotConfigured)
        }
    }

    struct StubGenerator {
        calls: Calls,
        prompts: Arc<Mutex<Vec<String>>>,
        reply: Result<String, GenerationError>,
    }

    #[async_trait]
    impl Generator for StubGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            self.calls.lock().unwrap().push("generate".to_string());
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone()
        }
    }

    struct RecordingDirector {
        calls: Calls,
    }

    impl Director for RecordingDirector {
        fn analyze(&self, _persona: &Persona, state: &SessionState) -> Option<Hint> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("director:{}", state.history().len()));
            None
        }
    }

    struct Harness {
        calls: Calls,
        prompts: Arc<Mutex<Vec<String>>>,
        engine: ConversationEngine,
    }

    fn harness(
        snippets: Result<Vec<String>, String>,
        reply: Result<String, GenerationError>,
        director: Option<Arc<dyn Director>>,
    ) -> Harness {
        let calls: Calls = Arc::default();
        let prompts: Arc<Mutex<Vec<String>>> = Arc::default();
        let director = director.unwrap_or_else(|| {
            Arc::new(RecordingDirector {
                calls: calls.clone(),
            })
        });
        let engine = ConversationEngine::new(
            "ceo",
            Arc::new(PersonaRegistry::builtin()),
            Arc::new(StubRetriever {
                calls: calls.clone(),
                snippets,
            }),
            Arc::new(StubGenerator {
                calls: calls.clone(),
                prompts: prompts.clone(),
                reply,
            }),
            director,
            EngineSettings::default(),
        )
        .unwrap();
        Harness {
            calls,
            prompts,
            engine,
        }
    }

    #[tokio::test]
    async fn steps_run_once_in_order() {
        let h = harness(Ok(vec!["ctx".to_string()]), Ok("reply".to_string()), None);
        let mut state = SessionState::new("s-1", "ceo");

        h.engine.run_turn("hello", &mut state).await;

        assert_eq!(
            *h.calls.lock().unwrap(),
            vec!["embed:hello", "search:3", "generate", "director:2"]
        );
    }

    #[tokio::test]
    async fn prompt_carries_context_and_latest_user_line() {
        let h = harness(
            Ok(vec!["first".to_string(), "second".to_string()]),
            Ok("reply".to_string()),
            None,
        );
        let mut state = SessionState::new("s-1", "ceo");

        let result = h.engine.run_turn("hello", &mut state).await;

        assert_eq!(result.context_used, "first\n\nsecond");
        let prompts = h.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("CONTEXT FROM KNOWLEDGE BASE:\nfirst\n\nsecond\n"));
        assert!(prompts[0].ends_with("USER: hello\n\nASSISTANT:"));
    }

    #[tokio::test]
    async fn history_window_limits_prompt_transcript() {
        let h = harness(Ok(vec![]), Ok("ok".to_string()), None);
        let mut state = SessionState::new("s-1", "ceo");
        for i in 0..8 {
            h.engine.run_turn(&format!("turn {i}"), &mut state).await;
        }

        let prompts = h.prompts.lock().unwrap();
        let last = prompts.last().unwrap();
        // 15 messages exist when the eighth prompt is built; only 10 are sent.
        assert!(!last.contains("USER: turn 2\n"));
        assert!(last.contains("ASSISTANT: ok\nUSER: turn 3\n"));
        assert!(last.ends_with("USER: turn 7\n\nASSISTANT:"));
    }

    #[tokio::test]
    async fn turn_count_and_history_stay_in_lockstep() {
        let h = harness(Ok(vec![]), Ok("ok".to_string()), None);
        let mut state = SessionState::new("s-1", "ceo");
        for n in 1..=4u32 {
            h.engine.run_turn("next", &mut state).await;
            assert_eq!(state.turn_count(), n);
            assert_eq!(state.history().len(), 2 * n as usize);
        }
    }

    #[tokio::test]
    async fn retrieval_failure_degrades_to_empty_context() {
        let h = harness(Err("qdrant down".to_string()), Ok("still here".to_string()), None);
        let mut state = SessionState::new("s-1", "ceo");

        let result = h.engine.run_turn("hello", &mut state).await;

        assert_eq!(result.context_used, "");
        assert_eq!(result.assistant_message, "still here");
        let prompts = h.prompts.lock().unwrap();
        assert!(prompts[0].contains("CONTEXT FROM KNOWLEDGE BASE:\n\n\nNow respond"));
    }

    #[tokio::test]
    async fn rate_limit_gets_the_unavailability_reply() {
        let h = harness(
            Ok(vec![]),
            Err(GenerationError::RateLimited("429".to_string())),
            None,
        );
        let mut state = SessionState::new("s-1", "ceo");

        let result = h.engine.run_turn("hello", &mut state).await;

        assert_eq!(result.assistant_message, RATE_LIMITED_REPLY);
        assert_ne!(result.assistant_message, GENERIC_APOLOGY_REPLY);
        assert_eq!(state.history()[1].content(), RATE_LIMITED_REPLY);
    }

    #[tokio::test]
    async fn other_failures_get_the_generic_apology() {
        let h = harness(
            Ok(vec![]),
            Err(GenerationError::Other("boom: secret detail".to_string())),
            None,
        );
        let mut state = SessionState::new("s-1", "ceo");

        let result = h.engine.run_turn("hello", &mut state).await;

        assert_eq!(result.assistant_message, GENERIC_APOLOGY_REPLY);
        assert!(!result.assistant_message.contains("secret"));
        assert_eq!(state.turn_count(), 1);
        assert_eq!(state.history().len(), 2);
    }

    #[tokio::test]
    async fn director_hint_is_returned() {
        let h = harness(
            Ok(vec![]),
            Ok("Is there anything else you need help with?".to_string()),
            Some(Arc::new(HelpRequestDirector::new())),
        );
        let mut state = SessionState::new("s-1", "ceo");
        let mut last = None;
        for _ in 0..6 {
            last = Some(h.engine.run_turn("more", &mut state).await);
        }
        let hint = last.unwrap().director_hint.unwrap();
        assert_eq!(
            hint.as_str(),
            "Hint: Try asking the CEO about 'Brand Autonomy' constraints."
        );
    }

    #[tokio::test]
    async fn switching_persona_resets_the_session() {
        let h = harness(Ok(vec![]), Ok("ok".to_string()), Some(Arc::new(SilentDirector)));
        let mut state = SessionState::new("s-1", "ceo");
        h.engine.run_turn("hello", &mut state).await;
        state.remember("topic", "hiring");

        let chro = h.engine.with_persona("chro").unwrap();
        chro.run_turn("hi there", &mut state).await;

        assert_eq!(state.session_id(), "s-1");
        assert_eq!(state.persona_id(), "chro");
        assert_eq!(state.turn_count(), 1);
        assert_eq!(state.history()[0].content(), "hi there");
        assert!(state.facts().is_empty());
    }

    #[test]
    fn unknown_persona_fails_construction() {
        let h = harness(Ok(vec![]), Ok("ok".to_string()), None);
        let err = h.engine.with_persona("cmo").err().unwrap();
        assert_eq!(err.persona_id, "cmo");
    }
}
