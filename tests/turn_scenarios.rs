//! End-to-end turns through the public API with stubbed collaborators.

use std::sync::Arc;

use async_trait::async_trait;
use coworker::config::EngineSettings;
use coworker::constants::{GENERIC_APOLOGY_REPLY, RATE_LIMITED_REPLY};
use coworker::director::HelpRequestDirector;
use coworker::generation::Generator;
use coworker::retrieval::{Retriever, Unconfigured};
use coworker::{
    ConversationEngine, GenerationError, PersonaRegistry, RetrievalError, Role, SessionState,
};

struct FixedContext(&'static str);

#[async_trait]
impl Retriever for FixedContext {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, RetrievalError> {
        Ok(vec![1.0; 4])
    }

    async fn search(&self, _vector: &[f32], top_k: usize) -> Result<Vec<String>, RetrievalError> {
        Ok(vec![self.0.to_string(); top_k.min(1)])
    }
}

struct ScriptedReply(Result<&'static str, GenerationError>);

#[async_trait]
impl Generator for ScriptedReply {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        self.0.clone().map(str::to_string)
    }
}

fn engine(retriever: Arc<dyn Retriever>, generator: ScriptedReply) -> ConversationEngine {
    ConversationEngine::new(
        "ceo",
        Arc::new(PersonaRegistry::builtin()),
        retriever,
        Arc::new(generator),
        Arc::new(HelpRequestDirector::new()),
        EngineSettings::default(),
    )
    .expect("ceo is a builtin persona")
}

#[tokio::test]
async fn centralized_hiring_is_rejected() {
    let engine = engine(
        Arc::new(FixedContext("Gucci Group brands operate with high autonomy.")),
        ScriptedReply(Ok("I cannot accept a centralized approach.")),
    );
    let mut session = SessionState::start("ceo");

    let result = engine.run_turn("Let's centralize hiring", &mut session).await;

    assert_eq!(result.assistant_message, "I cannot accept a centralized approach.");
    assert_eq!(result.context_used, "Gucci Group brands operate with high autonomy.");
    assert_eq!(result.director_hint, None);
    assert_eq!(session.turn_count(), 1);

    let history: Vec<(Role, &str)> = session
        .history()
        .iter()
        .map(|m| (m.role(), m.content()))
        .collect();
    assert_eq!(
        history,
        vec![
            (Role::User, "Let's centralize hiring"),
            (Role::Assistant, "I cannot accept a centralized approach."),
        ]
    );
}

#[tokio::test]
async fn unconfigured_knowledge_base_still_answers() {
    let engine = engine(
        Arc::new(Unconfigured("no API key".to_string())),
        ScriptedReply(Ok("Tell me more.")),
    );
    let mut session = SessionState::start("ceo");

    let result = engine.run_turn("Hello", &mut session).await;

    assert_eq!(result.context_used, "");
    assert_eq!(result.assistant_message, "Tell me more.");
}

#[tokio::test]
async fn fallback_replies_follow_the_error_kind() {
    let limited = engine(
        Arc::new(FixedContext("ctx")),
        ScriptedReply(Err(GenerationError::RateLimited("quota".to_string()))),
    );
    let broken = engine(
        Arc::new(FixedContext("ctx")),
        ScriptedReply(Err(GenerationError::Other("500".to_string()))),
    );
    let mut session = SessionState::start("ceo");

    let first = limited.run_turn("one", &mut session).await;
    let second = broken.run_turn("two", &mut session).await;

    assert_eq!(first.assistant_message, RATE_LIMITED_REPLY);
    assert_eq!(second.assistant_message, GENERIC_APOLOGY_REPLY);
    assert_eq!(session.turn_count(), 2);
    assert_eq!(session.history().len(), 4);
}

#[tokio::test]
async fn one_engine_serves_independent_sessions() {
    let engine = engine(Arc::new(FixedContext("ctx")), ScriptedReply(Ok("ok")));
    let mut alice = SessionState::start("ceo");
    let mut bob = SessionState::start("ceo");

    let (a, b) = tokio::join!(
        engine.run_turn("from alice", &mut alice),
        engine.run_turn("from bob", &mut bob),
    );

    assert_eq!(a.assistant_message, "ok");
    assert_eq!(b.assistant_message, "ok");
    assert_eq!(alice.history()[0].content(), "from alice");
    assert_eq!(bob.history()[0].content(), "from bob");
    assert_eq!(alice.turn_count(), 1);
    assert_eq!(bob.turn_count(), 1);
}

#[test]
fn unknown_persona_is_rejected_at_construction() {
    let err = ConversationEngine::new(
        "intern",
        Arc::new(PersonaRegistry::builtin()),
        Arc::new(FixedContext("ctx")),
        Arc::new(ScriptedReply(Ok("ok"))),
        Arc::new(HelpRequestDirector::new()),
        EngineSettings::default(),
    )
    .err()
    .expect("intern is not in the catalog");
    assert_eq!(err.persona_id, "intern");
}
