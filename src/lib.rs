//! Coworker — a role-play simulator for rehearsing conversations with
//! executive personas.
//!
//! A turn runs through the [`engine::ConversationEngine`]: the user line is
//! recorded, background text is pulled from the knowledge base, the
//! persona prompt is compiled around it, a reply is generated, and the
//! [`director::Director`] may hand the user a hint.
//!
//! | Module       | Responsibility                                 |
//! |--------------|------------------------------------------------|
//! | `session`    | `SessionState`, `Message`, `Role`              |
//! | `persona`    | `Persona`, immutable `PersonaRegistry`         |
//! | `prompt`     | Prompt compilation and transcript assembly     |
//! | `director`   | `Director` strategy trait and heuristics       |
//! | `engine`     | Turn orchestration and failure absorption      |
//! | `retrieval`  | `Retriever` trait, Gemini + Qdrant knowledge base |
//! | `generation` | `Generator` trait                              |
//! | `gemini`     | Gemini HTTP client                             |
//! | `qdrant`     | Qdrant REST client                             |
//! | `config`     | Environment-driven settings                    |
//! | `logging`    | `tracing` subscriber setup                     |

pub mod config;
pub mod constants;
pub mod director;
pub mod engine;
pub mod error;
pub mod gemini;
pub mod generation;
pub mod logging;
pub mod persona;
pub mod prompt;
pub mod qdrant;
pub mod retrieval;
pub mod session;
pub mod util;

pub use engine::{ConversationEngine, TurnResult};
pub use error::{ConfigError, GenerationError, InvalidPersonaError, RetrievalError};
pub use persona::{Persona, PersonaRegistry};
pub use session::{Message, Role, SessionState};
