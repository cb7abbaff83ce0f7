//! Prompt assembly: persona block, retrieved context, and transcript tail.

use crate::persona::Persona;
use crate::session::Message;

/// Compile the persona's instruction block around `context`.
///
/// Every section is always rendered, so an empty context yields an empty
/// context section rather than a missing one.
pub fn compile(persona: &Persona, context: &str) -> String {
    format!(
        "ROLE: {name}\n\
         \n\
         CORE INSTRUCTIONS:\n\
         {instructions}\n\
         \n\
         STYLE GUIDE:\n\
         {style}\n\
         \n\
         CONTEXT FROM KNOWLEDGE BASE:\n\
         {context}\n\
         \n\
         Now respond to the user based on the context above.\n",
        name = persona.name,
        instructions = persona.system_prompt,
        style = persona.style_guide,
    )
}

/// Render messages as `ROLE: content` lines, oldest first.
pub fn transcript(messages: &[Message]) -> String {
    let mut out = String::new();
    for msg in messages {
        out.push_str(msg.role().tag());
        out.push_str(": ");
        out.push_str(msg.content());
        out.push('\n');
    }
    out
}

/// Full model input: compiled persona block, the last `window` history
/// entries, and the open assistant cue.
pub fn assemble(persona: &Persona, context: &str, history: &[Message], window: usize) -> String {
    let start = history.len().saturating_sub(window);
    format!(
        "{}\nCONVERSATION HISTORY:\n{}\nASSISTANT:",
        compile(persona, context),
        transcript(&history[start..])
    )
}
