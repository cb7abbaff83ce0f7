//! Persona definitions — the executives the user role-plays against.
//!
//! Each persona carries a display name, a short title, the concept it
//! guards, and the instructions that get compiled into the system prompt.
//! The [`PersonaRegistry`] is built once at startup and shared behind an
//! `Arc`; nothing mutates it afterwards.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, InvalidPersonaError};
use crate::prompt;

/// A fixed behavioural template for in-character replies.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    /// Lookup key (e.g. "ceo").
    pub id: String,
    /// Display name shown in the header and the `ROLE:` line.
    pub name: String,
    /// Short role name used when the director points at this persona.
    pub title: String,
    /// The concept this persona cares about most.
    pub focus: String,
    /// Core instructions.
    pub system_prompt: String,
    /// Tone directives.
    pub style_guide: String,
}

impl Persona {
    /// Full instruction block for this persona with `context` spliced in.
    pub fn compile_prompt(&self, context: &str) -> String {
        prompt::compile(self, context)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::Persona {
            id: self.id.clone(),
            reason: reason.to_string(),
        };
        if self.id.trim().is_empty() {
            return Err(invalid("id cannot be empty"));
        }
        if self.name.trim().is_empty() {
            return Err(invalid("name cannot be empty"));
        }
        if self.system_prompt.trim().is_empty() {
            return Err(invalid("system_prompt cannot be empty"));
        }
        Ok(())
    }
}

/// Immutable id → persona catalog.
#[derive(Clone, Debug)]
pub struct PersonaRegistry {
    personas: BTreeMap<String, Persona>,
}

impl PersonaRegistry {
    /// The catalog that ships with the binary.
    pub fn builtin() -> Self {
        Self::from_personas(builtin_personas())
    }

    /// Built-ins overlaid with the personas in a JSON file.
    ///
    /// The file holds an array of persona objects; an entry whose id
    /// matches a built-in replaces it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let extra: Vec<Persona> =
            serde_json::from_str(&raw).map_err(|source| ConfigError::PersonaFile {
                path: path.to_path_buf(),
                source,
            })?;
        for persona in &extra {
            persona.validate()?;
        }
        let mut personas = builtin_personas();
        personas.extend(extra);
        Ok(Self::from_personas(personas))
    }

    fn from_personas(personas: Vec<Persona>) -> Self {
        Self {
            personas: personas.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }

    pub fn lookup(&self, id: &str) -> Result<&Persona, InvalidPersonaError> {
        self.personas
            .get(id)
            .ok_or_else(|| InvalidPersonaError::new(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.personas.contains_key(id)
    }

    /// Persona ids in sorted order.
    pub fn ids(&self) -> Vec<&str> {
        self.personas.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Persona> {
        self.personas.values()
    }

    pub fn len(&self) -> usize {
        self.personas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }
}

fn builtin_personas() -> Vec<Persona> {
    vec![
        Persona {
            id: "ceo".to_string(),
            name: "Gucci Group CEO".to_string(),
            title: "CEO".to_string(),
            focus: "Brand Autonomy".to_string(),
            system_prompt: "You are the CEO of Kering/Gucci Group. You value Brand Autonomy \
                            above all else.\n\
                            Your goal is to ensure the Group DNA is respected while allowing \
                            individual brands (YSL, Gucci, Bottega) to flourish independently.\n\
                            If the user suggests a 'one-size-fits-all' centralization, REJECT IT \
                            firmly but professionally."
                .to_string(),
            style_guide: "Direct, visionary, protective, executive brevity.".to_string(),
        },
        Persona {
            id: "chro".to_string(),
            name: "Gucci Group CHRO".to_string(),
            title: "CHRO".to_string(),
            focus: "Competency Framework".to_string(),
            system_prompt: "You are the Chief HR Officer. Your mission is Talent Development \
                            and Mobility.\n\
                            You care about the Competency Framework: Vision, Entrepreneurship, \
                            Passion, Trust.\n\
                            You want to support the brands, not police them."
                .to_string(),
            style_guide: "Encouraging, questions-focused, strategic.".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn builtin_catalog_has_ceo_and_chro() {
        let registry = PersonaRegistry::builtin();
        assert_eq!(registry.ids(), vec!["ceo", "chro"]);
        let ceo = registry.lookup("ceo").unwrap();
        assert_eq!(ceo.name, "Gucci Group CEO");
        assert_eq!(ceo.focus, "Brand Autonomy");
    }

    #[test]
    fn lookup_of_unknown_id_fails() {
        let registry = PersonaRegistry::builtin();
        let err = registry.lookup("cfo").unwrap_err();
        assert_eq!(err, InvalidPersonaError::new("cfo"));
        assert_eq!(err.to_string(), "Invalid persona id: cfo");
    }

    #[test]
    fn load_overlays_file_personas() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"id": "cfo", "name": "Group CFO", "title": "CFO", "focus": "Margin Discipline",
                  "system_prompt": "You guard the margins.", "style_guide": "Numbers first."}},
                {{"id": "ceo", "name": "Interim CEO", "title": "CEO", "focus": "Turnaround",
                  "system_prompt": "You are new here.", "style_guide": "Careful."}}
            ]"#
        )
        .unwrap();

        let registry = PersonaRegistry::load(file.path()).unwrap();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.lookup("cfo").unwrap().focus, "Margin Discipline");
        assert_eq!(registry.lookup("ceo").unwrap().name, "Interim CEO");
        assert!(registry.contains("chro"));
    }

    #[test]
    fn load_rejects_blank_prompts() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id": "coo", "name": "COO", "title": "COO", "focus": "Ops",
                 "system_prompt": "   ", "style_guide": ""}}]"#
        )
        .unwrap();

        let err = PersonaRegistry::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Persona { ref id, .. } if id == "coo"));
    }
}
