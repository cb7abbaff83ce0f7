//! `/kb` command handlers. Network work runs on the runtime and reports
//! back through [`TaskEvent::Log`].

use std::fs;
use std::path::Path;

use coworker::constants::DIMENSION_PROBE_TEXT;

use super::super::logging::LogLevel;
use super::super::{App, TaskEvent, log_src};

impl App {
    pub(crate) fn handle_kb_command(&mut self, args: Vec<&str>) {
        match args.first().copied() {
            None | Some("status") => self.show_kb_status(),
            Some("ingest") => match args.get(1) {
                Some(path) => self.ingest_file(path),
                None => self.log(LogLevel::Warn, "Usage: /kb ingest <path>".to_string()),
            },
            Some("clear") => self.clear_kb(),
            Some("check") => self.check_kb_dimension(),
            Some(other) => log_src!(self, LogLevel::Warn, format!("Unknown /kb command: {other}")),
        }
    }

    fn show_kb_status(&mut self) {
        let Some(kb) = self.knowledge.clone() else {
            self.log(
                LogLevel::Warn,
                "Knowledge base is off: set GEMINI_API_KEY to enable retrieval.".to_string(),
            );
            return;
        };
        let store = kb.store().clone();
        let models = self
            .gemini
            .as_ref()
            .map(|g| format!("{} / {}", g.llm_model(), g.embed_model()))
            .unwrap_or_default();
        self.log(
            LogLevel::Info,
            format!(
                "Qdrant {} collection '{}' ({} dims). Models: {models}",
                store.url(),
                store.collection(),
                store.vector_size()
            ),
        );

        let tx = self.task_tx.clone();
        self.runtime.spawn(async move {
            let (level, message) = match store.exists().await {
                Ok(true) => (LogLevel::Info, "Collection is present.".to_string()),
                Ok(false) => (
                    LogLevel::Warn,
                    "Collection does not exist yet. Try /kb ingest <path>.".to_string(),
                ),
                Err(err) => (LogLevel::Error, format!("Qdrant unreachable: {err}")),
            };
            let _ = tx.send(TaskEvent::Log { level, message });
        });
    }

    fn ingest_file(&mut self, path: &str) {
        let Some(kb) = self.knowledge.clone() else {
            self.log(LogLevel::Warn, "Knowledge base is off.".to_string());
            return;
        };
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                log_src!(self, LogLevel::Error, format!("Cannot read {path}: {err}"));
                return;
            }
        };
        let source = Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string());

        self.log(LogLevel::Info, format!("Ingesting {source}…"));
        let tx = self.task_tx.clone();
        self.runtime.spawn(async move {
            let (level, message) = match kb.ingest(&source, &text).await {
                Ok(0) => (LogLevel::Warn, format!("{source} had no paragraphs to ingest.")),
                Ok(n) => (LogLevel::Info, format!("Ingested {n} chunk(s) from {source}.")),
                Err(err) => (LogLevel::Error, format!("Ingest of {source} failed: {err}")),
            };
            let _ = tx.send(TaskEvent::Log { level, message });
        });
    }

    fn clear_kb(&mut self) {
        let Some(kb) = self.knowledge.clone() else {
            self.log(LogLevel::Warn, "Knowledge base is off.".to_string());
            return;
        };
        let tx = self.task_tx.clone();
        self.runtime.spawn(async move {
            let store = kb.store();
            let (level, message) = match store.clear_collection().await {
                Ok(()) => (
                    LogLevel::Info,
                    format!("Collection '{}' dropped.", store.collection()),
                ),
                Err(err) => (LogLevel::Error, format!("Clear failed: {err}")),
            };
            let _ = tx.send(TaskEvent::Log { level, message });
        });
    }

    fn check_kb_dimension(&mut self) {
        let Some(kb) = self.knowledge.clone() else {
            self.log(LogLevel::Warn, "Knowledge base is off.".to_string());
            return;
        };
        let tx = self.task_tx.clone();
        self.runtime.spawn(async move {
            let (level, message) = match kb.check_dimension(DIMENSION_PROBE_TEXT).await {
                Ok(report) if report.matches() => (
                    LogLevel::Info,
                    format!("{} returns {} dims, matching the collection.", report.model, report.actual),
                ),
                Ok(report) => (
                    LogLevel::Warn,
                    format!(
                        "{} returns {} dims but the collection expects {}.",
                        report.model, report.actual, report.expected
                    ),
                ),
                Err(err) => (LogLevel::Error, format!("Dimension check failed: {err}")),
            };
            let _ = tx.send(TaskEvent::Log { level, message });
        });
    }
}
