//! Reporting capability handed down into the importers
//!
//! Importers never log through a global logger directly; they receive a
//! `Reporter` so that recoverable data problems (missing columns, unknown
//! references, malformed values) can be captured and asserted on in tests
//! while production runs forward everything to `tracing`.

use std::sync::Mutex;

/// Severity of a reported import event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Debug,
}

/// Sink for import-time diagnostics
pub trait Reporter {
    fn report(&self, severity: Severity, message: &str);

    fn error(&self, message: &str) {
        self.report(Severity::Error, message);
    }

    fn warning(&self, message: &str) {
        self.report(Severity::Warning, message);
    }

    fn info(&self, message: &str) {
        self.report(Severity::Info, message);
    }

    fn debug(&self, message: &str) {
        self.report(Severity::Debug, message);
    }
}

/// Production reporter: forwards everything to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Error => tracing::error!(target: "herbarium::import", "{}", message),
            Severity::Warning => tracing::warn!(target: "herbarium::import", "{}", message),
            Severity::Info => tracing::info!(target: "herbarium::import", "{}", message),
            Severity::Debug => tracing::debug!(target: "herbarium::import", "{}", message),
        }
    }
}

/// A recorded import event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub severity: Severity,
    pub message: String,
}

/// Test reporter: records events for later assertion
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<Event>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Messages recorded at the given severity, in order
    pub fn messages(&self, severity: Severity) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.severity == severity)
            .map(|e| e.message.clone())
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.messages(Severity::Error)
    }

    pub fn contains(&self, severity: Severity, fragment: &str) -> bool {
        self.events
            .lock()
            .unwrap()
            .iter()
            .any(|e| e.severity == severity && e.message.contains(fragment))
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, severity: Severity, message: &str) {
        self.events.lock().unwrap().push(Event {
            severity,
            message: message.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_reporter_captures_events() {
        let reporter = RecordingReporter::new();
        reporter.error("unknown character: leaf_shape_xy");
        reporter.warning("row without underscore");
        reporter.info("loading taxa");

        assert_eq!(reporter.errors(), vec!["unknown character: leaf_shape_xy"]);
        assert!(reporter.contains(Severity::Warning, "underscore"));
        assert!(!reporter.contains(Severity::Error, "underscore"));
        assert_eq!(reporter.events().len(), 3);
    }

    #[test]
    fn test_messages_filter_by_severity() {
        let reporter = RecordingReporter::new();
        reporter.debug("collision on taxon 'Acer rubrum'");
        reporter.debug("collision on taxon 'Acer saccharum'");
        reporter.error("bad float value: '2,5'");

        assert_eq!(reporter.messages(Severity::Debug).len(), 2);
        assert_eq!(reporter.messages(Severity::Error).len(), 1);
    }
}
