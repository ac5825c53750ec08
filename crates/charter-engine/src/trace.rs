//! Structured run trace
//!
//! Ordered record of everything the orchestrator did: one event per attempt
//! and per section outcome, serializable to JSON alongside the other run
//! artifacts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Event outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceStatus {
    /// The step succeeded
    Ok,
    /// The step failed (possibly recoverably)
    Error,
}

/// One structured trace event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Position in the run, assigned at record time
    pub seq: u64,
    /// When the event was recorded
    pub timestamp: DateTime<Utc>,
    /// Emitting component, e.g. `orchestrator`
    pub component: String,
    /// What happened, e.g. `generate_attempt`
    pub action: String,
    /// Outcome
    pub status: TraceStatus,
    /// Section the event belongs to, when applicable
    pub section_id: Option<String>,
    /// Attempt index (1-based), when applicable
    pub attempt: Option<u32>,
    /// Step duration, when measured
    pub duration_ms: Option<u64>,
    /// Free-form detail
    pub details: Option<String>,
}

impl TraceEvent {
    /// Create an `Ok` event; `seq` is assigned when recorded
    #[must_use]
    pub fn new(component: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            seq: 0,
            timestamp: Utc::now(),
            component: component.into(),
            action: action.into(),
            status: TraceStatus::Ok,
            section_id: None,
            attempt: None,
            duration_ms: None,
            details: None,
        }
    }

    /// Mark the event as failed
    #[must_use]
    pub fn failed(mut self) -> Self {
        self.status = TraceStatus::Error;
        self
    }

    /// Attach the owning section
    #[must_use]
    pub fn with_section(mut self, section_id: impl Into<String>) -> Self {
        self.section_id = Some(section_id.into());
        self
    }

    /// Attach the attempt index
    #[must_use]
    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = Some(attempt);
        self
    }

    /// Attach a measured duration
    #[must_use]
    pub fn with_duration(mut self, duration: std::time::Duration) -> Self {
        self.duration_ms = Some(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Attach free-form detail
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Ordered, run-scoped trace collector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunTrace {
    /// Run identifier
    run_id: Ulid,
    /// Events in record order
    events: Vec<TraceEvent>,
}

impl RunTrace {
    /// Start a new trace with a fresh run id
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            run_id: Ulid::new(),
            events: Vec::new(),
        }
    }

    /// The run identifier
    #[inline]
    #[must_use]
    pub fn run_id(&self) -> Ulid {
        self.run_id
    }

    /// Record an event, assigning the next sequence number
    pub fn record(&mut self, mut event: TraceEvent) {
        event.seq = self.events.len() as u64 + 1;
        self.events.push(event);
    }

    /// Recorded events in order
    #[inline]
    #[must_use]
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Serialize the trace to pretty JSON
    ///
    /// # Errors
    /// Returns the underlying serde error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        Ok(text)
    }
}

impl Default for RunTrace {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_assigns_sequence() {
        let mut trace = RunTrace::new();
        trace.record(TraceEvent::new("orchestrator", "start"));
        trace.record(
            TraceEvent::new("orchestrator", "generate_attempt")
                .with_section("a")
                .with_attempt(1)
                .failed(),
        );
        assert_eq!(trace.events().len(), 2);
        assert_eq!(trace.events()[0].seq, 1);
        assert_eq!(trace.events()[1].seq, 2);
        assert_eq!(trace.events()[1].status, TraceStatus::Error);
        assert_eq!(trace.events()[1].section_id.as_deref(), Some("a"));
    }

    #[test]
    fn json_round_trip() {
        let mut trace = RunTrace::new();
        trace.record(
            TraceEvent::new("orchestrator", "section_complete")
                .with_section("a")
                .with_duration(std::time::Duration::from_millis(12))
                .with_details("status=complete"),
        );
        let json = trace.to_json().unwrap();
        let decoded: RunTrace = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.run_id(), trace.run_id());
        assert_eq!(decoded.events(), trace.events());
    }
}
