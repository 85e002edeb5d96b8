use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// The fixed steps of a clearing pass, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    DurableStore,
    SessionStore,
    Cookies,
    AppCache,
    Workers,
    CacheStorage,
    CacheBust,
}

impl Step {
    pub const ALL: [Step; 7] = [
        Step::DurableStore,
        Step::SessionStore,
        Step::Cookies,
        Step::AppCache,
        Step::Workers,
        Step::CacheStorage,
        Step::CacheBust,
    ];
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::DurableStore => write!(f, "Durable storage"),
            Step::SessionStore => write!(f, "Session storage"),
            Step::Cookies => write!(f, "Cookies"),
            Step::AppCache => write!(f, "Application cache"),
            Step::Workers => write!(f, "Service workers"),
            Step::CacheStorage => write!(f, "Cache storage"),
            Step::CacheBust => write!(f, "Asset cache-busting"),
        }
    }
}

/// What happened to one step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    /// Step ran; `affected` counts the things it removed or rewrote
    Completed { affected: usize },
    /// The environment lacks the capability this step needs
    Unsupported,
    /// Step errored; the pass carried on without it
    Failed { reason: String },
}

impl StepOutcome {
    pub fn done(affected: usize) -> Self {
        StepOutcome::Completed { affected }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        StepOutcome::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, StepOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    pub step: Step,
    pub outcome: StepOutcome,
}

/// Aggregated result of one clearing pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearReport {
    /// Version the pass cleared for
    pub version: String,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// One entry per step, in execution order
    pub steps: Vec<StepReport>,

    /// Whether the version marker was written
    pub marker_written: bool,
}

impl ClearReport {
    pub fn new(version: &str, started_millis: i64) -> Self {
        let started_at = millis_to_utc(started_millis);
        Self {
            version: version.to_string(),
            started_at,
            finished_at: started_at,
            steps: Vec::with_capacity(Step::ALL.len()),
            marker_written: false,
        }
    }

    pub fn record(&mut self, step: Step, outcome: StepOutcome) {
        self.steps.push(StepReport { step, outcome });
    }

    pub fn finish(&mut self, finished_millis: i64) {
        self.finished_at = millis_to_utc(finished_millis);
    }

    pub fn outcome(&self, step: Step) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|r| r.step == step)
            .map(|r| &r.outcome)
    }

    pub fn failures(&self) -> Vec<&StepReport> {
        self.steps.iter().filter(|r| r.outcome.is_failure()).collect()
    }

    pub fn duration_millis(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

fn millis_to_utc(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failures_and_lookup() {
        let mut report = ClearReport::new("V2.1", 1_700_000_000_000);
        report.record(Step::DurableStore, StepOutcome::done(3));
        report.record(Step::AppCache, StepOutcome::failed("InvalidStateError"));
        report.record(Step::Workers, StepOutcome::Unsupported);
        report.finish(1_700_000_000_250);

        assert_eq!(report.failures().len(), 1);
        assert_eq!(report.outcome(Step::DurableStore), Some(&StepOutcome::done(3)));
        assert_eq!(report.outcome(Step::Cookies), None);
        assert_eq!(report.duration_millis(), 250);
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let json = serde_json::to_string(&StepOutcome::failed("boom")).unwrap();
        assert_eq!(json, r#"{"status":"failed","reason":"boom"}"#);
    }
}
