use std::cell::{Cell, RefCell};
use std::time::Duration;

use super::report::{ClearReport, Step, StepOutcome};
use super::steps;
use crate::common::config::ClearerConfig;
use crate::common::errors::ClearError;
use crate::env::BrowserEnv;
use crate::ui::{self, Indicator};

/// How a clearing request ended when it did not error
#[derive(Debug, Clone)]
pub enum CleanOutcome {
    /// Marker already matched the target; nothing was touched
    Skipped,
    /// A full pass ran and the marker now equals the target
    Cleaned(ClearReport),
}

impl CleanOutcome {
    pub fn performed(&self) -> bool {
        matches!(self, CleanOutcome::Cleaned(_))
    }

    pub fn report(&self) -> Option<&ClearReport> {
        match self {
            CleanOutcome::Skipped => None,
            CleanOutcome::Cleaned(report) => Some(report),
        }
    }
}

/// Clears a page's persisted state once per target version.
///
/// One instance per page, owned by whoever composes the page. Interior
/// mutability keeps every entry point on `&self`, matching a
/// single-threaded event loop where calls may interleave at await points.
/// Two overlapping calls are not serialized: both can see a stale marker
/// and both run a full pass.
pub struct VersionGatedCleaner {
    config: ClearerConfig,
    target: RefCell<String>,
    env: BrowserEnv,
    performed: Cell<bool>,
    last_report: RefCell<Option<ClearReport>>,
}

impl VersionGatedCleaner {
    pub fn new(config: ClearerConfig, env: BrowserEnv) -> Self {
        let target = RefCell::new(config.target_version.clone());
        Self {
            config,
            target,
            env,
            performed: Cell::new(false),
            last_report: RefCell::new(None),
        }
    }

    /// Build a cleaner and run the load-time silent pass. Failures are
    /// logged when diagnostics are on and otherwise swallowed; the marker
    /// stays stale so the next load retries.
    pub async fn boot(config: ClearerConfig, env: BrowserEnv) -> Self {
        let cleaner = Self::new(config, env);
        if let Err(e) = cleaner.clean_silently().await {
            if cleaner.config.diagnostics {
                tracing::warn!("automatic cache clear failed: {}", e);
            }
        }
        cleaner
    }

    pub fn config(&self) -> &ClearerConfig {
        &self.config
    }

    pub fn target_version(&self) -> String {
        self.target.borrow().clone()
    }

    /// Stored marker, if readable
    pub fn stored_version(&self) -> Option<String> {
        match self.env.durable.get(&self.config.storage_key) {
            Ok(value) => value,
            Err(e) => {
                if self.config.diagnostics {
                    tracing::warn!("could not read version marker: {}", e);
                }
                None
            }
        }
    }

    /// True when the marker is absent, unreadable, or differs from the target
    pub fn needs_cleaning(&self) -> bool {
        match self.stored_version() {
            Some(stored) => stored != *self.target.borrow(),
            None => true,
        }
    }

    /// Whether a pass completed during this page lifetime
    pub fn was_cleaning_performed(&self) -> bool {
        self.performed.get()
    }

    /// Report of the most recent completed pass
    pub fn last_report(&self) -> Option<ClearReport> {
        self.last_report.borrow().clone()
    }

    /// Overwrite the target and the stored marker without clearing anything
    pub fn update_version(&self, version: &str) -> Result<(), ClearError> {
        *self.target.borrow_mut() = version.to_string();
        self.env
            .durable
            .set(&self.config.storage_key, version)
            .map_err(|source| ClearError::MarkerWrite {
                version: version.to_string(),
                source,
            })?;
        tracing::debug!("version marker set to {}", version);
        Ok(())
    }

    /// Run a pass if the marker is stale. Resolves `true` when one ran.
    pub async fn clean_silently(&self) -> Result<bool, ClearError> {
        Ok(self.clean().await?.performed())
    }

    /// Like `clean_silently`, but returns the pass report
    pub async fn clean(&self) -> Result<CleanOutcome, ClearError> {
        if !self.needs_cleaning() {
            tracing::debug!("marker matches {}, skipping", self.target.borrow());
            return Ok(CleanOutcome::Skipped);
        }
        self.run_pass().await.map(CleanOutcome::Cleaned)
    }

    /// Run a pass with progress feedback rendered into element `mount_id`
    pub async fn clean_with_ui(&self, mount_id: &str) -> Result<bool, ClearError> {
        Ok(self.clean_with_ui_report(mount_id).await?.performed())
    }

    pub async fn clean_with_ui_report(&self, mount_id: &str) -> Result<CleanOutcome, ClearError> {
        let doc = self.env.document.clone();
        let mount = doc
            .element_by_id(mount_id)
            .ok_or_else(|| ClearError::MountNotFound(mount_id.to_string()))?;

        if !self.needs_cleaning() {
            return Ok(CleanOutcome::Skipped);
        }

        ui::render(doc.as_ref(), mount, mount_id, &Indicator::Progress)?;
        let shown_at = self.env.clock.now_millis();

        let result = self.run_pass().await;

        let elapsed = (self.env.clock.now_millis() - shown_at).max(0) as u64;
        let min_display = self.config.min_display.as_millis() as u64;
        if elapsed < min_display {
            self.env
                .clock
                .sleep(Duration::from_millis(min_display - elapsed))
                .await;
        }

        match result {
            Ok(report) => {
                // The pass is recorded by now; a failed final render is not a failed pass
                let version = report.version.clone();
                let done = Indicator::Complete { version: &version };
                if let Err(render_err) = ui::render(doc.as_ref(), mount, mount_id, &done) {
                    if self.config.diagnostics {
                        tracing::warn!("could not show completion: {}", render_err);
                    }
                }
                Ok(CleanOutcome::Cleaned(report))
            }
            Err(e) => {
                if let Err(render_err) = ui::render(doc.as_ref(), mount, mount_id, &Indicator::Error) {
                    if self.config.diagnostics {
                        tracing::warn!("could not show error state: {}", render_err);
                    }
                }
                Err(e)
            }
        }
    }

    /// The ordered clearing sequence followed by the marker write
    async fn run_pass(&self) -> Result<ClearReport, ClearError> {
        let version = self.target.borrow().clone();
        let env = &self.env;
        let mut report = ClearReport::new(&version, env.clock.now_millis());
        tracing::debug!("clearing persisted state for version {}", version);

        for step in Step::ALL {
            let outcome = match step {
                Step::DurableStore => steps::sweep_durable(env, &self.config.storage_key).await,
                Step::SessionStore => steps::sweep_session(env).await,
                Step::Cookies => steps::purge_cookies(env).await,
                Step::AppCache => steps::retire_app_cache(env).await,
                Step::Workers => steps::unregister_workers(env).await,
                Step::CacheStorage => steps::purge_cache_storage(env).await,
                Step::CacheBust => steps::bust_assets(env, &self.config).await,
            };
            self.log_outcome(step, &outcome);
            report.record(step, outcome);
        }

        env.durable
            .set(&self.config.storage_key, &version)
            .map_err(|source| ClearError::MarkerWrite {
                version: version.clone(),
                source,
            })?;
        report.marker_written = true;
        report.finish(env.clock.now_millis());

        self.performed.set(true);
        *self.last_report.borrow_mut() = Some(report.clone());
        tracing::debug!(
            "cleared for version {} in {}ms",
            version,
            report.duration_millis()
        );
        Ok(report)
    }

    fn log_outcome(&self, step: Step, outcome: &StepOutcome) {
        if !self.config.diagnostics {
            return;
        }
        match outcome {
            StepOutcome::Completed { affected } => tracing::debug!("{}: {} affected", step, affected),
            StepOutcome::Unsupported => tracing::debug!("{}: not supported here", step),
            StepOutcome::Failed { reason } => tracing::warn!("{} failed: {}", step, reason),
        }
    }
}
