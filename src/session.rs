use crate::config::Config;
use crate::environment::EnvironmentInfo;
use crate::tasks::{self, Orchestrator, ScanKind, TaskStatus};
use chrono::{DateTime, Utc};
use log::{info, warn};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use tokio::time::timeout;

/// What a background session was asked to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanSelector {
    All,
    One(ScanKind),
}

impl ScanSelector {
    pub fn parse(selector: &str) -> Option<ScanSelector> {
        if selector == "all" {
            Some(ScanSelector::All)
        } else {
            ScanKind::from_selector(selector).map(ScanSelector::One)
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScanSelector::All => "all",
            ScanSelector::One(kind) => kind.selector(),
        }
    }
}

/// Descriptor of the scan a session is currently running.
#[derive(Debug, Clone, Serialize)]
pub struct SessionTask {
    pub domain: String,
    pub port: u16,
    pub scan_type: String,
    pub start_time: DateTime<Utc>,
}

/// Pollable status snapshot. Written only by the session task; read by any
/// number of concurrent pollers.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub running: bool,
    pub current_scan: Option<SessionTask>,
    pub progress: u8,
    pub message: String,
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self {
            running: false,
            current_scan: None,
            progress: 0,
            message: String::new(),
        }
    }
}

/// Why a start request was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartError {
    /// One session at a time; a second request is rejected, never queued.
    AlreadyRunning,
    MissingDomain,
}

impl std::fmt::Display for StartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StartError::AlreadyRunning => write!(f, "Scan already in progress"),
            StartError::MissingDomain => write!(f, "Domain is required"),
        }
    }
}

/// Owns the single background scan session and its shared status record.
pub struct SessionManager {
    config: Config,
    env: EnvironmentInfo,
    status: Arc<RwLock<SessionStatus>>,
}

impl SessionManager {
    pub fn new(config: Config, env: EnvironmentInfo) -> Self {
        Self {
            config,
            env,
            status: Arc::new(RwLock::new(SessionStatus::default())),
        }
    }

    /// Snapshot of the current status.
    pub fn poll(&self) -> SessionStatus {
        self.status.read().clone()
    }

    /// JSON rendering of the current status, for web front-ends polling over
    /// HTTP.
    pub fn poll_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(&self.poll())?)
    }

    /// Start a background session. Exactly one may run at a time; the
    /// check-and-claim happens under a single write lock so two racing
    /// starts cannot both be accepted.
    pub fn start(
        &self,
        domain: &str,
        port: u16,
        selector: ScanSelector,
    ) -> std::result::Result<(), StartError> {
        if tasks::validate_domain(domain).is_err() {
            return Err(StartError::MissingDomain);
        }

        {
            let mut status = self.status.write();
            if status.running {
                return Err(StartError::AlreadyRunning);
            }

            *status = SessionStatus {
                running: true,
                current_scan: Some(SessionTask {
                    domain: domain.to_string(),
                    port,
                    scan_type: selector.name().to_string(),
                    start_time: Utc::now(),
                }),
                progress: 0,
                message: "Starting scan...".to_string(),
            };
        }

        let status = Arc::clone(&self.status);
        let config = self.config.clone();
        let env = self.env;
        let domain = domain.to_string();

        tokio::spawn(async move {
            let ceiling = config.session_ceiling();
            let session = run_session(config, env, Arc::clone(&status), domain, port, selector);

            // Dropping the session future on expiry kills any in-flight
            // external process (spawned with kill_on_drop).
            if timeout(ceiling, session).await.is_err() {
                warn!("Background session exceeded its ceiling and was terminated");
                publish(
                    &status,
                    100,
                    format!("Scan timed out after {} minutes", ceiling.as_secs() / 60),
                );
            }

            status.write().running = false;
        });

        Ok(())
    }
}

/// Each milestone is one short write so pollers never see a half-applied
/// update.
fn publish(status: &Arc<RwLock<SessionStatus>>, progress: u8, message: String) {
    let mut guard = status.write();
    guard.progress = progress;
    guard.message = message;
}

async fn run_session(
    config: Config,
    env: EnvironmentInfo,
    status: Arc<RwLock<SessionStatus>>,
    domain: String,
    port: u16,
    selector: ScanSelector,
) {
    publish(&status, 10, "Checking dependencies...".to_string());

    let orchestrator = match Orchestrator::new(config, env) {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            publish(&status, 100, format!("Error: {}", e));
            return;
        }
    };

    let missing = orchestrator.resolver().missing();
    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(|t| t.name()).collect();
        info!(
            "Missing tools: {}. Continuing with available tools.",
            names.join(", ")
        );
    }

    publish(
        &status,
        30,
        format!("Running {} scan on {}:{}...", selector.name(), domain, port),
    );
    publish(&status, 50, "Scan in progress...".to_string());

    let outcomes = match selector {
        ScanSelector::All => orchestrator.run_all(&domain, port).await,
        ScanSelector::One(kind) => {
            vec![orchestrator.run_one(tasks::task_for(kind), &domain, port).await]
        }
    };

    let failed: Vec<&str> = outcomes
        .iter()
        .filter(|o| matches!(o.status, TaskStatus::Failed(_) | TaskStatus::TimedOut(_)))
        .map(|o| o.title)
        .collect();

    let message = if failed.is_empty() {
        "Scan completed successfully".to_string()
    } else {
        format!("Scan finished; failed tasks: {}", failed.join(", "))
    };
    publish(&status, 100, message);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager_with_tempdir() -> (SessionManager, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.directories.scan_dir = dir.path().join("scan_results");

        let env = crate::environment::detect_environment();
        (SessionManager::new(config, env), dir)
    }

    #[tokio::test]
    async fn empty_domain_is_rejected() {
        let (manager, _dir) = manager_with_tempdir();
        let result = manager.start("", 443, ScanSelector::All);
        assert_eq!(result, Err(StartError::MissingDomain));
        assert!(!manager.poll().running);
    }

    #[tokio::test]
    async fn second_start_is_rejected_and_status_untouched() {
        let (manager, _dir) = manager_with_tempdir();

        manager
            .start("test.invalid", 443, ScanSelector::One(ScanKind::SslScan))
            .unwrap();
        let before = manager.poll();
        assert!(before.running);

        let rejected = manager.start("other.invalid", 8443, ScanSelector::All);
        assert_eq!(rejected, Err(StartError::AlreadyRunning));

        let after = manager.poll();
        let (Some(before_scan), Some(after_scan)) = (&before.current_scan, &after.current_scan)
        else {
            panic!("current scan descriptor missing");
        };
        assert_eq!(after_scan.domain, before_scan.domain);
        assert_eq!(after_scan.port, before_scan.port);
        assert_eq!(after_scan.scan_type, before_scan.scan_type);
    }

    #[tokio::test]
    async fn idle_status_serializes() {
        let (manager, _dir) = manager_with_tempdir();
        let json = manager.poll_json().unwrap();
        assert!(json.contains("\"running\":false"));
        assert!(json.contains("\"progress\":0"));
    }

    #[tokio::test]
    async fn selector_strings_parse() {
        assert_eq!(ScanSelector::parse("all"), Some(ScanSelector::All));
        assert_eq!(
            ScanSelector::parse("nikto"),
            Some(ScanSelector::One(ScanKind::Nikto))
        );
        assert_eq!(ScanSelector::parse("bogus"), None);
    }
}
