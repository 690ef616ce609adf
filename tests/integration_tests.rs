use chrono::Local;
use std::time::Duration;
use webrecon::{
    artifacts::{self, ArtifactNamer},
    config::Config,
    environment,
    executor::{self, CommandStatus},
    tasks::{Orchestrator, CATALOG},
    Result,
};

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(config.target.default_port, 443);
    assert_eq!(
        config.directories.scan_dir.to_string_lossy(),
        "scan_results"
    );
    assert_eq!(
        config.directories.reports_dir.to_string_lossy(),
        "Nmap-reports-files"
    );

    assert_eq!(config.default_timeout(), Duration::from_secs(300));
    assert_eq!(config.extended_timeout(), Duration::from_secs(600));
    assert_eq!(config.install_timeout(), Duration::from_secs(300));
    assert_eq!(config.session_ceiling(), Duration::from_secs(1800));
}

#[test]
fn test_config_save_load_roundtrip() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("webrecon.toml");

    let mut config = Config::default();
    config.target.default_port = 8443;
    config.execution.default_timeout = 120;
    config.save_to_file(&path.to_string_lossy())?;

    let loaded = Config::load_from_file(&path.to_string_lossy())?;
    assert_eq!(loaded.target.default_port, 8443);
    assert_eq!(loaded.default_timeout(), Duration::from_secs(120));
    assert_eq!(loaded.directories.scan_dir, config.directories.scan_dir);

    Ok(())
}

#[test]
fn test_artifact_names_never_collide() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let namer = ArtifactNamer::new(dir.path());

    let mut names = Vec::new();
    for _ in 0..5 {
        let base = namer.next_name("sslscan");
        // Claim one extension; the next allocation must move on.
        std::fs::write(namer.path_for(&base, "txt"), b"")?;
        names.push(base);
    }

    let mut unique = names.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), names.len());

    Ok(())
}

#[test]
fn test_artifact_counter_skips_any_claimed_extension() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let namer = ArtifactNamer::new(dir.path());
    let date = Local::now().format("%Y%m%d");

    // A leftover .html with counter 0 claims the whole base name.
    std::fs::write(dir.path().join(format!("{}-nikto-0.html", date)), b"")?;

    let base = namer.next_name("nikto");
    assert_eq!(base, format!("{}-nikto-1", date));

    Ok(())
}

#[test]
fn test_result_listing_and_path_safety() -> Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("20250101-sslscan-0.txt"), b"output")?;

    let results = artifacts::list_results(dir.path())?;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].name, "20250101-sslscan-0.txt");
    assert_eq!(results[0].extension, "txt");
    assert_eq!(results[0].size, 6);

    assert!(artifacts::result_path(dir.path(), "20250101-sslscan-0.txt").is_ok());
    assert!(artifacts::result_path(dir.path(), "../etc/passwd").is_err());
    assert!(artifacts::result_path(dir.path(), "missing.txt").is_err());

    Ok(())
}

#[tokio::test]
async fn test_executor_classifies_outcomes() {
    let ok = executor::execute("true", &[], Duration::from_secs(5)).await;
    assert_eq!(ok.status, CommandStatus::Success);

    let failed = executor::execute("false", &[], Duration::from_secs(5)).await;
    assert_eq!(failed.status, CommandStatus::ToolFailure(1));

    let missing = executor::execute(
        "definitely-not-a-real-binary-xyz",
        &[],
        Duration::from_secs(5),
    )
    .await;
    assert!(matches!(missing.status, CommandStatus::ExecutionError(_)));
}

#[tokio::test]
async fn test_run_all_reports_every_cataloged_task() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut config = Config::default();
    config.directories.scan_dir = dir.path().join("scan_results");
    // Keep the run short: any task that actually executes against the
    // reserved .invalid TLD fails fast, and the budget caps stragglers.
    config.execution.default_timeout = 15;
    config.execution.extended_timeout = 15;

    let env = environment::detect_environment();
    let orchestrator = Orchestrator::new(config, env)?;

    let outcomes = orchestrator.run_all("test.invalid", 443).await;

    assert_eq!(outcomes.len(), CATALOG.len());
    for (outcome, task) in outcomes.iter().zip(CATALOG.iter()) {
        assert_eq!(outcome.kind, task.kind);
        for artifact in &outcome.artifacts {
            assert!(artifact.starts_with(dir.path()));
        }
    }

    Ok(())
}

#[tokio::test]
async fn test_orchestrator_creates_scan_directory() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut config = Config::default();
    config.directories.scan_dir = dir.path().join("nested").join("scan_results");

    let env = environment::detect_environment();
    let _orchestrator = Orchestrator::new(config.clone(), env)?;

    assert!(config.directories.scan_dir.is_dir());
    Ok(())
}
