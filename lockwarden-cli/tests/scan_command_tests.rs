//! Integration tests for the `lockwarden` scan handler.
//!
//! These runs never reach the network: either the root is missing or
//! no project is discovered.

use std::fs;

use tempfile::TempDir;

use lockwarden_cli::cli::OutputFormat;
use lockwarden_cli::output::OutputWriter;
use lockwarden_cli::scan::{AuditReport, audit};
use lockwarden_core::config::LockwardenConfig;

#[tokio::test]
async fn test_scan_missing_root_exits_with_general_error() {
    // Given: A path that does not exist
    let temp_dir = TempDir::new().expect("should create temp dir");
    let missing = temp_dir.path().join("missing");

    // When: Auditing it
    let err = audit(&missing, LockwardenConfig::default())
        .await
        .expect_err("missing root should fail");

    // Then: Exit code 1 with the path in the message
    assert_eq!(err.exit_code(), 1);
    assert!(err.to_string().contains("scan root not found"));
}

#[tokio::test]
async fn test_scan_tree_without_manifests_reports_nothing() {
    // Given: A directory tree with no package.json anywhere
    let temp_dir = TempDir::new().expect("should create temp dir");
    fs::create_dir_all(temp_dir.path().join("src/lib")).expect("should create dirs");
    fs::write(temp_dir.path().join("README.md"), "# hello").expect("should write file");

    // When: Auditing it
    let run = audit(temp_dir.path(), LockwardenConfig::default())
        .await
        .expect("empty tree is not an error");

    // Then: No reports and the notice is rendered
    assert!(run.reports.is_empty());

    let mut buffer = Vec::new();
    OutputWriter::with_color(OutputFormat::Text, false)
        .render_to(&AuditReport::new(&run), &mut buffer)
        .expect("rendering should succeed");
    let output = String::from_utf8(buffer).expect("valid UTF-8");
    assert!(output.contains("No npm projects found."));
}

#[tokio::test]
async fn test_scan_project_without_dependencies_makes_no_requests() {
    // Given: A manifest with no dependencies and a dead registry URL
    let temp_dir = TempDir::new().expect("should create temp dir");
    fs::write(temp_dir.path().join("package.json"), r#"{"name": "empty"}"#)
        .expect("should write manifest");

    let mut config = LockwardenConfig::default();
    config.sources.registry_url = "http://127.0.0.1:9".to_owned();
    config.sources.osv_batch_url = "http://127.0.0.1:9/querybatch".to_owned();

    // When: Auditing it
    let run = audit(temp_dir.path(), config).await.expect("audit should succeed");

    // Then: The project is reported with zero packages and no warnings
    assert_eq!(run.reports.len(), 1);
    assert_eq!(run.reports[0].package_count, 0);
    assert!(run.reports[0].warnings.is_empty());
}

#[tokio::test]
async fn test_scan_rejects_invalid_config() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut config = LockwardenConfig::default();
    config.scan.project_concurrency = 0;

    let err = audit(temp_dir.path(), config)
        .await
        .expect_err("invalid config should fail");
    assert_eq!(err.exit_code(), 2);
}
