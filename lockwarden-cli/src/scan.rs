//! `lockwarden [PATH]` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use lockwarden_audit::AuditorBuilder;
use lockwarden_core::config::LockwardenConfig;
use lockwarden_core::types::{AuditRun, FindingCategory, ProjectReport};

use crate::cli::{Cli, DEFAULT_CONFIG_FILE};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Load the effective configuration: file (if any), env overrides, then CLI flags.
///
/// An explicit `--config` that does not exist is an error; a missing default
/// `lockwarden.toml` falls back to built-in defaults.
pub async fn load_config(cli: &Cli) -> Result<LockwardenConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => LockwardenConfig::load(path).await?,
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if tokio::fs::try_exists(default).await.unwrap_or(false) {
                LockwardenConfig::load(default).await?
            } else {
                LockwardenConfig::from_env()?
            }
        }
    };

    if let Some(level) = &cli.log_level {
        config.general.log_level = level.clone();
    }
    if cli.no_typosquat {
        config.typosquat.enabled = false;
    }

    config.validate()?;
    Ok(config)
}

/// Execute the audit and render the report.
pub async fn execute(
    cli: &Cli,
    config: LockwardenConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let run = audit(&cli.path, config).await?;

    writer.render(&AuditReport::new(&run))?;

    let total = run.total_findings();
    if cli.fail_on_findings && total > 0 {
        return Err(CliError::Findings(total));
    }

    Ok(())
}

/// Build an auditor from `config` and run it over `path`.
pub async fn audit(path: &Path, config: LockwardenConfig) -> Result<AuditRun, CliError> {
    let auditor = AuditorBuilder::new().config(config).build()?;
    info!(
        path = %path.display(),
        typosquat = auditor.typosquat_enabled(),
        "starting lockwarden audit"
    );
    Ok(auditor.run(path).await?)
}

/// Output payload for one audit run.
#[derive(Serialize)]
#[serde(transparent)]
pub struct AuditReport<'a> {
    run: &'a AuditRun,
}

impl<'a> AuditReport<'a> {
    pub fn new(run: &'a AuditRun) -> Self {
        Self { run }
    }
}

fn category_title(category: FindingCategory) -> &'static str {
    match category {
        FindingCategory::Vulnerability => "vulnerable packages",
        FindingCategory::Integrity => "integrity mismatches",
        FindingCategory::Forensics => "metadata warnings",
        FindingCategory::Script => "install scripts",
        FindingCategory::Typosquat => "potential typosquats",
    }
}

fn render_project(report: &ProjectReport, w: &mut dyn Write) -> std::io::Result<()> {
    use colored::Colorize;

    writeln!(w)?;
    writeln!(
        w,
        "Project: {}",
        report.project_path.display().to_string().bold().underline()
    )?;

    let Some(method) = report.resolution_method else {
        writeln!(w, "  {}", "No dependency information found.".red())?;
        return Ok(());
    };

    writeln!(w, "  Source: {method}")?;

    if let Some(error) = &report.resolution_error {
        writeln!(w, "  {} {}", "[!] Resolution failed:".red().bold(), error)?;
        return Ok(());
    }

    writeln!(w, "  Found {} packages.", report.package_count)?;

    for warning in &report.warnings {
        writeln!(w, "  {} {}", "[~]".yellow(), warning)?;
    }

    if report.package_count == 0 {
        return Ok(());
    }

    if !report.has_findings() {
        writeln!(w, "  {}", "[+] No issues found.".green())?;
        return Ok(());
    }

    for category in FindingCategory::ALL {
        let findings: Vec<_> = report.findings_in(category).collect();
        if findings.is_empty() {
            continue;
        }

        let header = format!("[!] {} {}:", findings.len(), category_title(category));
        writeln!(w, "  {}", header.red().bold())?;
        for finding in findings {
            match &finding.advisory_id {
                Some(id) => writeln!(
                    w,
                    "    - {} {} {}",
                    finding.subject.cyan(),
                    id.yellow(),
                    finding.message
                )?,
                None => writeln!(w, "    - {}: {}", finding.subject.cyan(), finding.message)?,
            }
        }
    }

    Ok(())
}

impl Render for AuditReport<'_> {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Scanning: {}", self.run.root.display().to_string().bold())?;

        if self.run.reports.is_empty() {
            writeln!(w, "{}", "No npm projects found.".red().bold())?;
            return Ok(());
        }

        for report in &self.run.reports {
            render_project(report, w)?;
        }

        let counts = self.run.category_counts();
        let breakdown = FindingCategory::ALL
            .iter()
            .map(|c| format!("{} {}", c, counts.get(*c)))
            .collect::<Vec<_>>()
            .join(", ");
        let totals = format!(
            "{} projects, {} packages, {} findings",
            self.run.reports.len(),
            self.run.total_packages(),
            counts.total()
        );

        writeln!(w)?;
        if counts.total() > 0 {
            writeln!(w, "Summary: {} ({})", totals.red().bold(), breakdown)?;
        } else {
            writeln!(w, "Summary: {} ({})", totals.green().bold(), breakdown)?;
        }

        Ok(())
    }
}
