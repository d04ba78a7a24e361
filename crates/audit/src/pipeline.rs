//! 감사 오케스트레이터 -- 탐색, 해석, 평가, 집계
//!
//! [`Auditor`]는 스캔 루트 아래의 모든 npm 프로젝트를 찾아 프로젝트마다
//! 해석기와 평가기를 실행하고 결과를 [`AuditRun`]으로 모읍니다.
//!
//! # 내부 아키텍처
//!
//! ```text
//! root --> discover_projects (spawn_blocking)
//!              |
//!              +--> [project_concurrency 제한 JoinSet]
//!                      |
//!                      +--> Resolver::resolve (spawn_blocking)
//!                      |
//!                      +--> join!(Vulnerability, Integrity, Forensics, Scripts) + Typosquat
//!                      |
//!                      +--> ProjectReport
//!              |
//!              +--> AuditRun (project_path 순 정렬)
//! ```
//!
//! 평가기 실패는 경고로 기록되고 감사는 계속됩니다. 실행 전체를 중단시키는 것은
//! 스캔 루트가 없거나 디렉토리가 아닌 경우, 그리고 태스크 join 실패뿐입니다.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{Instrument, debug, info, info_span, warn};

use lockwarden_core::config::LockwardenConfig;
use lockwarden_core::metrics as m;
use lockwarden_core::types::{AuditRun, PackageRef, ProjectReport, ResolutionMethod};

use crate::anchors::{OsvClient, RegistryClient};
use crate::discovery::discover_projects;
use crate::error::AuditError;
use crate::evaluate::{
    ForensicsEvaluator, IntegrityEvaluator, ScriptEvaluator, VulnerabilityEvaluator,
};
#[cfg(feature = "typosquat")]
use crate::evaluate::{SeedList, TyposquatEvaluator};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::resolver::Resolver;

/// 감사 오케스트레이터
///
/// 한 번의 [`run`](Auditor::run) 동안 레지스트리 문서는 이름별로 한 번만 조회됩니다.
/// 메모이즈는 `Auditor` 인스턴스에 묶여 있으므로, 실행 간 캐시를 원하지 않으면
/// 실행마다 새 인스턴스를 만들어야 합니다.
pub struct Auditor<F: Fetcher = HttpFetcher> {
    config: LockwardenConfig,
    shared: Arc<ProjectAuditor<F>>,
}

/// 프로젝트 태스크 간에 공유되는 구성 요소
struct ProjectAuditor<F: Fetcher> {
    resolver: Resolver,
    registry: Arc<RegistryClient<F>>,
    vulnerability: VulnerabilityEvaluator<F>,
    integrity: IntegrityEvaluator<F>,
    forensics: ForensicsEvaluator<F>,
    scripts: ScriptEvaluator<F>,
    #[cfg(feature = "typosquat")]
    typosquat: Option<TyposquatEvaluator>,
}

impl<F: Fetcher> Auditor<F> {
    /// 사용 중인 설정을 반환합니다.
    pub fn config(&self) -> &LockwardenConfig {
        &self.config
    }

    /// 타이포스쿼팅 평가기가 활성화되어 있는지 반환합니다.
    pub fn typosquat_enabled(&self) -> bool {
        #[cfg(feature = "typosquat")]
        {
            self.shared.typosquat.is_some()
        }
        #[cfg(not(feature = "typosquat"))]
        {
            false
        }
    }

    /// 스캔 루트 아래의 모든 프로젝트를 감사합니다.
    ///
    /// # Errors
    ///
    /// - [`AuditError::RootNotFound`] / [`AuditError::NotADirectory`]: 스캔 루트를 순회할 수 없음
    /// - [`AuditError::Join`]: 탐색 또는 프로젝트 태스크가 패닉/취소됨
    pub async fn run(&self, root: impl AsRef<Path>) -> Result<AuditRun, AuditError> {
        let root = root.as_ref().to_path_buf();
        let started_at = Utc::now();

        let metadata = tokio::fs::metadata(&root).await.map_err(|_| AuditError::RootNotFound {
            path: root.display().to_string(),
        })?;
        if !metadata.is_dir() {
            return Err(AuditError::NotADirectory {
                path: root.display().to_string(),
            });
        }

        let projects = {
            let root = root.clone();
            let max_depth = self.config.scan.max_depth;
            tokio::task::spawn_blocking(move || {
                discover_projects(&root, max_depth).collect::<Vec<_>>()
            })
            .await
            .map_err(|e| AuditError::Join(format!("project discovery failed: {e}")))?
        };

        info!(root = %root.display(), projects = projects.len(), "starting audit");

        let semaphore = Arc::new(Semaphore::new(self.config.scan.project_concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for project in projects {
            let shared = Arc::clone(&self.shared);
            let semaphore = Arc::clone(&semaphore);
            let span = info_span!("project", path = %project.display());
            tasks.spawn(
                async move {
                    let _permit = semaphore.acquire_owned().await;
                    shared.audit(project).await
                }
                .instrument(span),
            );
        }

        let mut reports = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let report = joined.map_err(|e| AuditError::Join(format!("project task failed: {e}")))??;
            reports.push(report);
        }
        reports.sort_by(|a, b| a.project_path.cmp(&b.project_path));

        let run = AuditRun {
            run_id: uuid::Uuid::new_v4(),
            root,
            started_at,
            reports,
        };

        info!(
            run_id = %run.run_id,
            projects = run.reports.len(),
            packages = run.total_packages(),
            findings = run.total_findings(),
            "audit completed"
        );

        Ok(run)
    }
}

impl<F: Fetcher> ProjectAuditor<F> {
    async fn audit(self: Arc<Self>, project: PathBuf) -> Result<ProjectReport, AuditError> {
        let started = Instant::now();
        metrics::counter!(m::PROJECTS_SCANNED_TOTAL).increment(1);

        let resolution = {
            let shared = Arc::clone(&self);
            let path = project.clone();
            tokio::task::spawn_blocking(move || shared.resolver.resolve(&path))
                .await
                .map_err(|e| AuditError::Join(format!("resolution failed: {e}")))?
        };

        let mut report = ProjectReport::empty(&project);
        report.resolution_method = resolution.method;

        if let Some(e) = resolution.error {
            warn!(error = %e, "failed to resolve dependencies, skipping evaluation");
            report.resolution_error = Some(e.to_string());
            return Ok(report);
        }

        let Some(method) = resolution.method else {
            debug!("no dependency source, skipping evaluation");
            return Ok(report);
        };

        let packages = resolution.packages;
        report.package_count = packages.len();
        metrics::counter!(m::PACKAGES_RESOLVED_TOTAL, m::LABEL_METHOD => method.as_str())
            .increment(u64::try_from(packages.len()).unwrap_or(u64::MAX));

        self.evaluate(&packages, method, &mut report).await;

        for finding in &report.findings {
            metrics::counter!(m::FINDINGS_TOTAL, m::LABEL_CATEGORY => finding.category.as_str())
                .increment(1);
        }
        metrics::histogram!(m::PROJECT_AUDIT_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());

        info!(
            method = %method,
            packages = report.package_count,
            findings = report.findings.len(),
            warnings = report.warnings.len(),
            "project audited"
        );

        Ok(report)
    }

    async fn evaluate(
        &self,
        packages: &[PackageRef],
        method: ResolutionMethod,
        report: &mut ProjectReport,
    ) {
        if packages.is_empty() {
            return;
        }

        let (vulnerability, integrity, forensics, scripts) = tokio::join!(
            self.vulnerability.evaluate(packages),
            self.integrity.evaluate(packages, method),
            self.forensics.evaluate(packages),
            self.scripts.evaluate(packages),
        );

        for (evaluator, anchor, result) in [
            ("vulnerability", m::ANCHOR_OSV, vulnerability),
            ("integrity", m::ANCHOR_REGISTRY, integrity),
            ("forensics", m::ANCHOR_REGISTRY, forensics),
            ("scripts", m::ANCHOR_REGISTRY, scripts),
        ] {
            match result {
                Ok(findings) => report.findings.extend(findings),
                Err(e) => {
                    warn!(evaluator, error = %e, "evaluator failed, continuing");
                    metrics::counter!(m::TRANSPORT_FAILURES_TOTAL, m::LABEL_ANCHOR => anchor)
                        .increment(1);
                    report.warnings.push(format!("{evaluator} lookup failed: {e}"));
                }
            }
        }

        #[cfg(feature = "typosquat")]
        if let Some(typosquat) = &self.typosquat {
            report.findings.extend(typosquat.evaluate(packages));
        }

        self.collect_registry_warnings(packages, report).await;
    }

    /// 레지스트리 조회에 실패한 이름을 경고로 남깁니다.
    ///
    /// 문서는 이미 메모이즈되어 있으므로 추가 요청은 발생하지 않습니다.
    async fn collect_registry_warnings(&self, packages: &[PackageRef], report: &mut ProjectReport) {
        let names: BTreeSet<&str> = packages.iter().map(PackageRef::name).collect();
        for name in names {
            if let Err(e) = self.registry.packument(name).await {
                warn!(package = %name, error = %e, "registry metadata unavailable");
                metrics::counter!(m::TRANSPORT_FAILURES_TOTAL, m::LABEL_ANCHOR => m::ANCHOR_REGISTRY)
                    .increment(1);
                report
                    .warnings
                    .push(format!("registry metadata unavailable for {name}: {e}"));
            }
        }
    }
}

/// 감사 오케스트레이터 빌더
pub struct AuditorBuilder {
    config: LockwardenConfig,
    #[cfg(feature = "typosquat")]
    seeds: Option<SeedList>,
}

impl AuditorBuilder {
    /// 기본 설정으로 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: LockwardenConfig::default(),
            #[cfg(feature = "typosquat")]
            seeds: None,
        }
    }

    /// 설정을 지정합니다.
    pub fn config(mut self, config: LockwardenConfig) -> Self {
        self.config = config;
        self
    }

    /// 타이포스쿼팅 seed 목록을 교체합니다.
    ///
    /// 지정하지 않으면 기본 목록에 `typosquat.extra_seeds`를 더한 목록을 사용합니다.
    #[cfg(feature = "typosquat")]
    pub fn seeds(mut self, seeds: SeedList) -> Self {
        self.seeds = Some(seeds);
        self
    }

    /// `reqwest` 기반 전송으로 오케스트레이터를 빌드합니다.
    pub fn build(self) -> Result<Auditor<HttpFetcher>, AuditError> {
        self.config.validate()?;
        let fetcher = Arc::new(HttpFetcher::new(&self.config.sources)?);
        self.build_with_fetcher(fetcher)
    }

    /// 지정한 전송으로 오케스트레이터를 빌드합니다.
    pub fn build_with_fetcher<F: Fetcher>(self, fetcher: Arc<F>) -> Result<Auditor<F>, AuditError> {
        self.config.validate()?;

        let config = self.config;
        let concurrency = config.scan.request_concurrency;

        let osv = Arc::new(OsvClient::new(Arc::clone(&fetcher), &config.sources));
        let registry = Arc::new(RegistryClient::new(fetcher, &config.sources));

        #[cfg(feature = "typosquat")]
        let typosquat = if config.typosquat.enabled {
            let seeds = self.seeds.unwrap_or_else(|| {
                SeedList::builtin().with_extra(config.typosquat.extra_seeds.iter().cloned())
            });
            TyposquatEvaluator::try_new(seeds)
        } else {
            None
        };

        #[cfg(not(feature = "typosquat"))]
        if config.typosquat.enabled {
            debug!("typosquat detection requested but not compiled in");
        }

        let shared = ProjectAuditor {
            resolver: Resolver::new(config.scan.max_file_size),
            vulnerability: VulnerabilityEvaluator::new(osv, concurrency),
            integrity: IntegrityEvaluator::new(Arc::clone(&registry), concurrency),
            forensics: ForensicsEvaluator::new(
                Arc::clone(&registry),
                &config.forensics,
                concurrency,
            ),
            scripts: ScriptEvaluator::new(Arc::clone(&registry), concurrency),
            registry,
            #[cfg(feature = "typosquat")]
            typosquat,
        };

        Ok(Auditor {
            config,
            shared: Arc::new(shared),
        })
    }
}

impl Default for AuditorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MockFetcher;
    use lockwarden_core::types::FindingCategory;
    use serde_json::json;
    use std::fs;

    const BATCH: &str = "https://api.osv.dev/v1/querybatch";

    fn auditor(fetcher: MockFetcher) -> (Auditor<MockFetcher>, Arc<MockFetcher>) {
        let fetcher = Arc::new(fetcher);
        let auditor = AuditorBuilder::new()
            .build_with_fetcher(Arc::clone(&fetcher))
            .unwrap();
        (auditor, fetcher)
    }

    fn write_lockfile(dir: &Path, body: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join("package.json"), "{}").unwrap();
        fs::write(dir.join("package-lock.json"), body).unwrap();
    }

    #[test]
    fn builder_rejects_invalid_config() {
        let mut config = LockwardenConfig::default();
        config.scan.max_depth = 0;
        let result = AuditorBuilder::new()
            .config(config)
            .build_with_fetcher(Arc::new(MockFetcher::new()));
        assert!(matches!(result, Err(AuditError::Config { .. })));
    }

    #[test]
    fn builder_creates_http_auditor() {
        let auditor = AuditorBuilder::new().build().unwrap();
        assert_eq!(auditor.config().scan.max_depth, 32);
    }

    #[test]
    fn typosquat_can_be_disabled_by_config() {
        let mut config = LockwardenConfig::default();
        config.typosquat.enabled = false;
        let auditor = AuditorBuilder::new()
            .config(config)
            .build_with_fetcher(Arc::new(MockFetcher::new()))
            .unwrap();
        assert!(!auditor.typosquat_enabled());
    }

    #[tokio::test]
    async fn missing_root_is_fatal() {
        let (auditor, _) = auditor(MockFetcher::new());
        let err = auditor.run("/definitely/not/here").await.unwrap_err();
        assert!(matches!(err, AuditError::RootNotFound { .. }));
    }

    #[tokio::test]
    async fn file_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("package.json");
        fs::write(&file, "{}").unwrap();
        let (auditor, _) = auditor(MockFetcher::new());
        let err = auditor.run(&file).await.unwrap_err();
        assert!(matches!(err, AuditError::NotADirectory { .. }));
    }

    #[tokio::test]
    async fn empty_tree_yields_no_reports() {
        let dir = tempfile::tempdir().unwrap();
        let (auditor, fetcher) = auditor(MockFetcher::new());
        let run = auditor.run(dir.path()).await.unwrap();
        assert!(run.reports.is_empty());
        assert_eq!(fetcher.total_calls(), 0);
    }

    #[tokio::test]
    async fn transport_failures_become_warnings_not_findings() {
        let dir = tempfile::tempdir().unwrap();
        write_lockfile(
            dir.path(),
            r#"{"packages": {"node_modules/left-pad": {"version": "1.3.0", "integrity": "sha512-AAAA"}}}"#,
        );
        let (auditor, _) = auditor(MockFetcher::new().with_status(BATCH, 500));

        let run = auditor.run(dir.path()).await.unwrap();
        assert_eq!(run.reports.len(), 1);
        let report = &run.reports[0];
        assert_eq!(report.resolution_method, Some(ResolutionMethod::Lockfile));
        assert_eq!(report.package_count, 1);
        assert!(report.findings.is_empty());
        assert!(report.warnings.iter().any(|w| w.starts_with("vulnerability lookup failed")));
        assert!(
            report
                .warnings
                .iter()
                .any(|w| w.starts_with("registry metadata unavailable for left-pad"))
        );
    }

    #[tokio::test]
    async fn registry_is_fetched_once_across_projects_and_evaluators() {
        let dir = tempfile::tempdir().unwrap();
        let lock = r#"{"packages": {"node_modules/left-pad": {"version": "1.3.0", "integrity": "sha512-AAAA"}}}"#;
        write_lockfile(&dir.path().join("a"), lock);
        write_lockfile(&dir.path().join("b"), lock);

        let registry_url = "https://registry.npmjs.org/left-pad";
        let (auditor, fetcher) = auditor(
            MockFetcher::new()
                .with_json(BATCH, json!({"results": [{}]}))
                .with_json(
                    registry_url,
                    json!({
                        "versions": {
                            "1.0.0": {}, "1.1.0": {},
                            "1.3.0": {"dist": {"integrity": "sha512-AAAA"}, "scripts": {"install": "node-gyp rebuild"}}
                        },
                        "time": {"1.3.0": "2018-04-09T00:00:00.000Z"}
                    }),
                ),
        );

        let run = auditor.run(dir.path()).await.unwrap();
        assert_eq!(run.reports.len(), 2);
        assert_eq!(fetcher.calls(registry_url), 1);
        assert_eq!(fetcher.calls(BATCH), 2);

        for report in &run.reports {
            assert_eq!(report.findings_in(FindingCategory::Script).count(), 1);
            assert_eq!(report.findings_in(FindingCategory::Integrity).count(), 0);
            assert!(report.warnings.is_empty());
        }
        assert!(run.reports[0].project_path < run.reports[1].project_path);
    }

    #[tokio::test]
    async fn parse_error_is_reported_on_project() {
        let dir = tempfile::tempdir().unwrap();
        write_lockfile(dir.path(), "{ broken");
        let (auditor, fetcher) = auditor(MockFetcher::new());

        let run = auditor.run(dir.path()).await.unwrap();
        let report = &run.reports[0];
        assert_eq!(report.resolution_method, Some(ResolutionMethod::Lockfile));
        assert!(report.resolution_error.is_some());
        assert_eq!(report.package_count, 0);
        assert_eq!(fetcher.total_calls(), 0);
    }
}
