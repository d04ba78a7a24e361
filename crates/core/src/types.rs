//! 도메인 타입 -- 해석된 패키지, 발견 사항, 프로젝트 리포트
//!
//! 모든 타입은 생성 후 변경되지 않으며 한 번의 감사 실행 안에서만 존재합니다.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 취약점 DB에서 npm 네임스페이스를 구분하는 생태계 태그
pub const NPM_ECOSYSTEM: &str = "npm";

/// 해석된 의존성 인스턴스 하나
///
/// `name`과 `version`은 항상 비어 있지 않습니다. 이 조건을 만족하지 않는 레코드는
/// [`PackageRef::new`]가 `None`을 반환하므로 평가기까지 도달하지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PackageRef {
    name: String,
    version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    integrity: Option<String>,
}

impl PackageRef {
    /// 새 패키지 참조를 생성합니다.
    ///
    /// 이름이나 버전이 비어 있으면 `None`을 반환합니다.
    /// 빈 문자열 integrity는 digest 없음으로 취급합니다.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        integrity: Option<String>,
    ) -> Option<Self> {
        let name = name.into();
        let version = version.into();
        if name.trim().is_empty() || version.trim().is_empty() {
            return None;
        }
        Some(Self {
            name,
            version,
            integrity: integrity.filter(|i| !i.is_empty()),
        })
    }

    /// 패키지 이름 (scope 접두사 포함 가능)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 구체적인 버전 토큰
    pub fn version(&self) -> &str {
        &self.version
    }

    /// lockfile에 기록된 content digest
    pub fn integrity(&self) -> Option<&str> {
        self.integrity.as_deref()
    }

    /// `name@version` 형식의 식별자를 반환합니다.
    pub fn subject(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

impl fmt::Display for PackageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// content digest의 세대 구분
///
/// 비교 여부를 결정하는 데 쓰이지 않으며 메시지와 로그 표시용입니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityDigest {
    /// `algorithm-base64digest` 형식 (예: `sha512-...`)
    Sri { algorithm: String },
    /// 16진수 digest (SHA-1 계열 `shasum`)
    LegacyHex,
    /// 어느 형식에도 해당하지 않음
    Unrecognized,
}

impl IntegrityDigest {
    /// digest 문자열의 형식을 판별합니다.
    pub fn classify(digest: &str) -> Self {
        if let Some((algorithm, rest)) = digest.split_once('-') {
            if !algorithm.is_empty()
                && algorithm.chars().all(|c| c.is_ascii_alphanumeric())
                && !rest.is_empty()
            {
                return Self::Sri {
                    algorithm: algorithm.to_ascii_lowercase(),
                };
            }
        }
        if !digest.is_empty() && digest.chars().all(|c| c.is_ascii_hexdigit()) {
            return Self::LegacyHex;
        }
        Self::Unrecognized
    }

    /// 표시용 라벨을 반환합니다.
    pub fn label(&self) -> &str {
        match self {
            Self::Sri { algorithm } => algorithm,
            Self::LegacyHex => "shasum",
            Self::Unrecognized => "unknown",
        }
    }
}

/// 패키지 목록을 만든 의존성 소스
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    /// `package-lock.json`
    Lockfile,
    /// `node_modules/` 설치 트리
    InstalledTree,
    /// `package.json`의 버전 범위
    Manifest,
}

impl ResolutionMethod {
    /// 메트릭 레이블에 쓰는 snake_case 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lockfile => "lockfile",
            Self::InstalledTree => "installed_tree",
            Self::Manifest => "manifest",
        }
    }
}

impl fmt::Display for ResolutionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lockfile => write!(f, "lockfile"),
            Self::InstalledTree => write!(f, "installed tree"),
            Self::Manifest => write!(f, "manifest"),
        }
    }
}

/// 발견 사항을 만든 평가기 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingCategory {
    Vulnerability,
    Integrity,
    Forensics,
    Script,
    Typosquat,
}

impl FindingCategory {
    /// 표시 순서대로 나열한 전체 카테고리
    pub const ALL: [Self; 5] = [
        Self::Vulnerability,
        Self::Integrity,
        Self::Forensics,
        Self::Script,
        Self::Typosquat,
    ];

    /// 메트릭 레이블 등에 쓰는 소문자 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vulnerability => "vulnerability",
            Self::Integrity => "integrity",
            Self::Forensics => "forensics",
            Self::Script => "script",
            Self::Typosquat => "typosquat",
        }
    }
}

impl fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 발견 사항 심각도
///
/// 점수를 계산하지 않으므로 모든 발견 사항은 정보성입니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum Severity {
    /// 정보성 신호 (존재 여부만 의미)
    #[default]
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
        }
    }
}

/// 평가기 출력 하나
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// 발견 사항 분류
    pub category: FindingCategory,
    /// `name@version`, 또는 버전과 무관한 경우 `name`
    pub subject: String,
    /// 사람이 읽을 설명
    pub message: String,
    /// 심각도 (항상 정보성)
    pub severity: Severity,
    /// 권고 ID (취약점 발견 사항만 해당)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advisory_id: Option<String>,
}

impl Finding {
    /// 새 발견 사항을 생성합니다.
    pub fn new(
        category: FindingCategory,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            subject: subject.into(),
            message: message.into(),
            severity: Severity::Info,
            advisory_id: None,
        }
    }

    /// 권고 ID를 붙입니다.
    pub fn with_advisory(mut self, id: impl Into<String>) -> Self {
        self.advisory_id = Some(id.into());
        self
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.advisory_id {
            Some(id) => write!(f, "[{}] {} {}: {}", self.category, self.subject, id, self.message),
            None => write!(f, "[{}] {}: {}", self.category, self.subject, self.message),
        }
    }
}

/// 카테고리별 발견 사항 개수
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    pub vulnerability: usize,
    pub integrity: usize,
    pub forensics: usize,
    pub script: usize,
    pub typosquat: usize,
}

impl CategoryCounts {
    /// 카운트에 발견 사항 하나를 더합니다.
    pub fn add(&mut self, category: FindingCategory) {
        match category {
            FindingCategory::Vulnerability => self.vulnerability += 1,
            FindingCategory::Integrity => self.integrity += 1,
            FindingCategory::Forensics => self.forensics += 1,
            FindingCategory::Script => self.script += 1,
            FindingCategory::Typosquat => self.typosquat += 1,
        }
    }

    /// 카테고리의 개수를 반환합니다.
    pub fn get(&self, category: FindingCategory) -> usize {
        match category {
            FindingCategory::Vulnerability => self.vulnerability,
            FindingCategory::Integrity => self.integrity,
            FindingCategory::Forensics => self.forensics,
            FindingCategory::Script => self.script,
            FindingCategory::Typosquat => self.typosquat,
        }
    }

    /// 전체 발견 사항 수를 반환합니다.
    pub fn total(&self) -> usize {
        self.vulnerability + self.integrity + self.forensics + self.script + self.typosquat
    }
}

/// 프로젝트 루트 하나에 대한 감사 결과
#[derive(Debug, Clone, Serialize)]
pub struct ProjectReport {
    /// 프로젝트 디렉토리
    pub project_path: PathBuf,
    /// 사용된 의존성 소스 (소스가 없으면 `None`)
    pub resolution_method: Option<ResolutionMethod>,
    /// 해석된 패키지 수
    pub package_count: usize,
    /// 발견 사항 목록
    pub findings: Vec<Finding>,
    /// 전송 수준 경고 (발견 사항이 아님)
    pub warnings: Vec<String>,
    /// 의존성 소스를 해석하지 못한 경우의 사유
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_error: Option<String>,
}

impl ProjectReport {
    /// 평가 대상이 없는 빈 리포트를 생성합니다.
    pub fn empty(project_path: impl Into<PathBuf>) -> Self {
        Self {
            project_path: project_path.into(),
            resolution_method: None,
            package_count: 0,
            findings: Vec::new(),
            warnings: Vec::new(),
            resolution_error: None,
        }
    }

    /// 특정 카테고리의 발견 사항을 반환합니다.
    pub fn findings_in(&self, category: FindingCategory) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.category == category)
    }

    /// 카테고리별 개수를 반환합니다.
    pub fn category_counts(&self) -> CategoryCounts {
        let mut counts = CategoryCounts::default();
        for finding in &self.findings {
            counts.add(finding.category);
        }
        counts
    }

    /// 발견 사항이 하나라도 있는지 반환합니다.
    pub fn has_findings(&self) -> bool {
        !self.findings.is_empty()
    }
}

/// 한 번의 감사 실행 결과
#[derive(Debug, Clone, Serialize)]
pub struct AuditRun {
    /// 실행 고유 ID
    pub run_id: Uuid,
    /// 스캔 루트
    pub root: PathBuf,
    /// 시작 시각
    pub started_at: DateTime<Utc>,
    /// 프로젝트별 리포트 (`project_path` 순)
    pub reports: Vec<ProjectReport>,
}

impl AuditRun {
    /// 모든 프로젝트에 걸친 카테고리별 개수
    pub fn category_counts(&self) -> CategoryCounts {
        let mut counts = CategoryCounts::default();
        for finding in self.reports.iter().flat_map(|r| &r.findings) {
            counts.add(finding.category);
        }
        counts
    }

    /// 전체 발견 사항 수
    pub fn total_findings(&self) -> usize {
        self.reports.iter().map(|r| r.findings.len()).sum()
    }

    /// 전체 해석된 패키지 수
    pub fn total_packages(&self) -> usize {
        self.reports.iter().map(|r| r.package_count).sum()
    }
}
