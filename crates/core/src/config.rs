//! 설정 관리 -- lockwarden.toml 파싱 및 런타임 설정
//!
//! [`LockwardenConfig`]는 감사 실행에 필요한 모든 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`LOCKWARDEN_SCAN_MAX_DEPTH=8` 형식)
//! 3. 설정 파일 (`lockwarden.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), lockwarden_core::error::LockwardenError> {
//! use lockwarden_core::config::LockwardenConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = LockwardenConfig::load("lockwarden.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = LockwardenConfig::parse("[scan]\nmax_depth = 8")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, LockwardenError};

/// 설정 상한값 상수
const MAX_DEPTH_LIMIT: usize = 256;
const MAX_FILE_SIZE_LIMIT: u64 = 100 * 1024 * 1024; // 100 MB
const MAX_PROJECT_CONCURRENCY: usize = 64;
const MAX_REQUEST_CONCURRENCY: usize = 256;
const MAX_TIMEOUT_SECS: u64 = 300;

/// lockwarden 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LockwardenConfig {
    /// 일반 설정 (로깅)
    #[serde(default)]
    pub general: GeneralConfig,
    /// 탐색 및 동시성 설정
    #[serde(default)]
    pub scan: ScanConfig,
    /// trust anchor 엔드포인트 설정
    #[serde(default)]
    pub sources: SourcesConfig,
    /// 메타데이터 포렌식 임계값
    #[serde(default)]
    pub forensics: ForensicsConfig,
    /// 타이포스쿼팅 탐지 설정
    #[serde(default)]
    pub typosquat: TyposquatConfig,
}

impl LockwardenConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LockwardenError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 기본값에 환경변수 오버라이드만 적용한 설정을 반환합니다.
    ///
    /// 설정 파일이 없을 때 사용합니다.
    pub fn from_env() -> Result<Self, LockwardenError> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, LockwardenError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LockwardenError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                LockwardenError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, LockwardenError> {
        toml::from_str(toml_str).map_err(|e| {
            LockwardenError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LOCKWARDEN_{SECTION}_{FIELD}`
    /// 예: `LOCKWARDEN_SOURCES_TIMEOUT_SECS=30`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "LOCKWARDEN_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LOCKWARDEN_GENERAL_LOG_FORMAT");

        // Scan
        override_usize(&mut self.scan.max_depth, "LOCKWARDEN_SCAN_MAX_DEPTH");
        override_u64(&mut self.scan.max_file_size, "LOCKWARDEN_SCAN_MAX_FILE_SIZE");
        override_usize(
            &mut self.scan.project_concurrency,
            "LOCKWARDEN_SCAN_PROJECT_CONCURRENCY",
        );
        override_usize(
            &mut self.scan.request_concurrency,
            "LOCKWARDEN_SCAN_REQUEST_CONCURRENCY",
        );

        // Sources
        override_string(&mut self.sources.osv_batch_url, "LOCKWARDEN_SOURCES_OSV_BATCH_URL");
        override_string(&mut self.sources.osv_vuln_url, "LOCKWARDEN_SOURCES_OSV_VULN_URL");
        override_string(&mut self.sources.registry_url, "LOCKWARDEN_SOURCES_REGISTRY_URL");
        override_u64(&mut self.sources.timeout_secs, "LOCKWARDEN_SOURCES_TIMEOUT_SECS");
        override_string(&mut self.sources.user_agent, "LOCKWARDEN_SOURCES_USER_AGENT");

        // Forensics
        override_u64(
            &mut self.forensics.freshness_hours,
            "LOCKWARDEN_FORENSICS_FRESHNESS_HOURS",
        );
        override_usize(
            &mut self.forensics.min_versions,
            "LOCKWARDEN_FORENSICS_MIN_VERSIONS",
        );

        // Typosquat
        override_bool(&mut self.typosquat.enabled, "LOCKWARDEN_TYPOSQUAT_ENABLED");
        override_csv(
            &mut self.typosquat.extra_seeds,
            "LOCKWARDEN_TYPOSQUAT_EXTRA_SEEDS",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LockwardenError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.scan.max_depth == 0 || self.scan.max_depth > MAX_DEPTH_LIMIT {
            return Err(invalid(
                "scan.max_depth",
                format!("must be 1-{MAX_DEPTH_LIMIT}"),
            ));
        }

        if self.scan.max_file_size == 0 || self.scan.max_file_size > MAX_FILE_SIZE_LIMIT {
            return Err(invalid(
                "scan.max_file_size",
                format!("must be 1-{MAX_FILE_SIZE_LIMIT}"),
            ));
        }

        if self.scan.project_concurrency == 0
            || self.scan.project_concurrency > MAX_PROJECT_CONCURRENCY
        {
            return Err(invalid(
                "scan.project_concurrency",
                format!("must be 1-{MAX_PROJECT_CONCURRENCY}"),
            ));
        }

        if self.scan.request_concurrency == 0
            || self.scan.request_concurrency > MAX_REQUEST_CONCURRENCY
        {
            return Err(invalid(
                "scan.request_concurrency",
                format!("must be 1-{MAX_REQUEST_CONCURRENCY}"),
            ));
        }

        for (field, url) in [
            ("sources.osv_batch_url", &self.sources.osv_batch_url),
            ("sources.osv_vuln_url", &self.sources.osv_vuln_url),
            ("sources.registry_url", &self.sources.registry_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(invalid(field, "must be an http or https URL".to_owned()));
            }
        }

        if self.sources.timeout_secs == 0 || self.sources.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(invalid(
                "sources.timeout_secs",
                format!("must be 1-{MAX_TIMEOUT_SECS}"),
            ));
        }

        if self.forensics.freshness_hours == 0 {
            return Err(invalid(
                "forensics.freshness_hours",
                "must be greater than 0".to_owned(),
            ));
        }

        if self.typosquat.extra_seeds.iter().any(|s| s.trim().is_empty()) {
            return Err(invalid(
                "typosquat.extra_seeds",
                "seed names must not be empty".to_owned(),
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: String) -> LockwardenError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 디렉토리 탐색 및 동시성 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// 프로젝트 탐색 최대 깊이
    pub max_depth: usize,
    /// lockfile / manifest 최대 허용 크기 (바이트)
    pub max_file_size: u64,
    /// 동시에 감사할 프로젝트 수
    pub project_concurrency: usize,
    /// 평가기당 동시 원격 호출 수
    pub request_concurrency: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_depth: 32,
            max_file_size: 10 * 1024 * 1024, // 10 MB
            project_concurrency: 4,
            request_concurrency: 16,
        }
    }
}

/// trust anchor 엔드포인트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// 취약점 DB 배치 질의 엔드포인트
    pub osv_batch_url: String,
    /// 취약점 상세 엔드포인트 (뒤에 `/{id}`가 붙음)
    pub osv_vuln_url: String,
    /// 레지스트리 메타데이터 엔드포인트 (뒤에 `/{name}`이 붙음)
    pub registry_url: String,
    /// 호출별 타임아웃 (초)
    pub timeout_secs: u64,
    /// HTTP User-Agent
    pub user_agent: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            osv_batch_url: "https://api.osv.dev/v1/querybatch".to_owned(),
            osv_vuln_url: "https://api.osv.dev/v1/vulns".to_owned(),
            registry_url: "https://registry.npmjs.org".to_owned(),
            timeout_secs: 15,
            user_agent: concat!("lockwarden/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

/// 메타데이터 포렌식 임계값
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForensicsConfig {
    /// 이 시간(시)보다 최근에 게시된 버전을 표시
    pub freshness_hours: u64,
    /// 게시된 버전 수가 이 값보다 적으면 표시
    pub min_versions: usize,
}

impl Default for ForensicsConfig {
    fn default() -> Self {
        Self {
            freshness_hours: 48,
            min_versions: 3,
        }
    }
}

/// 타이포스쿼팅 탐지 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TyposquatConfig {
    /// 탐지 활성화 여부
    pub enabled: bool,
    /// 기본 seed 목록에 추가할 패키지 이름
    pub extra_seeds: Vec<String>,
}

impl Default for TyposquatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            extra_seeds: Vec::new(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn default_config_has_sane_values() {
        let config = LockwardenConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "pretty");
        assert_eq!(config.scan.max_depth, 32);
        assert_eq!(config.forensics.freshness_hours, 48);
        assert_eq!(config.forensics.min_versions, 3);
        assert!(config.typosquat.enabled);
        assert_eq!(config.sources.registry_url, "https://registry.npmjs.org");
    }

    #[test]
    fn default_config_passes_validation() {
        LockwardenConfig::default().validate().unwrap();
    }

    #[test]
    fn parse_empty_toml_uses_defaults() {
        let config = LockwardenConfig::parse("").unwrap();
        assert_eq!(config.scan.request_concurrency, 16);
        assert_eq!(config.sources.timeout_secs, 15);
    }

    #[test]
    fn parse_partial_toml_merges_with_defaults() {
        let toml = r#"
[scan]
max_depth = 4

[typosquat]
extra_seeds = ["left-pad"]
"#;
        let config = LockwardenConfig::parse(toml).unwrap();
        assert_eq!(config.scan.max_depth, 4);
        // max_file_size는 기본값 유지
        assert_eq!(config.scan.max_file_size, 10 * 1024 * 1024);
        assert_eq!(config.typosquat.extra_seeds, vec!["left-pad"]);
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
[general]
log_level = "debug"
log_format = "json"

[scan]
max_depth = 12
max_file_size = 1048576
project_concurrency = 2
request_concurrency = 8

[sources]
osv_batch_url = "http://127.0.0.1:8080/v1/querybatch"
osv_vuln_url = "http://127.0.0.1:8080/v1/vulns"
registry_url = "http://127.0.0.1:4873"
timeout_secs = 5
user_agent = "ci-audit"

[forensics]
freshness_hours = 72
min_versions = 5

[typosquat]
enabled = false
"#;
        let config = LockwardenConfig::parse(toml).unwrap();
        config.validate().unwrap();
        assert_eq!(config.general.log_format, "json");
        assert_eq!(config.scan.project_concurrency, 2);
        assert_eq!(config.sources.registry_url, "http://127.0.0.1:4873");
        assert_eq!(config.forensics.min_versions, 5);
        assert!(!config.typosquat.enabled);
    }

    #[test]
    fn parse_invalid_toml_fails() {
        let err = LockwardenConfig::parse("[scan\nmax_depth = ").unwrap_err();
        assert!(matches!(
            err,
            LockwardenError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = LockwardenConfig::default();
        config.general.log_level = "verbose".to_owned();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_max_depth() {
        let mut config = LockwardenConfig::default();
        config.scan.max_depth = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_too_large_max_file_size() {
        let mut config = LockwardenConfig::default();
        config.scan.max_file_size = 200 * 1024 * 1024;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = LockwardenConfig::default();
        config.scan.request_concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = LockwardenConfig::default();
        config.scan.project_concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_http_url() {
        let mut config = LockwardenConfig::default();
        config.sources.registry_url = "ftp://registry.example".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("sources.registry_url"));
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = LockwardenConfig::default();
        config.sources.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_blank_seed() {
        let mut config = LockwardenConfig::default();
        config.typosquat.extra_seeds = vec![" ".to_owned()];
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn from_file_missing_returns_file_not_found() {
        let err = LockwardenConfig::from_file("/nonexistent/lockwarden.toml")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LockwardenError::Config(ConfigError::FileNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lockwarden.toml");
        std::fs::write(&path, "[forensics]\nfreshness_hours = 24\n").unwrap();
        let config = LockwardenConfig::from_file(&path).await.unwrap();
        assert_eq!(config.forensics.freshness_hours, 24);
    }

    #[test]
    #[serial]
    fn env_override_applies_values() {
        // SAFETY: serial_test로 환경변수 접근을 직렬화합니다.
        unsafe {
            std::env::set_var("LOCKWARDEN_SCAN_MAX_DEPTH", "7");
            std::env::set_var("LOCKWARDEN_TYPOSQUAT_ENABLED", "false");
            std::env::set_var("LOCKWARDEN_TYPOSQUAT_EXTRA_SEEDS", "left-pad, is-odd");
        }

        let mut config = LockwardenConfig::default();
        config.apply_env_overrides();

        unsafe {
            std::env::remove_var("LOCKWARDEN_SCAN_MAX_DEPTH");
            std::env::remove_var("LOCKWARDEN_TYPOSQUAT_ENABLED");
            std::env::remove_var("LOCKWARDEN_TYPOSQUAT_EXTRA_SEEDS");
        }

        assert_eq!(config.scan.max_depth, 7);
        assert!(!config.typosquat.enabled);
        assert_eq!(config.typosquat.extra_seeds, vec!["left-pad", "is-odd"]);
    }

    #[test]
    #[serial]
    fn env_override_ignores_unparseable_values() {
        unsafe {
            std::env::set_var("LOCKWARDEN_SOURCES_TIMEOUT_SECS", "soon");
        }

        let mut config = LockwardenConfig::default();
        config.apply_env_overrides();

        unsafe {
            std::env::remove_var("LOCKWARDEN_SOURCES_TIMEOUT_SECS");
        }

        assert_eq!(config.sources.timeout_secs, 15);
    }
}
