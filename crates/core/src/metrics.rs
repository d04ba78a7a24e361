//! 메트릭 이름 상수
//!
//! 감사 파이프라인이 `metrics` 파사드로 기록하는 카운터 이름을 중앙에서 정의합니다.
//! 레코더가 설치되지 않은 경우 모든 호출은 no-op입니다.
//! 레코더와 설명 등록은 이 크레이트를 포함하는 애플리케이션이 담당합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `lockwarden_`
//! - 접미어: `_total` (counter), `_seconds` (histogram)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(lockwarden_core::metrics::PROJECTS_SCANNED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 발견 사항 카테고리 레이블 키 (vulnerability, integrity, ...)
pub const LABEL_CATEGORY: &str = "category";

/// trust anchor 레이블 키 (osv, registry)
pub const LABEL_ANCHOR: &str = "anchor";

/// 해석 방법 레이블 키 (lockfile, installed_tree, manifest)
pub const LABEL_METHOD: &str = "method";

// ─── 레이블 값 상수 ────────────────────────────────────────────────

/// 취약점 DB anchor
pub const ANCHOR_OSV: &str = "osv";

/// 레지스트리 메타데이터 anchor
pub const ANCHOR_REGISTRY: &str = "registry";

// ─── 감사 파이프라인 메트릭 ────────────────────────────────────────

/// 감사한 프로젝트 수 (counter)
pub const PROJECTS_SCANNED_TOTAL: &str = "lockwarden_projects_scanned_total";

/// 해석된 패키지 수 (counter, label: method)
pub const PACKAGES_RESOLVED_TOTAL: &str = "lockwarden_packages_resolved_total";

/// 발견 사항 수 (counter, label: category)
pub const FINDINGS_TOTAL: &str = "lockwarden_findings_total";

/// trust anchor 호출 실패 수 (counter, label: anchor)
pub const TRANSPORT_FAILURES_TOTAL: &str = "lockwarden_transport_failures_total";

/// 프로젝트 하나를 감사하는 데 걸린 시간 (histogram, 초)
pub const PROJECT_AUDIT_DURATION_SECONDS: &str = "lockwarden_project_audit_duration_seconds";
