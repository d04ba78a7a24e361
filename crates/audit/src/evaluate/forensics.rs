//! 레지스트리 메타데이터 포렌식
//!
//! 두 가지 신호를 평가합니다.
//!
//! - **신선도**: 해석된 버전이 `freshness_hours`보다 최근에 게시됨 (`name@version`)
//! - **버전 수 하한**: 게시된 버전이 `min_versions`개 미만 (`name`, 이름당 한 번)
//!
//! 게시 시각이 없거나 RFC 3339로 해석되지 않으면 신선도 신호는 꺼집니다.
//! 레지스트리 조회가 실패하거나 해석된 버전이 레지스트리에 없으면
//! 해당 패키지의 두 신호 모두 꺼집니다.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use lockwarden_core::config::ForensicsConfig;
use lockwarden_core::types::{Finding, FindingCategory, PackageRef};

use super::fetch_packuments;
use crate::anchors::RegistryClient;
use crate::error::EvaluatorError;
use crate::fetch::Fetcher;

/// 메타데이터 포렌식 평가기
pub struct ForensicsEvaluator<F: Fetcher> {
    registry: Arc<RegistryClient<F>>,
    request_concurrency: usize,
    freshness_hours: u64,
    min_versions: usize,
}

impl<F: Fetcher> ForensicsEvaluator<F> {
    /// 새 평가기를 생성합니다.
    pub fn new(
        registry: Arc<RegistryClient<F>>,
        config: &ForensicsConfig,
        request_concurrency: usize,
    ) -> Self {
        Self {
            registry,
            request_concurrency,
            freshness_hours: config.freshness_hours,
            min_versions: config.min_versions,
        }
    }

    /// 현재 시각 기준으로 평가합니다.
    pub async fn evaluate(&self, refs: &[PackageRef]) -> Result<Vec<Finding>, EvaluatorError> {
        self.evaluate_at(refs, Utc::now()).await
    }

    /// 지정한 시각 기준으로 평가합니다.
    pub async fn evaluate_at(
        &self,
        refs: &[PackageRef],
        now: DateTime<Utc>,
    ) -> Result<Vec<Finding>, EvaluatorError> {
        if refs.is_empty() {
            return Ok(Vec::new());
        }

        let documents = fetch_packuments(&self.registry, refs, self.request_concurrency).await;
        let threshold_secs = i64::try_from(self.freshness_hours)
            .unwrap_or(i64::MAX)
            .saturating_mul(3600);

        let mut findings = Vec::new();
        let mut counted: HashSet<&str> = HashSet::new();

        for package in refs {
            let Some(Ok(document)) = documents.get(package.name()) else {
                continue;
            };
            if document.version(package.version()).is_none() {
                debug!(package = %package.subject(), "version not in registry, forensics skipped");
                continue;
            }

            if let Some(raw) = document.published_at(package.version()) {
                match DateTime::parse_from_rfc3339(raw) {
                    Ok(published) => {
                        let age = now.signed_duration_since(published.with_timezone(&Utc));
                        if age.num_seconds() < threshold_secs {
                            findings.push(Finding::new(
                                FindingCategory::Forensics,
                                package.subject(),
                                format!(
                                    "Published less than {} hours ago ({}h ago).",
                                    self.freshness_hours,
                                    age.num_hours()
                                ),
                            ));
                        }
                    }
                    Err(e) => {
                        debug!(package = %package.subject(), value = raw, error = %e, "unparseable publish time");
                    }
                }
            }

            if counted.insert(package.name()) {
                let count = document.version_count();
                if count < self.min_versions {
                    findings.push(Finding::new(
                        FindingCategory::Forensics,
                        package.name(),
                        format!(
                            "Has fewer than {} versions ({count}).",
                            self.min_versions
                        ),
                    ));
                }
            }
        }

        Ok(findings)
    }
}
