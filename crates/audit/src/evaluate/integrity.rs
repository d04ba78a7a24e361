//! 패키지 무결성 평가기
//!
//! lockfile에 기록된 digest를 레지스트리의 `dist.integrity`, `dist.shasum`과 비교합니다.
//! 둘 중 하나라도 일치하면 통과입니다. lockfile로 해석된 프로젝트만 평가합니다.

use std::sync::Arc;

use tracing::debug;

use lockwarden_core::types::{
    Finding, FindingCategory, IntegrityDigest, PackageRef, ResolutionMethod,
};

use super::fetch_packuments;
use crate::anchors::RegistryClient;
use crate::error::EvaluatorError;
use crate::fetch::Fetcher;

/// 메시지에 표시할 digest 앞부분 길이
const DIGEST_PREVIEW_CHARS: usize = 15;

/// 레지스트리 digest 비교 평가기
pub struct IntegrityEvaluator<F: Fetcher> {
    registry: Arc<RegistryClient<F>>,
    request_concurrency: usize,
}

impl<F: Fetcher> IntegrityEvaluator<F> {
    /// 새 평가기를 생성합니다.
    pub fn new(registry: Arc<RegistryClient<F>>, request_concurrency: usize) -> Self {
        Self {
            registry,
            request_concurrency,
        }
    }

    /// `method`가 [`ResolutionMethod::Lockfile`]일 때만 digest를 비교합니다.
    ///
    /// 레지스트리 조회 실패는 해당 패키지에 대해 아무것도 보고하지 않습니다.
    pub async fn evaluate(
        &self,
        refs: &[PackageRef],
        method: ResolutionMethod,
    ) -> Result<Vec<Finding>, EvaluatorError> {
        if method != ResolutionMethod::Lockfile {
            return Ok(Vec::new());
        }

        let locked: Vec<PackageRef> = refs
            .iter()
            .filter(|r| r.integrity().is_some())
            .cloned()
            .collect();
        if locked.is_empty() {
            return Ok(Vec::new());
        }

        let documents = fetch_packuments(&self.registry, &locked, self.request_concurrency).await;

        let mut findings = Vec::new();
        for package in &locked {
            let (Some(Ok(document)), Some(local)) =
                (documents.get(package.name()), package.integrity())
            else {
                continue;
            };

            let Some(meta) = document.version(package.version()) else {
                findings.push(Finding::new(
                    FindingCategory::Integrity,
                    package.subject(),
                    "Version not found in registry.",
                ));
                continue;
            };

            let remote_integrity = meta.dist.integrity.as_deref();
            let remote_shasum = meta.dist.shasum.as_deref();
            if remote_integrity == Some(local) || remote_shasum == Some(local) {
                continue;
            }

            let local_kind = IntegrityDigest::classify(local);
            let remote = remote_integrity.or(remote_shasum);
            let remote_kind = remote.map(IntegrityDigest::classify);
            debug!(package = %package.subject(), digest = %local_kind.label(), "integrity mismatch");
            findings.push(Finding::new(
                FindingCategory::Integrity,
                package.subject(),
                format!(
                    "Local {}... != Remote {} ({} vs {})",
                    preview(local),
                    remote.map_or_else(|| "none".to_owned(), |d| format!("{}...", preview(d))),
                    local_kind.label(),
                    remote_kind.as_ref().map_or("none", IntegrityDigest::label),
                ),
            ));
        }

        Ok(findings)
    }
}

fn preview(digest: &str) -> String {
    digest.chars().take(DIGEST_PREVIEW_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate::test_support::{locked, pkg, registry, registry_url};
    use crate::fetch::MockFetcher;
    use serde_json::json;

    fn evaluator(fetcher: MockFetcher) -> (IntegrityEvaluator<MockFetcher>, Arc<MockFetcher>) {
        let fetcher = Arc::new(fetcher);
        (IntegrityEvaluator::new(registry(&fetcher), 4), fetcher)
    }

    fn document(integrity: Option<&str>, shasum: Option<&str>) -> serde_json::Value {
        json!({"versions": {"1.0.0": {"dist": {"integrity": integrity, "shasum": shasum}}}})
    }

    #[tokio::test]
    async fn matching_integrity_is_accepted() {
        let (evaluator, _) = evaluator(
            MockFetcher::new().with_json(&registry_url("a"), document(Some("sha512-AAAA"), None)),
        );
        let findings = evaluator
            .evaluate(&[locked("a", "1.0.0", "sha512-AAAA")], ResolutionMethod::Lockfile)
            .await
            .unwrap();
        assert!(findings.is_empty());
    }

    #[tokio::test]
    async fn matching_legacy_shasum_is_accepted() {
        let (evaluator, _) = evaluator(MockFetcher::new().with_json(
            &registry_url("a"),
            document(Some("sha512-BBBB"), Some("0123456789abcdef")),
        ));
        let findings = evaluator
            .evaluate(&[locked("a", "1.0.0", "0123456789abcdef")], ResolutionMethod::Lockfile)
            .await
            .unwrap();
        assert!(findings.is_empty());
    }

    #[tokio::test]
    async fn mismatch_yields_one_finding() {
        let (evaluator, _) = evaluator(
            MockFetcher::new().with_json(&registry_url("a"), document(Some("sha512-BBBB"), None)),
        );
        let findings = evaluator
            .evaluate(&[locked("a", "1.0.0", "sha512-AAAA")], ResolutionMethod::Lockfile)
            .await
            .unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].category, FindingCategory::Integrity);
        assert_eq!(findings[0].subject, "a@1.0.0");
        assert_eq!(
            findings[0].message,
            "Local sha512-AAAA... != Remote sha512-BBBB... (sha512 vs sha512)"
        );
    }

    #[tokio::test]
    async fn digests_are_truncated_in_message() {
        let local = format!("sha512-{}", "A".repeat(80));
        let (evaluator, _) = evaluator(
            MockFetcher::new().with_json(&registry_url("a"), document(None, Some("ffffffffffffffffffff"))),
        );
        let findings = evaluator
            .evaluate(&[locked("a", "1.0.0", &local)], ResolutionMethod::Lockfile)
            .await
            .unwrap();
        assert_eq!(
            findings[0].message,
            "Local sha512-AAAAAAAA... != Remote fffffffffffffff... (sha512 vs shasum)"
        );
    }

    #[tokio::test]
    async fn mismatch_without_remote_digest_names_none() {
        let (evaluator, _) =
            evaluator(MockFetcher::new().with_json(&registry_url("a"), document(None, None)));
        let findings = evaluator
            .evaluate(&[locked("a", "1.0.0", "sha1-AAAA")], ResolutionMethod::Lockfile)
            .await
            .unwrap();
        assert_eq!(findings[0].message, "Local sha1-AAAA... != Remote none (sha1 vs none)");
    }

    #[tokio::test]
    async fn missing_version_is_a_finding() {
        let (evaluator, _) = evaluator(
            MockFetcher::new().with_json(&registry_url("a"), document(Some("sha512-AAAA"), None)),
        );
        let findings = evaluator
            .evaluate(&[locked("a", "9.9.9", "sha512-AAAA")], ResolutionMethod::Lockfile)
            .await
            .unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].message, "Version not found in registry.");
    }

    #[tokio::test]
    async fn non_lockfile_methods_are_skipped() {
        let (evaluator, fetcher) = evaluator(MockFetcher::new());
        let refs = [locked("a", "1.0.0", "sha512-AAAA")];
        for method in [ResolutionMethod::InstalledTree, ResolutionMethod::Manifest] {
            assert!(evaluator.evaluate(&refs, method).await.unwrap().is_empty());
        }
        assert_eq!(fetcher.total_calls(), 0);
    }

    #[tokio::test]
    async fn refs_without_integrity_are_not_fetched() {
        let (evaluator, fetcher) = evaluator(MockFetcher::new());
        let findings = evaluator
            .evaluate(&[pkg("a", "1.0.0")], ResolutionMethod::Lockfile)
            .await
            .unwrap();
        assert!(findings.is_empty());
        assert_eq!(fetcher.total_calls(), 0);
    }

    #[tokio::test]
    async fn registry_failure_is_swallowed() {
        let (evaluator, _) = evaluator(MockFetcher::new().with_status(&registry_url("a"), 500));
        let findings = evaluator
            .evaluate(
                &[locked("a", "1.0.0", "sha512-AAAA"), locked("b", "1.0.0", "sha512-CCCC")],
                ResolutionMethod::Lockfile,
            )
            .await
            .unwrap();
        // b는 등록되지 않아 404, a는 500: 둘 다 발견 사항 없음
        assert!(findings.is_empty());
    }
}
