//! 알려진 취약점 평가기
//!
//! 모든 패키지를 한 번의 OSV 배치 요청으로 질의한 뒤, 서로 다른 권고 ID마다
//! 상세 조회를 한 번씩 동시에 수행하여 메시지를 채웁니다.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use lockwarden_core::types::{Finding, FindingCategory, PackageRef};

use crate::anchors::OsvClient;
use crate::anchors::osv::NO_SUMMARY;
use crate::error::EvaluatorError;
use crate::fetch::Fetcher;

/// OSV 기반 취약점 평가기
pub struct VulnerabilityEvaluator<F: Fetcher> {
    osv: Arc<OsvClient<F>>,
    request_concurrency: usize,
}

impl<F: Fetcher> VulnerabilityEvaluator<F> {
    /// 새 평가기를 생성합니다.
    pub fn new(osv: Arc<OsvClient<F>>, request_concurrency: usize) -> Self {
        Self {
            osv,
            request_concurrency: request_concurrency.max(1),
        }
    }

    /// 패키지 목록의 알려진 취약점을 평가합니다.
    ///
    /// 빈 목록이면 요청을 보내지 않습니다. 배치 요청이 실패하면
    /// [`EvaluatorError::Transport`]를 반환하며, 상세 조회 실패는 메시지만 `"No summary"`가 됩니다.
    pub async fn evaluate(&self, refs: &[PackageRef]) -> Result<Vec<Finding>, EvaluatorError> {
        if refs.is_empty() {
            return Ok(Vec::new());
        }

        let ids_per_ref = self.osv.query_batch(refs).await?;
        if ids_per_ref.len() != refs.len() {
            warn!(
                queries = refs.len(),
                results = ids_per_ref.len(),
                "vulnerability batch result count mismatch, matching overlapping prefix only"
            );
        }

        let distinct: BTreeSet<&str> = ids_per_ref.iter().flatten().map(String::as_str).collect();
        let messages = self.describe_all(distinct).await;

        let findings = refs
            .iter()
            .zip(&ids_per_ref)
            .flat_map(|(package, ids)| {
                ids.iter().map(|id| {
                    let message = messages
                        .get(id)
                        .cloned()
                        .unwrap_or_else(|| NO_SUMMARY.to_owned());
                    Finding::new(FindingCategory::Vulnerability, package.subject(), message)
                        .with_advisory(id.as_str())
                })
            })
            .collect();

        Ok(findings)
    }

    async fn describe_all(&self, ids: BTreeSet<&str>) -> HashMap<String, String> {
        let semaphore = Arc::new(Semaphore::new(self.request_concurrency));
        let mut tasks = JoinSet::new();

        for id in ids {
            let id = id.to_owned();
            let osv = Arc::clone(&self.osv);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let message = match osv.describe(&id).await {
                    Ok(message) => message,
                    Err(e) => {
                        debug!(advisory = %id, error = %e, "advisory detail lookup failed");
                        NO_SUMMARY.to_owned()
                    }
                };
                (id, message)
            });
        }

        let mut messages = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((id, message)) => {
                    messages.insert(id, message);
                }
                Err(e) => warn!(error = %e, "advisory detail task failed"),
            }
        }
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate::test_support::pkg;
    use crate::fetch::MockFetcher;
    use lockwarden_core::config::SourcesConfig;
    use lockwarden_core::error::TransportError;
    use serde_json::json;

    const BATCH: &str = "https://api.osv.dev/v1/querybatch";
    const VULNS: &str = "https://api.osv.dev/v1/vulns";

    fn evaluator(fetcher: MockFetcher) -> (VulnerabilityEvaluator<MockFetcher>, Arc<MockFetcher>) {
        let fetcher = Arc::new(fetcher);
        let osv = Arc::new(OsvClient::new(Arc::clone(&fetcher), &SourcesConfig::default()));
        (VulnerabilityEvaluator::new(osv, 4), fetcher)
    }

    #[tokio::test]
    async fn empty_input_sends_no_request() {
        let (evaluator, fetcher) = evaluator(MockFetcher::new());
        assert!(evaluator.evaluate(&[]).await.unwrap().is_empty());
        assert_eq!(fetcher.total_calls(), 0);
    }

    #[tokio::test]
    async fn one_finding_per_advisory_with_resolved_message() {
        let (evaluator, fetcher) = evaluator(
            MockFetcher::new()
                .with_json(
                    BATCH,
                    json!({"results": [
                        {"vulns": [{"id": "GHSA-aaaa"}, {"id": "GHSA-bbbb"}]},
                        {},
                        {"vulns": [{"id": "GHSA-aaaa"}]}
                    ]}),
                )
                .with_json(
                    &format!("{VULNS}/GHSA-aaaa"),
                    json!({"summary": "Prototype pollution in lodash"}),
                )
                .with_status(&format!("{VULNS}/GHSA-bbbb"), 503),
        );

        let refs = [
            pkg("lodash", "4.17.20"),
            pkg("express", "4.18.2"),
            pkg("lodash", "4.17.19"),
        ];
        let findings = evaluator.evaluate(&refs).await.unwrap();

        assert_eq!(findings.len(), 3);
        assert_eq!(findings[0].subject, "lodash@4.17.20");
        assert_eq!(findings[0].advisory_id.as_deref(), Some("GHSA-aaaa"));
        assert_eq!(findings[0].message, "Prototype pollution in lodash");
        assert_eq!(findings[1].message, NO_SUMMARY);
        assert_eq!(findings[2].subject, "lodash@4.17.19");

        // 중복 ID는 상세 조회를 한 번만 수행
        assert_eq!(fetcher.calls(&format!("{VULNS}/GHSA-aaaa")), 1);
        assert_eq!(fetcher.calls(BATCH), 1);
    }

    #[tokio::test]
    async fn batch_failure_is_reported_as_error() {
        let (evaluator, _) = evaluator(MockFetcher::new().with_status(BATCH, 500));
        let err = evaluator.evaluate(&[pkg("a", "1.0.0")]).await.unwrap_err();
        assert!(matches!(
            err,
            EvaluatorError::Transport(TransportError::Status { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn batch_timeout_is_reported_as_error() {
        let (evaluator, _) = evaluator(MockFetcher::new().with_timeout(BATCH));
        assert!(evaluator.evaluate(&[pkg("a", "1.0.0")]).await.is_err());
    }

    #[tokio::test]
    async fn short_result_list_matches_prefix_only() {
        let (evaluator, _) = evaluator(
            MockFetcher::new()
                .with_json(BATCH, json!({"results": [{"vulns": [{"id": "GHSA-1"}]}]}))
                .with_json(&format!("{VULNS}/GHSA-1"), json!({"details": "short"})),
        );

        let findings = evaluator
            .evaluate(&[pkg("a", "1.0.0"), pkg("b", "1.0.0")])
            .await
            .unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].subject, "a@1.0.0");
        assert_eq!(findings[0].message, "short");
    }
}
