//! 위험 평가기
//!
//! 각 평가기는 [`PackageRef`] 목록을 받아 [`Finding`](lockwarden_core::Finding) 목록을 만듭니다.
//!
//! | 평가기 | trust anchor | 실패 시 |
//! |--------|--------------|---------|
//! | [`VulnerabilityEvaluator`] | OSV 배치 + 상세 | `EvaluatorError` |
//! | [`IntegrityEvaluator`] | 레지스트리 | 패키지별로 무시 |
//! | [`ForensicsEvaluator`] | 레지스트리 | 패키지별로 무시 |
//! | [`ScriptEvaluator`] | 레지스트리 | 패키지별로 무시 |
//! | `TyposquatEvaluator` | 없음 (편집 거리) | - |

pub mod forensics;
pub mod integrity;
pub mod scripts;
#[cfg(feature = "typosquat")]
pub mod typosquat;
pub mod vulnerability;

pub use forensics::ForensicsEvaluator;
pub use integrity::IntegrityEvaluator;
pub use scripts::ScriptEvaluator;
#[cfg(feature = "typosquat")]
pub use typosquat::{SeedList, TyposquatEvaluator};
pub use vulnerability::VulnerabilityEvaluator;

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use lockwarden_core::error::TransportError;
use lockwarden_core::types::PackageRef;

use crate::anchors::{Packument, RegistryClient};
use crate::fetch::Fetcher;

/// 이름별 레지스트리 조회 결과
pub(crate) type PackumentMap = HashMap<String, Result<Arc<Packument>, TransportError>>;

/// 서로 다른 패키지 이름마다 레지스트리 문서를 동시에 조회합니다.
///
/// 동시 요청 수는 `limit`으로 제한됩니다. 결과에는 조회를 시도한 모든 이름이 포함됩니다.
pub(crate) async fn fetch_packuments<F: Fetcher>(
    registry: &Arc<RegistryClient<F>>,
    refs: &[PackageRef],
    limit: usize,
) -> PackumentMap {
    let names: BTreeSet<&str> = refs.iter().map(PackageRef::name).collect();
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let mut tasks = JoinSet::new();

    for name in names {
        let name = name.to_owned();
        let registry = Arc::clone(registry);
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            let result = registry.packument(&name).await;
            (name, result)
        });
    }

    let mut results = HashMap::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((name, result)) => {
                if let Err(e) = &result {
                    debug!(package = %name, error = %e, "registry lookup failed");
                }
                results.insert(name, result);
            }
            Err(e) => warn!(error = %e, "registry lookup task failed"),
        }
    }
    results
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::fetch::MockFetcher;
    use serde_json::json;

    #[tokio::test]
    async fn fetch_packuments_deduplicates_names() {
        let fetcher = Arc::new(
            MockFetcher::new()
                .with_json(&registry_url("a"), json!({"versions": {}}))
                .with_status(&registry_url("b"), 500),
        );
        let registry = registry(&fetcher);
        let refs = vec![pkg("a", "1.0.0"), pkg("a", "2.0.0"), pkg("b", "1.0.0")];

        let map = fetch_packuments(&registry, &refs, 2).await;
        assert_eq!(map.len(), 2);
        assert!(map["a"].is_ok());
        assert!(map["b"].is_err());
        assert_eq!(fetcher.total_calls(), 2);
    }
}
