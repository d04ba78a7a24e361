//! 설치 시점 스크립트 평가기
//!
//! 해석된 버전의 레지스트리 메타데이터에서 설치 중 자동 실행되는 hook을 찾습니다.

use std::sync::Arc;

use lockwarden_core::types::{Finding, FindingCategory, PackageRef};

use super::fetch_packuments;
use crate::anchors::RegistryClient;
use crate::error::EvaluatorError;
use crate::fetch::Fetcher;

/// 설치 중 자동 실행되는 npm lifecycle hook
pub const INSTALL_HOOKS: [&str; 3] = ["preinstall", "install", "postinstall"];

/// 설치 스크립트 평가기
pub struct ScriptEvaluator<F: Fetcher> {
    registry: Arc<RegistryClient<F>>,
    request_concurrency: usize,
}

impl<F: Fetcher> ScriptEvaluator<F> {
    /// 새 평가기를 생성합니다.
    pub fn new(registry: Arc<RegistryClient<F>>, request_concurrency: usize) -> Self {
        Self {
            registry,
            request_concurrency,
        }
    }

    /// 각 패키지 버전의 install hook을 보고합니다.
    ///
    /// 레지스트리에 없는 버전이나 조회 실패는 아무것도 보고하지 않습니다.
    pub async fn evaluate(&self, refs: &[PackageRef]) -> Result<Vec<Finding>, EvaluatorError> {
        if refs.is_empty() {
            return Ok(Vec::new());
        }

        let documents = fetch_packuments(&self.registry, refs, self.request_concurrency).await;

        let findings = refs
            .iter()
            .filter_map(|package| {
                let document = documents.get(package.name())?.as_ref().ok()?;
                let meta = document.version(package.version())?;
                Some(INSTALL_HOOKS.iter().filter_map(move |hook| {
                    meta.script(hook).map(|command| {
                        Finding::new(
                            FindingCategory::Script,
                            package.subject(),
                            format!("Has '{hook}' script: '{command}'"),
                        )
                    })
                }))
            })
            .flatten()
            .collect();

        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate::test_support::{pkg, registry, registry_url};
    use crate::fetch::MockFetcher;
    use serde_json::json;

    fn evaluator(fetcher: MockFetcher) -> ScriptEvaluator<MockFetcher> {
        let fetcher = Arc::new(fetcher);
        ScriptEvaluator::new(registry(&fetcher), 4)
    }

    #[tokio::test]
    async fn postinstall_hook_is_reported_with_command() {
        let evaluator = evaluator(MockFetcher::new().with_json(
            &registry_url("setup-pkg"),
            json!({"versions": {"1.0.0": {"scripts": {"postinstall": "node setup.js", "test": "jest"}}}}),
        ));
        let findings = evaluator.evaluate(&[pkg("setup-pkg", "1.0.0")]).await.unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].category, FindingCategory::Script);
        assert_eq!(findings[0].subject, "setup-pkg@1.0.0");
        assert_eq!(findings[0].message, "Has 'postinstall' script: 'node setup.js'");
    }

    #[tokio::test]
    async fn every_install_hook_is_reported() {
        let evaluator = evaluator(MockFetcher::new().with_json(
            &registry_url("busy"),
            json!({"versions": {"2.0.0": {"scripts": {
                "preinstall": "a", "install": "b", "postinstall": "c", "prepare": "d"
            }}}}),
        ));
        let findings = evaluator.evaluate(&[pkg("busy", "2.0.0")]).await.unwrap();
        let messages: Vec<&str> = findings.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Has 'preinstall' script: 'a'",
                "Has 'install' script: 'b'",
                "Has 'postinstall' script: 'c'",
            ]
        );
    }

    #[tokio::test]
    async fn no_scripts_no_findings() {
        let evaluator = evaluator(
            MockFetcher::new().with_json(&registry_url("quiet"), json!({"versions": {"1.0.0": {}}})),
        );
        assert!(evaluator.evaluate(&[pkg("quiet", "1.0.0")]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_version_yields_nothing() {
        let evaluator = evaluator(MockFetcher::new().with_json(
            &registry_url("gone"),
            json!({"versions": {"1.0.0": {"scripts": {"install": "x"}}}}),
        ));
        assert!(evaluator.evaluate(&[pkg("gone", "2.0.0")]).await.unwrap().is_empty());
    }
}
