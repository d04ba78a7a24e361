//! 취약점 DB (OSV) 클라이언트
//!
//! # 배치 질의
//!
//! ```text
//! POST {osv_batch_url}
//! {"queries": [{"package": {"name": "lodash", "ecosystem": "npm"}, "version": "4.17.20"}, ...]}
//!
//! => {"results": [{"vulns": [{"id": "GHSA-..."}]}, {}, ...]}
//! ```
//!
//! # 상세 조회
//!
//! ```text
//! GET {osv_vuln_url}/{id}  =>  {"summary": "...", "details": "..."}
//! ```

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;

use lockwarden_core::config::SourcesConfig;
use lockwarden_core::error::TransportError;
use lockwarden_core::types::{NPM_ECOSYSTEM, PackageRef};

use super::decode;
use crate::fetch::Fetcher;

/// 상세 설명이 없을 때 사용하는 메시지
pub const NO_SUMMARY: &str = "No summary";

/// `details`를 요약으로 쓸 때의 최대 길이
const DETAILS_MAX_CHARS: usize = 100;

#[derive(Deserialize)]
struct BatchResponse {
    #[serde(default)]
    results: Vec<BatchResult>,
}

#[derive(Deserialize)]
struct BatchResult {
    #[serde(default)]
    vulns: Option<Vec<VulnRef>>,
}

#[derive(Deserialize)]
struct VulnRef {
    id: String,
}

#[derive(Deserialize)]
struct VulnDetail {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

/// OSV API 클라이언트
pub struct OsvClient<F: Fetcher> {
    fetcher: Arc<F>,
    batch_url: String,
    vuln_url: String,
}

impl<F: Fetcher> OsvClient<F> {
    /// 설정의 엔드포인트로 클라이언트를 생성합니다.
    pub fn new(fetcher: Arc<F>, sources: &SourcesConfig) -> Self {
        Self {
            fetcher,
            batch_url: sources.osv_batch_url.clone(),
            vuln_url: sources.osv_vuln_url.trim_end_matches('/').to_owned(),
        }
    }

    /// 모든 패키지를 한 번의 배치 요청으로 질의합니다.
    ///
    /// 반환값의 `i`번째 원소는 `refs[i]`에 대한 권고 ID 목록입니다.
    ///
    /// # Precondition
    ///
    /// 응답의 `results`는 요청의 `queries`와 위치 순서가 같아야 합니다.
    /// 응답에 식별자가 없으므로 이 대응 관계를 검증할 방법이 없습니다.
    /// 길이가 다르면 응답 길이 그대로 반환하며, 호출자는 겹치는 앞부분만 사용해야 합니다.
    pub async fn query_batch(&self, refs: &[PackageRef]) -> Result<Vec<Vec<String>>, TransportError> {
        let queries: Vec<_> = refs
            .iter()
            .map(|r| {
                json!({
                    "package": { "name": r.name(), "ecosystem": NPM_ECOSYSTEM },
                    "version": r.version(),
                })
            })
            .collect();

        let body = self
            .fetcher
            .post_json(&self.batch_url, &json!({ "queries": queries }))
            .await?;
        let response: BatchResponse = decode(&self.batch_url, body)?;

        Ok(response
            .results
            .into_iter()
            .map(|result| {
                result
                    .vulns
                    .unwrap_or_default()
                    .into_iter()
                    .map(|v| v.id)
                    .collect()
            })
            .collect())
    }

    /// 권고 ID의 사람이 읽을 설명을 조회합니다.
    pub async fn describe(&self, id: &str) -> Result<String, TransportError> {
        let url = format!("{}/{}", self.vuln_url, id);
        let body = self.fetcher.get_json(&url).await?;
        let detail: VulnDetail = decode(&url, body)?;
        Ok(summarize(detail.summary.as_deref(), detail.details.as_deref()))
    }
}

/// `summary`가 있으면 그대로, 없으면 `details`를 잘라서 사용합니다.
fn summarize(summary: Option<&str>, details: Option<&str>) -> String {
    if let Some(summary) = summary.filter(|s| !s.trim().is_empty()) {
        return summary.to_owned();
    }

    match details.filter(|d| !d.trim().is_empty()) {
        Some(details) if details.chars().count() > DETAILS_MAX_CHARS => {
            let head: String = details.chars().take(DETAILS_MAX_CHARS - 3).collect();
            format!("{head}...")
        }
        Some(details) => details.to_owned(),
        None => NO_SUMMARY.to_owned(),
    }
}
