//! npm 레지스트리 메타데이터 클라이언트
//!
//! `GET {registry_url}/{name}`은 패키지의 모든 버전 메타데이터(packument)를 반환합니다.
//! integrity, forensics, script 평가기가 같은 문서를 사용하므로 [`RegistryClient`]는
//! 한 번의 실행 동안 이름별로 결과를 메모이즈합니다. 실패한 조회도 메모이즈되어
//! 같은 실행 안에서 재시도하지 않습니다.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tokio::sync::{Mutex, OnceCell};
use tracing::debug;

use lockwarden_core::config::SourcesConfig;
use lockwarden_core::error::TransportError;

use super::decode;
use crate::fetch::Fetcher;

/// 패키지 메타데이터 문서
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Packument {
    /// 게시된 버전별 메타데이터
    #[serde(default)]
    pub versions: HashMap<String, VersionMeta>,
    /// 버전별 게시 시각 (RFC 3339). `created`, `modified` 키도 포함됩니다.
    #[serde(default)]
    pub time: HashMap<String, Value>,
}

impl Packument {
    /// 정확한 버전의 메타데이터를 반환합니다.
    pub fn version(&self, version: &str) -> Option<&VersionMeta> {
        self.versions.get(version)
    }

    /// 버전의 게시 시각 문자열을 반환합니다.
    pub fn published_at(&self, version: &str) -> Option<&str> {
        self.time.get(version).and_then(Value::as_str)
    }

    /// 게시된 버전 수
    pub fn version_count(&self) -> usize {
        self.versions.len()
    }
}

/// 버전 하나의 메타데이터
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VersionMeta {
    /// 배포 tarball 정보
    #[serde(default)]
    pub dist: Dist,
    /// npm 스크립트 (값이 문자열이 아닌 항목은 무시)
    #[serde(default)]
    pub scripts: BTreeMap<String, Value>,
}

impl VersionMeta {
    /// 스크립트 명령 문자열을 반환합니다.
    pub fn script(&self, hook: &str) -> Option<&str> {
        self.scripts.get(hook).and_then(Value::as_str)
    }
}

/// tarball digest
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Dist {
    /// SRI 형식 digest (`sha512-...`)
    #[serde(default)]
    pub integrity: Option<String>,
    /// SHA-1 hex digest
    #[serde(default)]
    pub shasum: Option<String>,
}

type CachedPackument = Result<Arc<Packument>, TransportError>;

/// 메모이즈 레지스트리 클라이언트
pub struct RegistryClient<F: Fetcher> {
    fetcher: Arc<F>,
    base_url: String,
    cache: Mutex<HashMap<String, Arc<OnceCell<CachedPackument>>>>,
}

impl<F: Fetcher> RegistryClient<F> {
    /// 설정의 레지스트리 엔드포인트로 클라이언트를 생성합니다.
    pub fn new(fetcher: Arc<F>, sources: &SourcesConfig) -> Self {
        Self {
            fetcher,
            base_url: sources.registry_url.trim_end_matches('/').to_owned(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// 패키지 이름의 문서 URL을 반환합니다. scope 구분자 `/`는 `%2F`로 인코딩합니다.
    pub fn packument_url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name.replace('/', "%2F"))
    }

    /// 패키지 문서를 조회합니다.
    ///
    /// 같은 이름에 대한 동시 호출은 하나의 요청을 공유하며,
    /// 이후 호출은 첫 결과(실패 포함)를 그대로 받습니다.
    pub async fn packument(&self, name: &str) -> CachedPackument {
        let cell = {
            let mut cache = self.cache.lock().await;
            Arc::clone(cache.entry(name.to_owned()).or_default())
        };

        cell.get_or_init(|| self.fetch(name)).await.clone()
    }

    /// 지금까지 조회(또는 조회 시도)한 이름 수
    #[cfg(test)]
    pub(crate) async fn cached_names(&self) -> usize {
        self.cache.lock().await.len()
    }

    async fn fetch(&self, name: &str) -> CachedPackument {
        let url = self.packument_url(name);
        debug!(package = %name, url = %url, "fetching registry metadata");
        let body = self.fetcher.get_json(&url).await?;
        decode::<Packument>(&url, body).map(Arc::new)
    }
}
