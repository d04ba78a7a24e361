//! HTTP 전송 추상화
//!
//! [`Fetcher`] trait은 trust anchor 호출에 필요한 두 가지 동작(JSON GET, JSON POST)만
//! 정의합니다. 운영 코드는 [`HttpFetcher`]를, 단위 테스트는 `MockFetcher`를 사용합니다.
//!
//! ```text
//!   OsvClient   RegistryClient
//!        \          /
//!         ▼        ▼
//!        ┌──────────┐
//!        │ Fetcher  │ (trait)
//!        └──────────┘
//!          │      │
//!          ▼      ▼
//!     HttpFetcher MockFetcher
//! ```
//!
//! 모든 호출은 `sources.timeout_secs`의 제한을 받으며, 타임아웃은 non-2xx 응답과
//! 동일하게 [`TransportError`]로 보고됩니다.

use std::future::Future;
use std::time::Duration;

use serde_json::Value;

use lockwarden_core::config::SourcesConfig;
use lockwarden_core::error::TransportError;

use crate::error::AuditError;

/// trust anchor 호출용 전송 trait
///
/// `Send + Sync + 'static`이므로 `Arc`로 감싸 여러 태스크에서 공유할 수 있습니다.
pub trait Fetcher: Send + Sync + 'static {
    /// `url`에 GET 요청을 보내고 JSON 본문을 반환합니다.
    ///
    /// # Errors
    ///
    /// 연결 실패, 타임아웃, non-2xx 응답, JSON이 아닌 본문은 모두 [`TransportError`]입니다.
    fn get_json(&self, url: &str) -> impl Future<Output = Result<Value, TransportError>> + Send;

    /// `url`에 JSON 본문으로 POST 요청을 보내고 JSON 본문을 반환합니다.
    fn post_json(
        &self,
        url: &str,
        body: &Value,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send;
}

/// `reqwest` 기반 운영 전송 구현
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpFetcher {
    /// 설정의 타임아웃과 User-Agent로 클라이언트를 생성합니다.
    pub fn new(sources: &SourcesConfig) -> Result<Self, AuditError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(sources.timeout_secs))
            .user_agent(sources.user_agent.as_str())
            .build()
            .map_err(|e| AuditError::Client(e.to_string()))?;

        Ok(Self {
            client,
            timeout_secs: sources.timeout_secs,
        })
    }

    async fn send(
        &self,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<Value, TransportError> {
        let response = request
            .send()
            .await
            .map_err(|e| self.classify(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_owned(),
                status: status.as_u16(),
            });
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_timeout() {
                self.classify(url, &e)
            } else {
                TransportError::Decode {
                    url: url.to_owned(),
                    reason: e.to_string(),
                }
            }
        })
    }

    fn classify(&self, url: &str, err: &reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout {
                url: url.to_owned(),
                timeout_secs: self.timeout_secs,
            }
        } else {
            TransportError::Request {
                url: url.to_owned(),
                reason: err.to_string(),
            }
        }
    }
}

impl Fetcher for HttpFetcher {
    async fn get_json(&self, url: &str) -> Result<Value, TransportError> {
        self.send(url, self.client.get(url)).await
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Value, TransportError> {
        self.send(url, self.client.post(url).json(body)).await
    }
}

/// 테스트용 Mock 전송
///
/// URL별로 응답을 지정하고, 호출 횟수와 POST 본문을 기록합니다.
/// 등록되지 않은 URL은 HTTP 404로 응답합니다.
#[cfg(test)]
#[derive(Default)]
pub struct MockFetcher {
    responses: std::collections::HashMap<String, Result<Value, TransportError>>,
    calls: std::sync::Mutex<std::collections::HashMap<String, usize>>,
    posted: std::sync::Mutex<Vec<Value>>,
}

#[cfg(test)]
impl MockFetcher {
    /// 응답이 없는 mock을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// `url`에 대한 성공 응답을 등록합니다.
    pub fn with_json(mut self, url: &str, body: Value) -> Self {
        self.responses.insert(url.to_owned(), Ok(body));
        self
    }

    /// `url`이 지정한 HTTP 상태로 실패하도록 등록합니다.
    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        self.responses.insert(
            url.to_owned(),
            Err(TransportError::Status {
                url: url.to_owned(),
                status,
            }),
        );
        self
    }

    /// `url`이 타임아웃으로 실패하도록 등록합니다.
    pub fn with_timeout(mut self, url: &str) -> Self {
        self.responses.insert(
            url.to_owned(),
            Err(TransportError::Timeout {
                url: url.to_owned(),
                timeout_secs: 15,
            }),
        );
        self
    }

    /// `url`이 호출된 횟수를 반환합니다.
    pub fn calls(&self, url: &str) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.get(url).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// 전체 호출 횟수를 반환합니다.
    pub fn total_calls(&self) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.values().sum())
            .unwrap_or(0)
    }

    /// 지금까지 POST된 본문 목록을 반환합니다.
    pub fn posted_bodies(&self) -> Vec<Value> {
        self.posted.lock().map(|p| p.clone()).unwrap_or_default()
    }

    fn respond(&self, url: &str) -> Result<Value, TransportError> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls.entry(url.to_owned()).or_insert(0) += 1;
        }
        self.responses.get(url).cloned().unwrap_or_else(|| {
            Err(TransportError::Status {
                url: url.to_owned(),
                status: 404,
            })
        })
    }
}

#[cfg(test)]
impl Fetcher for MockFetcher {
    async fn get_json(&self, url: &str) -> Result<Value, TransportError> {
        self.respond(url)
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Value, TransportError> {
        if let Ok(mut posted) = self.posted.lock() {
            posted.push(body.clone());
        }
        self.respond(url)
    }
}
