//! Trust anchor 클라이언트
//!
//! - [`OsvClient`]: 취약점 DB 배치 질의 및 권고 상세 조회
//! - [`RegistryClient`]: npm 레지스트리 메타데이터(packument) 조회, 이름별 메모이즈
//!
//! 두 클라이언트 모두 주입된 [`Fetcher`](crate::fetch::Fetcher) 위에서 동작하며
//! 응답 JSON을 내부 타입으로 해석합니다. 해석 실패는 `TransportError::Decode`입니다.

pub mod osv;
pub mod registry;

pub use osv::OsvClient;
pub use registry::{Dist, Packument, RegistryClient, VersionMeta};

use serde::de::DeserializeOwned;
use serde_json::Value;

use lockwarden_core::error::TransportError;

/// 응답 JSON을 지정한 타입으로 변환합니다.
pub(crate) fn decode<T: DeserializeOwned>(url: &str, body: Value) -> Result<T, TransportError> {
    serde_json::from_value(body).map_err(|e| TransportError::Decode {
        url: url.to_owned(),
        reason: e.to_string(),
    })
}
