//! 감사 파이프라인 에러 타입
//!
//! [`AuditError`]는 감사 실행 자체를 중단시키는 에러만 나타냅니다.
//! 프로젝트 단위의 해석 실패나 trust anchor 호출 실패는 여기에 포함되지 않으며,
//! [`ProjectReport`](lockwarden_core::ProjectReport)에 기록된 뒤 감사가 계속됩니다.
//!
//! [`EvaluatorError`]는 개별 평가기가 orchestrator에 돌려주는 실패입니다.

use lockwarden_core::error::{LockwardenError, TransportError};

/// 감사 실행 에러
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// 스캔 루트가 존재하지 않음
    #[error("scan root not found: {path}")]
    RootNotFound {
        /// 요청된 경로
        path: String,
    },

    /// 스캔 루트가 디렉토리가 아님
    #[error("scan root is not a directory: {path}")]
    NotADirectory {
        /// 요청된 경로
        path: String,
    },

    /// 유효하지 않은 설정
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// HTTP 클라이언트 초기화 실패
    #[error("failed to initialize http client: {0}")]
    Client(String),

    /// blocking 태스크 또는 프로젝트 태스크 join 실패
    #[error("task join error: {0}")]
    Join(String),
}

impl From<AuditError> for LockwardenError {
    fn from(err: AuditError) -> Self {
        match err {
            AuditError::Config { field, reason } => {
                LockwardenError::Config(lockwarden_core::ConfigError::InvalidValue {
                    field,
                    reason,
                })
            }
            other => LockwardenError::Audit(other.to_string()),
        }
    }
}

impl From<LockwardenError> for AuditError {
    fn from(err: LockwardenError) -> Self {
        match err {
            LockwardenError::Config(lockwarden_core::ConfigError::InvalidValue {
                field,
                reason,
            }) => AuditError::Config { field, reason },
            other => AuditError::Config {
                field: "config".to_owned(),
                reason: other.to_string(),
            },
        }
    }
}

/// 평가기 실패
///
/// orchestrator는 이 에러를 경고로 기록하고 해당 평가기의 발견 사항을 0건으로 처리합니다.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EvaluatorError {
    /// trust anchor 호출 실패
    #[error(transparent)]
    Transport(#[from] TransportError),
}
