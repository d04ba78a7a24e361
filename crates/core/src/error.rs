//! 에러 타입 -- 도메인별 에러 정의
//!
//! # 에러 분류
//!
//! - **설정**: [`ConfigError`] -- 잘못된 설정 파일이나 값. 실행 전에 보고됩니다.
//! - **해석**: [`ResolutionError`] -- lockfile/manifest를 읽거나 파싱하지 못함.
//!   해당 프로젝트의 패키지 목록을 빈 목록으로 만들 뿐 전파되지 않습니다.
//! - **전송**: [`TransportError`] -- trust anchor 호출 실패 (네트워크, 타임아웃, non-2xx).
//!   해당 호출에서 발견 사항 0건으로 처리되며 경고로만 표시됩니다.

/// lockwarden 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum LockwardenError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 의존성 해석 에러
    #[error("resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    /// trust anchor 전송 에러
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// 감사 파이프라인 실행 에러 (스캔 루트 없음 등)
    #[error("audit error: {0}")]
    Audit(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 의존성 소스(lockfile, node_modules, package.json) 해석 에러
#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    /// 파일 읽기 실패
    #[error("failed to read {path}: {source}")]
    Io {
        /// 대상 파일 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },

    /// JSON 구문 또는 구조 오류
    #[error("failed to parse {path}: {reason}")]
    Parse {
        /// 대상 파일 경로
        path: String,
        /// 파싱 실패 사유
        reason: String,
    },

    /// 파일 크기 초과
    #[error("file too large: {path}: {size} bytes (max: {max})")]
    FileTooBig {
        /// 파일 경로
        path: String,
        /// 실제 파일 크기 (바이트)
        size: u64,
        /// 최대 허용 크기 (바이트)
        max: u64,
    },
}

/// trust anchor 호출 실패
///
/// 실패한 호출은 같은 실행 안에서 메모이즈될 수 있으므로 `Clone`을 구현합니다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// 연결 실패 등 요청 자체가 완료되지 않음
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    /// 호출별 타임아웃 초과
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    /// 2xx가 아닌 응답
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// 응답 본문을 기대한 형식으로 해석할 수 없음
    #[error("failed to decode response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

impl TransportError {
    /// 실패한 요청의 URL을 반환합니다.
    pub fn url(&self) -> &str {
        match self {
            Self::Request { url, .. }
            | Self::Timeout { url, .. }
            | Self::Status { url, .. }
            | Self::Decode { url, .. } => url,
        }
    }
}
