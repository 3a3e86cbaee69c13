//! Error types for Heatrix
//!
//! 호스트 인프라(설정, 저장소, 검증) 에러를 중앙에서 관리.
//! 플러그인 경계 에러(LoadError, AttachError 등)는 heatrix-core에 있음.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Heatrix 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 설정 관련
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // 저장소 관련
    // ========================================================================
    #[error("Storage error: {0}")]
    Storage(String),

    // ========================================================================
    // 일반
    // ========================================================================
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation error: {0}")]
    Validation(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    // ========================================================================
    // 기타
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// 사용자에게 보여줄 수 있는 에러인지 확인
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_) | Error::InvalidInput(_) | Error::Validation(_)
        )
    }

    /// NotFound 에러 생성 헬퍼
    pub fn not_found(what: impl Into<String>) -> Self {
        Error::NotFound(what.into())
    }

    /// Validation 에러 생성 헬퍼
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }
}

// ============================================================================
// From 구현 (추가 변환)
// ============================================================================

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing() {
        assert!(Error::not_found("project 42").is_user_facing());
        assert!(Error::validation("empty name").is_user_facing());
        assert!(!Error::Storage("disk full".into()).is_user_facing());
    }

    #[test]
    fn test_display() {
        let err = Error::not_found("project 42");
        assert_eq!(err.to_string(), "Not found: project 42");

        let err: Error = "boom".into();
        assert!(matches!(err, Error::Internal(_)));
    }
}
