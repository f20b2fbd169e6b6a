//! Error types for Kiln
//!
//! 런타임 전체의 에러를 중앙에서 관리

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Kiln 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 입력/설정 관련
    // ========================================================================
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // 조회 관련
    // ========================================================================
    #[error("Not found: {0}")]
    NotFound(String),

    // ========================================================================
    // 플러그인 관련
    // ========================================================================
    #[error("Plugin {plugin} has unresolved dependencies: {}", .missing.join(", "))]
    Dependency { plugin: String, missing: Vec<String> },

    #[error("Invalid state for {plugin}: expected {expected}, found {actual}")]
    InvalidState {
        plugin: String,
        expected: String,
        actual: String,
    },

    // ========================================================================
    // 실행 관련
    // ========================================================================
    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Execution failed: {message}")]
    Execution {
        message: String,
        #[source]
        cause: Option<Box<Error>>,
    },

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ========================================================================
    // 기타
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

/// 에러 분류 - 호출자가 match 하기 위한 닫힌 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Dependency,
    State,
    Timeout,
    Execution,
    Other,
}

impl Error {
    /// 에러 분류 반환
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) | Error::Config(_) => ErrorKind::Validation,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Dependency { .. } => ErrorKind::Dependency,
            Error::InvalidState { .. } => ErrorKind::State,
            Error::Timeout(_) => ErrorKind::Timeout,
            Error::Execution { .. } => ErrorKind::Execution,
            Error::Io(_) | Error::Json(_) | Error::Internal(_) => ErrorKind::Other,
        }
    }

    /// 사용자에게 보여줄 수 있는 에러인지 확인
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Validation | ErrorKind::NotFound | ErrorKind::Dependency
        )
    }

    /// 누락된 의존성 목록 (Dependency 에러인 경우)
    pub fn missing_dependencies(&self) -> Option<&[String]> {
        match self {
            Error::Dependency { missing, .. } => Some(missing),
            _ => None,
        }
    }

    /// 실행 에러 생성 헬퍼
    pub fn execution(message: impl Into<String>, cause: Option<Error>) -> Self {
        Error::Execution {
            message: message.into(),
            cause: cause.map(Box::new),
        }
    }

    /// 상태 에러 생성 헬퍼
    pub fn invalid_state(
        plugin: impl Into<String>,
        expected: impl Into<String>,
        actual: impl ToString,
    ) -> Self {
        Error::InvalidState {
            plugin: plugin.into(),
            expected: expected.into(),
            actual: actual.to_string(),
        }
    }

    /// 의존성 에러 생성 헬퍼
    pub fn dependency(plugin: impl Into<String>, missing: Vec<String>) -> Self {
        Error::Dependency {
            plugin: plugin.into(),
            missing,
        }
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
    use std::error::Error as _;

    #[test]
    fn test_dependency_message_lists_missing() {
        let err = Error::dependency("chat", vec!["auth".into(), "storage".into()]);

        assert_eq!(err.kind(), ErrorKind::Dependency);
        assert_eq!(
            err.to_string(),
            "Plugin chat has unresolved dependencies: auth, storage"
        );
        assert_eq!(err.missing_dependencies().map(|m| m.len()), Some(2));
    }

    #[test]
    fn test_execution_keeps_cause() {
        let err = Error::execution("hook failed", Some(Error::Timeout("slow".into())));

        assert_eq!(err.kind(), ErrorKind::Execution);
        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("Timeout: slow"));
    }

    #[test]
    fn test_user_facing() {
        assert!(Error::NotFound("x".into()).is_user_facing());
        assert!(!Error::Internal("x".into()).is_user_facing());
        assert!(!Error::invalid_state("p", "active", "loaded").is_user_facing());
    }
}
