//! Plugin boundary errors
//!
//! 각 라이프사이클 경계(레지스트리, 로드, attach, 보고서)마다 별도의 에러 타입.
//! 어떤 에러도 호스트 프로세스를 종료시키지 않으며, 경계에서 진단으로 기록된다.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// PluginError - 플러그인 코드가 반환하는 에러
// ============================================================================

/// 플러그인 훅이 반환하는 에러
#[derive(Debug, Error)]
#[error("{message}")]
pub struct PluginError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl PluginError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<heatrix_foundation::Error> for PluginError {
    fn from(err: heatrix_foundation::Error) -> Self {
        Self::with_source(err.to_string(), err)
    }
}

impl From<serde_json::Error> for PluginError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(format!("invalid plugin state: {}", err), err)
    }
}

// ============================================================================
// RegistryError
// ============================================================================

/// 레지스트리 저장소 에러
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Registry file not found: {0}")]
    Missing(PathBuf),

    #[error("Registry file {path} is malformed: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("Invalid registry entry #{index}: {reason}")]
    InvalidEntry { index: usize, reason: String },

    #[error("Failed to write registry: {0}")]
    Write(String),

    #[error("Plugin identity already registered: {0}")]
    DuplicateIdentity(String),

    #[error("Unknown plugin identity: {0}")]
    UnknownIdentity(String),
}

// ============================================================================
// LoadError
// ============================================================================

/// 디스크립터 → 인스턴스 변환 실패
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{id}: module '{module}' not found")]
    ModuleNotFound { id: String, module: String },

    #[error("{id}: type '{class}' not found in module '{module}'")]
    TypeNotFound {
        id: String,
        module: String,
        class: String,
    },

    #[error("{id}: contract violation: {reason}")]
    ContractViolation { id: String, reason: String },

    #[error("{id}: construction failed: {reason}")]
    ConstructionError { id: String, reason: String },
}

impl LoadError {
    /// 실패한 디스크립터의 identity
    pub fn identity(&self) -> &str {
        match self {
            LoadError::ModuleNotFound { id, .. }
            | LoadError::TypeNotFound { id, .. }
            | LoadError::ContractViolation { id, .. }
            | LoadError::ConstructionError { id, .. } => id,
        }
    }
}

// ============================================================================
// AttachError
// ============================================================================

/// attach 호출 실패
#[derive(Debug, Error)]
pub enum AttachError {
    #[error("{id}: attach failed: {source}")]
    Failed {
        id: String,
        #[source]
        source: PluginError,
    },

    #[error("{id}: attach panicked: {message}")]
    Panicked { id: String, message: String },

    #[error("{id}: expected exactly one registered tab, found {tabs}")]
    TabContract { id: String, tabs: usize },
}

impl AttachError {
    pub fn identity(&self) -> &str {
        match self {
            AttachError::Failed { id, .. }
            | AttachError::Panicked { id, .. }
            | AttachError::TabContract { id, .. } => id,
        }
    }
}

// ============================================================================
// ReportError
// ============================================================================

/// export_report 호출 실패 (이번 보고서 생성에서만 해당 섹션 제외)
#[derive(Debug, Clone, Error)]
pub enum ReportError {
    #[error("{id}: report export failed: {reason}")]
    Failed { id: String, reason: String },

    #[error("{id}: report export panicked: {message}")]
    Panicked { id: String, message: String },

    #[error("{id}: invalid report section: {reason}")]
    InvalidSection { id: String, reason: String },
}

impl ReportError {
    pub fn identity(&self) -> &str {
        match self {
            ReportError::Failed { id, .. }
            | ReportError::Panicked { id, .. }
            | ReportError::InvalidSection { id, .. } => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_identity() {
        let err = LoadError::TypeNotFound {
            id: "iso".into(),
            module: "iso.plugin".into(),
            class: "IsoPlugin".into(),
        };
        assert_eq!(err.identity(), "iso");
        assert_eq!(
            err.to_string(),
            "iso: type 'IsoPlugin' not found in module 'iso.plugin'"
        );
    }

    #[test]
    fn test_plugin_error_from_foundation() {
        let err: PluginError = heatrix_foundation::Error::not_found("project").into();
        assert_eq!(err.message(), "Not found: project");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_attach_error_display() {
        let err = AttachError::Failed {
            id: "air".into(),
            source: PluginError::new("no widget"),
        };
        assert_eq!(err.identity(), "air");
        assert_eq!(err.to_string(), "air: attach failed: no widget");
    }
}
