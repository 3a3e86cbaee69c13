//! # heatrix-foundation
//!
//! Foundation layer for Heatrix:
//! - Error: 호스트 공통 에러 타입
//! - Storage: JsonStore (레지스트리, 프로젝트, 설정 파일)
//! - Config: 통합 설정 (HostConfig, Theme, LoadPolicy)

pub mod config;
pub mod error;
pub mod storage;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{
    HostConfig, LoadPolicy, Theme, DEFAULT_ISOLATION_DB, DEFAULT_PROJECTS_FILE,
    DEFAULT_REGISTRY_FILE, DEFAULT_REPORT_TITLE, HOST_CONFIG_FILE,
};

// ============================================================================
// Storage (저장소)
// ============================================================================
pub use storage::{JsonStore, APP_DIR_NAME, PROJECT_DIR_NAME};
