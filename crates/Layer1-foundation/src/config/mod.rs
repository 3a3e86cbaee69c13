//! Config - 통합 설정 관리
//!
//! - `host.rs` - HostConfig 통합 설정, Theme, LoadPolicy

mod host;

pub use host::{
    HostConfig, LoadPolicy, Theme, DEFAULT_ISOLATION_DB, DEFAULT_PROJECTS_FILE,
    DEFAULT_REGISTRY_FILE, DEFAULT_REPORT_TITLE, HOST_CONFIG_FILE,
};
