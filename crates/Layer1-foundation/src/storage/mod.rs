//! Storage module for Heatrix
//!
//! - `json`: JSON - 범용 파일 저장/로드 (레지스트리, 프로젝트, 설정)
//!
//! 재료 라이브러리의 SQLite 저장소는 heatrix-core `isolation` 모듈에 있음

mod json;

// JSON Storage (범용)
pub use json::{JsonStore, APP_DIR_NAME, PROJECT_DIR_NAME};
