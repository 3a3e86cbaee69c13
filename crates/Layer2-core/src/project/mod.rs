//! Project Manager - 프로젝트와 플러그인별 상태 blob
//!
//! 프로젝트는 플러그인 identity → 불투명 JSON blob 맵을 가진다.
//! 항상 최대 하나의 "현재" 프로젝트가 있고, 플러그인은 자기 blob만 읽고 쓴다.
//!
//! ## 구조
//! - `model`: Project, ProjectSummary
//! - `store`: ProjectStore (projects.json)
//! - `manager`: ProjectManager (작업 사본 + 원자적 전환)

mod manager;
mod model;
mod store;

pub use manager::ProjectManager;
pub use model::{Project, ProjectSummary};
pub use store::{ProjectSet, ProjectStore, PROJECTS_FORMAT_VERSION};
