//! projects.json 저장소

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::model::Project;
use heatrix_foundation::{JsonStore, Result};

/// 파일 포맷 버전
pub const PROJECTS_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectsFile {
    format_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    current: Option<String>,
    #[serde(default)]
    projects: Vec<Project>,
}

/// 로드된 프로젝트 집합
#[derive(Debug, Clone, Default)]
pub struct ProjectSet {
    pub projects: Vec<Project>,
    /// 마지막으로 선택된 프로젝트
    pub current: Option<String>,
}

/// 프로젝트 파일 저장소
#[derive(Debug, Clone)]
pub struct ProjectStore {
    store: JsonStore,
    filename: String,
}

impl ProjectStore {
    pub fn new(store: JsonStore, filename: impl Into<String>) -> Self {
        Self {
            store,
            filename: filename.into(),
        }
    }

    pub fn path(&self) -> std::path::PathBuf {
        self.store.file_path(&self.filename)
    }

    /// 로드 (없거나 깨진 파일은 빈 목록)
    pub fn load(&self) -> ProjectSet {
        match self.store.load_optional::<ProjectsFile>(&self.filename) {
            Ok(Some(file)) => {
                if file.format_version != PROJECTS_FORMAT_VERSION {
                    warn!(
                        "Projects file has format version {}, expected {}",
                        file.format_version, PROJECTS_FORMAT_VERSION
                    );
                }
                debug!("Loaded {} projects", file.projects.len());
                ProjectSet {
                    projects: file.projects,
                    current: file.current,
                }
            }
            Ok(None) => ProjectSet::default(),
            Err(e) => {
                warn!("Projects file {} is unreadable, starting empty: {}", self.path().display(), e);
                ProjectSet::default()
            }
        }
    }

    /// 전체 교체 저장 (원자적 rename)
    pub fn save(&self, projects: &[Project], current: Option<&str>) -> Result<()> {
        let file = ProjectsFile {
            format_version: PROJECTS_FORMAT_VERSION,
            current: current.map(str::to_string),
            projects: projects.to_vec(),
        };
        self.store.save(&self.filename, &file)
    }
}
