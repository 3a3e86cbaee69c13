//! JSON 파일 저장소

use crate::{Error, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// 애플리케이션 디렉토리 이름
pub const APP_DIR_NAME: &str = "heatrix";

/// 프로젝트 로컬 설정 디렉토리 이름
pub const PROJECT_DIR_NAME: &str = ".heatrix";

/// JSON 파일 저장소
///
/// `base_dir` 아래의 파일을 JSON으로 읽고 쓴다. 저장은 임시 파일에 기록한 뒤
/// rename으로 교체하므로, 쓰기 도중 중단되어도 기존 파일은 깨지지 않는다.
#[derive(Debug, Clone)]
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// 글로벌 설정 (~/.config/heatrix/)
    pub fn global() -> Result<Self> {
        let dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Cannot find config directory".to_string()))?
            .join(APP_DIR_NAME);
        Ok(Self::new(dir))
    }

    /// 기본 데이터 디렉토리 (~/.local/share/heatrix/)
    pub fn data() -> Result<Self> {
        let dir = dirs::data_dir()
            .ok_or_else(|| Error::Config("Cannot find data directory".to_string()))?
            .join(APP_DIR_NAME);
        Ok(Self::new(dir))
    }

    /// 프로젝트 설정 (.heatrix/)
    pub fn project(root: impl Into<PathBuf>) -> Self {
        Self::new(root.into().join(PROJECT_DIR_NAME))
    }

    /// 현재 디렉토리 프로젝트 설정
    pub fn current_project() -> Result<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| Error::Config(format!("Cannot get current directory: {}", e)))?;
        Ok(Self::project(cwd))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn file_path(&self, filename: &str) -> PathBuf {
        self.base_dir.join(filename)
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.base_dir.exists() {
            std::fs::create_dir_all(&self.base_dir)
                .map_err(|e| Error::Storage(format!("Failed to create directory: {}", e)))?;
        }
        Ok(())
    }

    /// JSON 로드
    pub fn load<T: DeserializeOwned>(&self, filename: &str) -> Result<T> {
        let path = self.file_path(filename);
        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::Storage(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| Error::InvalidInput(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// JSON 로드 (기본값)
    pub fn load_or_default<T: DeserializeOwned + Default>(&self, filename: &str) -> T {
        self.load(filename).unwrap_or_default()
    }

    /// JSON 로드 (Optional)
    pub fn load_optional<T: DeserializeOwned>(&self, filename: &str) -> Result<Option<T>> {
        let path = self.file_path(filename);
        if !path.exists() {
            return Ok(None);
        }
        self.load(filename).map(Some)
    }

    /// JSON 저장 (임시 파일 + rename)
    pub fn save<T: Serialize>(&self, filename: &str, data: &T) -> Result<()> {
        self.ensure_dir()?;
        let path = self.file_path(filename);
        let content = serde_json::to_string_pretty(data)
            .map_err(|e| Error::Storage(format!("Failed to serialize: {}", e)))?;

        let tmp = self.file_path(&format!(".{}.tmp", filename));
        std::fs::write(&tmp, content)
            .map_err(|e| Error::Storage(format!("Failed to write {}: {}", tmp.display(), e)))?;
        std::fs::rename(&tmp, &path).map_err(|e| {
            Error::Storage(format!("Failed to replace {}: {}", path.display(), e))
        })?;

        debug!("Saved {}", path.display());
        Ok(())
    }

    /// 파일 존재 여부
    pub fn exists(&self, filename: &str) -> bool {
        self.file_path(filename).exists()
    }

    /// 파일 삭제
    pub fn remove(&self, filename: &str) -> Result<()> {
        let path = self.file_path(filename);
        if path.exists() {
            std::fs::remove_file(&path).map_err(|e| {
                Error::Storage(format!("Failed to remove {}: {}", path.display(), e))
            })?;
        }
        Ok(())
    }
}
