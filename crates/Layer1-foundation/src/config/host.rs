//! Host Config - 호스트 통합 설정
//!
//! 글로벌(`~/.config/heatrix/config.json`)과 프로젝트(`.heatrix/config.json`)
//! 설정을 병합한다. 파일에 없는 값은 `None`으로 남고, 접근자가 기본값을 채운다.

use crate::storage::JsonStore;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// 설정 파일명
pub const HOST_CONFIG_FILE: &str = "config.json";

/// 기본 레지스트리 파일명
pub const DEFAULT_REGISTRY_FILE: &str = "plugins.json";

/// 기본 프로젝트 파일명
pub const DEFAULT_PROJECTS_FILE: &str = "projects.json";

/// 기본 재료 라이브러리 DB 파일명
pub const DEFAULT_ISOLATION_DB: &str = "isolation.db";

/// 기본 보고서 제목
pub const DEFAULT_REPORT_TITLE: &str = "Heatrix Bericht";

// ============================================================================
// Theme
// ============================================================================

/// UI 테마
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub const ALL: [Theme; 2] = [Theme::Light, Theme::Dark];

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(Error::InvalidInput(format!("Unknown theme: {}", other))),
        }
    }
}

// ============================================================================
// LoadPolicy
// ============================================================================

/// 플러그인 로드 실패 시 정책
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadPolicy {
    /// 실패를 기록하고 다음 플러그인 계속 로드
    #[default]
    Skip,
    /// 첫 실패에서 시작 중단
    Abort,
}

// ============================================================================
// HostConfig
// ============================================================================

/// Heatrix 호스트 설정
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostConfig {
    /// 데이터 디렉토리 (레지스트리, 프로젝트, 재료 DB)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projects_file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isolation_db: Option<String>,

    /// 시작 테마
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,

    /// 로드 실패 정책
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_load_failure: Option<LoadPolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_title: Option<String>,

    /// 레지스트리 파일이 없을 때 기본 플러그인 목록으로 생성
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_default_registry: Option<bool>,
}

impl HostConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Load / Save
    // ========================================================================

    /// 글로벌 + 프로젝트 병합 로드
    pub fn load() -> Result<Self> {
        let mut config = Self::new();

        // 1. 글로벌 설정
        if let Ok(global) = JsonStore::global() {
            if let Some(global_config) = global.load_optional::<HostConfig>(HOST_CONFIG_FILE)? {
                config.merge(global_config);
            }
        }

        // 2. 프로젝트 설정
        if let Ok(project) = JsonStore::current_project() {
            if let Some(project_config) = project.load_optional::<HostConfig>(HOST_CONFIG_FILE)? {
                config.merge(project_config);
            }
        }

        Ok(config)
    }

    /// 특정 저장소에서만 로드
    pub fn load_from(store: &JsonStore) -> Result<Self> {
        Ok(store
            .load_optional::<HostConfig>(HOST_CONFIG_FILE)?
            .unwrap_or_default())
    }

    /// 저장소에 저장
    pub fn save_to(&self, store: &JsonStore) -> Result<()> {
        store.save(HOST_CONFIG_FILE, self)
    }

    // ========================================================================
    // Merge
    // ========================================================================

    /// 다른 설정과 병합 (other가 우선)
    pub fn merge(&mut self, other: HostConfig) {
        if other.data_dir.is_some() {
            self.data_dir = other.data_dir;
        }
        if other.registry_file.is_some() {
            self.registry_file = other.registry_file;
        }
        if other.projects_file.is_some() {
            self.projects_file = other.projects_file;
        }
        if other.isolation_db.is_some() {
            self.isolation_db = other.isolation_db;
        }
        if other.theme.is_some() {
            self.theme = other.theme;
        }
        if other.on_load_failure.is_some() {
            self.on_load_failure = other.on_load_failure;
        }
        if other.report_title.is_some() {
            self.report_title = other.report_title;
        }
        if other.seed_default_registry.is_some() {
            self.seed_default_registry = other.seed_default_registry;
        }
    }

    // ========================================================================
    // Builder
    // ========================================================================

    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme = Some(theme);
        self
    }

    pub fn on_load_failure(mut self, policy: LoadPolicy) -> Self {
        self.on_load_failure = Some(policy);
        self
    }

    // ========================================================================
    // Resolved values
    // ========================================================================

    /// 데이터 디렉토리 (설정 없으면 OS 데이터 디렉토리)
    pub fn resolved_data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(JsonStore::data()?.base_dir().to_path_buf()),
        }
    }

    /// 데이터 디렉토리용 저장소
    pub fn data_store(&self) -> Result<JsonStore> {
        Ok(JsonStore::new(self.resolved_data_dir()?))
    }

    pub fn registry_file_name(&self) -> &str {
        self.registry_file.as_deref().unwrap_or(DEFAULT_REGISTRY_FILE)
    }

    pub fn projects_file_name(&self) -> &str {
        self.projects_file.as_deref().unwrap_or(DEFAULT_PROJECTS_FILE)
    }

    pub fn isolation_db_name(&self) -> &str {
        self.isolation_db.as_deref().unwrap_or(DEFAULT_ISOLATION_DB)
    }

    pub fn resolved_theme(&self) -> Theme {
        self.theme.unwrap_or_default()
    }

    pub fn load_policy(&self) -> LoadPolicy {
        self.on_load_failure.unwrap_or_default()
    }

    pub fn resolved_report_title(&self) -> &str {
        self.report_title.as_deref().unwrap_or(DEFAULT_REPORT_TITLE)
    }

    pub fn seeds_default_registry(&self) -> bool {
        self.seed_default_registry.unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = HostConfig::new();
        assert_eq!(config.registry_file_name(), DEFAULT_REGISTRY_FILE);
        assert_eq!(config.resolved_theme(), Theme::Light);
        assert_eq!(config.load_policy(), LoadPolicy::Skip);
        assert_eq!(config.resolved_report_title(), DEFAULT_REPORT_TITLE);
        assert!(config.seeds_default_registry());
    }

    #[test]
    fn test_merge_later_wins() {
        let mut base = HostConfig::new().theme(Theme::Dark);
        base.report_title = Some("Global".into());

        let mut project = HostConfig::new().on_load_failure(LoadPolicy::Abort);
        project.report_title = Some("Projekt".into());

        base.merge(project);

        assert_eq!(base.resolved_theme(), Theme::Dark);
        assert_eq!(base.load_policy(), LoadPolicy::Abort);
        assert_eq!(base.resolved_report_title(), "Projekt");
    }

    #[test]
    fn test_camel_case_file() {
        let temp = TempDir::new().unwrap();
        let store = JsonStore::new(temp.path());
        std::fs::write(
            store.file_path(HOST_CONFIG_FILE),
            r#"{ "theme": "dark", "onLoadFailure": "abort", "registryFile": "tools.json" }"#,
        )
        .unwrap();

        let config = HostConfig::load_from(&store).unwrap();
        assert_eq!(config.resolved_theme(), Theme::Dark);
        assert_eq!(config.load_policy(), LoadPolicy::Abort);
        assert_eq!(config.registry_file_name(), "tools.json");
    }

    #[test]
    fn test_theme_parse() {
        assert_eq!("Dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert_eq!(" light ".parse::<Theme>().unwrap(), Theme::Light);
        assert!("sepia".parse::<Theme>().is_err());
        assert_eq!(Theme::Dark.to_string(), "dark");
    }
}
