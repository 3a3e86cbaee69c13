//! Runtime - 설정에서 호스트까지 조립
//!
//! 시작 순서:
//! 1. 레지스트리 로드 (첫 실행이면 내장 도구로 시드)
//! 2. 프로젝트 / 단열재 라이브러리 / 보고서 관리자 열기
//! 3. SharedContext 구성 후 호스트 시작
//! 4. 설정된 테마 적용
//!
//! 종료 시 현재 프로젝트 상태와 변경된 레지스트리를 저장한다.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

use heatrix_core::{
    IsolationLibrary, PluginHost, PluginLoader, ProjectManager, ProjectStore, RegistryStore,
    ReportManager, SharedContext, StartupReport, Workbench,
};
use heatrix_foundation::HostConfig;

/// 레지스트리 열기 (필요하면 기본 목록으로 시드)
pub fn open_registry(config: &HostConfig) -> Result<(RegistryStore, heatrix_core::RegistryLoad)> {
    let store = config.data_store()?;
    let registry = RegistryStore::in_store(store, config.registry_file_name());
    let load = registry.load();

    if config.seeds_default_registry()
        && registry
            .seed_defaults(heatrix_tools::default_descriptors())
            .context("Failed to seed plugin registry")?
    {
        info!("Created default registry at {}", registry.path().display());
    }

    Ok((registry, load))
}

/// 프로젝트 관리자 열기
pub fn open_projects(config: &HostConfig) -> Result<ProjectManager> {
    let store = config.data_store()?;
    Ok(ProjectManager::open(ProjectStore::new(
        store,
        config.projects_file_name(),
    )))
}

/// 실행 중인 호스트와 그 저장소
pub struct Runtime {
    config: HostConfig,
    registry: RegistryStore,
    ui: Arc<Workbench>,
    host: PluginHost,
}

impl Runtime {
    /// 저장소와 공유 서비스를 열고 호스트 구성 (아직 시작하지 않음)
    pub fn open(config: HostConfig) -> Result<Self> {
        let (registry, load) = open_registry(&config)?;

        let data_dir = config.resolved_data_dir()?;
        let isolation = IsolationLibrary::open(data_dir.join(config.isolation_db_name()))
            .context("Failed to open isolation library")?;
        let projects = open_projects(&config)?;

        let ui = Arc::new(Workbench::new());
        let ctx = SharedContext::new(
            ui.clone(),
            Arc::new(projects),
            Arc::new(isolation),
            Arc::new(ReportManager::new()),
        );

        let mut host = PluginHost::new(ctx, PluginLoader::new(heatrix_tools::builtin_catalog()))
            .with_policy(config.load_policy());
        host.note_registry(&load);

        debug!("Runtime opened in {}", data_dir.display());
        Ok(Self {
            config,
            registry,
            ui,
            host,
        })
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn registry(&self) -> &RegistryStore {
        &self.registry
    }

    pub fn ui(&self) -> &Workbench {
        &self.ui
    }

    pub fn host(&self) -> &PluginHost {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut PluginHost {
        &mut self.host
    }

    /// 플러그인 시작 + 테마 적용
    ///
    /// `LoadPolicy::Abort`에서 로드 실패만 에러가 된다.
    pub fn start(&mut self) -> Result<StartupReport> {
        let report = self
            .host
            .start(&self.registry)
            .context("Plugin startup aborted")?;

        let theme = self.config.resolved_theme();
        if theme != self.host.theme() {
            self.host.set_theme(theme);
        }

        info!(
            "Startup finished: {} active, {} disabled, {} failed",
            report.active.len(),
            report.skipped.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// 프로젝트 상태와 레지스트리 저장
    pub fn shutdown(&mut self) -> Result<()> {
        if let Err(e) = self.host.save_project() {
            warn!("Failed to save project: {}", e);
        }
        if self.registry.is_dirty() {
            self.registry.persist()?;
        }
        Ok(())
    }
}
