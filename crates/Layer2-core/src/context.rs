//! Shared Context - 플러그인에 주입되는 호스트 서비스
//!
//! attach 시 모든 플러그인이 같은 컨텍스트를 받는다. 필드는 비공개이고
//! 접근자만 노출되므로 플러그인이 서비스를 교체할 수 없다.
//!
//! ## 사용 예시
//! ```ignore
//! fn attach(&mut self, ctx: &SharedContext) -> Result<(), PluginError> {
//!     let tab = ctx.ui().create_container("Isolierung");
//!     ctx.ui().register_tab(tab)?;
//!     let state = ctx.projects().get("isolierung");
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use crate::isolation::IsolationLibrary;
use crate::project::ProjectManager;
use crate::report::ReportManager;
use crate::ui::UiAnchor;

/// 공유 서비스 묶음
#[derive(Clone)]
pub struct SharedContext {
    ui: Arc<dyn UiAnchor>,
    projects: Arc<ProjectManager>,
    isolation: Arc<IsolationLibrary>,
    reports: Arc<ReportManager>,
}

impl SharedContext {
    pub fn new(
        ui: Arc<dyn UiAnchor>,
        projects: Arc<ProjectManager>,
        isolation: Arc<IsolationLibrary>,
        reports: Arc<ReportManager>,
    ) -> Self {
        Self {
            ui,
            projects,
            isolation,
            reports,
        }
    }

    /// 인메모리 서비스로 구성 (테스트)
    pub fn in_memory(ui: Arc<dyn UiAnchor>) -> heatrix_foundation::Result<Self> {
        Ok(Self::new(
            ui,
            Arc::new(ProjectManager::in_memory()),
            Arc::new(IsolationLibrary::in_memory()?),
            Arc::new(ReportManager::new()),
        ))
    }

    pub fn ui(&self) -> &dyn UiAnchor {
        self.ui.as_ref()
    }

    pub fn projects(&self) -> &ProjectManager {
        &self.projects
    }

    pub fn isolation(&self) -> &IsolationLibrary {
        &self.isolation
    }

    pub fn reports(&self) -> &ReportManager {
        &self.reports
    }

    /// 리스너 등에서 보관할 수 있는 핸들
    pub fn isolation_handle(&self) -> Arc<IsolationLibrary> {
        Arc::clone(&self.isolation)
    }
}

impl fmt::Debug for SharedContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedContext")
            .field("tabs", &self.ui.tabs().len())
            .field("projects", &self.projects.len())
            .finish_non_exhaustive()
    }
}
