//! heatrix-core: Core Runtime for Heatrix
//!
//! Layer2 - 플러그인 호스트와 공유 서비스
//!
//! # 주요 모듈
//!
//! - `plugin`: 레지스트리, 로더, 호스트 라이프사이클, 진단
//! - `context`: 플러그인에 주입되는 SharedContext
//! - `ui`: UiAnchor 경계와 헤드리스 Workbench
//! - `project`: 프로젝트와 플러그인별 상태 blob
//! - `isolation`: SQLite 기반 단열재 라이브러리
//! - `report`: 통합 보고서 수집/렌더링
//!
//! # 사용 예시
//!
//! ```ignore
//! use heatrix_core::{PluginHost, PluginLoader, RegistryStore, SharedContext, Workbench};
//!
//! let ctx = SharedContext::in_memory(Arc::new(Workbench::new()))?;
//! let registry = RegistryStore::new("plugins.json");
//! registry.load();
//!
//! let mut host = PluginHost::new(ctx, PluginLoader::new(catalog));
//! host.start(&registry)?;
//!
//! let doc = host.generate_report("Bericht");
//! std::fs::write("bericht.html", doc.to_html())?;
//! ```

pub mod context;
pub mod isolation;
pub mod plugin;
pub mod project;
pub mod report;
pub mod ui;

// Re-exports: Context
pub use context::SharedContext;

// Re-exports: Plugin
pub use plugin::{
    attach_one, display_version, load_one, AttachError, Diagnostic, Diagnostics, EntryStatus,
    FailureKind, LoadError, Plugin, PluginCatalog, PluginDescriptor, PluginEntry, PluginError,
    PluginFactory, PluginHost, PluginLoader, PluginState, RegistryError, RegistryLoad,
    RegistryStore, ReportError, ReportExporter, Stage, StartupReport, StatefulPlugin, ThemeAware,
    UNVERSIONED,
};

// Re-exports: UI
pub use ui::{ContainerHandle, TabInfo, UiAnchor, Workbench, HOST_OWNER};

// Re-exports: Project
pub use project::{Project, ProjectManager, ProjectStore, ProjectSummary};

// Re-exports: Isolation
pub use isolation::{
    IsolationCriteria, IsolationEntry, IsolationKey, IsolationLibrary, SubscriptionId,
    UpsertOutcome,
};

// Re-exports: Report
pub use report::{
    escape_html, export_one, BlockItem, ReportBlock, ReportDocument, ReportManager, ReportSection,
    ReportSource,
};
