//! # Plugin System
//!
//! Heatrix 계산 도구 플러그인 시스템
//!
//! ## 아키텍처
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        PluginHost                            │
//! │                                                              │
//! │  RegistryStore ──► PluginLoader ──► attach ──► Active        │
//! │  (plugins.json)    (PluginCatalog)    │                      │
//! │                                       ▼                      │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │                    SharedContext                       │  │
//! │  │  - UiAnchor (탭)                                       │  │
//! │  │  - ProjectManager (플러그인별 상태 blob)               │  │
//! │  │  - IsolationLibrary (단열재 라이브러리)                │  │
//! │  │  - ReportManager (통합 보고서)                         │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │                                                              │
//! │  Diagnostics: 단계별 실패 기록 (호스트는 계속 실행)          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 예시
//!
//! ```ignore
//! let catalog = PluginCatalog::new()
//!     .with("heatrix.tools.air", "AirPropertiesPlugin", || Ok(Box::new(AirPlugin::new())));
//!
//! let registry = RegistryStore::new(data_dir.join("plugins.json"));
//! registry.load();
//!
//! let mut host = PluginHost::new(ctx, PluginLoader::new(catalog));
//! let report = host.start(&registry)?;
//! host.set_theme(Theme::Dark);
//! ```

mod descriptor;
mod diagnostics;
mod error;
pub(crate) mod guard;
mod host;
mod loader;
mod store;
mod traits;

pub use descriptor::PluginDescriptor;
pub use diagnostics::{Diagnostic, Diagnostics, Stage};
pub use error::{AttachError, LoadError, PluginError, RegistryError, ReportError};
pub use host::{
    attach_one, load_one, EntryStatus, FailureKind, PluginEntry, PluginHost, PluginState,
    StartupReport,
};
pub use loader::{PluginCatalog, PluginFactory, PluginLoader};
pub use store::{RegistryFile, RegistryLoad, RegistryStore};
pub use traits::{
    display_version, Plugin, ReportExporter, StatefulPlugin, ThemeAware, UNVERSIONED,
};
