//! heatrix-tools: Built-in Tools - 내장 계산 도구들
//!
//! Layer3 - 호스트가 카탈로그를 통해 로드하는 플러그인 구현
//!
//! ## 도구 목록
//!
//! - `isolierung` - 다층 단열 열류 (공유 단열재 라이브러리 사용, 테마 대응)
//! - `stoffeigenschaften_luft` - 건조 공기 물성치 (데이터 전용 보고서)
//! - `elektrik` - 단상/3상 유효전력 (테마 대응)
//!
//! ## Layer2 연동
//! - 모든 도구는 `heatrix_core::Plugin` 구현
//! - 선택 기능은 `ThemeAware`, `ReportExporter`, `StatefulPlugin`

pub mod air;
pub mod electrical;
pub mod isolation;

mod panel;

// Re-exports
pub use air::AirPropertiesPlugin;
pub use electrical::ElectricalPlugin;
pub use isolation::IsolationPlugin;

use heatrix_core::{Plugin, PluginCatalog, PluginDescriptor};

/// 모든 내장 도구의 카탈로그
pub fn builtin_catalog() -> PluginCatalog {
    PluginCatalog::new()
        .with(isolation::ISOLATION_MODULE, isolation::ISOLATION_CLASS, || {
            Ok(Box::new(IsolationPlugin::new()) as Box<dyn Plugin>)
        })
        .with(air::AIR_MODULE, air::AIR_CLASS, || {
            Ok(Box::new(AirPropertiesPlugin::new()) as Box<dyn Plugin>)
        })
        .with(electrical::ELECTRICAL_MODULE, electrical::ELECTRICAL_CLASS, || {
            Ok(Box::new(ElectricalPlugin::new()) as Box<dyn Plugin>)
        })
}

/// 레지스트리 파일이 없을 때 쓰는 기본 디스크립터 (보고서 순서)
pub fn default_descriptors() -> Vec<PluginDescriptor> {
    vec![
        PluginDescriptor::new(
            isolation::ISOLATION_ID,
            isolation::ISOLATION_MODULE,
            isolation::ISOLATION_CLASS,
        )
        .with_name("Isolierung"),
        PluginDescriptor::new(air::AIR_ID, air::AIR_MODULE, air::AIR_CLASS)
            .with_name("Stoffeigenschaften Luft"),
        PluginDescriptor::new(
            electrical::ELECTRICAL_ID,
            electrical::ELECTRICAL_MODULE,
            electrical::ELECTRICAL_CLASS,
        )
        .with_name("Elektrik"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use heatrix_core::{PluginHost, PluginLoader, RegistryStore, SharedContext, UiAnchor, Workbench};
    use heatrix_foundation::Theme;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn test_catalog_covers_default_descriptors() {
        let catalog = builtin_catalog();
        assert_eq!(catalog.len(), 3);
        for d in default_descriptors() {
            assert!(catalog.contains(&d.module, &d.class), "{}", d.id);
            assert!(d.validate().is_ok());
        }
    }

    #[test]
    fn test_builtin_tools_start_in_host() {
        let dir = tempdir().unwrap();
        let registry = RegistryStore::new(dir.path().join("plugins.json"));
        registry.load();
        registry.seed_defaults(default_descriptors()).unwrap();

        let ui = Arc::new(Workbench::new());
        let ctx = SharedContext::in_memory(ui.clone()).unwrap();
        let mut host = PluginHost::new(ctx, PluginLoader::new(builtin_catalog()));

        let report = host.start(&registry).unwrap();
        assert_eq!(report.active.len(), 3);
        assert!(report.failed.is_empty());

        let titles: Vec<String> = ui.tabs().into_iter().map(|t| t.title).collect();
        assert_eq!(titles, vec!["Isolierung", "Stoffeigenschaften Luft", "Elektrik"]);

        host.set_theme(Theme::Dark);
        let doc = host.generate_report("Bericht");
        assert_eq!(
            doc.block_titles(),
            vec!["Isolierung", "Stoffeigenschaften Luft", "Elektrik"]
        );
        assert!(doc.to_html().contains("<table class=\"power\">"));
    }
}
