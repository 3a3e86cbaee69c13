//! Plugin traits - 핵심 플러그인 인터페이스
//!
//! 필수 계약은 [`Plugin`] 하나이고, 선택 기능(테마, 보고서, 상태 저장)은
//! 별도 트레이트로 분리되어 `Option` 접근자로 노출된다. 접근자가 `None`을
//! 반환하는 것은 에러가 아니라 "해당 기능 없음"을 뜻한다.

use super::error::PluginError;
use crate::context::SharedContext;
use crate::report::ReportSection;
use heatrix_foundation::Theme;
use serde_json::Value;

/// 버전이 없는 플러그인에 표시되는 값
pub const UNVERSIONED: &str = "unversioned";

// ============================================================================
// Plugin Trait - 모든 플러그인이 구현해야 하는 인터페이스
// ============================================================================

/// 계산 도구 플러그인
///
/// 로더가 인자 없이 생성하고, 호스트가 정확히 한 번 [`Plugin::attach`]를 호출한다.
/// attach에서 공유 UI 앵커에 컨테이너 하나를 만들고 탭으로 등록해야 한다.
pub trait Plugin: Send {
    /// 표시 이름 (비어 있으면 계약 위반)
    fn name(&self) -> &str;

    /// 버전 (선택)
    fn version(&self) -> Option<&str> {
        None
    }

    /// UI 등록 및 초기화
    fn attach(&mut self, ctx: &SharedContext) -> Result<(), PluginError>;

    /// 테마 변경 수신 기능
    fn theme_aware(&mut self) -> Option<&mut dyn ThemeAware> {
        None
    }

    /// 보고서 기여 기능
    fn report_exporter(&self) -> Option<&dyn ReportExporter> {
        None
    }

    /// 프로젝트 상태 저장/복원 기능
    fn stateful(&mut self) -> Option<&mut dyn StatefulPlugin> {
        None
    }
}

/// 테마 변경 훅
pub trait ThemeAware {
    fn on_theme_changed(&mut self, theme: Theme);
}

/// 보고서 기여 훅
///
/// `Ok(None)`은 이번 보고서에 기여하지 않음을 뜻한다.
pub trait ReportExporter {
    fn export_report(&self) -> Result<Option<ReportSection>, PluginError>;
}

/// 상태 저장 훅
///
/// 반환된 값은 현재 프로젝트의 `plugin_data`에 플러그인 identity로 저장된다.
/// 전환한 프로젝트에 저장된 상태가 없거나 복원에 실패하면 `reset_state`가
/// 호출되어 이전 프로젝트의 데이터가 남지 않는다.
pub trait StatefulPlugin {
    fn export_state(&self) -> Result<Value, PluginError>;
    fn import_state(&mut self, state: Value) -> Result<(), PluginError>;
    /// 기본값으로 초기화
    fn reset_state(&mut self);
}

/// 표시용 버전 문자열
pub fn display_version(plugin: &dyn Plugin) -> String {
    match plugin.version().map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => UNVERSIONED.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bare;

    impl Plugin for Bare {
        fn name(&self) -> &str {
            "Bare"
        }

        fn attach(&mut self, _ctx: &SharedContext) -> Result<(), PluginError> {
            Ok(())
        }
    }

    struct Versioned(&'static str);

    impl Plugin for Versioned {
        fn name(&self) -> &str {
            "Versioned"
        }

        fn version(&self) -> Option<&str> {
            Some(self.0)
        }

        fn attach(&mut self, _ctx: &SharedContext) -> Result<(), PluginError> {
            Ok(())
        }
    }

    #[test]
    fn test_optional_capabilities_absent() {
        let mut plugin = Bare;
        assert!(plugin.theme_aware().is_none());
        assert!(plugin.report_exporter().is_none());
        assert!(plugin.stateful().is_none());
    }

    #[test]
    fn test_display_version() {
        assert_eq!(display_version(&Bare), UNVERSIONED);
        assert_eq!(display_version(&Versioned("  ")), UNVERSIONED);
        assert_eq!(display_version(&Versioned("2.1")), "2.1");
    }
}
