//! ReportManager - 섹션 수집 및 문서 렌더링

use chrono::Utc;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, warn};

use super::document::{BlockItem, ReportBlock, ReportDocument};
use super::section::ReportSection;
use crate::plugin::guard::guarded;
use crate::plugin::{PluginState, ReportError, ReportExporter};
use crate::ui::UiAnchor;

/// 수집 대상 하나 (호스트 인스턴스 테이블 순서)
pub struct ReportSource<'a> {
    pub plugin_id: &'a str,
    pub state: &'a PluginState,
    pub exporter: Option<&'a dyn ReportExporter>,
}

#[derive(Debug, Default)]
struct ReportSettings {
    excluded: HashSet<String>,
    last_failures: Vec<ReportError>,
}

/// 통합 보고서 관리자
#[derive(Debug, Default)]
pub struct ReportManager {
    settings: RwLock<ReportSettings>,
}

impl ReportManager {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // 포함 여부
    // ========================================================================

    /// 보고서에 플러그인 포함 여부 설정
    pub fn set_included(&self, plugin_id: &str, included: bool) {
        let mut settings = self.settings.write();
        if included {
            settings.excluded.remove(plugin_id);
        } else {
            settings.excluded.insert(plugin_id.to_string());
        }
    }

    pub fn is_included(&self, plugin_id: &str) -> bool {
        !self.settings.read().excluded.contains(plugin_id)
    }

    /// 마지막 수집에서 실패한 플러그인
    pub fn last_failures(&self) -> Vec<ReportError> {
        self.settings.read().last_failures.clone()
    }

    // ========================================================================
    // 수집
    // ========================================================================

    /// 순서대로 섹션 수집
    ///
    /// Active가 아니거나 기능이 없거나 제외된 플러그인은 건너뛴다.
    /// 한 플러그인의 실패(에러, 패닉, 빈 제목)는 그 섹션만 빠지게 한다.
    pub fn collect<'a, I>(&self, sources: I) -> Vec<ReportSection>
    where
        I: IntoIterator<Item = ReportSource<'a>>,
    {
        let mut sections = Vec::new();
        let mut failures = Vec::new();
        let mut visited = HashSet::new();

        for source in sources {
            if !source.state.is_active() {
                continue;
            }
            let Some(exporter) = source.exporter else {
                continue;
            };
            if !self.is_included(source.plugin_id) || !visited.insert(source.plugin_id) {
                continue;
            }

            match export_one(source.plugin_id, exporter) {
                Ok(Some(section)) => {
                    debug!("Report section '{}' from {}", section.title, source.plugin_id);
                    sections.push(section);
                }
                Ok(None) => debug!("{} contributed nothing to the report", source.plugin_id),
                Err(e) => {
                    warn!("{}", e);
                    failures.push(e);
                }
            }
        }

        self.settings.write().last_failures = failures;
        sections
    }

    // ========================================================================
    // 렌더링
    // ========================================================================

    /// 섹션 → 문서
    ///
    /// html은 그대로, data는 html이 없을 때만 JSON 텍스트로, content는 UI 스냅샷으로.
    pub fn render(&self, title: &str, sections: &[ReportSection], ui: &dyn UiAnchor) -> ReportDocument {
        let blocks = sections
            .iter()
            .map(|section| {
                let mut items = Vec::new();

                if let Some(handle) = section.content {
                    items.push(BlockItem::Embedded {
                        handle,
                        content: ui.content(handle),
                    });
                }

                match (&section.html, &section.data) {
                    (Some(html), _) => items.push(BlockItem::Markup(html.clone())),
                    (None, Some(data)) => items.push(BlockItem::Text(pretty_json(data))),
                    (None, None) => {}
                }

                ReportBlock {
                    title: section.title.clone(),
                    items,
                }
            })
            .collect();

        ReportDocument {
            title: title.to_string(),
            generated_at: Utc::now(),
            blocks,
        }
    }
}

/// 보고서 경계: 섹션 하나 내보내기
///
/// 에러, 패닉, 빈 제목은 모두 [`ReportError`]로 변환된다.
pub fn export_one(
    plugin_id: &str,
    exporter: &dyn ReportExporter,
) -> Result<Option<ReportSection>, ReportError> {
    let id = plugin_id.to_string();
    match guarded(|| exporter.export_report()) {
        Ok(Ok(Some(section))) => match section.validate() {
            Ok(()) => Ok(Some(section)),
            Err(reason) => Err(ReportError::InvalidSection { id, reason }),
        },
        Ok(Ok(None)) => Ok(None),
        Ok(Err(e)) => Err(ReportError::Failed {
            id,
            reason: e.to_string(),
        }),
        Err(message) => Err(ReportError::Panicked { id, message }),
    }
}

fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
