use serde_json::Value;

use crate::ui::ContainerHandle;

/// 플러그인이 기여하는 보고서 섹션
///
/// 제목만 있는 섹션도 허용된다. 제목이 비어 있으면 수집 단계에서 거부된다.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReportSection {
    pub title: String,
    /// 그대로 삽입할 UI 컨테이너
    pub content: Option<ContainerHandle>,
    /// 인라인 마크업
    pub html: Option<String>,
    /// 구조화 데이터 (html이 없을 때만 표시)
    pub data: Option<Value>,
}

impl ReportSection {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_content(mut self, handle: ContainerHandle) -> Self {
        self.content = Some(handle);
        self
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("section title must not be empty".to_string());
        }
        Ok(())
    }
}
