//! Panel - 도구 탭 하나
//!
//! 헤드리스 툴킷에서는 탭 내용이 텍스트 줄 목록이다.

use heatrix_core::{ContainerHandle, PluginError, SharedContext, UiAnchor};
use heatrix_foundation::Theme;

pub(crate) struct Panel {
    ctx: SharedContext,
    handle: ContainerHandle,
}

impl Panel {
    /// 컨테이너를 만들고 탭으로 등록
    pub(crate) fn open(ctx: &SharedContext, title: &str) -> Result<Self, PluginError> {
        let handle = ctx.ui().create_container(title);
        ctx.ui().register_tab(handle)?;
        Ok(Self {
            ctx: ctx.clone(),
            handle,
        })
    }

    pub(crate) fn ctx(&self) -> &SharedContext {
        &self.ctx
    }

    pub(crate) fn handle(&self) -> ContainerHandle {
        self.handle
    }

    pub(crate) fn show(&self, theme: Theme, lines: &[String]) {
        let mut content = format!("[{}]\n", theme);
        content.push_str(&lines.join("\n"));
        if let Err(e) = self.ctx.ui().set_content(self.handle, &content) {
            tracing::warn!("Failed to update panel {}: {}", self.handle, e);
        }
    }
}

/// 표시용 숫자 (소수점 자릿수 고정, -0 제거)
pub(crate) fn fmt_num(value: f64, decimals: usize) -> String {
    let text = format!("{:.*}", decimals, value);
    if text.starts_with('-') && text[1..].chars().all(|c| c == '0' || c == '.') {
        text[1..].to_string()
    } else {
        text
    }
}
