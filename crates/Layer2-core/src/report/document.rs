//! 렌더링된 보고서 문서

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::ui::ContainerHandle;

/// 블록 안의 항목
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum BlockItem {
    /// 인라인 마크업 (escape 하지 않음)
    Markup(String),
    /// 고정폭 텍스트
    Text(String),
    /// UI 컨테이너 스냅샷
    Embedded {
        handle: ContainerHandle,
        content: Option<String>,
    },
}

/// 섹션 하나에 대응하는 블록
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportBlock {
    pub title: String,
    pub items: Vec<BlockItem>,
}

/// 통합 보고서
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDocument {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub blocks: Vec<ReportBlock>,
}

impl ReportDocument {
    pub fn block_titles(&self) -> Vec<&str> {
        self.blocks.iter().map(|b| b.title.as_str()).collect()
    }

    /// 단독 HTML 문서
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        let title = escape_html(&self.title);

        out.push_str("<!DOCTYPE html>\n");
        out.push_str("<html>\n<head>\n<meta charset=\"utf-8\">\n");
        out.push_str(&format!("<title>{}</title>\n</head>\n<body>\n", title));
        out.push_str(&format!("<h1>{}</h1>\n", title));
        out.push_str(&format!(
            "<p class=\"generated\">{}</p>\n",
            self.generated_at.format("%Y-%m-%d %H:%M UTC")
        ));

        for block in &self.blocks {
            out.push_str(&format!("<section>\n<h2>{}</h2>\n", escape_html(&block.title)));
            for item in &block.items {
                match item {
                    BlockItem::Markup(html) => {
                        out.push_str(html);
                        out.push('\n');
                    }
                    BlockItem::Text(text) => {
                        out.push_str(&format!("<pre>{}</pre>\n", escape_html(text)));
                    }
                    BlockItem::Embedded { handle, content } => {
                        out.push_str(&format!(
                            "<div class=\"embedded\" data-container=\"{}\"><pre>{}</pre></div>\n",
                            handle.0,
                            escape_html(content.as_deref().unwrap_or(""))
                        ));
                    }
                }
            }
            out.push_str("</section>\n");
        }

        out.push_str("</body>\n</html>\n");
        out
    }

    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("# {}\n\n", self.title));
        out.push_str(&format!(
            "_{}_\n\n",
            self.generated_at.format("%Y-%m-%d %H:%M UTC")
        ));

        for block in &self.blocks {
            out.push_str(&format!("## {}\n\n", block.title));
            for item in &block.items {
                match item {
                    BlockItem::Markup(html) => {
                        out.push_str(&format!("{}\n\n", html));
                    }
                    BlockItem::Text(text) => {
                        out.push_str(&format!("```\n{}\n```\n\n", text));
                    }
                    BlockItem::Embedded { content, .. } => {
                        out.push_str(&format!(
                            "```\n{}\n```\n\n",
                            content.as_deref().unwrap_or("")
                        ));
                    }
                }
            }
        }
        out
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
