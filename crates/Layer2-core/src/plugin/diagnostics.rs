//! Diagnostics - 플러그인별 실패 기록
//!
//! 실패는 호스트를 멈추지 않고 여기에 쌓인다. UI는 활성 진단을 경고로 표시하고
//! 사용자가 닫을(dismiss) 수 있다.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// 실패가 발생한 라이프사이클 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Registry,
    Load,
    Attach,
    Theme,
    Report,
    State,
    Project,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Registry => "registry",
            Stage::Load => "load",
            Stage::Attach => "attach",
            Stage::Theme => "theme",
            Stage::Report => "report",
            Stage::State => "state",
            Stage::Project => "project",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 진단 하나
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub id: u64,
    /// 관련 플러그인 identity (레지스트리 전체 문제면 None)
    pub plugin: Option<String>,
    pub stage: Stage,
    pub message: String,
    pub at: DateTime<Utc>,
    pub dismissed: bool,
}

/// 진단 목록
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    next_id: u64,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// 기록 후 id 반환
    pub fn record(
        &mut self,
        plugin: Option<&str>,
        stage: Stage,
        message: impl Into<String>,
    ) -> u64 {
        self.next_id += 1;
        self.entries.push(Diagnostic {
            id: self.next_id,
            plugin: plugin.map(str::to_string),
            stage,
            message: message.into(),
            at: Utc::now(),
            dismissed: false,
        });
        self.next_id
    }

    /// 닫히지 않은 진단
    pub fn active(&self) -> Vec<&Diagnostic> {
        self.entries.iter().filter(|d| !d.dismissed).collect()
    }

    pub fn all(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn for_plugin(&self, plugin: &str) -> Vec<&Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.plugin.as_deref() == Some(plugin))
            .collect()
    }

    /// 닫기. 없는 id면 false
    pub fn dismiss(&mut self, id: u64) -> bool {
        match self.entries.iter_mut().find(|d| d.id == id) {
            Some(d) => {
                d.dismissed = true;
                true
            }
            None => false,
        }
    }

    pub fn dismiss_all(&mut self) {
        for d in &mut self.entries {
            d.dismissed = true;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_dismiss() {
        let mut diags = Diagnostics::new();
        let a = diags.record(Some("iso"), Stage::Attach, "no widget");
        let b = diags.record(None, Stage::Registry, "registry missing");

        assert_eq!(diags.active().len(), 2);
        assert!(diags.dismiss(a));
        assert!(!diags.dismiss(999));

        let active = diags.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, b);
        assert_eq!(diags.for_plugin("iso").len(), 1);
        assert_eq!(diags.all().len(), 2);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Report.to_string(), "report");
    }
}
