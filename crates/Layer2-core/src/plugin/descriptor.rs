//! Plugin Descriptor - 레지스트리 레코드
//!
//! 플러그인의 위치(module/class)와 활성화 상태. 라이브 인스턴스와는 별개.

use serde::{Deserialize, Serialize};

use crate::ui::HOST_OWNER;

/// 플러그인 디스크립터
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    /// 고유 identity (예: "isolierung")
    #[serde(rename = "identity", alias = "identifier", alias = "id")]
    pub id: String,

    /// 표시 이름 (없으면 플러그인 자체 name 사용)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// 모듈 참조 (카탈로그 키)
    pub module: String,

    /// 모듈 안의 타입 참조
    #[serde(rename = "class", alias = "class_name", alias = "factory")]
    pub class: String,

    /// 활성화 여부
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl PluginDescriptor {
    pub fn new(id: impl Into<String>, module: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            module: module.into(),
            class: class.into(),
            enabled: true,
        }
    }

    /// 표시 이름 설정
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// 활성화 여부 설정
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// 필수 필드 검사
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("identity must not be empty".to_string());
        }
        // 호스트 소유 컨테이너와 구분되어야 함
        if self.id.trim() == HOST_OWNER {
            return Err(format!("identity '{}' is reserved for the host", HOST_OWNER));
        }
        if self.module.trim().is_empty() {
            return Err(format!("{}: module must not be empty", self.id));
        }
        if self.class.trim().is_empty() {
            return Err(format!("{}: class must not be empty", self.id));
        }
        Ok(())
    }

    /// 표시 이름 (없으면 identity)
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}
