//! UI Anchor - 외부 위젯 툴킷과의 경계
//!
//! 플러그인은 attach 중에 컨테이너를 만들고 정확히 하나의 탭으로 등록한다.
//! 호스트는 attach 전후로 `begin_attach`/`end_attach`를 호출해
//! 생성된 컨테이너가 어느 플러그인 것인지 기록하게 한다.

mod workbench;

pub use workbench::Workbench;

use crate::plugin::PluginError;
use heatrix_foundation::Theme;
use serde::Serialize;
use std::fmt;

/// attach 밖에서 만든 컨테이너의 소유자
pub const HOST_OWNER: &str = "host";

/// 컨테이너 핸들 (툴킷이 발급)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ContainerHandle(pub u64);

impl fmt::Display for ContainerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 표시 중인 탭
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabInfo {
    pub owner: String,
    pub handle: ContainerHandle,
    pub title: String,
}

/// 호스트 UI 앵커
///
/// 모든 메서드는 `&self`; 구현체가 내부 가변성을 책임진다.
pub trait UiAnchor: Send + Sync {
    /// 이후 생성되는 컨테이너를 `owner`에 귀속
    fn begin_attach(&self, owner: &str);

    /// 귀속 종료
    fn end_attach(&self);

    /// 새 컨테이너 생성 (탭으로는 아직 보이지 않음)
    fn create_container(&self, title: &str) -> ContainerHandle;

    /// 컨테이너 내용 설정 (헤드리스 툴킷에서는 텍스트)
    fn set_content(&self, handle: ContainerHandle, content: &str) -> Result<(), PluginError>;

    fn content(&self, handle: ContainerHandle) -> Option<String>;

    /// 컨테이너를 탭으로 등록
    fn register_tab(&self, handle: ContainerHandle) -> Result<(), PluginError>;

    /// `owner`가 등록한 탭
    fn tabs_of(&self, owner: &str) -> Vec<TabInfo>;

    /// `owner`가 만든 컨테이너와 탭을 모두 제거
    fn discard(&self, owner: &str);

    /// 등록 순서대로 모든 탭
    fn tabs(&self) -> Vec<TabInfo>;

    /// 툴킷 전체 테마 변경
    fn set_theme(&self, _theme: Theme) {}
}
