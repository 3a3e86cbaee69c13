//! Workbench - 헤드리스 인메모리 UiAnchor

use parking_lot::Mutex;
use std::collections::BTreeMap;
use tracing::debug;

use super::{ContainerHandle, TabInfo, UiAnchor, HOST_OWNER};
use crate::plugin::PluginError;
use heatrix_foundation::Theme;

#[derive(Debug, Clone)]
struct Container {
    owner: String,
    title: String,
    content: String,
}

#[derive(Debug, Default)]
struct WorkbenchState {
    next_handle: u64,
    attaching: Option<String>,
    containers: BTreeMap<ContainerHandle, Container>,
    /// 등록 순서
    tabs: Vec<ContainerHandle>,
    theme: Theme,
}

/// 바이너리와 테스트에서 쓰는 UiAnchor
#[derive(Debug, Default)]
pub struct Workbench {
    state: Mutex<WorkbenchState>,
}

impl Workbench {
    pub fn new() -> Self {
        Self::default()
    }

    /// 현재 툴킷 테마
    pub fn theme(&self) -> Theme {
        self.state.lock().theme
    }

    /// 탭으로 등록되지 않은 컨테이너 포함 전체 개수
    pub fn container_count(&self) -> usize {
        self.state.lock().containers.len()
    }

    pub fn title(&self, handle: ContainerHandle) -> Option<String> {
        self.state
            .lock()
            .containers
            .get(&handle)
            .map(|c| c.title.clone())
    }
}

impl UiAnchor for Workbench {
    fn begin_attach(&self, owner: &str) {
        self.state.lock().attaching = Some(owner.to_string());
    }

    fn end_attach(&self) {
        self.state.lock().attaching = None;
    }

    fn create_container(&self, title: &str) -> ContainerHandle {
        let mut state = self.state.lock();
        state.next_handle += 1;
        let handle = ContainerHandle(state.next_handle);
        let owner = state
            .attaching
            .clone()
            .unwrap_or_else(|| HOST_OWNER.to_string());

        debug!("Container {} '{}' created for {}", handle, title, owner);
        state.containers.insert(
            handle,
            Container {
                owner,
                title: title.to_string(),
                content: String::new(),
            },
        );
        handle
    }

    fn set_content(&self, handle: ContainerHandle, content: &str) -> Result<(), PluginError> {
        let mut state = self.state.lock();
        let container = state
            .containers
            .get_mut(&handle)
            .ok_or_else(|| PluginError::new(format!("unknown container {}", handle)))?;
        container.content = content.to_string();
        Ok(())
    }

    fn content(&self, handle: ContainerHandle) -> Option<String> {
        self.state
            .lock()
            .containers
            .get(&handle)
            .map(|c| c.content.clone())
    }

    fn register_tab(&self, handle: ContainerHandle) -> Result<(), PluginError> {
        let mut state = self.state.lock();
        if !state.containers.contains_key(&handle) {
            return Err(PluginError::new(format!("unknown container {}", handle)));
        }
        if state.tabs.contains(&handle) {
            return Err(PluginError::new(format!(
                "container {} is already a tab",
                handle
            )));
        }
        state.tabs.push(handle);
        Ok(())
    }

    fn tabs_of(&self, owner: &str) -> Vec<TabInfo> {
        self.tabs()
            .into_iter()
            .filter(|t| t.owner == owner)
            .collect()
    }

    fn discard(&self, owner: &str) {
        let mut state = self.state.lock();
        let WorkbenchState {
            containers, tabs, ..
        } = &mut *state;

        containers.retain(|_, c| c.owner != owner);
        tabs.retain(|h| containers.contains_key(h));
        debug!("Discarded UI of {}", owner);
    }

    fn tabs(&self) -> Vec<TabInfo> {
        let state = self.state.lock();
        state
            .tabs
            .iter()
            .filter_map(|h| {
                state.containers.get(h).map(|c| TabInfo {
                    owner: c.owner.clone(),
                    handle: *h,
                    title: c.title.clone(),
                })
            })
            .collect()
    }

    fn set_theme(&self, theme: Theme) {
        self.state.lock().theme = theme;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_containers_attributed_to_attaching_plugin() {
        let wb = Workbench::new();

        wb.begin_attach("iso");
        let a = wb.create_container("Isolierung");
        wb.register_tab(a).unwrap();
        wb.end_attach();

        let b = wb.create_container("Bericht");
        wb.register_tab(b).unwrap();

        assert_eq!(wb.tabs_of("iso").len(), 1);
        assert_eq!(wb.tabs_of(HOST_OWNER)[0].title, "Bericht");
        assert_eq!(
            wb.tabs().iter().map(|t| t.handle).collect::<Vec<_>>(),
            vec![a, b]
        );
    }

    #[test]
    fn test_register_tab_twice_fails() {
        let wb = Workbench::new();
        let a = wb.create_container("A");
        wb.register_tab(a).unwrap();
        assert!(wb.register_tab(a).is_err());
        assert!(wb.register_tab(ContainerHandle(99)).is_err());
    }

    #[test]
    fn test_discard_removes_owned_ui() {
        let wb = Workbench::new();
        wb.begin_attach("air");
        let a = wb.create_container("Luft");
        let _orphan = wb.create_container("Luft 2");
        wb.register_tab(a).unwrap();
        wb.end_attach();

        wb.discard("air");
        assert!(wb.tabs().is_empty());
        assert_eq!(wb.container_count(), 0);
    }

    #[test]
    fn test_content_and_theme() {
        let wb = Workbench::new();
        let a = wb.create_container("A");
        wb.set_content(a, "q = 12 W/m²").unwrap();
        assert_eq!(wb.content(a).as_deref(), Some("q = 12 W/m²"));

        wb.set_theme(Theme::Dark);
        assert_eq!(wb.theme(), Theme::Dark);
    }
}
