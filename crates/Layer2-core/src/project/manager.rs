//! ProjectManager
//!
//! 현재 프로젝트는 작업 사본(working copy)으로 메모리에 유지되고, 플러그인의
//! `put`은 작업 사본만 바꾼다. `save`/`select`/`create`가 작업 사본을 목록에
//! 합친 뒤 파일에 기록한다. 파일 기록이 실패하면 메모리 상태도 바뀌지 않는다.

use chrono::Utc;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::model::{Project, ProjectSummary};
use super::store::ProjectStore;
use heatrix_foundation::{Error, Result};

#[derive(Debug, Default)]
struct Inner {
    /// 마지막으로 기록된 목록
    projects: Vec<Project>,
    /// 현재 프로젝트 작업 사본
    working: Option<Project>,
    dirty: bool,
}

impl Inner {
    /// 작업 사본을 합친 목록
    fn merged(&self) -> Vec<Project> {
        let mut projects = self.projects.clone();
        if let Some(working) = &self.working {
            if let Some(slot) = projects.iter_mut().find(|p| p.id == working.id) {
                *slot = working.clone();
            }
        }
        projects
    }

    fn current_id(&self) -> Option<&str> {
        self.working.as_ref().map(|p| p.id.as_str())
    }
}

/// 프로젝트 관리자
#[derive(Debug)]
pub struct ProjectManager {
    store: Option<ProjectStore>,
    inner: RwLock<Inner>,
}

impl ProjectManager {
    /// 파일 기반으로 열기 (마지막 선택 프로젝트 복원)
    pub fn open(store: ProjectStore) -> Self {
        let set = store.load();
        let working = set
            .current
            .as_deref()
            .and_then(|id| set.projects.iter().find(|p| p.id == id).cloned());

        info!(
            "Opened {} projects (current: {})",
            set.projects.len(),
            working.as_ref().map(|p| p.name.as_str()).unwrap_or("none")
        );

        Self {
            store: Some(store),
            inner: RwLock::new(Inner {
                projects: set.projects,
                working,
                dirty: false,
            }),
        }
    }

    /// 저장하지 않는 관리자 (테스트, 임시 세션)
    pub fn in_memory() -> Self {
        Self {
            store: None,
            inner: RwLock::new(Inner::default()),
        }
    }

    fn write_out(&self, projects: &[Project], current: Option<&str>) -> Result<()> {
        match &self.store {
            Some(store) => store.save(projects, current),
            None => Ok(()),
        }
    }

    // ========================================================================
    // 프로젝트 단위
    // ========================================================================

    /// 새 프로젝트 생성 후 현재 프로젝트로 전환
    pub fn create(&self, name: &str) -> Result<Project> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation("project name must not be empty"));
        }

        let project = Project::new(name);
        let mut inner = self.inner.write();

        let mut next = inner.merged();
        next.push(project.clone());
        self.write_out(&next, Some(&project.id))?;

        inner.projects = next;
        inner.working = Some(project.clone());
        inner.dirty = false;

        info!("Created project '{}' ({})", project.name, project.id);
        Ok(project)
    }

    /// 최근 수정 순
    pub fn list(&self) -> Vec<ProjectSummary> {
        let mut summaries: Vec<_> = self
            .inner
            .read()
            .merged()
            .iter()
            .map(Project::summary)
            .collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        summaries
    }

    pub fn current(&self) -> Option<ProjectSummary> {
        self.inner.read().working.as_ref().map(Project::summary)
    }

    /// 현재 프로젝트 전체 사본
    pub fn current_project(&self) -> Option<Project> {
        self.inner.read().working.clone()
    }

    /// 현재 프로젝트 전환
    ///
    /// 기존 작업 사본을 기록한 뒤 하나의 락 안에서 교체한다.
    pub fn select(&self, id: &str) -> Result<()> {
        let mut inner = self.inner.write();

        let next = inner.merged();
        let target = next
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("project {}", id)))?;

        self.write_out(&next, Some(id))?;

        info!("Selected project '{}' ({})", target.name, target.id);
        inner.projects = next;
        inner.working = Some(target);
        inner.dirty = false;
        Ok(())
    }

    /// 이름 변경
    pub fn rename(&self, id: &str, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation("project name must not be empty"));
        }

        let mut inner = self.inner.write();
        let mut next = inner.merged();
        let project = next
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::not_found(format!("project {}", id)))?;
        project.name = name.to_string();
        project.touch();
        let renamed = project.clone();

        let current = inner.current_id().map(str::to_string);
        self.write_out(&next, current.as_deref())?;

        inner.projects = next;
        if current.as_deref() == Some(id) {
            inner.working = Some(renamed);
            inner.dirty = false;
        }
        Ok(())
    }

    /// 삭제. 현재 프로젝트였다면 선택이 해제된다
    pub fn delete(&self, id: &str) -> Result<bool> {
        let mut inner = self.inner.write();
        let mut next = inner.merged();
        let before = next.len();
        next.retain(|p| p.id != id);
        if next.len() == before {
            return Ok(false);
        }

        let was_current = inner.current_id() == Some(id);
        let current = if was_current {
            None
        } else {
            inner.current_id().map(str::to_string)
        };
        self.write_out(&next, current.as_deref())?;

        inner.projects = next;
        if was_current {
            inner.working = None;
            inner.dirty = false;
        }
        info!("Deleted project {}", id);
        Ok(true)
    }

    // ========================================================================
    // 플러그인 blob
    // ========================================================================

    /// 현재 프로젝트에서 플러그인 blob 조회
    pub fn get(&self, plugin_id: &str) -> Option<Value> {
        self.inner
            .read()
            .working
            .as_ref()
            .and_then(|p| p.plugin_data.get(plugin_id).cloned())
    }

    /// 현재 프로젝트 작업 사본에 blob 기록 (파일은 `save`에서)
    pub fn put(&self, plugin_id: &str, blob: Value) -> Result<()> {
        let mut inner = self.inner.write();
        let Some(working) = inner.working.as_mut() else {
            warn!("No current project, dropping state of {}", plugin_id);
            return Err(Error::not_found("current project"));
        };

        working.plugin_data.insert(plugin_id.to_string(), blob);
        working.updated_at = Utc::now();
        inner.dirty = true;
        debug!("Stored state of {}", plugin_id);
        Ok(())
    }

    /// 현재 프로젝트에 저장된 blob의 플러그인 identity 목록
    pub fn plugin_ids(&self) -> Vec<String> {
        self.inner
            .read()
            .working
            .as_ref()
            .map(|p| p.plugin_data.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// 작업 사본을 파일에 기록
    pub fn save(&self) -> Result<()> {
        let mut inner = self.inner.write();
        let next = inner.merged();
        let current = inner.current_id().map(str::to_string);
        self.write_out(&next, current.as_deref())?;

        inner.projects = next;
        inner.dirty = false;
        Ok(())
    }

    /// 저장되지 않은 변경 여부
    pub fn is_dirty(&self) -> bool {
        self.inner.read().dirty
    }

    pub fn len(&self) -> usize {
        self.inner.read().projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heatrix_foundation::JsonStore;
    use serde_json::json;
    use tempfile::TempDir;

    fn file_manager(dir: &std::path::Path) -> ProjectManager {
        ProjectManager::open(ProjectStore::new(JsonStore::new(dir), "projects.json"))
    }

    #[test]
    fn test_create_becomes_current() {
        let pm = ProjectManager::in_memory();
        assert!(pm.current().is_none());

        let p = pm.create("Halle 3").unwrap();
        assert_eq!(pm.current().unwrap().id, p.id);
        assert!(matches!(pm.create("  "), Err(Error::Validation(_))));
    }

    #[test]
    fn test_put_requires_current_project() {
        let pm = ProjectManager::in_memory();
        assert!(matches!(
            pm.put("iso", json!({"layers": 2})),
            Err(Error::NotFound(_))
        ));
        assert!(pm.get("iso").is_none());
    }

    #[test]
    fn test_blobs_are_per_project() {
        let pm = ProjectManager::in_memory();
        let a = pm.create("A").unwrap();
        pm.put("iso", json!({"t": 1})).unwrap();

        let b = pm.create("B").unwrap();
        assert!(pm.get("iso").is_none());
        pm.put("iso", json!({"t": 2})).unwrap();

        pm.select(&a.id).unwrap();
        assert_eq!(pm.get("iso"), Some(json!({"t": 1})));
        pm.select(&b.id).unwrap();
        assert_eq!(pm.get("iso"), Some(json!({"t": 2})));
        assert_eq!(pm.plugin_ids(), vec!["iso".to_string()]);
    }

    #[test]
    fn test_select_unknown() {
        let pm = ProjectManager::in_memory();
        pm.create("A").unwrap();
        assert!(matches!(pm.select("nope"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_persisted_across_reopen() {
        let temp = TempDir::new().unwrap();
        let id = {
            let pm = file_manager(temp.path());
            let p = pm.create("Kesselhaus").unwrap();
            pm.put("air", json!({"t": 20.0})).unwrap();
            assert!(pm.is_dirty());
            pm.save().unwrap();
            assert!(!pm.is_dirty());
            p.id
        };

        let pm = file_manager(temp.path());
        assert_eq!(pm.current().unwrap().id, id);
        assert_eq!(pm.get("air"), Some(json!({"t": 20.0})));
    }

    #[test]
    fn test_select_does_not_switch_when_write_fails() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("data");
        let pm = file_manager(&dir);
        let a = pm.create("A").unwrap();
        let b = pm.create("B").unwrap();
        assert_eq!(pm.current().unwrap().id, b.id);

        // 디렉토리를 파일로 바꿔 기록 실패 유도
        std::fs::remove_dir_all(&dir).unwrap();
        std::fs::write(&dir, "blocker").unwrap();

        assert!(pm.select(&a.id).is_err());
        assert_eq!(pm.current().unwrap().id, b.id);
    }

    #[test]
    fn test_malformed_file_starts_empty() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("projects.json"), "not json").unwrap();

        let pm = file_manager(temp.path());
        assert!(pm.is_empty());
        assert!(pm.current().is_none());
    }

    #[test]
    fn test_rename_and_delete() {
        let pm = ProjectManager::in_memory();
        let a = pm.create("A").unwrap();
        let b = pm.create("B").unwrap();

        pm.rename(&b.id, "B2").unwrap();
        assert_eq!(pm.current().unwrap().name, "B2");

        assert!(pm.delete(&a.id).unwrap());
        assert!(!pm.delete(&a.id).unwrap());
        assert_eq!(pm.current().unwrap().id, b.id);

        assert!(pm.delete(&b.id).unwrap());
        assert!(pm.current().is_none());
        assert!(pm.is_empty());
    }

    #[test]
    fn test_list_most_recent_first() {
        let pm = ProjectManager::in_memory();
        let a = pm.create("A").unwrap();
        let b = pm.create("B").unwrap();

        pm.select(&a.id).unwrap();
        pm.put("iso", json!(1)).unwrap();

        let list = pm.list();
        assert_eq!(list[0].id, a.id);
        assert_eq!(list[1].id, b.id);
    }
}
