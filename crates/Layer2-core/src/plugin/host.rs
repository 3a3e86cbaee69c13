//! Plugin Host - 플러그인 라이프사이클 관리
//!
//! 레지스트리 순서대로 로드 → attach → 상태 복원 → Active.
//! 한 플러그인의 실패는 그 슬롯만 Failed로 만들고, 진단으로 기록된 뒤
//! 다음 플러그인으로 넘어간다. 플러그인 코드는 모두 경계 함수
//! (`load_one`, `attach_one`, [`export_one`](crate::report::export_one))를 통해 호출된다.

use serde::Serialize;
use std::fmt;
use tracing::{debug, error, info, warn};

use super::descriptor::PluginDescriptor;
use super::diagnostics::{Diagnostics, Stage};
use super::error::{AttachError, LoadError, RegistryError};
use super::guard::guarded;
use super::loader::PluginLoader;
use super::store::{RegistryLoad, RegistryStore};
use super::traits::{display_version, Plugin};
use crate::context::SharedContext;
use crate::project::Project;
use crate::report::{ReportDocument, ReportSource};
use crate::ui::UiAnchor;
use heatrix_foundation::{LoadPolicy, Theme};

// ============================================================================
// 상태
// ============================================================================

/// 실패 원인
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", content = "reason", rename_all = "lowercase")]
pub enum FailureKind {
    Load(String),
    Attach(String),
}

impl FailureKind {
    pub fn reason(&self) -> &str {
        match self {
            FailureKind::Load(r) | FailureKind::Attach(r) => r,
        }
    }
}

/// 인스턴스 테이블의 슬롯 상태
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PluginState {
    /// 생성됨, 아직 attach 전
    Loaded,
    /// UI 등록 완료, 상태 복원 전
    Attached,
    Active,
    Failed(FailureKind),
}

impl PluginState {
    pub fn is_active(&self) -> bool {
        matches!(self, PluginState::Active)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, PluginState::Failed(_))
    }
}

impl fmt::Display for PluginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginState::Loaded => f.write_str("loaded"),
            PluginState::Attached => f.write_str("attached"),
            PluginState::Active => f.write_str("active"),
            PluginState::Failed(kind) => write!(f, "failed: {}", kind.reason()),
        }
    }
}

/// 인스턴스 테이블 엔트리
///
/// 로드에 실패한 플러그인도 슬롯을 가진다 (instance 없음).
struct PluginSlot {
    descriptor: PluginDescriptor,
    state: PluginState,
    instance: Option<Box<dyn Plugin>>,
    /// 플러그인이 보고한 이름/버전 (로드 성공 시)
    name: Option<String>,
    version: Option<String>,
}

impl PluginSlot {
    fn failed(descriptor: PluginDescriptor, kind: FailureKind) -> Self {
        Self {
            descriptor,
            state: PluginState::Failed(kind),
            instance: None,
            name: None,
            version: None,
        }
    }

    fn id(&self) -> &str {
        &self.descriptor.id
    }
}

// ============================================================================
// 조회용 타입
// ============================================================================

/// `start()` 결과 요약
#[derive(Debug, Clone, Default, Serialize)]
pub struct StartupReport {
    pub active: Vec<String>,
    /// 비활성화되어 로드하지 않음
    pub skipped: Vec<String>,
    /// (identity, 원인)
    pub failed: Vec<(String, String)>,
}

impl StartupReport {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// 플러그인 목록 표시 상태
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "camelCase")]
pub enum EntryStatus {
    Disabled,
    Active,
    Failed(String),
    /// 비활성화되었지만 다음 시작까지 실행 중
    PendingDisable,
    /// 활성화되어 있지만 아직 시작하지 않음
    NotStarted,
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryStatus::Disabled => f.write_str("disabled"),
            EntryStatus::Active => f.write_str("active"),
            EntryStatus::Failed(reason) => write!(f, "failed ({})", reason),
            EntryStatus::PendingDisable => f.write_str("disabled on next start"),
            EntryStatus::NotStarted => f.write_str("not started"),
        }
    }
}

/// 플러그인 관리 화면의 한 줄
#[derive(Debug, Clone, Serialize)]
pub struct PluginEntry {
    pub id: String,
    pub name: String,
    pub version: Option<String>,
    pub module: String,
    pub class: String,
    pub enabled: bool,
    pub status: EntryStatus,
    pub in_report: bool,
}

// ============================================================================
// 경계 함수
// ============================================================================

/// 로드 경계
pub fn load_one(loader: &PluginLoader, descriptor: &PluginDescriptor) -> Result<Box<dyn Plugin>, LoadError> {
    debug!("Loading plugin {}", descriptor.id);
    loader.load(descriptor)
}

/// attach 경계
///
/// attach를 UI 귀속 구간으로 감싸고, 성공 후 탭이 정확히 하나인지 검사한다.
/// 실패하면 플러그인이 만든 UI를 모두 제거한다.
pub fn attach_one(ctx: &SharedContext, id: &str, plugin: &mut dyn Plugin) -> Result<(), AttachError> {
    let ui = ctx.ui();

    ui.begin_attach(id);
    let outcome = guarded(|| plugin.attach(ctx));
    ui.end_attach();

    let result = match outcome {
        Ok(Ok(())) => {
            let tabs = ui.tabs_of(id).len();
            if tabs == 1 {
                Ok(())
            } else {
                Err(AttachError::TabContract {
                    id: id.to_string(),
                    tabs,
                })
            }
        }
        Ok(Err(source)) => Err(AttachError::Failed {
            id: id.to_string(),
            source,
        }),
        Err(message) => Err(AttachError::Panicked {
            id: id.to_string(),
            message,
        }),
    };

    if result.is_err() {
        ui.discard(id);
    }
    result
}

// ============================================================================
// PluginHost
// ============================================================================

/// 플러그인 호스트
pub struct PluginHost {
    ctx: SharedContext,
    loader: PluginLoader,
    policy: LoadPolicy,
    theme: Theme,
    /// 레지스트리 순서
    slots: Vec<PluginSlot>,
    diagnostics: Diagnostics,
}

impl PluginHost {
    pub fn new(ctx: SharedContext, loader: PluginLoader) -> Self {
        Self {
            ctx,
            loader,
            policy: LoadPolicy::default(),
            theme: Theme::default(),
            slots: Vec::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// 로드 실패 정책
    pub fn with_policy(mut self, policy: LoadPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn context(&self) -> &SharedContext {
        &self.ctx
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    /// 레지스트리 로드 문제를 진단으로 기록 (첫 실행의 파일 없음은 제외)
    pub fn note_registry(&mut self, load: &RegistryLoad) {
        for problem in &load.diagnostics {
            match problem {
                RegistryError::Missing(path) => {
                    info!("No plugin registry at {}", path.display());
                }
                RegistryError::DuplicateIdentity(id) => {
                    self.diagnostics
                        .record(Some(id), Stage::Registry, problem.to_string());
                }
                other => {
                    self.diagnostics
                        .record(None, Stage::Registry, other.to_string());
                }
            }
        }
    }

    // ========================================================================
    // 시작
    // ========================================================================

    /// 레지스트리 순서대로 모든 활성 플러그인 시작
    ///
    /// `LoadPolicy::Abort`이면 첫 로드 실패에서 중단하고 그 에러를 반환한다.
    /// attach 실패는 정책과 무관하게 해당 플러그인만 Failed가 된다.
    pub fn start(&mut self, registry: &RegistryStore) -> Result<StartupReport, LoadError> {
        let mut report = StartupReport::default();
        info!("Starting plugins (policy: {:?})", self.policy);

        for descriptor in registry.list() {
            let id = descriptor.id.clone();

            if !descriptor.enabled {
                debug!("Plugin {} is disabled, not loading", id);
                report.skipped.push(id);
                continue;
            }
            if self.slot(&id).is_some() {
                debug!("Plugin {} already started", id);
                continue;
            }

            match self.start_one(descriptor) {
                Ok(()) => report.active.push(id),
                Err(StartError::Load(e)) => {
                    if self.policy == LoadPolicy::Abort {
                        error!("Aborting startup: {}", e);
                        return Err(e);
                    }
                    report.failed.push((id, e.to_string()));
                }
                Err(StartError::Attach(e)) => report.failed.push((id, e.to_string())),
            }
        }

        info!(
            "Startup complete: {} active, {} failed, {} disabled",
            report.active.len(),
            report.failed.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// 디스크립터 하나를 Active까지 진행
    fn start_one(&mut self, descriptor: PluginDescriptor) -> Result<(), StartError> {
        let id = descriptor.id.clone();

        let mut plugin = match load_one(&self.loader, &descriptor) {
            Ok(plugin) => plugin,
            Err(e) => {
                warn!("Plugin load failed: {}", e);
                self.diagnostics.record(Some(&id), Stage::Load, e.to_string());
                self.slots
                    .push(PluginSlot::failed(descriptor, FailureKind::Load(e.to_string())));
                return Err(StartError::Load(e));
            }
        };

        let name = guarded(|| plugin.name().to_string()).unwrap_or_else(|_| id.clone());
        let version = guarded(|| display_version(plugin.as_ref())).ok();
        debug!("Plugin {} loaded as '{}'", id, name);

        if let Err(e) = attach_one(&self.ctx, &id, plugin.as_mut()) {
            warn!("Plugin attach failed: {}", e);
            self.diagnostics.record(Some(&id), Stage::Attach, e.to_string());
            self.slots
                .push(PluginSlot::failed(descriptor, FailureKind::Attach(e.to_string())));
            return Err(StartError::Attach(e));
        }

        self.slots.push(PluginSlot {
            descriptor,
            state: PluginState::Attached,
            instance: Some(plugin),
            name: Some(name),
            version,
        });

        let index = self.slots.len() - 1;
        self.restore_slot(index);
        self.theme_slot(index, self.theme);
        self.slots[index].state = PluginState::Active;

        info!("Plugin {} is active", id);
        Ok(())
    }

    // ========================================================================
    // 테마
    // ========================================================================

    /// 테마 변경 전파 (Active + 테마 기능이 있는 인스턴스, 순서대로)
    pub fn set_theme(&mut self, theme: Theme) {
        info!("Theme changed to {}", theme);
        self.theme = theme;
        self.ctx.ui().set_theme(theme);

        for index in 0..self.slots.len() {
            if self.slots[index].state.is_active() {
                self.theme_slot(index, theme);
            }
        }
    }

    fn theme_slot(&mut self, index: usize, theme: Theme) {
        let slot = &mut self.slots[index];
        let Some(instance) = slot.instance.as_mut() else {
            return;
        };
        let Some(aware) = instance.theme_aware() else {
            return;
        };

        if let Err(message) = guarded(|| aware.on_theme_changed(theme)) {
            warn!("Plugin {} panicked on theme change: {}", slot.descriptor.id, message);
            self.diagnostics.record(
                Some(&slot.descriptor.id),
                Stage::Theme,
                format!("theme change panicked: {}", message),
            );
        }
    }

    // ========================================================================
    // 보고서
    // ========================================================================

    /// 통합 보고서 생성
    pub fn generate_report(&mut self, title: &str) -> ReportDocument {
        let reports = self.ctx.reports();

        let sources = self.slots.iter().map(|slot| ReportSource {
            plugin_id: &slot.descriptor.id,
            state: &slot.state,
            exporter: slot.instance.as_ref().and_then(|p| p.report_exporter()),
        });
        let sections = reports.collect(sources);

        for failure in reports.last_failures() {
            self.diagnostics
                .record(Some(failure.identity()), Stage::Report, failure.to_string());
        }

        info!("Report '{}' with {} sections", title, sections.len());
        reports.render(title, &sections, self.ctx.ui())
    }

    // ========================================================================
    // 활성화 / 비활성화
    // ========================================================================

    /// 활성화 후 즉시 로드 + attach
    ///
    /// 반환값은 변경 후 상태. 레지스트리는 persist하지 않는다.
    pub fn enable(&mut self, registry: &RegistryStore, id: &str) -> Result<EntryStatus, RegistryError> {
        registry.set_enabled(id, true)?;

        if let Some(slot) = self.slot(id) {
            if !slot.state.is_failed() {
                return Ok(EntryStatus::Active);
            }
        }
        // 실패했던 슬롯은 다시 시도
        self.slots.retain(|s| s.id() != id);

        let descriptor = registry
            .get(id)
            .ok_or_else(|| RegistryError::UnknownIdentity(id.to_string()))?;

        let status = match self.start_one(descriptor) {
            Ok(()) => EntryStatus::Active,
            Err(e) => EntryStatus::Failed(e.to_string()),
        };
        self.sort_slots(registry);
        Ok(status)
    }

    /// 비활성화 (실행 중인 인스턴스는 다음 시작까지 유지)
    pub fn disable(&mut self, registry: &RegistryStore, id: &str) -> Result<EntryStatus, RegistryError> {
        registry.set_enabled(id, false)?;

        let running = self.slot(id).is_some_and(|s| s.state.is_active());
        if running {
            info!("Plugin {} disabled, stays active until next start", id);
            Ok(EntryStatus::PendingDisable)
        } else {
            Ok(EntryStatus::Disabled)
        }
    }

    fn sort_slots(&mut self, registry: &RegistryStore) {
        let order: Vec<String> = registry.list().into_iter().map(|d| d.id).collect();
        self.slots.sort_by_key(|slot| {
            order
                .iter()
                .position(|id| id == slot.id())
                .unwrap_or(usize::MAX)
        });
    }

    // ========================================================================
    // 조회
    // ========================================================================

    /// 레지스트리의 모든 디스크립터와 상태
    pub fn entries(&self, registry: &RegistryStore) -> Vec<PluginEntry> {
        registry
            .list()
            .into_iter()
            .map(|descriptor| {
                let slot = self.slot(&descriptor.id);
                let status = match (descriptor.enabled, slot.map(|s| &s.state)) {
                    (true, None) => EntryStatus::NotStarted,
                    (true, Some(PluginState::Failed(kind))) => {
                        EntryStatus::Failed(kind.reason().to_string())
                    }
                    (true, Some(_)) => EntryStatus::Active,
                    (false, Some(PluginState::Active)) => EntryStatus::PendingDisable,
                    (false, _) => EntryStatus::Disabled,
                };

                PluginEntry {
                    name: slot
                        .and_then(|s| s.name.clone())
                        .unwrap_or_else(|| descriptor.display_name().to_string()),
                    version: slot.and_then(|s| s.version.clone()),
                    in_report: self.ctx.reports().is_included(&descriptor.id),
                    id: descriptor.id,
                    module: descriptor.module,
                    class: descriptor.class,
                    enabled: descriptor.enabled,
                    status,
                }
            })
            .collect()
    }

    pub fn state(&self, id: &str) -> Option<&PluginState> {
        self.slot(id).map(|s| &s.state)
    }

    /// Active 플러그인 identity (순서대로)
    pub fn active_ids(&self) -> Vec<String> {
        self.slots
            .iter()
            .filter(|s| s.state.is_active())
            .map(|s| s.descriptor.id.clone())
            .collect()
    }

    pub fn plugin(&self, id: &str) -> Option<&dyn Plugin> {
        self.slot(id).and_then(|s| s.instance.as_deref())
    }

    fn slot(&self, id: &str) -> Option<&PluginSlot> {
        self.slots.iter().find(|s| s.id() == id)
    }

    // ========================================================================
    // 프로젝트 상태
    // ========================================================================

    /// 상태 기능이 있는 Active 인스턴스의 상태를 현재 프로젝트에 기록
    ///
    /// 현재 프로젝트가 없으면 아무것도 하지 않는다. 기록된 개수 반환.
    pub fn snapshot_states(&mut self) -> usize {
        if self.ctx.projects().current().is_none() {
            debug!("No current project, skipping state snapshot");
            return 0;
        }

        let mut stored = 0;
        let Self {
            ctx,
            slots,
            diagnostics,
            ..
        } = self;

        for slot in slots.iter_mut().filter(|s| s.state.is_active()) {
            let id = slot.descriptor.id.as_str();
            let Some(stateful) = slot.instance.as_mut().and_then(|p| p.stateful()) else {
                continue;
            };

            let state = match guarded(|| stateful.export_state()) {
                Ok(Ok(state)) => state,
                Ok(Err(e)) => {
                    warn!("Plugin {} failed to export state: {}", id, e);
                    diagnostics.record(Some(id), Stage::State, format!("export failed: {}", e));
                    continue;
                }
                Err(message) => {
                    warn!("Plugin {} panicked exporting state: {}", id, message);
                    diagnostics.record(Some(id), Stage::State, format!("export panicked: {}", message));
                    continue;
                }
            };

            match ctx.projects().put(id, state) {
                Ok(()) => stored += 1,
                Err(e) => {
                    diagnostics.record(Some(id), Stage::Project, e.to_string());
                }
            }
        }

        debug!("Snapshot stored {} plugin states", stored);
        stored
    }

    /// 현재 프로젝트의 blob을 각 플러그인에 복원
    ///
    /// 알 수 없는 identity의 blob은 무시된다. 복원된 개수 반환.
    pub fn restore_states(&mut self) -> usize {
        for id in self.ctx.projects().plugin_ids() {
            if !self.slots.iter().any(|s| s.id() == id && s.state.is_active()) {
                debug!("Ignoring stored state of unknown plugin {}", id);
            }
        }

        let mut restored = 0;
        for index in 0..self.slots.len() {
            if self.slots[index].state.is_active() && self.restore_slot(index) {
                restored += 1;
            }
        }
        restored
    }

    /// 저장된 상태가 없거나 복원에 실패하면 기본값으로 초기화
    fn restore_slot(&mut self, index: usize) -> bool {
        let slot = &mut self.slots[index];
        let id = slot.descriptor.id.as_str();
        let stored = self.ctx.projects().get(id);

        let Some(stateful) = slot.instance.as_mut().and_then(|p| p.stateful()) else {
            if stored.is_some() {
                debug!("Plugin {} has stored state but no state capability", id);
            }
            return false;
        };

        let message = match stored {
            Some(state) => match guarded(|| stateful.import_state(state)) {
                Ok(Ok(())) => return true,
                Ok(Err(e)) => format!("import failed: {}", e),
                Err(panic) => format!("import panicked: {}", panic),
            },
            None => {
                return match guarded(|| stateful.reset_state()) {
                    Ok(()) => {
                        debug!("Plugin {} has no stored state, reset to defaults", id);
                        false
                    }
                    Err(panic) => {
                        let message = format!("reset panicked: {}", panic);
                        warn!("Plugin {}: {}", id, message);
                        self.diagnostics.record(Some(id), Stage::State, message);
                        false
                    }
                };
            }
        };

        warn!("Plugin {}: {}", id, message);
        if let Err(panic) = guarded(|| stateful.reset_state()) {
            warn!("Plugin {} panicked during reset: {}", id, panic);
        }
        self.diagnostics.record(Some(id), Stage::State, message);
        false
    }

    /// 상태 저장 → 프로젝트 전환 → 상태 복원
    pub fn switch_project(&mut self, project_id: &str) -> heatrix_foundation::Result<usize> {
        self.snapshot_states();
        self.ctx.projects().select(project_id)?;
        Ok(self.restore_states())
    }

    /// 상태 저장 → 새 프로젝트 생성 (현재 프로젝트가 됨) → 기본값으로 초기화
    pub fn create_project(&mut self, name: &str) -> heatrix_foundation::Result<Project> {
        self.snapshot_states();
        let project = self.ctx.projects().create(name)?;
        self.restore_states();
        Ok(project)
    }

    /// 상태 저장 후 프로젝트 파일 기록
    pub fn save_project(&mut self) -> heatrix_foundation::Result<()> {
        self.snapshot_states();
        self.ctx.projects().save()
    }
}

/// start_one 내부 실패
enum StartError {
    Load(LoadError),
    Attach(AttachError),
}

impl fmt::Display for StartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartError::Load(e) => e.fmt(f),
            StartError::Attach(e) => e.fmt(f),
        }
    }
}
