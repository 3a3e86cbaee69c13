//! 플러그인 호스트 라이프사이클 통합 테스트

use heatrix_core::{
    EntryStatus, IsolationEntry, IsolationKey, LoadError, Plugin, PluginCatalog, PluginDescriptor,
    PluginError, PluginHost, PluginLoader, PluginState, RegistryStore, ReportExporter,
    ReportSection, SharedContext, Stage, StatefulPlugin, ThemeAware, UiAnchor, UpsertOutcome,
    Workbench,
};
use heatrix_foundation::{LoadPolicy, Theme};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

// ============================================================================
// Test plugin
// ============================================================================

#[derive(Clone, Copy, PartialEq)]
enum Attach {
    Ok,
    Err,
    Panic,
    NoTab,
    TwoTabs,
}

/// 호출 기록 (플러그인 이름 + 이벤트)
#[derive(Default)]
struct Calls(Mutex<Vec<String>>);

impl Calls {
    fn push(&self, event: String) {
        self.0.lock().push(event);
    }

    fn count(&self, event: &str) -> usize {
        self.0.lock().iter().filter(|e| *e == event).count()
    }
}

struct TestPlugin {
    name: String,
    attach: Attach,
    report: bool,
    calls: Arc<Calls>,
    value: Value,
}

impl Plugin for TestPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn attach(&mut self, ctx: &SharedContext) -> Result<(), PluginError> {
        self.calls.push(format!("attach:{}", self.name));
        let ui = ctx.ui();
        match self.attach {
            Attach::Ok => {
                let tab = ui.create_container(&self.name);
                ui.register_tab(tab)
            }
            Attach::Err => {
                let _ = ui.create_container(&self.name);
                Err(PluginError::new("widget toolkit refused"))
            }
            Attach::Panic => panic!("attach exploded"),
            Attach::NoTab => Ok(()),
            Attach::TwoTabs => {
                ui.register_tab(ui.create_container("one"))?;
                ui.register_tab(ui.create_container("two"))
            }
        }
    }

    fn theme_aware(&mut self) -> Option<&mut dyn ThemeAware> {
        Some(self as &mut dyn ThemeAware)
    }

    fn report_exporter(&self) -> Option<&dyn ReportExporter> {
        self.report.then_some(self as &dyn ReportExporter)
    }

    fn stateful(&mut self) -> Option<&mut dyn StatefulPlugin> {
        Some(self as &mut dyn StatefulPlugin)
    }
}

impl ThemeAware for TestPlugin {
    fn on_theme_changed(&mut self, theme: Theme) {
        self.calls.push(format!("theme:{}:{}", self.name, theme));
    }
}

impl ReportExporter for TestPlugin {
    fn export_report(&self) -> Result<Option<ReportSection>, PluginError> {
        self.calls.push(format!("export:{}", self.name));
        Ok(Some(
            ReportSection::new(self.name.clone()).with_data(json!({ "value": self.value })),
        ))
    }
}

impl StatefulPlugin for TestPlugin {
    fn export_state(&self) -> Result<Value, PluginError> {
        Ok(json!({ "value": self.value }))
    }

    fn import_state(&mut self, state: Value) -> Result<(), PluginError> {
        self.value = state
            .get("value")
            .cloned()
            .ok_or_else(|| PluginError::new("missing value"))?;
        Ok(())
    }

    fn reset_state(&mut self) {
        self.calls.push(format!("reset:{}", self.name));
        self.value = json!(0);
    }
}

// ============================================================================
// Fixture
// ============================================================================

struct Fixture {
    _temp: TempDir,
    registry: RegistryStore,
    ui: Arc<Workbench>,
    ctx: SharedContext,
    calls: Arc<Calls>,
    catalog: PluginCatalog,
}

impl Fixture {
    fn new(descriptors: Vec<PluginDescriptor>) -> Self {
        let temp = TempDir::new().unwrap();
        let registry = RegistryStore::new(temp.path().join("plugins.json"));
        for d in descriptors {
            registry.add(d).unwrap();
        }

        let ui = Arc::new(Workbench::new());
        let ctx = SharedContext::in_memory(ui.clone()).unwrap();

        Self {
            _temp: temp,
            registry,
            ui,
            ctx,
            calls: Arc::new(Calls::default()),
            catalog: PluginCatalog::new(),
        }
    }

    /// 생성 횟수를 "construct:<name>"으로 기록하는 팩토리 등록
    fn register(&mut self, module: &str, class: &str, name: &str, attach: Attach, report: bool) {
        let calls = Arc::clone(&self.calls);
        let name = name.to_string();
        self.catalog.register(module, class, move || {
            calls.push(format!("construct:{}", name));
            Ok(Box::new(TestPlugin {
                name: name.clone(),
                attach,
                report,
                calls: Arc::clone(&calls),
                value: json!(0),
            }) as Box<dyn Plugin>)
        });
    }

    fn host(&self) -> PluginHost {
        PluginHost::new(self.ctx.clone(), PluginLoader::new(self.catalog.clone()))
    }
}

fn iso_air() -> Vec<PluginDescriptor> {
    vec![
        PluginDescriptor::new("iso", "iso.plugin", "IsoPlugin"),
        PluginDescriptor::new("air", "air.plugin", "AirPlugin").enabled(false),
    ]
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn disabled_plugin_is_never_loaded() {
    let mut fx = Fixture::new(iso_air());
    fx.register("iso.plugin", "IsoPlugin", "iso", Attach::Ok, true);
    fx.register("air.plugin", "AirPlugin", "air", Attach::Ok, true);

    let mut host = fx.host();
    let report = host.start(&fx.registry).unwrap();

    assert_eq!(report.active, vec!["iso"]);
    assert_eq!(report.skipped, vec!["air"]);
    assert_eq!(fx.calls.count("construct:air"), 0);
    assert_eq!(host.state("iso"), Some(&PluginState::Active));
    assert!(host.state("air").is_none());
    assert!(host.plugin("air").is_none());

    let doc = host.generate_report("Bericht");
    assert_eq!(doc.block_titles(), vec!["iso"]);
    assert_eq!(fx.calls.count("export:iso"), 1);
    assert_eq!(fx.calls.count("export:air"), 0);
}

#[test]
fn attach_failure_is_isolated() {
    for mode in [Attach::Err, Attach::Panic, Attach::NoTab, Attach::TwoTabs] {
        let mut fx = Fixture::new(vec![
            PluginDescriptor::new("iso", "iso.plugin", "IsoPlugin"),
            PluginDescriptor::new("air", "air.plugin", "AirPlugin").enabled(false),
            PluginDescriptor::new("elec", "elec.plugin", "ElecPlugin"),
        ]);
        fx.register("iso.plugin", "IsoPlugin", "iso", mode, true);
        fx.register("air.plugin", "AirPlugin", "air", Attach::Ok, true);
        fx.register("elec.plugin", "ElecPlugin", "elec", Attach::Ok, true);

        let mut host = fx.host();
        let report = host.start(&fx.registry).unwrap();

        assert!(matches!(host.state("iso"), Some(PluginState::Failed(_))));
        assert!(host.state("air").is_none());
        assert_eq!(host.state("elec"), Some(&PluginState::Active));
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "iso");

        // 실패한 플러그인의 UI는 남지 않는다
        let tabs = fx.ui.tabs();
        assert_eq!(tabs.len(), 1);
        assert_eq!(tabs[0].owner, "elec");
        assert!(fx.ui.tabs_of("iso").is_empty());

        let warnings = host.diagnostics().for_plugin("iso");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].stage, Stage::Attach);

        // Failed 플러그인은 보고서에서 빠진다
        let doc = host.generate_report("Bericht");
        assert_eq!(doc.block_titles(), vec!["elec"]);
        assert_eq!(fx.calls.count("export:iso"), 0);
    }
}

#[test]
fn load_failure_skip_and_abort() {
    let mut fx = Fixture::new(vec![
        PluginDescriptor::new("iso", "iso.plugin", "IsoPlugin"),
        PluginDescriptor::new("elec", "elec.plugin", "ElecPlugin"),
    ]);
    // IsoPlugin 타입은 카탈로그에 없음
    fx.register("iso.plugin", "Other", "other", Attach::Ok, false);
    fx.register("elec.plugin", "ElecPlugin", "elec", Attach::Ok, false);

    let mut host = fx.host();
    let report = host.start(&fx.registry).unwrap();
    assert_eq!(report.active, vec!["elec"]);
    assert!(matches!(
        host.state("iso"),
        Some(PluginState::Failed(heatrix_core::FailureKind::Load(_)))
    ));

    let entries = host.entries(&fx.registry);
    assert!(matches!(&entries[0].status, EntryStatus::Failed(r) if r.contains("IsoPlugin")));
    assert_eq!(entries[1].status, EntryStatus::Active);

    let ui = Arc::new(Workbench::new());
    let ctx = SharedContext::in_memory(ui.clone()).unwrap();
    let mut strict =
        PluginHost::new(ctx, PluginLoader::new(fx.catalog.clone())).with_policy(LoadPolicy::Abort);
    let err = strict.start(&fx.registry).unwrap_err();
    assert!(matches!(err, LoadError::TypeNotFound { .. }));
    assert!(strict.state("elec").is_none());
    assert!(ui.tabs().is_empty());
}

#[test]
fn report_follows_registry_order() {
    let mut fx = Fixture::new(vec![
        PluginDescriptor::new("c", "m", "C"),
        PluginDescriptor::new("a", "m", "A"),
        PluginDescriptor::new("b", "m", "B"),
    ]);
    fx.register("m", "A", "a", Attach::Ok, true);
    fx.register("m", "B", "b", Attach::Panic, true);
    fx.register("m", "C", "c", Attach::Ok, true);

    let mut host = fx.host();
    host.start(&fx.registry).unwrap();

    let doc = host.generate_report("Bericht");
    assert_eq!(doc.block_titles(), vec!["c", "a"]);

    fx.ctx.reports().set_included("c", false);
    let doc = host.generate_report("Bericht");
    assert_eq!(doc.block_titles(), vec!["a"]);
}

#[test]
fn theme_reaches_active_plugins_in_order() {
    let mut fx = Fixture::new(vec![
        PluginDescriptor::new("a", "m", "A"),
        PluginDescriptor::new("b", "m", "B"),
        PluginDescriptor::new("c", "m", "C"),
    ]);
    fx.register("m", "A", "a", Attach::Ok, false);
    fx.register("m", "B", "b", Attach::Err, false);
    fx.register("m", "C", "c", Attach::Ok, false);

    let mut host = fx.host();
    host.start(&fx.registry).unwrap();
    fx.calls.0.lock().clear();

    host.set_theme(Theme::Dark);

    let events = fx.calls.0.lock().clone();
    assert_eq!(events, vec!["theme:a:dark", "theme:c:dark"]);
    assert_eq!(fx.ui.theme(), Theme::Dark);
    assert_eq!(host.theme(), Theme::Dark);
}

#[test]
fn enable_and_disable_at_runtime() {
    let mut fx = Fixture::new(iso_air());
    fx.register("iso.plugin", "IsoPlugin", "iso", Attach::Ok, true);
    fx.register("air.plugin", "AirPlugin", "air", Attach::Ok, true);

    let mut host = fx.host();
    host.start(&fx.registry).unwrap();

    let status = host.enable(&fx.registry, "air").unwrap();
    assert_eq!(status, EntryStatus::Active);
    assert_eq!(fx.calls.count("construct:air"), 1);
    assert_eq!(host.active_ids(), vec!["iso", "air"]);
    assert!(fx.registry.is_dirty());

    let status = host.disable(&fx.registry, "iso").unwrap();
    assert_eq!(status, EntryStatus::PendingDisable);
    assert_eq!(host.state("iso"), Some(&PluginState::Active));

    let entries = host.entries(&fx.registry);
    assert_eq!(entries[0].status, EntryStatus::PendingDisable);
    assert!(!entries[0].enabled);

    assert!(host.enable(&fx.registry, "missing").is_err());
}

#[test]
fn shared_isolation_library_merges_upserts() {
    let fx = Fixture::new(Vec::new());
    let lib = fx.ctx.isolation();

    let first = lib
        .upsert(IsolationEntry::new("Mineralwolle", 100.0).with("lambda", 0.035))
        .unwrap();
    let second = fx
        .ctx
        .clone()
        .isolation()
        .upsert(IsolationEntry::new("mineralwolle ", 100.0).with("supplier", "B"))
        .unwrap();

    assert_eq!(first, UpsertOutcome::Inserted);
    assert_eq!(second, UpsertOutcome::Merged);
    assert_eq!(lib.len().unwrap(), 1);

    let entry = lib
        .get(&IsolationKey::new("Mineralwolle", 100.0).unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(entry.number("lambda"), Some(0.035));
    assert_eq!(entry.metadata.get("supplier"), Some(&json!("B")));
}

#[test]
fn plugin_state_follows_project_switch() {
    let mut fx = Fixture::new(vec![PluginDescriptor::new("a", "m", "A")]);
    fx.register("m", "A", "a", Attach::Ok, true);

    let projects = fx.ctx.projects();
    let first = projects.create("Halle 1").unwrap();
    projects.put("a", json!({ "value": 7 })).unwrap();
    projects.put("ghost", json!({ "value": 1 })).unwrap();

    let mut host = fx.host();
    host.start(&fx.registry).unwrap();

    // attach 직후 현재 프로젝트의 상태가 복원됨
    let doc = host.generate_report("Bericht");
    assert!(matches!(
        &doc.blocks[0].items[0],
        heatrix_core::BlockItem::Text(t) if t.contains('7')
    ));

    let second = projects.create("Halle 2").unwrap();
    assert_eq!(host.restore_states(), 0);

    assert_eq!(host.switch_project(&first.id).unwrap(), 1);
    assert_eq!(projects.get("a"), Some(json!({ "value": 7 })));

    // Halle 2에는 전환 시 기본값이 기록되었음
    assert_eq!(host.switch_project(&second.id).unwrap(), 1);
    assert_eq!(projects.get("a"), Some(json!({ "value": 0 })));
    assert!(host.diagnostics().active().is_empty());
}

#[test]
fn switching_to_empty_project_resets_plugin_state() {
    let mut fx = Fixture::new(vec![PluginDescriptor::new("a", "m", "A")]);
    fx.register("m", "A", "a", Attach::Ok, true);

    let projects = fx.ctx.projects();
    let empty = projects.create("Kunde Y").unwrap();
    let filled = projects.create("Kunde X").unwrap();
    projects.put("a", json!({ "value": "X-data" })).unwrap();

    let mut host = fx.host();
    host.start(&fx.registry).unwrap();

    assert_eq!(host.switch_project(&empty.id).unwrap(), 0);
    host.save_project().unwrap();
    assert_eq!(projects.get("a"), Some(json!({ "value": 0 })));
    assert!(fx.calls.count("reset:a") >= 1);

    // 다른 프로젝트의 데이터는 그대로
    assert_eq!(host.switch_project(&filled.id).unwrap(), 1);
    assert_eq!(projects.get("a"), Some(json!({ "value": "X-data" })));
}

#[test]
fn unreadable_state_resets_and_is_reported() {
    let mut fx = Fixture::new(vec![PluginDescriptor::new("a", "m", "A")]);
    fx.register("m", "A", "a", Attach::Ok, true);

    let projects = fx.ctx.projects();
    let good = projects.create("Gut").unwrap();
    projects.put("a", json!({ "value": 5 })).unwrap();
    let broken = projects.create("Kaputt").unwrap();
    projects.put("a", json!({ "other": true })).unwrap();

    let mut host = fx.host();
    projects.select(&good.id).unwrap();
    host.start(&fx.registry).unwrap();

    assert_eq!(host.switch_project(&broken.id).unwrap(), 0);
    let diags = host.diagnostics().for_plugin("a");
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].stage, Stage::State);

    // 이전 프로젝트의 값 5가 아니라 기본값이 기록됨
    host.save_project().unwrap();
    assert_eq!(projects.get("a"), Some(json!({ "value": 0 })));
}

#[test]
fn creating_project_saves_old_state_and_starts_fresh() {
    let mut fx = Fixture::new(vec![PluginDescriptor::new("a", "m", "A")]);
    fx.register("m", "A", "a", Attach::Ok, true);

    let projects = fx.ctx.projects();
    let old = projects.create("Alt").unwrap();
    projects.put("a", json!({ "value": 42 })).unwrap();

    let mut host = fx.host();
    host.start(&fx.registry).unwrap();

    let fresh = host.create_project("Neu").unwrap();
    assert_eq!(projects.current().unwrap().id, fresh.id);
    assert_eq!(projects.get("a"), None);

    host.save_project().unwrap();
    assert_eq!(projects.get("a"), Some(json!({ "value": 0 })));

    assert_eq!(host.switch_project(&old.id).unwrap(), 1);
    assert_eq!(projects.get("a"), Some(json!({ "value": 42 })));
}
