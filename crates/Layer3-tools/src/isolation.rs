//! Isolierung - 다층 평판 단열 열류 계산
//!
//! `q = ΔT / (Σ dᵢ/λᵢ + 1/h)`. 각 층의 λ는 공유 단열재 라이브러리의
//! `lambda` 메타데이터에서 가져온다. 외부 열전달계수 h는 선택.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::panel::{fmt_num, Panel};
use heatrix_core::{
    escape_html, IsolationCriteria, IsolationEntry, IsolationKey, IsolationLibrary, Plugin,
    PluginError, ReportExporter, ReportSection, SharedContext, StatefulPlugin, SubscriptionId,
    ThemeAware,
};
use heatrix_foundation::Theme;

pub const ISOLATION_ID: &str = "isolierung";
pub const ISOLATION_MODULE: &str = "heatrix.tools.isolation";
pub const ISOLATION_CLASS: &str = "IsolationPlugin";

/// 라이브러리가 비어 있을 때 넣는 기본 재료 (재료, 두께 mm, λ W/(m·K))
const SEED_MATERIALS: &[(&str, f64, f64)] = &[
    ("Mineralwolle", 100.0, 0.035),
    ("Mineralwolle", 50.0, 0.035),
    ("PUR-Hartschaum", 60.0, 0.024),
    ("Calciumsilikat", 50.0, 0.065),
];

// ============================================================================
// 입력 / 결과
// ============================================================================

/// 층 하나
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub material: String,
    pub thickness_mm: f64,
}

/// 계산 입력 (프로젝트 상태로 저장됨)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IsolationInputs {
    pub layers: Vec<Layer>,
    /// 고온측 온도 [°C]
    pub t_hot: f64,
    /// 주위 온도 [°C]
    pub t_ambient: f64,
    /// 외부 열전달계수 [W/(m²·K)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h_outer: Option<f64>,
}

impl Default for IsolationInputs {
    fn default() -> Self {
        Self {
            layers: vec![Layer {
                material: "Mineralwolle".to_string(),
                thickness_mm: 100.0,
            }],
            t_hot: 250.0,
            t_ambient: 20.0,
            h_outer: Some(10.0),
        }
    }
}

/// 계산 결과
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatFlux {
    /// 열류밀도 [W/m²]
    pub q: f64,
    /// 전체 열저항 [m²·K/W]
    pub r_total: f64,
    /// 층별 λ
    pub lambdas: Vec<f64>,
    /// 고온측부터 층 경계 온도 [°C]
    pub interface_temperatures: Vec<f64>,
}

/// 층의 λ 조회: 정확한 (재료, 두께) 키 우선, 없으면 같은 재료의 아무 엔트리
fn lookup_lambda(library: &IsolationLibrary, layer: &Layer) -> Result<f64, PluginError> {
    let key = IsolationKey::new(&layer.material, layer.thickness_mm)?;
    let exact = library.get(&key)?;
    let entry = match exact {
        Some(entry) => Some(entry),
        None => library
            .find(&IsolationCriteria::any().material(key.material()))?
            .into_iter()
            .find(|e| e.number("lambda").is_some()),
    };

    entry
        .and_then(|e| e.number("lambda"))
        .filter(|lambda| *lambda > 0.0)
        .ok_or_else(|| {
            PluginError::new(format!(
                "no thermal conductivity for '{}' in the isolation library",
                layer.material
            ))
        })
}

/// 열류 계산
pub fn compute(inputs: &IsolationInputs, library: &IsolationLibrary) -> Result<HeatFlux, PluginError> {
    if inputs.layers.is_empty() {
        return Err(PluginError::new("at least one layer is required"));
    }
    if let Some(h) = inputs.h_outer {
        if h.is_nan() || h <= 0.0 {
            return Err(PluginError::new("outer heat transfer coefficient must be positive"));
        }
    }

    let mut lambdas = Vec::with_capacity(inputs.layers.len());
    let mut resistances = Vec::with_capacity(inputs.layers.len());
    for layer in &inputs.layers {
        let lambda = lookup_lambda(library, layer)?;
        lambdas.push(lambda);
        resistances.push(layer.thickness_mm / 1000.0 / lambda);
    }

    let r_total = resistances.iter().sum::<f64>() + inputs.h_outer.map_or(0.0, |h| 1.0 / h);
    if r_total.is_nan() || r_total <= 0.0 {
        return Err(PluginError::new("total thermal resistance must be positive"));
    }
    let q = (inputs.t_hot - inputs.t_ambient) / r_total;

    let mut interface_temperatures = vec![inputs.t_hot];
    for r in &resistances {
        let last = interface_temperatures[interface_temperatures.len() - 1];
        interface_temperatures.push(last - q * r);
    }

    Ok(HeatFlux {
        q,
        r_total,
        lambdas,
        interface_temperatures,
    })
}

// ============================================================================
// IsolationPlugin
// ============================================================================

/// 단열 계산 도구
pub struct IsolationPlugin {
    inputs: IsolationInputs,
    theme: Theme,
    panel: Option<Panel>,
    /// 라이브러리 변경 후 아직 다시 계산하지 않음
    stale: Arc<AtomicBool>,
    subscription: Option<SubscriptionId>,
}

impl IsolationPlugin {
    pub fn new() -> Self {
        Self {
            inputs: IsolationInputs::default(),
            theme: Theme::default(),
            panel: None,
            stale: Arc::new(AtomicBool::new(false)),
            subscription: None,
        }
    }

    pub fn inputs(&self) -> &IsolationInputs {
        &self.inputs
    }

    pub fn set_inputs(&mut self, inputs: IsolationInputs) {
        self.inputs = inputs;
        self.refresh();
    }

    /// 라이브러리 변경 알림을 받은 뒤 아직 갱신하지 않았는지
    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::SeqCst)
    }

    /// 현재 입력으로 계산
    pub fn calculate(&self) -> Result<HeatFlux, PluginError> {
        let panel = self
            .panel
            .as_ref()
            .ok_or_else(|| PluginError::new("plugin is not attached"))?;
        compute(&self.inputs, panel.ctx().isolation())
    }

    fn refresh(&mut self) {
        let Some(panel) = &self.panel else {
            return;
        };
        self.stale.store(false, Ordering::SeqCst);

        let mut lines: Vec<String> = self
            .inputs
            .layers
            .iter()
            .enumerate()
            .map(|(i, l)| format!("Schicht {}: {} {} mm", i + 1, l.material, fmt_num(l.thickness_mm, 1)))
            .collect();
        lines.push(format!(
            "T innen {} °C, T außen {} °C",
            fmt_num(self.inputs.t_hot, 1),
            fmt_num(self.inputs.t_ambient, 1)
        ));

        match compute(&self.inputs, panel.ctx().isolation()) {
            Ok(result) => {
                lines.push(format!("q = {} W/m²", fmt_num(result.q, 2)));
                lines.push(format!("R = {} m²K/W", fmt_num(result.r_total, 3)));
            }
            Err(e) => lines.push(format!("Fehler: {}", e)),
        }
        panel.show(self.theme, &lines);
    }

    fn seed_library(library: &IsolationLibrary) -> Result<(), PluginError> {
        if !library.is_empty()? {
            return Ok(());
        }
        for (material, thickness, lambda) in SEED_MATERIALS {
            library.upsert(IsolationEntry::new(*material, *thickness).with("lambda", *lambda))?;
        }
        info!("Seeded isolation library with {} materials", SEED_MATERIALS.len());
        Ok(())
    }
}

impl Default for IsolationPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for IsolationPlugin {
    fn drop(&mut self) {
        if let (Some(panel), Some(id)) = (&self.panel, self.subscription.take()) {
            panel.ctx().isolation().unsubscribe(id);
        }
    }
}

impl Plugin for IsolationPlugin {
    fn name(&self) -> &str {
        "Isolierung"
    }

    fn version(&self) -> Option<&str> {
        Some(env!("CARGO_PKG_VERSION"))
    }

    fn attach(&mut self, ctx: &SharedContext) -> Result<(), PluginError> {
        Self::seed_library(ctx.isolation())?;
        self.panel = Some(Panel::open(ctx, "Isolierung")?);

        let stale = Arc::clone(&self.stale);
        self.subscription = Some(ctx.isolation().subscribe(move || {
            stale.store(true, Ordering::SeqCst);
        }));
        self.refresh();
        debug!("Isolation plugin attached");
        Ok(())
    }

    fn theme_aware(&mut self) -> Option<&mut dyn ThemeAware> {
        Some(self as &mut dyn ThemeAware)
    }

    fn report_exporter(&self) -> Option<&dyn ReportExporter> {
        Some(self as &dyn ReportExporter)
    }

    fn stateful(&mut self) -> Option<&mut dyn StatefulPlugin> {
        Some(self as &mut dyn StatefulPlugin)
    }
}

impl ThemeAware for IsolationPlugin {
    fn on_theme_changed(&mut self, theme: Theme) {
        self.theme = theme;
        self.refresh();
    }
}

impl ReportExporter for IsolationPlugin {
    fn export_report(&self) -> Result<Option<ReportSection>, PluginError> {
        if self.inputs.layers.is_empty() {
            return Ok(None);
        }
        let result = self.calculate()?;

        let mut html = String::from(
            "<table class=\"layers\">\n<tr><th>Schicht</th><th>Material</th><th>d [mm]</th><th>λ [W/(m·K)]</th></tr>\n",
        );
        for (i, (layer, lambda)) in self.inputs.layers.iter().zip(&result.lambdas).enumerate() {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                i + 1,
                escape_html(&layer.material),
                fmt_num(layer.thickness_mm, 1),
                fmt_num(*lambda, 3)
            ));
        }
        html.push_str("</table>\n");
        html.push_str(&format!(
            "<p>q = {} W/m², R = {} m²K/W</p>",
            fmt_num(result.q, 2),
            fmt_num(result.r_total, 3)
        ));

        Ok(Some(
            ReportSection::new("Isolierung")
                .with_html(html)
                .with_data(json!({ "inputs": self.inputs, "result": result })),
        ))
    }
}

impl StatefulPlugin for IsolationPlugin {
    fn export_state(&self) -> Result<Value, PluginError> {
        Ok(serde_json::to_value(&self.inputs)?)
    }

    fn import_state(&mut self, state: Value) -> Result<(), PluginError> {
        let inputs: IsolationInputs = serde_json::from_value(state)?;
        self.set_inputs(inputs);
        Ok(())
    }

    fn reset_state(&mut self) {
        self.set_inputs(IsolationInputs::default());
    }
}
