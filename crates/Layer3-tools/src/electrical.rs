//! Elektrik - 유효전력 계산

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use tracing::debug;

use crate::panel::{fmt_num, Panel};
use heatrix_core::{
    Plugin, PluginError, ReportExporter, ReportSection, SharedContext, StatefulPlugin, ThemeAware,
};
use heatrix_foundation::Theme;

pub const ELECTRICAL_ID: &str = "elektrik";
pub const ELECTRICAL_MODULE: &str = "heatrix.tools.electrical";
pub const ELECTRICAL_CLASS: &str = "ElectricalPlugin";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Single,
    Three,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Single => write!(f, "1~"),
            Phase::Three => write!(f, "3~"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectricalInputs {
    /// 전압 [V] (3상은 선간전압)
    pub voltage: f64,
    /// 전류 [A]
    pub current: f64,
    #[serde(default)]
    pub phase: Phase,
    /// 역률 cos φ
    #[serde(default = "unity")]
    pub power_factor: f64,
}

fn unity() -> f64 {
    1.0
}

impl Default for ElectricalInputs {
    fn default() -> Self {
        Self {
            voltage: 230.0,
            current: 10.0,
            phase: Phase::Single,
            power_factor: 1.0,
        }
    }
}

/// 유효전력 [W]
pub fn active_power(inputs: &ElectricalInputs) -> Result<f64, PluginError> {
    if !inputs.voltage.is_finite() || !inputs.current.is_finite() {
        return Err(PluginError::new("voltage and current must be numbers"));
    }
    if !(0.0..=1.0).contains(&inputs.power_factor) {
        return Err(PluginError::new(format!(
            "power factor must be within 0..1, got {}",
            inputs.power_factor
        )));
    }
    let base = inputs.voltage * inputs.current * inputs.power_factor;
    Ok(match inputs.phase {
        Phase::Single => base,
        Phase::Three => base * 3f64.sqrt(),
    })
}

/// 소수점 쉼표도 허용하는 숫자 파싱
pub fn parse_number(text: &str) -> Option<f64> {
    text.trim().replace(',', ".").parse().ok()
}

// ============================================================================
// ElectricalPlugin
// ============================================================================

pub struct ElectricalPlugin {
    inputs: ElectricalInputs,
    theme: Theme,
    panel: Option<Panel>,
}

impl ElectricalPlugin {
    pub fn new() -> Self {
        Self {
            inputs: ElectricalInputs::default(),
            theme: Theme::default(),
            panel: None,
        }
    }

    pub fn inputs(&self) -> &ElectricalInputs {
        &self.inputs
    }

    pub fn set_inputs(&mut self, inputs: ElectricalInputs) {
        self.inputs = inputs;
        self.refresh();
    }

    fn refresh(&self) {
        let Some(panel) = &self.panel else {
            return;
        };
        let mut lines = vec![format!(
            "{} U = {} V, I = {} A, cos φ = {}",
            self.inputs.phase,
            fmt_num(self.inputs.voltage, 1),
            fmt_num(self.inputs.current, 2),
            fmt_num(self.inputs.power_factor, 2)
        )];
        match active_power(&self.inputs) {
            Ok(p) => lines.push(format!("P = {} kW", fmt_num(p / 1000.0, 3))),
            Err(e) => lines.push(format!("Fehler: {}", e)),
        }
        panel.show(self.theme, &lines);
    }
}

impl Default for ElectricalPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for ElectricalPlugin {
    fn name(&self) -> &str {
        "Elektrik"
    }

    fn version(&self) -> Option<&str> {
        Some(env!("CARGO_PKG_VERSION"))
    }

    fn attach(&mut self, ctx: &SharedContext) -> Result<(), PluginError> {
        self.panel = Some(Panel::open(ctx, "Elektrik")?);
        self.refresh();
        debug!("Electrical plugin attached");
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

impl ThemeAware for ElectricalPlugin {
    fn on_theme_changed(&mut self, theme: Theme) {
        self.theme = theme;
        self.refresh();
    }
}

impl ReportExporter for ElectricalPlugin {
    fn export_report(&self) -> Result<Option<ReportSection>, PluginError> {
        let power = active_power(&self.inputs)?;
        let html = format!(
            "<table class=\"power\">\n\
             <tr><th>Netz</th><td>{}</td></tr>\n\
             <tr><th>U [V]</th><td>{}</td></tr>\n\
             <tr><th>I [A]</th><td>{}</td></tr>\n\
             <tr><th>cos φ</th><td>{}</td></tr>\n\
             <tr><th>P [kW]</th><td>{}</td></tr>\n\
             </table>",
            self.inputs.phase,
            fmt_num(self.inputs.voltage, 1),
            fmt_num(self.inputs.current, 2),
            fmt_num(self.inputs.power_factor, 2),
            fmt_num(power / 1000.0, 3)
        );
        Ok(Some(
            ReportSection::new("Elektrik")
                .with_html(html)
                .with_data(json!({ "inputs": self.inputs, "results": { "power": power } })),
        ))
    }
}

impl StatefulPlugin for ElectricalPlugin {
    fn export_state(&self) -> Result<Value, PluginError> {
        let results = active_power(&self.inputs).ok();
        Ok(json!({ "inputs": self.inputs, "results": { "power": results } }))
    }

    fn import_state(&mut self, state: Value) -> Result<(), PluginError> {
        // 결과는 다시 계산
        let inputs = state
            .get("inputs")
            .cloned()
            .ok_or_else(|| PluginError::new("state has no 'inputs'"))?;
        self.set_inputs(serde_json::from_value(inputs)?);
        Ok(())
    }

    fn reset_state(&mut self) {
        self.set_inputs(ElectricalInputs::default());
    }
}
