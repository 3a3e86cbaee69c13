//! Stoffeigenschaften Luft - 건조 공기 물성치
//!
//! - 밀도: 이상기체 `ρ = p / (R·T)`
//! - 비열: NASA 다항식 (200-1000 K / 1000-6000 K 두 구간)
//! - 동점성: Lucas 상관식
//! - 가열 열량: 온도 구간 1 K 간격 평균 cp 사용

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::panel::{fmt_num, Panel};
use heatrix_core::{
    Plugin, PluginError, ReportExporter, ReportSection, SharedContext, StatefulPlugin,
};
use heatrix_foundation::Theme;

pub const AIR_ID: &str = "stoffeigenschaften_luft";
pub const AIR_MODULE: &str = "heatrix.tools.air";
pub const AIR_CLASS: &str = "AirPropertiesPlugin";

/// 일반 기체 상수 [J/(mol·K)]
const R_UNIVERSAL: f64 = 8.314462618;
/// 건조 공기 몰질량 [kg/mol]
const MOLAR_MASS_AIR: f64 = 0.0289644;
/// 건조 공기 비기체 상수 [J/(kg·K)]
pub const R_AIR: f64 = R_UNIVERSAL / MOLAR_MASS_AIR;

const KELVIN_OFFSET: f64 = 273.15;

/// NASA 다항식 유효 구간 [K]
pub const T_MIN_K: f64 = 200.0;
pub const T_MAX_K: f64 = 6000.0;

const NASA_LOW: [f64; 7] = [
    10099.5016,
    -196.8276,
    5.009155,
    -0.005761014,
    1.06686e-05,
    -7.940298e-09,
    2.185232e-12,
];
const NASA_HIGH: [f64; 7] = [
    241521.443,
    -1257.875,
    5.144559,
    -0.0002138542,
    7.065228e-08,
    -1.071483e-11,
    6.577800e-16,
];

// ============================================================================
// 물성 함수
// ============================================================================

/// 정압비열 [J/(kg·K)], T [K]
pub fn cp(t: f64) -> f64 {
    let a = if t < 1000.0 { &NASA_LOW } else { &NASA_HIGH };
    let molar = a[0] / (t * t)
        + a[1] / t
        + a[2]
        + a[3] * t
        + a[4] * t.powi(2)
        + a[5] * t.powi(3)
        + a[6] * t.powi(4);
    molar * R_UNIVERSAL / MOLAR_MASS_AIR
}

/// 정적비열 [J/(kg·K)]
pub fn cv(t: f64) -> f64 {
    cp(t) - R_AIR
}

/// 밀도 [kg/m³], p [Pa], T [K]
pub fn density(p: f64, t: f64) -> f64 {
    p / (R_AIR * t)
}

/// 동점성 [Pa·s], T [K]
pub fn dynamic_viscosity(t: f64) -> f64 {
    const T_CRIT: f64 = 132.63;
    const P_CRIT_BAR: f64 = 37.858;
    const M_G_PER_MOL: f64 = 28.9644;

    let theta = 0.176 * T_CRIT.powf(1.0 / 6.0) * M_G_PER_MOL.powf(-0.5) * P_CRIT_BAR.powf(-0.667);
    let tr = t / T_CRIT;
    (0.807 * tr.powf(0.618) - 0.357 * (-0.449 * tr).exp() + 0.340 * (-4.058 * tr).exp() + 0.018)
        / theta
        * 1e-7
}

/// T1에서 T2까지 가열에 필요한 열량 [kW], T [K], 질량유량 [kg/s]
///
/// cp는 1 K 간격 샘플의 평균. 두 온도 모두 다항식 유효 구간 안이어야 한다.
pub fn heating_power(t1: f64, t2: f64, mass_flow: f64) -> Result<f64, PluginError> {
    for t in [t1, t2] {
        if !(T_MIN_K..=T_MAX_K).contains(&t) {
            return Err(PluginError::new(format!(
                "temperature {} K is outside {}..{} K",
                t, T_MIN_K, T_MAX_K
            )));
        }
    }
    if !mass_flow.is_finite() || mass_flow < 0.0 {
        return Err(PluginError::new("mass flow must be a non-negative number"));
    }

    let lo = t1.min(t2);
    let steps = (t1 - t2).abs().floor() as usize;
    let sum: f64 = (0..=steps).map(|i| cp(lo + i as f64)).sum();
    let cp_mean = sum / (steps + 1) as f64;
    Ok(mass_flow * cp_mean * (t2 - t1) / 1000.0)
}

/// 관 유동 레이놀즈 수
pub fn reynolds(diameter: f64, velocity: f64, mu: f64, rho: f64) -> Result<f64, PluginError> {
    if rho <= 0.0 {
        return Err(PluginError::new("density must be greater than zero"));
    }
    let nu = mu / rho;
    if nu <= 0.0 {
        return Err(PluginError::new("kinematic viscosity must be greater than zero"));
    }
    Ok(diameter * velocity / nu)
}

// ============================================================================
// 입력 / 결과
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirInputs {
    /// 온도 [°C]
    pub temperature_c: f64,
    /// 절대 압력 [Pa]
    pub pressure_pa: f64,
    /// 레이놀즈 수 계산용 관 내경 [m]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diameter_m: Option<f64>,
    /// 유속 [m/s]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<f64>,
    /// 가열 목표 온도 [°C]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_c: Option<f64>,
    /// 질량유량 [kg/s]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass_flow: Option<f64>,
}

impl Default for AirInputs {
    fn default() -> Self {
        Self {
            temperature_c: 20.0,
            pressure_pa: 101_325.0,
            diameter_m: None,
            velocity: None,
            target_c: None,
            mass_flow: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AirProperties {
    pub density: f64,
    pub cp: f64,
    pub cv: f64,
    pub dynamic_viscosity: f64,
    pub kinematic_viscosity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reynolds: Option<f64>,
    /// 목표 온도까지 가열 열량 [kW]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heating_power: Option<f64>,
}

impl AirInputs {
    pub fn evaluate(&self) -> Result<AirProperties, PluginError> {
        let t = self.temperature_c + KELVIN_OFFSET;
        if !t.is_finite() || t <= 0.0 {
            return Err(PluginError::new("temperature must be above absolute zero"));
        }
        if !self.pressure_pa.is_finite() || self.pressure_pa <= 0.0 {
            return Err(PluginError::new("pressure must be positive"));
        }

        let rho = density(self.pressure_pa, t);
        let mu = dynamic_viscosity(t);
        let reynolds = match (self.diameter_m, self.velocity) {
            (Some(d), Some(v)) => Some(reynolds(d, v, mu, rho)?),
            _ => None,
        };
        let heating_power = match (self.target_c, self.mass_flow) {
            (Some(target), Some(m)) => Some(heating_power(t, target + KELVIN_OFFSET, m)?),
            _ => None,
        };

        Ok(AirProperties {
            density: rho,
            cp: cp(t),
            cv: cv(t),
            dynamic_viscosity: mu,
            kinematic_viscosity: mu / rho,
            reynolds,
            heating_power,
        })
    }
}

// ============================================================================
// AirPropertiesPlugin
// ============================================================================

/// 공기 물성 도구 (테마 비대응)
pub struct AirPropertiesPlugin {
    inputs: AirInputs,
    panel: Option<Panel>,
}

impl AirPropertiesPlugin {
    pub fn new() -> Self {
        Self {
            inputs: AirInputs::default(),
            panel: None,
        }
    }

    pub fn inputs(&self) -> &AirInputs {
        &self.inputs
    }

    pub fn set_inputs(&mut self, inputs: AirInputs) {
        self.inputs = inputs;
        self.refresh();
    }

    fn refresh(&self) {
        let Some(panel) = &self.panel else {
            return;
        };
        let mut lines = vec![format!(
            "T = {} °C, p = {} Pa",
            fmt_num(self.inputs.temperature_c, 1),
            fmt_num(self.inputs.pressure_pa, 0)
        )];
        match self.inputs.evaluate() {
            Ok(props) => {
                lines.push(format!("ρ = {} kg/m³", fmt_num(props.density, 4)));
                lines.push(format!("cp = {} J/(kg·K)", fmt_num(props.cp, 1)));
                lines.push(format!("η = {:.3e} Pa·s", props.dynamic_viscosity));
                if let Some(re) = props.reynolds {
                    lines.push(format!("Re = {}", fmt_num(re, 0)));
                }
                if let (Some(q), Some(target)) = (props.heating_power, self.inputs.target_c) {
                    lines.push(format!("Q bis {} °C = {} kW", fmt_num(target, 1), fmt_num(q, 2)));
                }
            }
            Err(e) => lines.push(format!("Fehler: {}", e)),
        }
        panel.show(Theme::Light, &lines);
    }
}

impl Default for AirPropertiesPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for AirPropertiesPlugin {
    fn name(&self) -> &str {
        "Stoffeigenschaften Luft"
    }

    fn version(&self) -> Option<&str> {
        Some(env!("CARGO_PKG_VERSION"))
    }

    fn attach(&mut self, ctx: &SharedContext) -> Result<(), PluginError> {
        self.panel = Some(Panel::open(ctx, "Stoffeigenschaften Luft")?);
        self.refresh();
        debug!("Air properties plugin attached");
        Ok(())
    }

    fn report_exporter(&self) -> Option<&dyn ReportExporter> {
        Some(self as &dyn ReportExporter)
    }

    fn stateful(&mut self) -> Option<&mut dyn StatefulPlugin> {
        Some(self as &mut dyn StatefulPlugin)
    }
}

impl ReportExporter for AirPropertiesPlugin {
    fn export_report(&self) -> Result<Option<ReportSection>, PluginError> {
        let props = self.inputs.evaluate()?;
        Ok(Some(
            ReportSection::new("Stoffeigenschaften Luft")
                .with_data(json!({ "inputs": self.inputs, "properties": props })),
        ))
    }
}

impl StatefulPlugin for AirPropertiesPlugin {
    fn export_state(&self) -> Result<Value, PluginError> {
        Ok(serde_json::to_value(&self.inputs)?)
    }

    fn import_state(&mut self, state: Value) -> Result<(), PluginError> {
        let inputs: AirInputs = serde_json::from_value(state)?;
        self.set_inputs(inputs);
        Ok(())
    }

    fn reset_state(&mut self) {
        self.set_inputs(AirInputs::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heatrix_core::{UiAnchor, Workbench};
    use std::sync::Arc;

    #[test]
    fn test_standard_conditions() {
        let props = AirInputs::default().evaluate().unwrap();
        assert!((props.density - 1.2041).abs() < 1e-3);
        assert!((props.cp - 1005.0).abs() < 5.0);
        assert!((props.cp - props.cv - R_AIR).abs() < 1e-9);
        assert!(props.dynamic_viscosity > 1.7e-5 && props.dynamic_viscosity < 1.9e-5);
        assert!(props.reynolds.is_none());
    }

    #[test]
    fn test_reynolds_and_invalid_inputs() {
        let inputs = AirInputs {
            diameter_m: Some(0.1),
            velocity: Some(5.0),
            ..AirInputs::default()
        };
        let props = inputs.evaluate().unwrap();
        let expected = 0.1 * 5.0 / props.kinematic_viscosity;
        assert!((props.reynolds.unwrap() - expected).abs() < 1e-6);

        let cold = AirInputs {
            temperature_c: -300.0,
            ..AirInputs::default()
        };
        assert!(cold.evaluate().is_err());
        assert!(reynolds(0.1, 1.0, 1.8e-5, 0.0).is_err());
    }

    #[test]
    fn test_heating_power_sign_and_range() {
        let up = heating_power(293.15, 393.15, 1.0).unwrap();
        let down = heating_power(393.15, 293.15, 1.0).unwrap();
        assert!(up > 100.0 && up < 102.0);
        assert!((up + down).abs() < 1e-9);

        assert!(heating_power(293.15, 1.0e12, 1.0).is_err());
        assert!(heating_power(100.0, 293.15, 1.0).is_err());
        assert!(heating_power(293.15, 393.15, f64::NAN).is_err());
    }

    #[test]
    fn test_heating_reaches_panel_and_report() {
        let ui = Arc::new(Workbench::new());
        let ctx = SharedContext::in_memory(ui.clone()).unwrap();
        let mut plugin = AirPropertiesPlugin::new();
        plugin.attach(&ctx).unwrap();

        plugin.set_inputs(AirInputs {
            target_c: Some(120.0),
            mass_flow: Some(1.0),
            ..AirInputs::default()
        });
        assert!(ui.content(ui.tabs()[0].handle).unwrap().contains("Q bis 120.0 °C"));

        let data = plugin.export_report().unwrap().unwrap().data.unwrap();
        let q = data["properties"]["heatingPower"].as_f64().unwrap();
        assert!(q > 100.0 && q < 102.0);

        plugin.set_inputs(AirInputs {
            target_c: Some(1.0e9),
            mass_flow: Some(1.0),
            ..AirInputs::default()
        });
        assert!(plugin.export_report().is_err());

        plugin.reset_state();
        assert_eq!(plugin.inputs(), &AirInputs::default());
    }

    #[test]
    fn test_report_is_data_only() {
        let ui = Arc::new(Workbench::new());
        let ctx = SharedContext::in_memory(ui.clone()).unwrap();
        let mut plugin = AirPropertiesPlugin::new();
        plugin.attach(&ctx).unwrap();

        assert!(plugin.theme_aware().is_none());
        assert!(ui.content(ui.tabs()[0].handle).unwrap().contains("ρ = "));

        let section = plugin.export_report().unwrap().unwrap();
        assert!(section.html.is_none());
        assert!(section.data.unwrap()["properties"]["density"].is_number());
    }
}
