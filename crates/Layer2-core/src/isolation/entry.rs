use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use heatrix_foundation::{Error, Result};

// ============================================================================
// IsolationKey
// ============================================================================

/// 정규화된 (재료, 두께) 키
///
/// 재료는 trim + 소문자 + 내부 공백 하나로, 두께는 0.01 mm 단위로 반올림.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IsolationKey {
    material: String,
    /// 0.01 mm 단위
    hundredths: i64,
}

impl IsolationKey {
    pub fn new(material: &str, thickness_mm: f64) -> Result<Self> {
        let material = normalize_material(material);
        if material.is_empty() {
            return Err(Error::validation("material must not be empty"));
        }
        if !thickness_mm.is_finite() || thickness_mm < 0.0 {
            return Err(Error::validation(format!(
                "thickness must be a non-negative number, got {}",
                thickness_mm
            )));
        }

        Ok(Self {
            material,
            hundredths: (thickness_mm * 100.0).round() as i64,
        })
    }

    pub fn material(&self) -> &str {
        &self.material
    }

    pub fn thickness_mm(&self) -> f64 {
        self.hundredths as f64 / 100.0
    }
}

impl fmt::Display for IsolationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:.2}", self.material, self.thickness_mm())
    }
}

pub(crate) fn normalize_material(material: &str) -> String {
    material
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

// ============================================================================
// IsolationEntry
// ============================================================================

/// 단열재 엔트리
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IsolationEntry {
    /// 표시용 재료명 (키는 정규화된 값 사용)
    pub material: String,
    pub thickness_mm: f64,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl IsolationEntry {
    pub fn new(material: impl Into<String>, thickness_mm: f64) -> Self {
        Self {
            material: material.into(),
            thickness_mm,
            metadata: BTreeMap::new(),
        }
    }

    /// 메타데이터 추가
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn key(&self) -> Result<IsolationKey> {
        IsolationKey::new(&self.material, self.thickness_mm)
    }

    /// 숫자 메타데이터 (예: "lambda")
    pub fn number(&self, key: &str) -> Option<f64> {
        self.metadata.get(key).and_then(Value::as_f64)
    }

    pub(crate) fn metadata_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.metadata)?)
    }
}

// ============================================================================
// IsolationCriteria
// ============================================================================

/// 검색 조건 (모든 조건 AND)
#[derive(Debug, Clone, Default)]
pub struct IsolationCriteria {
    /// 정규화된 재료명에 포함 (대소문자 무시)
    pub material_contains: Option<String>,
    pub min_thickness: Option<f64>,
    pub max_thickness: Option<f64>,
    /// 메타데이터 값 일치
    pub metadata_eq: BTreeMap<String, Value>,
}

impl IsolationCriteria {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn material(mut self, needle: impl Into<String>) -> Self {
        self.material_contains = Some(needle.into());
        self
    }

    pub fn thickness_between(mut self, min: f64, max: f64) -> Self {
        self.min_thickness = Some(min);
        self.max_thickness = Some(max);
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata_eq.insert(key.into(), value.into());
        self
    }

    pub fn matches(&self, entry: &IsolationEntry) -> bool {
        if let Some(needle) = &self.material_contains {
            if !normalize_material(&entry.material).contains(&normalize_material(needle)) {
                return false;
            }
        }
        if self.min_thickness.is_some_and(|min| entry.thickness_mm < min) {
            return false;
        }
        if self.max_thickness.is_some_and(|max| entry.thickness_mm > max) {
            return false;
        }
        self.metadata_eq
            .iter()
            .all(|(k, v)| entry.metadata.get(k) == Some(v))
    }
}
