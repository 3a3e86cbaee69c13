//! Plugin Loader - 디스크립터를 라이브 인스턴스로 변환
//!
//! 런타임 코드 로딩 대신 컴파일 타임 카탈로그(module → class → factory)를 사용한다.
//! 레지스트리의 `module`/`class`는 카탈로그 키로 해석된다.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::descriptor::PluginDescriptor;
use super::error::{LoadError, PluginError};
use super::guard::guarded;
use super::traits::Plugin;

/// 인자 없는 플러그인 생성자
pub type PluginFactory = Arc<dyn Fn() -> Result<Box<dyn Plugin>, PluginError> + Send + Sync>;

// ============================================================================
// PluginCatalog
// ============================================================================

/// 로드 가능한 플러그인 타입 목록
#[derive(Clone, Default)]
pub struct PluginCatalog {
    modules: BTreeMap<String, BTreeMap<String, PluginFactory>>,
}

impl PluginCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 타입 등록 (같은 module/class는 덮어쓴다)
    pub fn register<F>(&mut self, module: impl Into<String>, class: impl Into<String>, factory: F)
    where
        F: Fn() -> Result<Box<dyn Plugin>, PluginError> + Send + Sync + 'static,
    {
        let module = module.into();
        let class = class.into();
        debug!("Catalog register: {}::{}", module, class);
        self.modules
            .entry(module)
            .or_default()
            .insert(class, Arc::new(factory));
    }

    /// 빌더 스타일 등록
    pub fn with<F>(mut self, module: impl Into<String>, class: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Result<Box<dyn Plugin>, PluginError> + Send + Sync + 'static,
    {
        self.register(module, class, factory);
        self
    }

    /// 다른 카탈로그 병합
    pub fn extend(&mut self, other: PluginCatalog) {
        for (module, classes) in other.modules {
            self.modules.entry(module).or_default().extend(classes);
        }
    }

    pub fn has_module(&self, module: &str) -> bool {
        self.modules.contains_key(module)
    }

    pub fn contains(&self, module: &str, class: &str) -> bool {
        self.modules
            .get(module)
            .is_some_and(|classes| classes.contains_key(class))
    }

    /// 등록된 (module, class) 목록
    pub fn entries(&self) -> Vec<(String, String)> {
        self.modules
            .iter()
            .flat_map(|(m, classes)| classes.keys().map(move |c| (m.clone(), c.clone())))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.modules.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for PluginCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginCatalog")
            .field("entries", &self.entries())
            .finish()
    }
}

// ============================================================================
// PluginLoader
// ============================================================================

/// 카탈로그 기반 로더
#[derive(Debug, Clone)]
pub struct PluginLoader {
    catalog: PluginCatalog,
}

impl PluginLoader {
    pub fn new(catalog: PluginCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &PluginCatalog {
        &self.catalog
    }

    /// 디스크립터 하나를 인스턴스로 변환
    ///
    /// 순서: 모듈 해석 → 타입 해석 → 생성 (패닉 포함 실패는 ConstructionError)
    /// → 계약 검사 (이름이 비어 있으면 ContractViolation).
    pub fn load(&self, descriptor: &PluginDescriptor) -> Result<Box<dyn Plugin>, LoadError> {
        let id = descriptor.id.clone();

        let classes = self
            .catalog
            .modules
            .get(&descriptor.module)
            .ok_or_else(|| LoadError::ModuleNotFound {
                id: id.clone(),
                module: descriptor.module.clone(),
            })?;

        let factory = classes
            .get(&descriptor.class)
            .ok_or_else(|| LoadError::TypeNotFound {
                id: id.clone(),
                module: descriptor.module.clone(),
                class: descriptor.class.clone(),
            })?;

        let plugin = match guarded(|| factory()) {
            Ok(Ok(plugin)) => plugin,
            Ok(Err(e)) => {
                warn!("Plugin {} failed to construct: {}", id, e);
                return Err(LoadError::ConstructionError {
                    id,
                    reason: e.to_string(),
                });
            }
            Err(panic) => {
                warn!("Plugin {} panicked during construction: {}", id, panic);
                return Err(LoadError::ConstructionError {
                    id,
                    reason: format!("panicked: {}", panic),
                });
            }
        };

        let name_ok = guarded(|| !plugin.name().trim().is_empty()).unwrap_or(false);
        if !name_ok {
            return Err(LoadError::ContractViolation {
                id,
                reason: "plugin name is empty".to_string(),
            });
        }

        debug!("Loaded plugin {} ({}::{})", id, descriptor.module, descriptor.class);
        Ok(plugin)
    }
}
