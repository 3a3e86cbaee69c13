//! Registry Store - 플러그인 디스크립터 영속화
//!
//! plugins.json을 통해 플러그인 목록(순서 = 표시/로드 순서)을 관리합니다.
//! 모든 변경은 메모리 캐시에만 반영되고 dirty 표시만 남기며,
//! 디스크는 `persist()`에서만 바뀝니다.

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use super::descriptor::PluginDescriptor;
use super::error::RegistryError;
use heatrix_foundation::JsonStore;

// ============================================================================
// RegistryFile - plugins.json 구조
// ============================================================================

/// plugins.json 파일 구조
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryFile {
    /// 파일 버전
    #[serde(default = "default_version")]
    pub version: String,

    /// 디스크립터 목록 (순서 유지)
    #[serde(default)]
    pub plugins: Vec<PluginDescriptor>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for RegistryFile {
    fn default() -> Self {
        Self {
            version: default_version(),
            plugins: Vec::new(),
        }
    }
}

/// `load()` 결과
#[derive(Debug, Default)]
pub struct RegistryLoad {
    /// 로드된 디스크립터 수
    pub count: usize,

    /// 로드 중 발견된 문제 (치명적이지 않음)
    pub diagnostics: Vec<RegistryError>,
}

impl RegistryLoad {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

// ============================================================================
// RegistryStore
// ============================================================================

/// 플러그인 레지스트리 저장소
pub struct RegistryStore {
    /// 파일이 위치한 디렉토리
    store: JsonStore,

    /// 파일명
    filename: String,

    /// 디스크립터 캐시
    cache: RwLock<RegistryFile>,

    /// 마지막 persist 이후 변경 여부
    dirty: AtomicBool,

    /// persist 직렬화 (단일 writer)
    writer: Mutex<()>,
}

impl RegistryStore {
    /// 경로로 생성 (아직 로드하지 않음)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path: PathBuf = path.into();
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let filename = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| heatrix_foundation::DEFAULT_REGISTRY_FILE.to_string());

        Self::in_store(JsonStore::new(dir), filename)
    }

    /// JsonStore + 파일명으로 생성
    pub fn in_store(store: JsonStore, filename: impl Into<String>) -> Self {
        Self {
            store,
            filename: filename.into(),
            cache: RwLock::new(RegistryFile::default()),
            dirty: AtomicBool::new(false),
            writer: Mutex::new(()),
        }
    }

    /// 레지스트리 파일 경로
    pub fn path(&self) -> PathBuf {
        self.store.file_path(&self.filename)
    }

    // ========================================================================
    // 로드 / 저장
    // ========================================================================

    /// 파일에서 로드
    ///
    /// 파일이 없거나 깨져 있으면 빈 목록과 진단을 반환한다 (에러 아님).
    /// 개별 엔트리가 잘못된 경우 그 엔트리만 건너뛴다.
    pub fn load(&self) -> RegistryLoad {
        let path = self.path();
        let mut result = RegistryLoad::default();

        if !path.exists() {
            debug!("Registry not found at {:?}, using empty", path);
            *self.cache.write() = RegistryFile::default();
            self.dirty.store(false, Ordering::SeqCst);
            result.diagnostics.push(RegistryError::Missing(path));
            return result;
        }

        let raw: Value = match self.store.load(&self.filename) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Registry {} is unreadable: {}", path.display(), e);
                *self.cache.write() = RegistryFile::default();
                self.dirty.store(false, Ordering::SeqCst);
                result.diagnostics.push(RegistryError::Malformed {
                    path,
                    reason: e.to_string(),
                });
                return result;
            }
        };

        // {"plugins": [...]} 또는 [...] 둘 다 허용
        let (version, entries) = match raw {
            Value::Object(mut map) => {
                let version = map
                    .get("version")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(default_version);
                (version, map.remove("plugins"))
            }
            list @ Value::Array(_) => (default_version(), Some(list)),
            _ => (default_version(), None),
        };

        let Some(Value::Array(entries)) = entries else {
            warn!("Registry {} has no plugin list", path.display());
            *self.cache.write() = RegistryFile::default();
            self.dirty.store(false, Ordering::SeqCst);
            result.diagnostics.push(RegistryError::Malformed {
                path,
                reason: "expected a list of plugin records".to_string(),
            });
            return result;
        };

        let mut seen = HashSet::new();
        let mut plugins = Vec::with_capacity(entries.len());

        for (index, entry) in entries.into_iter().enumerate() {
            let descriptor: PluginDescriptor = match serde_json::from_value(entry) {
                Ok(d) => d,
                Err(e) => {
                    warn!("Skipping registry entry #{}: {}", index, e);
                    result.diagnostics.push(RegistryError::InvalidEntry {
                        index,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            if let Err(reason) = descriptor.validate() {
                warn!("Skipping registry entry #{}: {}", index, reason);
                result
                    .diagnostics
                    .push(RegistryError::InvalidEntry { index, reason });
                continue;
            }

            if !seen.insert(descriptor.id.clone()) {
                warn!("Skipping duplicate registry entry: {}", descriptor.id);
                result
                    .diagnostics
                    .push(RegistryError::DuplicateIdentity(descriptor.id));
                continue;
            }

            plugins.push(descriptor);
        }

        result.count = plugins.len();
        *self.cache.write() = RegistryFile { version, plugins };
        self.dirty.store(false, Ordering::SeqCst);

        info!("Loaded {} plugin descriptors", result.count);
        result
    }

    /// 파일에 저장
    ///
    /// 동시에 호출되어도 writer 락으로 직렬화되고, 파일은 임시 파일 + rename으로 교체된다.
    pub fn persist(&self) -> Result<(), RegistryError> {
        let _guard = self.writer.lock();

        let snapshot = self.cache.read().clone();
        self.store
            .save(&self.filename, &snapshot)
            .map_err(|e| RegistryError::Write(e.to_string()))?;

        self.dirty.store(false, Ordering::SeqCst);
        debug!("Saved registry with {} plugins", snapshot.plugins.len());
        Ok(())
    }

    /// 파일이 아직 없을 때만 기본 목록으로 생성 (첫 실행)
    pub fn seed_defaults(&self, defaults: Vec<PluginDescriptor>) -> Result<bool, RegistryError> {
        if self.path().exists() {
            return Ok(false);
        }

        info!("Seeding registry with {} default plugins", defaults.len());
        *self.cache.write() = RegistryFile {
            version: default_version(),
            plugins: defaults,
        };
        self.persist()?;
        Ok(true)
    }

    // ========================================================================
    // 조회
    // ========================================================================

    /// 전체 목록 (순서 유지)
    pub fn list(&self) -> Vec<PluginDescriptor> {
        self.cache.read().plugins.clone()
    }

    /// 활성화된 디스크립터만
    pub fn list_enabled(&self) -> Vec<PluginDescriptor> {
        self.cache
            .read()
            .plugins
            .iter()
            .filter(|d| d.enabled)
            .cloned()
            .collect()
    }

    /// ID로 조회
    pub fn get(&self, id: &str) -> Option<PluginDescriptor> {
        self.cache.read().plugins.iter().find(|d| d.id == id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.cache.read().plugins.iter().any(|d| d.id == id)
    }

    pub fn len(&self) -> usize {
        self.cache.read().plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().plugins.is_empty()
    }

    /// 마지막 persist 이후 변경 여부
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    // ========================================================================
    // 변경
    // ========================================================================

    /// 디스크립터 추가 (끝에)
    pub fn add(&self, descriptor: PluginDescriptor) -> Result<(), RegistryError> {
        descriptor
            .validate()
            .map_err(|reason| RegistryError::InvalidEntry {
                index: self.len(),
                reason,
            })?;

        let mut cache = self.cache.write();
        if cache.plugins.iter().any(|d| d.id == descriptor.id) {
            return Err(RegistryError::DuplicateIdentity(descriptor.id));
        }

        info!("Registry add: {} ({}::{})", descriptor.id, descriptor.module, descriptor.class);
        cache.plugins.push(descriptor);
        self.dirty.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// 디스크립터 제거
    pub fn remove(&self, id: &str) -> Option<PluginDescriptor> {
        let mut cache = self.cache.write();
        let index = cache.plugins.iter().position(|d| d.id == id)?;
        let removed = cache.plugins.remove(index);
        self.dirty.store(true, Ordering::SeqCst);
        info!("Registry remove: {}", id);
        Some(removed)
    }

    /// 활성화 상태 변경
    pub fn set_enabled(&self, id: &str, enabled: bool) -> Result<(), RegistryError> {
        let mut cache = self.cache.write();
        let descriptor = cache
            .plugins
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| RegistryError::UnknownIdentity(id.to_string()))?;

        if descriptor.enabled != enabled {
            descriptor.enabled = enabled;
            self.dirty.store(true, Ordering::SeqCst);
            info!("Plugin {} {}", id, if enabled { "enabled" } else { "disabled" });
        }
        Ok(())
    }
}

// ============================================================================
// 테스트
// ============================================================================
