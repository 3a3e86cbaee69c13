//! Isolation Library - 공유 단열재 라이브러리
//!
//! (재료, 두께)로 키가 정해지는 단열재 엔트리 저장소. 여러 플러그인이
//! 같은 인스턴스를 공유하며, 변경 시 등록된 리스너에 알린다.
//!
//! ## Migration
//! - Version 1: isolation_entries
//! - Version 2: created_at 컬럼 추가

mod entry;
mod library;

pub use entry::{IsolationCriteria, IsolationEntry, IsolationKey};
pub use library::{IsolationLibrary, SubscriptionId, UpsertOutcome};
