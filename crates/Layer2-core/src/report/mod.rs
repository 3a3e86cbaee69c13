//! Report Manager - 통합 보고서
//!
//! 활성 플러그인의 섹션을 인스턴스 테이블 순서대로 모아 하나의 문서로 만든다.

mod document;
mod manager;
mod section;

pub use document::{escape_html, BlockItem, ReportBlock, ReportDocument};
pub use manager::{export_one, ReportManager, ReportSource};
pub use section::ReportSection;
