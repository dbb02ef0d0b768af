//! rk-core: Rulekeep 공통 핵심 라이브러리
//!
//! 정책 규칙을 관계형 테이블에 저장하기 위한 타입과 순수 로직을 제공합니다.
//!
//! # 모듈 구조
//!
//! - `rule`: 정책 튜플 ↔ 테이블 행 코덱
//! - `line`: 정책 라인 텍스트 포맷
//! - `filter`: 필터 로드 조건
//! - `model`: 메모리 정책 모델 경계
//! - `error`: 공통 에러 타입

pub mod error;
pub mod filter;
pub mod line;
pub mod model;
pub mod rule;

pub use error::{Error, Result};
pub use filter::Filter;
pub use model::{DefaultModel, PolicyModel};
pub use rule::{Column, PolicyRule, MAX_FIELDS};
