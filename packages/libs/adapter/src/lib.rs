//! rk-adapter: 정책 저장소 어댑터
//!
//! 인가 엔진의 정책 규칙을 SQL 테이블(`casbin_rule`)에 저장하고 로드합니다.
//!
//! # 모듈 구조
//!
//! - `adapter`: 어댑터 트레이트 (기본, 필터 로드, 일괄 처리)
//! - `sql_adapter`: SQL 어댑터 구현
//! - `engine`: SQL 실행 엔진 (SQLite)
//! - `config`: 연결/동작 설정
//! - `error`: 에러 타입
//!
//! # 사용 예
//!
//! ```no_run
//! use rk_adapter::{Adapter, AdapterOptions, SqlAdapter};
//! use rk_core::DefaultModel;
//!
//! # async fn run() -> rk_adapter::Result<()> {
//! let adapter = SqlAdapter::with_options(AdapterOptions {
//!     database_url: "sqlite://rules.db".to_string(),
//!     create_table: true,
//!     ..Default::default()
//! })
//! .await?;
//!
//! let mut model = DefaultModel::rbac();
//! adapter.load_policy(&mut model).await?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod config;
pub mod engine;
pub mod error;
pub mod sql_adapter;

pub use adapter::{Adapter, BatchAdapter, FilteredAdapter};
pub use config::{AdapterOptions, DEFAULT_TABLE_NAME};
pub use engine::{Engine, SqliteEngine};
pub use error::{AdapterError, Result};
pub use sql_adapter::SqlAdapter;
