//! rk-sql: 정책 규칙 테이블 SQL 생성 라이브러리
//!
//! 코덱이 만든 규칙 행과 조건을 SeaQuery 문장으로 변환합니다.
//! 값은 바인딩 파라미터로 분리되어 SQL Injection을 원천 차단합니다.
//!
//! # 모듈 구조
//!
//! - `predicate`: 세 가지 조건 모드 (오프셋 삭제, 필터 로드, 정확 일치)
//! - `builder`: SELECT/INSERT/DELETE 빌더
//! - `ddl`: 규칙 테이블 DDL 생성기

pub mod builder;
pub mod ddl;
pub mod predicate;

pub use builder::{DeleteBuilder, InsertBuilder, SelectBuilder, Statement};
pub use ddl::DdlGenerator;
pub use predicate::{Predicate, WhereClause};
