//! Adapter 설정

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AdapterError, Result};

/// 기본 규칙 테이블 이름
pub const DEFAULT_TABLE_NAME: &str = "casbin_rule";

/// Adapter 설정
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterOptions {
    /// DB URL (`sqlite://rules.db`, `sqlite::memory:`)
    pub database_url: String,

    /// 최대 커넥션 수
    pub max_connections: u32,

    /// 유지할 최소 커넥션 수
    pub min_connections: u32,

    /// 커넥션 최대 수명 (초, None = 무제한)
    pub max_lifetime_secs: Option<u64>,

    /// 커넥션 획득 타임아웃 (초)
    pub acquire_timeout_secs: u64,

    /// 규칙 테이블 이름
    pub table_name: String,

    /// 실행 SQL 로깅
    pub show_sql: bool,

    /// 테이블이 없으면 생성
    pub create_table: bool,

    /// save_policy의 삭제+삽입을 하나의 트랜잭션으로 실행
    pub transactional_save: bool,

    /// 잘못된 행이 있으면 로드 전체 실패 (false = 건너뛰고 계속)
    pub strict_load: bool,
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 5,
            min_connections: 0,
            max_lifetime_secs: None,
            acquire_timeout_secs: 30,
            table_name: DEFAULT_TABLE_NAME.to_string(),
            show_sql: false,
            create_table: false,
            transactional_save: true,
            strict_load: true,
        }
    }
}

impl AdapterOptions {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let options = Self {
            database_url: env::var("RK_DATABASE_URL").unwrap_or(defaults.database_url),
            max_connections: env_or("RK_MAX_CONNECTIONS", defaults.max_connections)?,
            min_connections: env_or("RK_MIN_CONNECTIONS", defaults.min_connections)?,
            max_lifetime_secs: env::var("RK_MAX_LIFETIME_SECS")
                .ok()
                .map(|v| parse("RK_MAX_LIFETIME_SECS", &v))
                .transpose()?,
            acquire_timeout_secs: env_or("RK_ACQUIRE_TIMEOUT_SECS", defaults.acquire_timeout_secs)?,
            table_name: env::var("RK_TABLE_NAME").unwrap_or(defaults.table_name),
            show_sql: env_or("RK_SHOW_SQL", defaults.show_sql)?,
            create_table: env_or("RK_CREATE_TABLE", defaults.create_table)?,
            transactional_save: env_or("RK_TRANSACTIONAL_SAVE", defaults.transactional_save)?,
            strict_load: env_or("RK_STRICT_LOAD", defaults.strict_load)?,
        };

        options.validate()?;
        Ok(options)
    }

    /// 값 검증
    pub fn validate(&self) -> Result<()> {
        if self.table_name.trim().is_empty() {
            return Err(AdapterError::config("table name must not be empty"));
        }
        if self.max_connections == 0 {
            return Err(AdapterError::config("max_connections must be at least 1"));
        }
        if self.min_connections > self.max_connections {
            return Err(AdapterError::config(format!(
                "min_connections ({}) exceeds max_connections ({})",
                self.min_connections, self.max_connections
            )));
        }
        Ok(())
    }

    /// 메모리 DB 여부
    ///
    /// 메모리 DB는 커넥션마다 별도 DB이므로 커넥션 하나만 사용해야 합니다.
    pub fn is_memory(&self) -> bool {
        self.database_url.contains(":memory:") || self.database_url.contains("mode=memory")
    }

    pub(crate) fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub(crate) fn max_lifetime(&self) -> Option<Duration> {
        self.max_lifetime_secs.map(Duration::from_secs)
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(value) => parse(key, &value),
        Err(_) => Ok(default),
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| AdapterError::config(format!("{key}: cannot parse '{value}'")))
}
