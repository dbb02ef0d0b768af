//! 스토리지 엔진
//!
//! 어댑터가 사용하는 SQL 실행 경계입니다. 어댑터는 SeaQuery 문장만 만들고,
//! 렌더링과 실행, 트랜잭션은 엔진이 담당합니다.

use std::str::FromStr;

use async_trait::async_trait;
use rk_core::{PolicyRule, MAX_FIELDS};
use rk_sql::Statement;
use sea_query::{QueryStatementWriter, SelectStatement, SqliteQueryBuilder, Value, Values};
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Arguments, ConnectOptions, SqlitePool};

use crate::config::AdapterOptions;
use crate::error::{AdapterError, Result};

/// SQL 실행 엔진
#[async_trait]
pub trait Engine: Send + Sync {
    /// 규칙 행 조회
    async fn fetch_rules(&self, query: &SelectStatement) -> Result<Vec<PolicyRule>>;

    /// 쿼리가 실행 가능한지 확인 (테이블 존재 확인)
    async fn probe(&self, query: &SelectStatement) -> Result<()>;

    /// 문장 하나 실행, 영향받은 행 수 반환
    async fn execute(&self, stmt: &Statement) -> Result<u64>;

    /// 여러 문장을 하나의 트랜잭션으로 실행
    ///
    /// 하나라도 실패하면 전체 롤백됩니다.
    async fn execute_in_tx(&self, stmts: &[Statement]) -> Result<Vec<u64>>;

    /// 커넥션 반환
    async fn close(&self);
}

/// 규칙 테이블 행
#[derive(Debug, sqlx::FromRow)]
struct RuleRow {
    id: i64,
    #[sqlx(rename = "p_type")]
    ptype: Option<String>,
    v0: Option<String>,
    v1: Option<String>,
    v2: Option<String>,
    v3: Option<String>,
    v4: Option<String>,
    v5: Option<String>,
}

impl From<RuleRow> for PolicyRule {
    fn from(row: RuleRow) -> Self {
        let values: [String; MAX_FIELDS] = [row.v0, row.v1, row.v2, row.v3, row.v4, row.v5]
            .map(Option::unwrap_or_default);
        PolicyRule::from_row(row.id, row.ptype.unwrap_or_default(), values)
    }
}

/// SQLite 엔진
#[derive(Clone)]
pub struct SqliteEngine {
    pool: SqlitePool,
    show_sql: bool,
}

impl SqliteEngine {
    /// 설정으로 커넥션 풀 생성
    pub async fn connect(options: &AdapterOptions) -> Result<Self> {
        let mut connect_options = SqliteConnectOptions::from_str(&options.database_url)
            .map_err(AdapterError::Connection)?
            .create_if_missing(true);
        if !options.show_sql {
            connect_options = connect_options.disable_statement_logging();
        }

        let pool_options = if options.is_memory() {
            // 메모리 DB: 커넥션 하나를 끝까지 유지
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
                .max_connections(options.max_connections)
                .min_connections(options.min_connections)
                .max_lifetime(options.max_lifetime())
        };

        let pool = pool_options
            .acquire_timeout(options.acquire_timeout())
            .connect_with(connect_options)
            .await
            .map_err(AdapterError::Connection)?;

        tracing::info!(
            url = %options.database_url,
            max_connections = pool.options().get_max_connections(),
            "connected policy store"
        );

        Ok(Self::from_pool(pool, options.show_sql))
    }

    /// 기존 풀 사용
    pub fn from_pool(pool: SqlitePool, show_sql: bool) -> Self {
        Self { pool, show_sql }
    }

    /// 커넥션 풀
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn log(&self, sql: &str) {
        if self.show_sql {
            tracing::info!(target: "rk_adapter::sql", "{}", sql);
        }
    }
}

#[async_trait]
impl Engine for SqliteEngine {
    async fn fetch_rules(&self, query: &SelectStatement) -> Result<Vec<PolicyRule>> {
        let (sql, values) = query.build(SqliteQueryBuilder);
        self.log(&sql);

        let rows = sqlx::query_as_with::<_, RuleRow, _>(&sql, arguments(&values)?)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(PolicyRule::from).collect())
    }

    async fn probe(&self, query: &SelectStatement) -> Result<()> {
        let (sql, values) = query.build(SqliteQueryBuilder);
        self.log(&sql);

        sqlx::query_with(&sql, arguments(&values)?)
            .fetch_optional(&self.pool)
            .await?;
        Ok(())
    }

    async fn execute(&self, stmt: &Statement) -> Result<u64> {
        let (sql, values) = stmt.build(SqliteQueryBuilder);
        self.log(&sql);

        let result = sqlx::query_with(&sql, arguments(&values)?)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn execute_in_tx(&self, stmts: &[Statement]) -> Result<Vec<u64>> {
        let mut tx = self.pool.begin().await?;
        let mut affected = Vec::with_capacity(stmts.len());

        for stmt in stmts {
            let (sql, values) = stmt.build(SqliteQueryBuilder);
            self.log(&sql);

            // 실패 시 tx drop → 롤백
            let result = sqlx::query_with(&sql, arguments(&values)?)
                .execute(&mut *tx)
                .await?;
            affected.push(result.rows_affected());
        }

        tx.commit().await?;
        Ok(affected)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// SeaQuery 바인딩 값 → sqlx 인자
fn arguments<'q>(values: &Values) -> Result<SqliteArguments<'q>> {
    let mut args = SqliteArguments::default();
    for value in values.iter() {
        let added = match value {
            Value::String(s) => args.add(s.as_deref().cloned()),
            Value::Bool(b) => args.add(*b),
            Value::TinyInt(i) => args.add(*i),
            Value::SmallInt(i) => args.add(*i),
            Value::Int(i) => args.add(*i),
            Value::BigInt(i) => args.add(*i),
            Value::TinyUnsigned(i) => args.add(*i),
            Value::SmallUnsigned(i) => args.add(*i),
            Value::Unsigned(i) => args.add(*i),
            // SQLite는 u64 인코딩이 없음 (LIMIT 값 등)
            Value::BigUnsigned(i) => match i.map(i64::try_from).transpose() {
                Ok(i) => args.add(i),
                Err(e) => Err(e.into()),
            },
            other => Err(format!("unsupported bind value: {other:?}").into()),
        };
        added.map_err(sqlx::Error::Encode)?;
    }
    Ok(args)
}
