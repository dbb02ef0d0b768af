//! SQL 정책 저장소 어댑터
//!
//! 규칙 코덱과 조건 빌더를 엔진 실행으로 연결합니다.
//!
//! - 로드: 행 조회 → 디코딩 → 모델에 추가
//! - 저장/추가/삭제: 인코딩 → 조건 생성 → 엔진 실행

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use rk_core::model::SECTIONS;
use rk_core::{Filter, PolicyModel, PolicyRule};
use rk_sql::{DdlGenerator, DeleteBuilder, InsertBuilder, SelectBuilder, Statement, WhereClause};

use crate::adapter::{Adapter, BatchAdapter, FilteredAdapter};
use crate::config::AdapterOptions;
use crate::engine::{Engine, SqliteEngine};
use crate::error::{AdapterError, Result};

/// SQL 정책 저장소 어댑터
///
/// 엔진을 소유하며 `close()`로 명시적으로 반환합니다.
pub struct SqlAdapter {
    engine: Box<dyn Engine>,
    table: String,
    transactional_save: bool,
    strict_load: bool,
    is_filtered: AtomicBool,
}

impl SqlAdapter {
    /// 기본 설정으로 연결
    pub async fn connect(database_url: &str) -> Result<Self> {
        Self::with_options(AdapterOptions {
            database_url: database_url.to_string(),
            ..Default::default()
        })
        .await
    }

    /// 설정으로 연결
    pub async fn with_options(options: AdapterOptions) -> Result<Self> {
        options.validate()?;
        let engine = SqliteEngine::connect(&options).await?;
        Self::with_engine(engine, options).await
    }

    /// 외부 엔진 사용
    ///
    /// 연결 관련 설정은 무시하고 테이블/로드/저장 설정만 사용합니다.
    pub async fn with_engine<E: Engine + 'static>(engine: E, options: AdapterOptions) -> Result<Self> {
        options.validate()?;

        let adapter = Self {
            engine: Box::new(engine),
            table: options.table_name,
            transactional_save: options.transactional_save,
            strict_load: options.strict_load,
            is_filtered: AtomicBool::new(false),
        };

        if options.create_table {
            adapter.engine.execute_in_tx(&DdlGenerator::generate(&adapter.table)).await?;
        }
        adapter.ensure_table().await?;

        Ok(adapter)
    }

    /// 규칙 테이블 이름
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// 엔진 커넥션 반환
    pub async fn close(self) {
        self.engine.close().await;
    }

    async fn ensure_table(&self) -> Result<()> {
        let probe = SelectBuilder::new(&self.table).probe();
        match self.engine.probe(&probe).await {
            Ok(()) => Ok(()),
            // DB가 거부한 경우만 (바인딩/커넥션 오류는 그대로)
            Err(AdapterError::Storage(source @ sqlx::Error::Database(_))) => {
                Err(AdapterError::TableMissing {
                    table: self.table.clone(),
                    source,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// 조건에 맞는 행을 모델에 로드, 추가된 규칙 수 반환
    async fn load_rules(
        &self,
        model: &mut dyn PolicyModel,
        where_clause: &WhereClause,
    ) -> Result<usize> {
        let query = SelectBuilder::new(&self.table).build(where_clause);
        let rows = self.engine.fetch_rules(&query).await?;

        let mut loaded = 0;
        for row in &rows {
            // 유효 필드가 없는 행은 건너뜀
            let Some(line) = row.to_line() else {
                continue;
            };

            match model.add_line(&line) {
                Ok(()) => loaded += 1,
                Err(e) if !self.strict_load => {
                    tracing::warn!(table = %self.table, id = ?row.id, error = %e, "skipping policy row");
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::debug!(table = %self.table, rows = rows.len(), loaded, "loaded policy rows");
        Ok(loaded)
    }

    fn encode_all(ptype: &str, rules: &[Vec<String>]) -> Result<Vec<PolicyRule>> {
        rules
            .iter()
            .map(|rule| PolicyRule::encode(ptype, rule.as_slice()).map_err(AdapterError::from))
            .collect()
    }

    fn delete(&self, where_clause: &WhereClause) -> Statement {
        Statement::Delete(DeleteBuilder::new(&self.table).build(where_clause))
    }
}

#[async_trait]
impl Adapter for SqlAdapter {
    async fn load_policy(&self, model: &mut dyn PolicyModel) -> Result<()> {
        self.load_rules(model, &WhereClause::empty()).await?;
        Ok(())
    }

    async fn save_policy(&self, model: &dyn PolicyModel) -> Result<()> {
        // 삭제 전에 인코딩 (arity 오류로 테이블이 비지 않도록)
        let mut rules = Vec::new();
        for sec in SECTIONS {
            for (ptype, rule) in model.rules(sec) {
                rules.push(PolicyRule::encode(&ptype, rule.as_slice())?);
            }
        }

        let mut stmts = vec![self.delete(&WhereClause::empty())];
        stmts.extend(InsertBuilder::new(&self.table).build(&rules).map(Statement::Insert));

        if self.transactional_save {
            self.engine.execute_in_tx(&stmts).await?;
        } else {
            for stmt in &stmts {
                self.engine.execute(stmt).await?;
            }
        }

        tracing::debug!(
            table = %self.table,
            rules = rules.len(),
            transactional = self.transactional_save,
            "saved policy"
        );
        Ok(())
    }

    async fn add_policy(&self, sec: &str, ptype: &str, rule: &[String]) -> Result<()> {
        let rule = PolicyRule::encode(ptype, rule)?;
        if let Some(insert) = InsertBuilder::new(&self.table).build(std::slice::from_ref(&rule)) {
            self.engine.execute(&Statement::Insert(insert)).await?;
        }

        tracing::debug!(table = %self.table, sec, ptype, "added policy");
        Ok(())
    }

    async fn remove_policy(&self, sec: &str, ptype: &str, rule: &[String]) -> Result<bool> {
        let rule = PolicyRule::encode(ptype, rule)?;
        let removed = self.engine.execute(&self.delete(&WhereClause::exact(&rule))).await?;

        tracing::debug!(table = %self.table, sec, ptype, removed, "removed policy");
        Ok(removed > 0)
    }

    async fn remove_filtered_policy(
        &self,
        sec: &str,
        ptype: &str,
        field_index: usize,
        field_values: &[String],
    ) -> Result<bool> {
        let where_clause = WhereClause::for_removal(ptype, field_index, field_values);
        let removed = self.engine.execute(&self.delete(&where_clause)).await?;

        tracing::debug!(
            table = %self.table,
            sec,
            ptype,
            field_index,
            removed,
            "removed filtered policy"
        );
        Ok(removed > 0)
    }
}

#[async_trait]
impl FilteredAdapter for SqlAdapter {
    async fn load_filtered_policy(
        &self,
        model: &mut dyn PolicyModel,
        filter: &Filter,
    ) -> Result<()> {
        self.load_rules(model, &WhereClause::from_filter(filter)).await?;
        self.is_filtered.store(true, Ordering::Release);
        Ok(())
    }

    fn is_filtered(&self) -> bool {
        self.is_filtered.load(Ordering::Acquire)
    }
}

#[async_trait]
impl BatchAdapter for SqlAdapter {
    async fn add_policies(&self, sec: &str, ptype: &str, rules: &[Vec<String>]) -> Result<()> {
        let rules = Self::encode_all(ptype, rules)?;
        if let Some(insert) = InsertBuilder::new(&self.table).build(&rules) {
            self.engine.execute(&Statement::Insert(insert)).await?;
        }

        tracing::debug!(table = %self.table, sec, ptype, count = rules.len(), "added policies");
        Ok(())
    }

    async fn remove_policies(&self, sec: &str, ptype: &str, rules: &[Vec<String>]) -> Result<bool> {
        let stmts: Vec<Statement> = Self::encode_all(ptype, rules)?
            .iter()
            .map(|rule| self.delete(&WhereClause::exact(rule)))
            .collect();
        if stmts.is_empty() {
            return Ok(false);
        }

        let removed: u64 = self.engine.execute_in_tx(&stmts).await?.iter().sum();

        tracing::debug!(table = %self.table, sec, ptype, removed, "removed policies");
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rk_core::{Column, DefaultModel};
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn options() -> AdapterOptions {
        AdapterOptions {
            create_table: true,
            ..Default::default()
        }
    }

    async fn adapter() -> SqlAdapter {
        SqlAdapter::with_options(options()).await.unwrap()
    }

    /// 풀을 공유하는 어댑터 (테스트에서 직접 SQL 실행용)
    async fn adapter_with_pool(options: AdapterOptions) -> (SqlAdapter, SqlitePool) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let engine = SqliteEngine::from_pool(pool.clone(), false);
        let adapter = SqlAdapter::with_engine(engine, options).await.unwrap();
        (adapter, pool)
    }

    fn rbac_model() -> DefaultModel {
        let mut model = DefaultModel::rbac();
        model.add_line("p, alice, data1, read").unwrap();
        model.add_line("p, bob, data2, write").unwrap();
        model.add_line("p, data2_admin, data2, read").unwrap();
        model.add_line("p, data2_admin, data2, write").unwrap();
        model.add_line("g, alice, data2_admin").unwrap();
        model
    }

    async fn load(adapter: &SqlAdapter) -> DefaultModel {
        let mut model = DefaultModel::rbac();
        adapter.load_policy(&mut model).await.unwrap();
        model
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let adapter = adapter().await;
        adapter.save_policy(&rbac_model()).await.unwrap();

        let model = load(&adapter).await;
        assert_eq!(
            model.policy("p"),
            &[
                strings(&["alice", "data1", "read"]),
                strings(&["bob", "data2", "write"]),
                strings(&["data2_admin", "data2", "read"]),
                strings(&["data2_admin", "data2", "write"]),
            ]
        );
        assert_eq!(model.policy("g"), &[strings(&["alice", "data2_admin"])]);
    }

    #[tokio::test]
    async fn test_save_replaces_existing_rules() {
        let adapter = adapter().await;
        adapter.save_policy(&rbac_model()).await.unwrap();

        let mut model = DefaultModel::rbac();
        model.add_line("p, carol, data3, read").unwrap();
        adapter.save_policy(&model).await.unwrap();

        let loaded = load(&adapter).await;
        assert_eq!(loaded.len(), 1);
        assert!(loaded.has_rule("p", &["carol", "data3", "read"]));
    }

    #[tokio::test]
    async fn test_save_without_transaction() {
        let adapter = SqlAdapter::with_options(AdapterOptions {
            transactional_save: false,
            ..options()
        })
        .await
        .unwrap();
        adapter.save_policy(&rbac_model()).await.unwrap();
        assert_eq!(load(&adapter).await.len(), 5);

        adapter.save_policy(&DefaultModel::rbac()).await.unwrap();
        assert!(load(&adapter).await.is_empty());
    }

    #[tokio::test]
    async fn test_save_rejects_wide_rule_before_deleting() {
        let adapter = adapter().await;
        adapter.save_policy(&rbac_model()).await.unwrap();

        let mut model = DefaultModel::rbac();
        model
            .add_rule("p", "p", strings(&["a", "b", "c", "d", "e", "f", "g"]))
            .unwrap();
        let err = adapter.save_policy(&model).await.unwrap_err();
        assert_eq!(err.code(), "UNSUPPORTED_ARITY");

        assert_eq!(load(&adapter).await.len(), 5);
    }

    #[tokio::test]
    async fn test_add_and_remove_policy() {
        let adapter = adapter().await;
        adapter.save_policy(&rbac_model()).await.unwrap();

        let rule = strings(&["alice", "data1", "write"]);
        adapter.add_policy("p", "p", &rule).await.unwrap();
        assert!(load(&adapter).await.has_rule("p", &["alice", "data1", "write"]));

        assert!(adapter.remove_policy("p", "p", &rule).await.unwrap());
        let model = load(&adapter).await;
        assert!(!model.has_rule("p", &["alice", "data1", "write"]));
        assert_eq!(model.len(), 5);

        assert!(!adapter.remove_policy("p", "p", &rule).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_policy_matches_exact_rule_only() {
        let adapter = adapter().await;
        adapter
            .add_policy("p", "p", &strings(&["alice", "data1", "read", "allow"]))
            .await
            .unwrap();
        adapter
            .add_policy("p", "p", &strings(&["alice", "data1", "read"]))
            .await
            .unwrap();

        // 짧은 규칙은 v3 = '' 조건으로 긴 규칙과 구분됨
        assert!(adapter
            .remove_policy("p", "p", &strings(&["alice", "data1", "read"]))
            .await
            .unwrap());
        let model = load(&adapter).await;
        assert_eq!(model.policy("p"), &[strings(&["alice", "data1", "read", "allow"])]);
    }

    #[tokio::test]
    async fn test_add_policy_rejects_wide_rule() {
        let adapter = adapter().await;
        let err = adapter
            .add_policy("p", "p", &strings(&["a", "b", "c", "d", "e", "f", "g"]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AdapterError::Core(rk_core::Error::UnsupportedArity { arity: 7, .. })
        ));
        assert!(load(&adapter).await.is_empty());
    }

    #[tokio::test]
    async fn test_remove_filtered_policy() {
        let adapter = adapter().await;
        let mut model = DefaultModel::rbac();
        model.add_line("p, alice, data1, read").unwrap();
        model.add_line("p, bob, data2, write").unwrap();
        adapter.save_policy(&model).await.unwrap();

        assert!(adapter
            .remove_filtered_policy("p", "p", 0, &strings(&["bob"]))
            .await
            .unwrap());

        let model = load(&adapter).await;
        assert_eq!(model.policy("p"), &[strings(&["alice", "data1", "read"])]);
    }

    #[tokio::test]
    async fn test_remove_filtered_policy_by_offset() {
        let adapter = adapter().await;
        adapter.save_policy(&rbac_model()).await.unwrap();

        // v1 = data2 인 p 규칙만 삭제, v0은 제약 없음
        assert!(adapter
            .remove_filtered_policy("p", "p", 1, &strings(&["data2"]))
            .await
            .unwrap());

        let model = load(&adapter).await;
        assert_eq!(model.policy("p"), &[strings(&["alice", "data1", "read"])]);
        assert_eq!(model.policy("g").len(), 1);
    }

    #[tokio::test]
    async fn test_remove_filtered_policy_empty_value_is_wildcard() {
        let adapter = adapter().await;
        adapter.save_policy(&rbac_model()).await.unwrap();

        assert!(adapter
            .remove_filtered_policy("p", "p", 0, &strings(&["data2_admin", "", "write"]))
            .await
            .unwrap());

        let model = load(&adapter).await;
        assert_eq!(model.policy("p").len(), 3);
        assert!(!model.has_rule("p", &["data2_admin", "data2", "write"]));
        assert!(model.has_rule("p", &["data2_admin", "data2", "read"]));
    }

    #[tokio::test]
    async fn test_bulk_add_and_remove() {
        let adapter = adapter().await;
        let rules = vec![
            strings(&["jack", "data4", "read"]),
            strings(&["jack", "data4", "write"]),
            strings(&["jill", "data5", "read"]),
        ];
        adapter.add_policies("p", "p", &rules).await.unwrap();
        assert_eq!(load(&adapter).await.len(), 3);

        assert!(adapter.remove_policies("p", "p", &rules[..2]).await.unwrap());

        let model = load(&adapter).await;
        assert_eq!(model.policy("p"), &[strings(&["jill", "data5", "read"])]);
    }

    #[tokio::test]
    async fn test_bulk_empty_is_noop() {
        let adapter = adapter().await;
        adapter.add_policies("p", "p", &[]).await.unwrap();
        assert!(!adapter.remove_policies("p", "p", &[]).await.unwrap());
    }

    #[tokio::test]
    async fn test_bulk_remove_rolls_back_on_failure() {
        let (adapter, pool) = adapter_with_pool(options()).await;
        adapter
            .add_policies(
                "p",
                "p",
                &[strings(&["alice", "data1", "read"]), strings(&["locked", "data1", "read"])],
            )
            .await
            .unwrap();

        sqlx::query(
            "CREATE TRIGGER guard_locked BEFORE DELETE ON casbin_rule \
             WHEN OLD.v0 = 'locked' BEGIN SELECT RAISE(ABORT, 'locked rule'); END",
        )
        .execute(&pool)
        .await
        .unwrap();

        let err = adapter
            .remove_policies(
                "p",
                "p",
                &[strings(&["alice", "data1", "read"]), strings(&["locked", "data1", "read"])],
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "STORAGE_FAILURE");

        // alice 삭제도 롤백됨
        let model = load(&adapter).await;
        assert!(model.has_rule("p", &["alice", "data1", "read"]));
        assert!(model.has_rule("p", &["locked", "data1", "read"]));
    }

    #[tokio::test]
    async fn test_filtered_load() {
        let adapter = adapter().await;
        adapter.save_policy(&rbac_model()).await.unwrap();
        assert!(!adapter.is_filtered());

        let filter = Filter::new().with(Column::V0, ["alice", "bob"]);
        let mut model = DefaultModel::rbac();
        adapter.load_filtered_policy(&mut model, &filter).await.unwrap();

        assert_eq!(
            model.policy("p"),
            &[strings(&["alice", "data1", "read"]), strings(&["bob", "data2", "write"])]
        );
        assert_eq!(model.policy("g"), &[strings(&["alice", "data2_admin"])]);
        assert!(adapter.is_filtered());

        // 이후 전체 로드에도 유지
        load(&adapter).await;
        assert!(adapter.is_filtered());
    }

    #[tokio::test]
    async fn test_filtered_load_by_type_and_value() {
        let adapter = adapter().await;
        adapter.save_policy(&rbac_model()).await.unwrap();

        let filter = Filter::from_value(serde_json::json!({
            "p_type": ["p"],
            "v0": ["data2_admin"],
        }))
        .unwrap();
        let mut model = DefaultModel::rbac();
        adapter.load_filtered_policy(&mut model, &filter).await.unwrap();

        assert_eq!(model.policy("p").len(), 2);
        assert!(model.policy("g").is_empty());
    }

    #[tokio::test]
    async fn test_empty_filter_loads_everything() {
        let adapter = adapter().await;
        adapter.save_policy(&rbac_model()).await.unwrap();

        let mut model = DefaultModel::rbac();
        adapter
            .load_filtered_policy(&mut model, &Filter::new())
            .await
            .unwrap();
        assert_eq!(model.len(), 5);
    }

    #[tokio::test]
    async fn test_failed_filtered_load_keeps_flag_unset() {
        let adapter = adapter().await;
        adapter.add_policy("p", "p2", &strings(&["alice"])).await.unwrap();

        let mut model = DefaultModel::rbac();
        let err = adapter
            .load_filtered_policy(&mut model, &Filter::new())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "MALFORMED_LINE");
        assert!(!adapter.is_filtered());
    }

    #[tokio::test]
    async fn test_strict_load_aborts_on_unknown_type() {
        let adapter = adapter().await;
        adapter.save_policy(&rbac_model()).await.unwrap();
        adapter.add_policy("p", "p9", &strings(&["eve", "data9"])).await.unwrap();

        let mut model = DefaultModel::rbac();
        let err = adapter.load_policy(&mut model).await.unwrap_err();
        match err {
            AdapterError::Core(rk_core::Error::MalformedLine { line, .. }) => {
                assert_eq!(line, "p9, eve, data9");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_relaxed_load_skips_unknown_type() {
        let adapter = SqlAdapter::with_options(AdapterOptions {
            strict_load: false,
            ..options()
        })
        .await
        .unwrap();
        adapter.save_policy(&rbac_model()).await.unwrap();
        adapter.add_policy("p", "p9", &strings(&["eve", "data9"])).await.unwrap();

        assert_eq!(load(&adapter).await.len(), 5);
    }

    #[tokio::test]
    async fn test_load_trusts_left_packed_rows() {
        let (adapter, pool) = adapter_with_pool(options()).await;
        sqlx::query(
            "INSERT INTO casbin_rule (p_type, v0, v1, v2, v3, v4, v5) VALUES \
             ('p', 'alice', '', 'read', '', '', ''), \
             ('p', '', '', '', '', '', ''), \
             ('g', 'bob', 'admin', '', '', '', '')",
        )
        .execute(&pool)
        .await
        .unwrap();

        let model = load(&adapter).await;
        // v1이 비어있으므로 v2는 버려짐, 빈 행은 건너뜀
        assert_eq!(model.policy("p"), &[strings(&["alice"])]);
        assert_eq!(model.policy("g"), &[strings(&["bob", "admin"])]);
    }

    #[tokio::test]
    async fn test_fields_with_commas_survive() {
        let adapter = adapter().await;
        let rule = strings(&["alice", "/data/a,b", "read"]);
        adapter.add_policy("p", "p", &rule).await.unwrap();

        let model = load(&adapter).await;
        assert_eq!(model.policy("p"), &[rule]);
    }

    #[tokio::test]
    async fn test_custom_table_name() {
        let adapter = SqlAdapter::with_options(AdapterOptions {
            table_name: "policy_rules".to_string(),
            ..options()
        })
        .await
        .unwrap();
        assert_eq!(adapter.table_name(), "policy_rules");

        adapter.save_policy(&rbac_model()).await.unwrap();
        assert_eq!(load(&adapter).await.len(), 5);
        adapter.close().await;
    }

    #[tokio::test]
    async fn test_missing_table() {
        let err = SqlAdapter::connect("sqlite::memory:").await.err().unwrap();
        assert_eq!(err.code(), "TABLE_MISSING");
        match err {
            AdapterError::TableMissing { table, source } => {
                assert_eq!(table, "casbin_rule");
                assert!(source.to_string().contains("no such table"), "{source}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_connect_to_existing_table() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        for stmt in DdlGenerator::generate("casbin_rule") {
            let (sql, _) = stmt.build(sea_query::SqliteQueryBuilder);
            sqlx::query(&sql).execute(&pool).await.unwrap();
        }
        sqlx::query(
            "INSERT INTO casbin_rule (p_type, v0, v1, v2) VALUES ('p', 'alice', 'data1', 'read')",
        )
        .execute(&pool)
        .await
        .unwrap();

        // create_table 없이 기존 테이블에 붙음
        let engine = SqliteEngine::from_pool(pool, false);
        let adapter = SqlAdapter::with_engine(engine, AdapterOptions::default())
            .await
            .unwrap();
        assert!(load(&adapter).await.has_rule("p", &["alice", "data1", "read"]));
    }

    #[tokio::test]
    async fn test_create_table_is_idempotent() {
        let (adapter, pool) = adapter_with_pool(options()).await;
        adapter.add_policy("p", "p", &strings(&["alice", "data1", "read"])).await.unwrap();

        let again = SqlAdapter::with_engine(SqliteEngine::from_pool(pool, false), options())
            .await
            .unwrap();
        assert_eq!(load(&again).await.len(), 1);
    }

    #[tokio::test]
    async fn test_connection_failure() {
        let err = SqlAdapter::with_options(AdapterOptions {
            database_url: "sqlite:///nonexistent-rulekeep-dir/sub/rules.db".to_string(),
            acquire_timeout_secs: 1,
            ..options()
        })
        .await
        .err()
        .unwrap();
        assert_eq!(err.code(), "CONNECTION_FAILURE");
    }

    #[tokio::test]
    async fn test_invalid_options() {
        let err = SqlAdapter::with_options(AdapterOptions {
            table_name: String::new(),
            ..options()
        })
        .await
        .err()
        .unwrap();
        assert_eq!(err.code(), "INVALID_CONFIG");
    }
}
