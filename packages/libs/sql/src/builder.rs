//! 정책 규칙 테이블 SQL 빌더
//!
//! `WhereClause`와 규칙 행을 받아 SeaQuery 문장을 생성합니다.
//! 렌더링(백엔드 선택)은 엔진이 담당합니다.

use rk_core::{Column, PolicyRule};
use sea_query::{
    DeleteStatement, Expr, Iden, IndexCreateStatement, InsertStatement, Order, Query,
    QueryBuilder, QueryStatementWriter, SchemaBuilder, SchemaStatementBuilder, SelectStatement,
    SimpleExpr, TableCreateStatement, Values,
};

use crate::predicate::WhereClause;

/// 규칙 테이블 식별자
#[derive(Debug, Clone)]
pub(crate) enum RuleIden {
    Table(String),
    Id,
    Column(Column),
}

impl Iden for RuleIden {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        let name = match self {
            RuleIden::Table(name) => name.as_str(),
            RuleIden::Id => "id",
            RuleIden::Column(column) => column.name(),
        };
        let _ = s.write_str(name);
    }
}

/// 쓰기/스키마 문장
#[derive(Debug, Clone)]
pub enum Statement {
    Insert(InsertStatement),
    Delete(DeleteStatement),
    CreateTable(TableCreateStatement),
    CreateIndex(IndexCreateStatement),
}

impl Statement {
    /// 백엔드 SQL + 바인딩 값으로 렌더링
    ///
    /// 스키마 문장은 바인딩 값이 없습니다.
    pub fn build<B>(&self, builder: B) -> (String, Values)
    where
        B: QueryBuilder + SchemaBuilder,
    {
        match self {
            Statement::Insert(stmt) => QueryStatementWriter::build(stmt, builder),
            Statement::Delete(stmt) => QueryStatementWriter::build(stmt, builder),
            Statement::CreateTable(stmt) => {
                (SchemaStatementBuilder::build(stmt, builder), Values(Vec::new()))
            }
            Statement::CreateIndex(stmt) => {
                (SchemaStatementBuilder::build(stmt, builder), Values(Vec::new()))
            }
        }
    }
}

/// SELECT 쿼리 빌더
pub struct SelectBuilder<'a> {
    table: &'a str,
}

impl<'a> SelectBuilder<'a> {
    /// 새 빌더 생성
    pub fn new(table: &'a str) -> Self {
        Self { table }
    }

    /// 조건에 맞는 규칙 행 조회 (id 오름차순)
    pub fn build(&self, where_clause: &WhereClause) -> SelectStatement {
        let mut query = Query::select();
        query
            .column(RuleIden::Id)
            .columns(Column::ALL.map(RuleIden::Column))
            .from(RuleIden::Table(self.table.to_string()));

        where_clause.apply(&mut query);

        query.order_by(RuleIden::Id, Order::Asc);
        query
    }

    /// 테이블 존재 확인용 쿼리 (`SELECT 1 ... LIMIT 1`)
    pub fn probe(&self) -> SelectStatement {
        let mut query = Query::select();
        query
            .expr(Expr::val(1))
            .from(RuleIden::Table(self.table.to_string()))
            .limit(1);
        query
    }
}

/// INSERT 쿼리 빌더
pub struct InsertBuilder<'a> {
    table: &'a str,
}

impl<'a> InsertBuilder<'a> {
    pub fn new(table: &'a str) -> Self {
        Self { table }
    }

    /// 다중 행 INSERT 생성
    ///
    /// 행이 없으면 None. `id`는 DB가 생성합니다.
    pub fn build(&self, rules: &[PolicyRule]) -> Option<InsertStatement> {
        if rules.is_empty() {
            return None;
        }

        let mut query = Query::insert();
        query
            .into_table(RuleIden::Table(self.table.to_string()))
            .columns(Column::ALL.map(RuleIden::Column));

        for rule in rules {
            let values: Vec<SimpleExpr> = Column::ALL
                .iter()
                .map(|column| Expr::val(rule.get(*column)).into())
                .collect();
            // 컬럼 수가 고정(7)이므로 실패하지 않음
            query.values_panic(values);
        }

        Some(query)
    }
}

/// DELETE 쿼리 빌더
pub struct DeleteBuilder<'a> {
    table: &'a str,
}

impl<'a> DeleteBuilder<'a> {
    pub fn new(table: &'a str) -> Self {
        Self { table }
    }

    /// 조건에 맞는 행 삭제 (빈 조건 = 전체 삭제)
    pub fn build(&self, where_clause: &WhereClause) -> DeleteStatement {
        let mut query = Query::delete();
        query.from_table(RuleIden::Table(self.table.to_string()));

        where_clause.apply(&mut query);
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rk_core::Filter;
    use sea_query::SqliteQueryBuilder;

    fn sql<S: QueryStatementWriter>(stmt: &S) -> String {
        stmt.to_string(SqliteQueryBuilder)
    }

    #[test]
    fn test_select_builder_basic() {
        let stmt = SelectBuilder::new("casbin_rule").build(&WhereClause::empty());
        let sql = sql(&stmt);

        assert!(sql.starts_with("SELECT \"id\", \"p_type\", \"v0\""));
        assert!(sql.contains("FROM \"casbin_rule\""));
        assert!(!sql.contains("WHERE"));
        assert!(sql.ends_with("ORDER BY \"id\" ASC"));
    }

    #[test]
    fn test_select_builder_with_filter() {
        let filter = Filter::new()
            .with(Column::PType, ["p"])
            .with(Column::V0, ["alice", "bob"]);
        let stmt = SelectBuilder::new("casbin_rule").build(&WhereClause::from_filter(&filter));
        let sql = sql(&stmt);

        assert!(sql.contains("\"p_type\" = 'p'"));
        assert!(sql.contains("\"v0\" IN ('alice', 'bob')"));
        assert!(sql.contains(" AND "));
    }

    #[test]
    fn test_probe() {
        let sql = sql(&SelectBuilder::new("rules").probe());
        assert!(sql.contains("FROM \"rules\""));
        assert!(sql.contains("LIMIT 1"));
    }

    #[test]
    fn test_insert_builder() {
        let rules = vec![
            PolicyRule::encode("p", &["alice", "data1", "read"]).unwrap(),
            PolicyRule::encode("g", &["alice", "admin"]).unwrap(),
        ];
        let stmt = InsertBuilder::new("casbin_rule").build(&rules).unwrap();
        let sql = sql(&stmt);

        assert!(sql.starts_with("INSERT INTO \"casbin_rule\" (\"p_type\", \"v0\""));
        assert!(!sql.contains("\"id\""));
        assert!(sql.contains("('p', 'alice', 'data1', 'read', '', '', '')"));
        assert!(sql.contains("('g', 'alice', 'admin', '', '', '', '')"));
    }

    #[test]
    fn test_insert_builder_empty() {
        assert!(InsertBuilder::new("casbin_rule").build(&[]).is_none());
    }

    #[test]
    fn test_delete_builder_removal() {
        let clause = WhereClause::for_removal("p", 1, &["data2"]);
        let sql = sql(&DeleteBuilder::new("casbin_rule").build(&clause));

        assert!(sql.starts_with("DELETE FROM \"casbin_rule\""));
        assert!(sql.contains("\"p_type\" = 'p' AND \"v1\" = 'data2'"));
        assert!(!sql.contains("\"v0\""));
    }

    #[test]
    fn test_delete_builder_all() {
        let sql = sql(&DeleteBuilder::new("casbin_rule").build(&WhereClause::empty()));
        assert_eq!(sql, "DELETE FROM \"casbin_rule\"");
    }

    #[test]
    fn test_statement_build_binds_values() {
        let clause = WhereClause::for_removal("p", 0, &["alice"]);
        let stmt = Statement::Delete(DeleteBuilder::new("t").build(&clause));
        let (sql, values) = stmt.build(SqliteQueryBuilder);

        assert_eq!(sql, "DELETE FROM \"t\" WHERE \"p_type\" = ? AND \"v0\" = ?");
        assert_eq!(values.0.len(), 2);
    }
}
