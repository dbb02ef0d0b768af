//! DDL 생성기
//!
//! 정책 규칙 테이블(`id`, `p_type`, `v0`..`v5`)의 CREATE 문장을 생성합니다.
//! 마이그레이션은 지원하지 않습니다.

use rk_core::Column;
use sea_query::{ColumnDef, Index, IndexCreateStatement, Table, TableCreateStatement};

use crate::builder::{RuleIden, Statement};

/// 값 컬럼 폭
pub const FIELD_WIDTH: u32 = 100;

pub struct DdlGenerator;

impl DdlGenerator {
    /// 테이블 + 인덱스 생성 문장
    pub fn generate(table: &str) -> Vec<Statement> {
        vec![
            Statement::CreateTable(Self::create_table(table)),
            Statement::CreateIndex(Self::create_index(table)),
        ]
    }

    fn create_table(name: &str) -> TableCreateStatement {
        let mut stmt = Table::create();
        stmt.table(RuleIden::Table(name.to_string())).if_not_exists();

        let mut id_col = ColumnDef::new(RuleIden::Id);
        id_col.integer().not_null().auto_increment().primary_key();
        stmt.col(&mut id_col);

        for column in Column::ALL {
            let mut col_def = ColumnDef::new(RuleIden::Column(column));
            col_def.string_len(FIELD_WIDTH).not_null().default("");
            stmt.col(&mut col_def);
        }

        stmt
    }

    fn create_index(table: &str) -> IndexCreateStatement {
        let mut stmt = Index::create();
        stmt.name(format!("idx_{}_{}", table, Column::PType.name()))
            .table(RuleIden::Table(table.to_string()))
            .col(RuleIden::Column(Column::PType))
            .if_not_exists();
        stmt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_query::SqliteQueryBuilder;

    #[test]
    fn test_generate_ddl() {
        let sqls: Vec<String> = DdlGenerator::generate("casbin_rule")
            .iter()
            .map(|stmt| stmt.build(SqliteQueryBuilder).0)
            .collect();
        assert_eq!(sqls.len(), 2);

        let create_table = &sqls[0];
        assert!(create_table.contains("CREATE TABLE IF NOT EXISTS \"casbin_rule\""));
        assert!(create_table.contains("\"id\" integer"));
        assert!(create_table.contains("AUTOINCREMENT"));
        assert!(create_table.contains("\"p_type\" varchar(100)"));
        assert!(create_table.contains("\"v5\" varchar(100)"));
        assert!(create_table.contains("DEFAULT ''"));

        assert!(sqls[1].contains("CREATE INDEX IF NOT EXISTS \"idx_casbin_rule_p_type\""));
        assert!(sqls[1].contains("ON \"casbin_rule\" (\"p_type\")"));
    }
}
