//! WHERE 조건 생성
//!
//! 정책 규칙 테이블에 대한 세 가지 조건 모드를 컬럼 조건 목록으로 변환합니다.
//!
//! - 필드 오프셋 삭제: `p_type` + 오프셋 창 안의 비어있지 않은 값
//! - 필터 로드: 컬럼별 후보 목록 (equality / IN)
//! - 정확 일치 삭제: 7개 컬럼 전체 equality
//!
//! 모든 조건은 AND로 결합됩니다.

use rk_core::{Column, Filter, PolicyRule};
use sea_query::{ConditionalStatement, Expr, SimpleExpr};

use crate::builder::RuleIden;

/// 컬럼 조건 하나
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `column = value`
    Eq { column: Column, value: String },
    /// `column IN (values...)`
    In { column: Column, values: Vec<String> },
}

impl Predicate {
    /// equality 조건
    pub fn eq(column: Column, value: impl Into<String>) -> Self {
        Predicate::Eq {
            column,
            value: value.into(),
        }
    }

    /// 대상 컬럼
    pub fn column(&self) -> Column {
        match self {
            Predicate::Eq { column, .. } | Predicate::In { column, .. } => *column,
        }
    }

    fn to_expr(&self) -> SimpleExpr {
        match self {
            Predicate::Eq { column, value } => {
                Expr::col(RuleIden::Column(*column)).eq(value.as_str())
            }
            Predicate::In { column, values } => {
                Expr::col(RuleIden::Column(*column)).is_in(values.iter().map(String::as_str))
            }
        }
    }
}

/// WHERE 조건 (AND 결합)
///
/// 비어있으면 테이블 전체와 매칭됩니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhereClause(Vec<Predicate>);

impl WhereClause {
    /// 빈 WHERE 절
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// 필드 오프셋 삭제 조건
    ///
    /// `field_values[0]`이 `v{field_index}`에 대응합니다. 빈 값과 `v5`를
    /// 넘어가는 값은 조건을 만들지 않습니다.
    pub fn for_removal<S: AsRef<str>>(ptype: &str, field_index: usize, field_values: &[S]) -> Self {
        let mut predicates = vec![Predicate::eq(Column::PType, ptype)];

        for (offset, value) in field_values.iter().enumerate() {
            let value = value.as_ref();
            if value.is_empty() {
                continue;
            }
            let Some(column) = field_index.checked_add(offset).and_then(Column::field) else {
                break;
            };
            predicates.push(Predicate::eq(column, value));
        }

        Self(predicates)
    }

    /// 필터 로드 조건
    pub fn from_filter(filter: &Filter) -> Self {
        let predicates = Column::ALL
            .iter()
            .filter_map(|column| match filter.column(*column) {
                [] => None,
                [value] => Some(Predicate::eq(*column, value.as_str())),
                values => Some(Predicate::In {
                    column: *column,
                    values: values.to_vec(),
                }),
            })
            .collect();

        Self(predicates)
    }

    /// 정확 일치 조건 (빈 필드 포함 7개 컬럼 전체)
    pub fn exact(rule: &PolicyRule) -> Self {
        let predicates = Column::ALL
            .iter()
            .map(|column| Predicate::eq(*column, rule.get(*column)))
            .collect();

        Self(predicates)
    }

    /// WHERE 조건이 비어있는지
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 조건 목록
    pub fn predicates(&self) -> &[Predicate] {
        &self.0
    }

    /// 쿼리에 AND 조건으로 추가
    pub(crate) fn apply<Q: ConditionalStatement>(&self, query: &mut Q) {
        for predicate in &self.0 {
            query.and_where(predicate.to_expr());
        }
    }
}
