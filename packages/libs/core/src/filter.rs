//! 필터 로드 조건
//!
//! 컬럼별 후보 값 목록으로 로드할 규칙의 부분집합을 지정합니다.
//!
//! # 예시
//!
//! ```json
//! { "p_type": ["p"], "v0": ["alice", "bob"] }   // p_type = 'p' AND v0 IN ('alice', 'bob')
//! {}                                            // 모든 규칙
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::rule::Column;

/// 필터 로드 조건
///
/// 빈 목록 = 조건 없음, 값 하나 = equality, 여러 값 = IN.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Filter {
    #[serde(default, rename = "p_type", alias = "ptype")]
    pub ptype: Vec<String>,
    #[serde(default)]
    pub v0: Vec<String>,
    #[serde(default)]
    pub v1: Vec<String>,
    #[serde(default)]
    pub v2: Vec<String>,
    #[serde(default)]
    pub v3: Vec<String>,
    #[serde(default)]
    pub v4: Vec<String>,
    #[serde(default)]
    pub v5: Vec<String>,
}

impl Filter {
    /// 빈 필터 (모든 규칙과 매칭)
    pub fn new() -> Self {
        Self::default()
    }

    /// JSON 값에서 파싱
    ///
    /// 객체가 아니거나 알 수 없는 컬럼, 문자열 배열이 아닌 값이 있으면
    /// `InvalidFilterType`.
    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(Error::InvalidFilterType {
                message: format!("expected an object of column lists, got {}", kind(&value)),
            });
        }
        serde_json::from_value(value).map_err(|e| Error::InvalidFilterType {
            message: e.to_string(),
        })
    }

    /// 컬럼 조건 추가 (builder)
    pub fn with<I, S>(mut self, column: Column, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.column_mut(column)
            .extend(values.into_iter().map(Into::into));
        self
    }

    /// 컬럼별 후보 값
    pub fn column(&self, column: Column) -> &[String] {
        match column {
            Column::PType => &self.ptype,
            Column::V0 => &self.v0,
            Column::V1 => &self.v1,
            Column::V2 => &self.v2,
            Column::V3 => &self.v3,
            Column::V4 => &self.v4,
            Column::V5 => &self.v5,
        }
    }

    fn column_mut(&mut self, column: Column) -> &mut Vec<String> {
        match column {
            Column::PType => &mut self.ptype,
            Column::V0 => &mut self.v0,
            Column::V1 => &mut self.v1,
            Column::V2 => &mut self.v2,
            Column::V3 => &mut self.v3,
            Column::V4 => &mut self.v4,
            Column::V5 => &mut self.v5,
        }
    }

    /// 조건이 하나도 없는지
    pub fn is_empty(&self) -> bool {
        Column::ALL.iter().all(|c| self.column(*c).is_empty())
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
