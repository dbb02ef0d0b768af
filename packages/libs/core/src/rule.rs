//! 정책 규칙 행(row) 코덱
//!
//! 임의 길이(0~6)의 정책 튜플을 고정 폭 테이블 행(`p_type`, `v0`..`v5`)으로
//! 변환하고, 저장된 행을 다시 정책 라인 텍스트로 복원합니다.
//!
//! # 필드 규칙
//!
//! - 인코딩: `rule[i]` → `v{i}`, 나머지 필드는 빈 문자열
//! - 디코딩: 앞에서부터 연속으로 비어있지 않은 필드만 유효 (left-packed prefix)
//! - 유효 필드가 없는 행은 정책 라인을 만들지 않음

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::line;

/// 행 하나에 저장 가능한 최대 필드 수
pub const MAX_FIELDS: usize = 6;

/// 규칙 테이블 컬럼
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    PType,
    V0,
    V1,
    V2,
    V3,
    V4,
    V5,
}

impl Column {
    /// `p_type`부터 `v5`까지 테이블 순서
    pub const ALL: [Column; 7] = [
        Column::PType,
        Column::V0,
        Column::V1,
        Column::V2,
        Column::V3,
        Column::V4,
        Column::V5,
    ];

    /// 값 필드 (`v0`..`v5`)
    pub const FIELDS: [Column; MAX_FIELDS] = [
        Column::V0,
        Column::V1,
        Column::V2,
        Column::V3,
        Column::V4,
        Column::V5,
    ];

    /// 필드 인덱스로 조회 (0 → `v0`)
    pub fn field(index: usize) -> Option<Self> {
        Self::FIELDS.get(index).copied()
    }

    /// 컬럼 이름
    pub fn name(&self) -> &'static str {
        match self {
            Column::PType => "p_type",
            Column::V0 => "v0",
            Column::V1 => "v1",
            Column::V2 => "v2",
            Column::V3 => "v3",
            Column::V4 => "v4",
            Column::V5 => "v5",
        }
    }
}

/// 저장된 정책 규칙 (테이블 행)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRule {
    /// 대리 키 (저장 전에는 None)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// 정책 타입 ("p", "g", "g2" ...)
    pub ptype: String,

    /// `v0`..`v5`
    #[serde(default)]
    pub values: [String; MAX_FIELDS],
}

impl PolicyRule {
    /// 정책 튜플을 행으로 인코딩
    ///
    /// 필드가 6개를 넘으면 `UnsupportedArity`를 반환합니다.
    pub fn encode<S: AsRef<str>>(ptype: &str, rule: &[S]) -> Result<Self> {
        if rule.len() > MAX_FIELDS {
            return Err(Error::UnsupportedArity {
                ptype: ptype.to_string(),
                arity: rule.len(),
                max: MAX_FIELDS,
            });
        }

        let mut values: [String; MAX_FIELDS] = Default::default();
        for (slot, value) in values.iter_mut().zip(rule) {
            *slot = value.as_ref().to_string();
        }

        Ok(Self {
            id: None,
            ptype: ptype.to_string(),
            values,
        })
    }

    /// 행에서 직접 생성 (DB 조회 결과)
    pub fn from_row(id: i64, ptype: String, values: [String; MAX_FIELDS]) -> Self {
        Self {
            id: Some(id),
            ptype,
            values,
        }
    }

    /// 컬럼 값
    pub fn get(&self, column: Column) -> &str {
        match column {
            Column::PType => &self.ptype,
            Column::V0 => &self.values[0],
            Column::V1 => &self.values[1],
            Column::V2 => &self.values[2],
            Column::V3 => &self.values[3],
            Column::V4 => &self.values[4],
            Column::V5 => &self.values[5],
        }
    }

    /// 선언된 arity
    ///
    /// 앞에서부터 연속으로 비어있지 않은 필드 수입니다. `v0`, `v2`만 채워진
    /// 행은 arity 1이 되고 `v2`는 버려집니다.
    pub fn arity(&self) -> usize {
        self.values.iter().take_while(|v| !v.is_empty()).count()
    }

    /// 유효 필드 목록
    pub fn args(&self) -> &[String] {
        &self.values[..self.arity()]
    }

    /// 정책 라인 텍스트로 디코딩 (`p, alice, data1, read`)
    ///
    /// 유효 필드가 없으면 None.
    pub fn to_line(&self) -> Option<String> {
        let args = self.args();
        if args.is_empty() {
            return None;
        }

        let fields = std::iter::once(self.ptype.as_str()).chain(args.iter().map(String::as_str));
        Some(line::join(fields))
    }
}
