//! 정책 모델
//!
//! 인가 엔진의 메모리 정책 모델과 어댑터 사이의 경계입니다. 어댑터는 디코딩한
//! 정책 라인을 모델에 추가하고, 저장 시 섹션별 규칙을 열거합니다.
//!
//! # 섹션
//!
//! - `p`: 권한 규칙 (`p`, `p2` ...)
//! - `g`: 역할/그룹 규칙 (`g`, `g2` ...)
//!
//! 정책 타입의 첫 글자가 섹션입니다.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::line;

/// 권한 규칙 섹션
pub const POLICY_SECTION: &str = "p";

/// 역할/그룹 규칙 섹션
pub const GROUPING_SECTION: &str = "g";

/// 어댑터가 저장하는 섹션 순서
pub const SECTIONS: [&str; 2] = [POLICY_SECTION, GROUPING_SECTION];

/// 메모리 정책 모델
pub trait PolicyModel: Send + Sync {
    /// 규칙 추가
    ///
    /// 모델에 선언되지 않은 정책 타입이면 `MalformedLine`.
    fn add_rule(&mut self, sec: &str, ptype: &str, rule: Vec<String>) -> Result<()>;

    /// 섹션의 모든 규칙 (정책 타입, 필드)
    fn rules(&self, sec: &str) -> Vec<(String, Vec<String>)>;

    /// 정책 라인 텍스트 하나를 파싱해서 추가
    fn add_line(&mut self, text: &str) -> Result<()> {
        let Some(mut fields) = line::split(text)? else {
            return Ok(());
        };

        let ptype = fields.remove(0);
        let Some(sec) = section_of(&ptype) else {
            return Err(Error::malformed(text, "empty policy type"));
        };
        self.add_rule(sec, &ptype, fields)
            .map_err(|e| match e {
                Error::MalformedLine { reason, .. } => Error::malformed(text, reason),
                other => other,
            })
    }
}

/// 정책 타입의 섹션 ("g2" → "g")
pub fn section_of(ptype: &str) -> Option<&str> {
    let first = ptype.chars().next()?;
    Some(&ptype[..first.len_utf8()])
}

/// 기본 메모리 모델
///
/// 선언된 정책 타입만 받아들이고, 섹션/타입/삽입 순서대로 규칙을 보관합니다.
#[derive(Debug, Clone, Default)]
pub struct DefaultModel {
    /// sec → ptype → rules
    sections: BTreeMap<String, BTreeMap<String, Vec<Vec<String>>>>,
}

impl DefaultModel {
    /// 정책 타입이 없는 모델
    pub fn new() -> Self {
        Self::default()
    }

    /// `p`, `g` 타입이 선언된 모델
    pub fn rbac() -> Self {
        Self::with_policy_types(["p", "g"])
    }

    /// 주어진 정책 타입이 선언된 모델
    pub fn with_policy_types<'a, I>(ptypes: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut model = Self::new();
        for ptype in ptypes {
            model.declare(ptype);
        }
        model
    }

    /// 정책 타입 선언
    pub fn declare(&mut self, ptype: &str) {
        if let Some(sec) = section_of(ptype) {
            self.sections
                .entry(sec.to_string())
                .or_default()
                .entry(ptype.to_string())
                .or_default();
        }
    }

    /// 정책 타입의 규칙
    pub fn policy(&self, ptype: &str) -> &[Vec<String>] {
        section_of(ptype)
            .and_then(|sec| self.sections.get(sec))
            .and_then(|types| types.get(ptype))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// 규칙 포함 여부
    pub fn has_rule(&self, ptype: &str, rule: &[&str]) -> bool {
        self.policy(ptype).iter().any(|r| r == rule)
    }

    /// 선언은 유지하고 규칙만 비움
    pub fn clear(&mut self) {
        for types in self.sections.values_mut() {
            for rules in types.values_mut() {
                rules.clear();
            }
        }
    }

    /// 전체 규칙 수
    pub fn len(&self) -> usize {
        self.sections
            .values()
            .flat_map(|types| types.values())
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PolicyModel for DefaultModel {
    fn add_rule(&mut self, sec: &str, ptype: &str, rule: Vec<String>) -> Result<()> {
        let rules = self
            .sections
            .get_mut(sec)
            .and_then(|types| types.get_mut(ptype))
            .ok_or_else(|| Error::MalformedLine {
                line: ptype.to_string(),
                reason: format!("policy type '{}' is not declared in section '{}'", ptype, sec),
            })?;
        rules.push(rule);
        Ok(())
    }

    fn rules(&self, sec: &str) -> Vec<(String, Vec<String>)> {
        self.sections
            .get(sec)
            .into_iter()
            .flat_map(|types| types.iter())
            .flat_map(|(ptype, rules)| rules.iter().map(move |r| (ptype.clone(), r.clone())))
            .collect()
    }
}
