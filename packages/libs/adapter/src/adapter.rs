//! 정책 저장소 어댑터 계약
//!
//! 인가 엔진이 사용하는 인터페이스입니다. `sec`은 섹션("p"/"g"),
//! `ptype`은 정책 타입("p", "g2" ...)입니다.

use async_trait::async_trait;
use rk_core::{Filter, PolicyModel};

use crate::error::Result;

/// 기본 어댑터
#[async_trait]
pub trait Adapter: Send + Sync {
    /// 저장된 모든 규칙을 모델에 로드
    async fn load_policy(&self, model: &mut dyn PolicyModel) -> Result<()>;

    /// 모델의 모든 규칙으로 저장소를 교체
    async fn save_policy(&self, model: &dyn PolicyModel) -> Result<()>;

    /// 규칙 하나 추가 (중복 검사 없음)
    async fn add_policy(&self, sec: &str, ptype: &str, rule: &[String]) -> Result<()>;

    /// 정확히 일치하는 규칙 삭제, 삭제된 행이 있으면 true
    async fn remove_policy(&self, sec: &str, ptype: &str, rule: &[String]) -> Result<bool>;

    /// `v{field_index}`부터 `field_values`와 일치하는 규칙 삭제
    ///
    /// 빈 값은 해당 컬럼을 제약하지 않습니다.
    async fn remove_filtered_policy(
        &self,
        sec: &str,
        ptype: &str,
        field_index: usize,
        field_values: &[String],
    ) -> Result<bool>;
}

/// 필터 로드를 지원하는 어댑터
#[async_trait]
pub trait FilteredAdapter: Adapter {
    /// 필터와 일치하는 규칙만 로드
    async fn load_filtered_policy(&self, model: &mut dyn PolicyModel, filter: &Filter)
        -> Result<()>;

    /// 필터 로드가 한 번이라도 성공했는지
    fn is_filtered(&self) -> bool;
}

/// 일괄 추가/삭제를 지원하는 어댑터
#[async_trait]
pub trait BatchAdapter: Adapter {
    /// 규칙 여러 개 추가 (하나의 INSERT)
    async fn add_policies(&self, sec: &str, ptype: &str, rules: &[Vec<String>]) -> Result<()>;

    /// 규칙 여러 개 삭제 (하나의 트랜잭션, 전부 아니면 전무)
    async fn remove_policies(&self, sec: &str, ptype: &str, rules: &[Vec<String>])
        -> Result<bool>;
}
