// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Prompt template for stage name suggestions

pub const DEFAULT_SUGGESTION_COUNT: usize = 3;

/// Build the Korean naming prompt for `original_name` in the given `concept`
pub fn build_prompt(original_name: &str, concept: &str, count: usize) -> String {
    format!(
        r#"사용자의 영문 이름: {original_name}
아이돌 콘셉트: {concept}
---
위 정보를 바탕으로 K-POP 스타일의 세련된 한국 이름 {count}개를 추천해줘.
각 이름에 대해:
- 한글 이름
- 한자(가능하다면)
- 의미(간단하게)
- 콘셉트 설명(아이돌 캐치프레이즈처럼)
결과는 JSON 배열로 반환해줘. 예시:
[
  {{"name": "세아", "hanja": "世芽", "meaning": "세상에 움튼 새싹", "concept": "신비로운 소녀"}},
  ...
]
"#
    )
}
