// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Extraction over the kinds of replies the model actually produces

use idol_name_proxy::extraction::{
    BracketedArray, ExtractionStrategy, NameSuggestion, ResponseExtractor, WholeText,
};

/// Takes everything after a `RESULT:` marker
struct AfterMarker;

impl ExtractionStrategy for AfterMarker {
    fn name(&self) -> &'static str {
        "after_marker"
    }

    fn candidate<'a>(&self, raw: &'a str) -> Option<&'a str> {
        raw.split_once("RESULT:").map(|(_, rest)| rest.trim())
    }
}

#[cfg(test)]
mod model_reply_tests {
    use super::*;

    #[test]
    fn test_fenced_reply_with_surrounding_prose() {
        let raw = "다음은 추천 이름입니다!\n\n```json\n[\n  {\"name\": \"세아\", \"hanja\": \"世芽\", \"meaning\": \"세상에 돋아나는 새싹\", \"concept\": \"청량\"}\n]\n```\n\n마음에 드셨으면 좋겠어요.";
        let suggestions = ResponseExtractor::new().extract_suggestions(raw).unwrap();

        assert_eq!(
            suggestions,
            vec![NameSuggestion {
                name: "세아".to_string(),
                hanja: "世芽".to_string(),
                meaning: "세상에 돋아나는 새싹".to_string(),
                concept: "청량".to_string(),
            }]
        );
    }

    #[test]
    fn test_unfenced_array_inside_prose() {
        let raw = "Sure! [{\"name\": \"하린\", \"hanja\": \"夏潾\"}, {\"name\": \"다온\", \"hanja\": null}] Hope this helps.";
        let suggestions = ResponseExtractor::new().extract_suggestions(raw).unwrap();

        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].name, "하린");
        assert_eq!(suggestions[1].hanja, "");
        assert_eq!(suggestions[1].meaning, "");
    }

    #[test]
    fn test_bare_json_reply() {
        let raw = "  [{\"name\": \"예린\", \"concept\": \"청순\"}]\n";
        let suggestions = ResponseExtractor::new().extract_suggestions(raw).unwrap();
        assert_eq!(suggestions[0].concept, "청순");
    }

    #[test]
    fn test_refusal_keeps_raw_text() {
        let raw = "죄송하지만 요청을 처리할 수 없습니다.";
        let err = ResponseExtractor::new().extract_suggestions(raw).unwrap_err();
        assert_eq!(err.raw(), raw);
    }

    #[test]
    fn test_broken_fenced_json_does_not_fall_through() {
        // The bracketed array after the fence is never consulted
        let raw = "```json\n[{\"name\": \"세아\",]\n```\n[{\"name\": \"하린\"}]";
        let err = ResponseExtractor::new().extract_suggestions(raw).unwrap_err();
        assert_eq!(err.raw(), raw);
    }

    #[test]
    fn test_custom_strategy_order() {
        let extractor = ResponseExtractor::with_strategies(vec![
            Box::new(AfterMarker),
            Box::new(BracketedArray),
            Box::new(WholeText),
        ]);
        let raw = "[{\"name\": \"무시\"}]\nRESULT: [{\"name\": \"채원\"}]";

        let suggestions = extractor.extract_suggestions(raw).unwrap();
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].name, "채원");
    }
}
