// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Candidate selection strategies
//!
//! Each strategy isolates a plausible JSON substring from free-form model
//! output. Strategies do not parse; the extractor does.

use regex::Regex;
use std::sync::OnceLock;

/// Picks a JSON candidate out of raw model text
pub trait ExtractionStrategy: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Candidate substring, or `None` if this strategy does not apply
    fn candidate<'a>(&self, raw: &'a str) -> Option<&'a str>;
}

/// Inner text of the first ```` ```json ```` fenced block
pub struct FencedJsonBlock;

impl ExtractionStrategy for FencedJsonBlock {
    fn name(&self) -> &'static str {
        "fenced_json_block"
    }

    fn candidate<'a>(&self, raw: &'a str) -> Option<&'a str> {
        static FENCE: OnceLock<Regex> = OnceLock::new();
        let fence =
            FENCE.get_or_init(|| Regex::new(r"(?s)```json\s*(.*?)```").expect("valid fence regex"));
        fence
            .captures(raw)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

/// First `[` ... `{` ... `}` ... `]` span, greedy to the last closing bracket
pub struct BracketedArray;

impl ExtractionStrategy for BracketedArray {
    fn name(&self) -> &'static str {
        "bracketed_array"
    }

    fn candidate<'a>(&self, raw: &'a str) -> Option<&'a str> {
        static ARRAY: OnceLock<Regex> = OnceLock::new();
        let array =
            ARRAY.get_or_init(|| Regex::new(r"(?s)\[\s*\{.*\}\s*\]").expect("valid array regex"));
        array.find(raw).map(|m| m.as_str())
    }
}

/// The whole text, verbatim
pub struct WholeText;

impl ExtractionStrategy for WholeText {
    fn name(&self) -> &'static str {
        "whole_text"
    }

    fn candidate<'a>(&self, raw: &'a str) -> Option<&'a str> {
        Some(raw)
    }
}

/// Strategies in the order they are tried
pub fn default_strategies() -> Vec<Box<dyn ExtractionStrategy>> {
    vec![
        Box::new(FencedJsonBlock),
        Box::new(BracketedArray),
        Box::new(WholeText),
    ]
}
