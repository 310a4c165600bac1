// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tolerant recovery of structured suggestions from free-form model output

pub mod extractor;
pub mod strategy;
pub mod types;

pub use extractor::ResponseExtractor;
pub use strategy::{
    default_strategies, BracketedArray, ExtractionStrategy, FencedJsonBlock, WholeText,
};
pub use types::{ExtractionError, NameSuggestion};
