// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod call_record_store;
pub mod file_store;

pub use call_record_store::{
    CallRecordStore, InMemoryCallRecordStore, RateLimitDocument, StoreError,
};
pub use file_store::FileCallRecordStore;
