// SPDX-License-Identifier: Apache-2.0

pub const MAX_SCORE: u8 = 100;
pub const MAX_PERCENT: u8 = 100;

pub const MIN_WORKERS: u32 = 1;
pub const MAX_WORKERS: u32 = 64;

pub const DEFAULT_WORKERS: u32 = 4;
pub const DEFAULT_PAGE_WAIT_MS: u64 = 15_000;
pub const DEFAULT_BUTTON_WAIT_MS: u64 = 5_000;
pub const DEFAULT_WORKFLOW_BUDGET_SECS: u64 = 120;

pub const DEFAULT_REDACTION_MARKER: &str = "[REDACTED]";
