//! Shared constants for end-to-end tests
//!
//! When the fixture catalog changes, update only this file.

// ============================================================================
// Test Catalog IDs
// ============================================================================

/// "Fantastic Four" #1, written by Stan Lee and pencilled by Jack Kirby
pub const FF_ISSUE_ID: i64 = 1001;

/// Another "Fantastic Four" issue with a blank summary and no credits
pub const FF_BLANK_ISSUE_ID: i64 = 1002;

/// "Journey into Mystery", also written by Stan Lee
pub const JIM_ISSUE_ID: i64 = 2001;

/// "Fantastic Four Unlimited", no credits
pub const FFU_ISSUE_ID: i64 = 3001;

/// "Amazing Spider-Man"
pub const ASM_ISSUE_ID: i64 = 4001;

/// "The Amazing Spiderman"
pub const TASM_ISSUE_ID: i64 = 4101;

/// Variant cover of [`FF_ISSUE_ID`], only present in the variant dataset
pub const FF_VARIANT_ISSUE_ID: i64 = 5001;

/// "Silver Surfer", whose summary has no stored vector
pub const SURFER_ISSUE_ID: i64 = 6001;

/// An issue ID present in neither dataset
pub const MISSING_ISSUE_ID: i64 = 999_999;

pub const FF_SERIES_ID: i64 = 5;
pub const JIM_SERIES_ID: i64 = 9;
pub const FFU_SERIES_ID: i64 = 12;
pub const ASM_SERIES_ID: i64 = 20;
pub const TASM_SERIES_ID: i64 = 21;
pub const SURFER_SERIES_ID: i64 = 30;

/// Model name recorded in the fixture embedding artifact
pub const EMBEDDING_MODEL: &str = "test-model";

/// Vector the mock embedding service returns for every input
pub const LIVE_EMBEDDING: [f32; 2] = [0.6, 0.8];

// ============================================================================
// Timeouts
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// HTTP request timeout for test client (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Interval between server readiness checks (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;
