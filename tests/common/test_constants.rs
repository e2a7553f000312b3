//! Shared constants for integration tests.
//!
//! Integration tests are compiled as separate crates (one per top-level file in
//! `tests/`). Placing shared constants under `tests/common/` avoids creating an
//! additional integration test binary while still allowing reuse via:
//!
//! ```rust
//! #[path = "common/test_constants.rs"]
//! mod test_constants;
//! ```

/// Organisation used by every mocked catalog and deployment route.
pub const ORGANISATION: &str = "acme";

/// Account name accepted by the mocked login endpoint.
pub const USERNAME: &str = "alice";

/// Password accepted by the mocked login endpoint.
pub const PASSWORD: &str = "secret";

/// Bearer token issued by the mocked login endpoint.
pub const TOKEN: &str = "token-123";
