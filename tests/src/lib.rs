//! # Event Variables Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Bus wiring, test state machines, wait helpers
//! └── integration/      # End-to-end flows over the in-memory bus
//!     ├── push_lifecycle.rs
//!     ├── poll_lifecycle.rs
//!     └── param_flow.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p event-vars-tests
//! cargo test -p event-vars-tests integration::param_flow
//! ```

pub mod fixtures;
pub mod integration;
