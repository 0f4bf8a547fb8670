//! Backend target selection.
//!
//! # Data Flow
//! ```text
//! explicit override (CLI flag, control header)
//!     → resolver.rs (trim, fall back)
//!     → store.rs (persisted value, swallowed failures)
//!     → DEFAULT_TARGET
//! ```

pub mod resolver;
pub mod store;

pub use resolver::{is_local, normalize_target, select_target, TargetResolver, DEFAULT_TARGET};
pub use store::{FileTargetStore, MemoryTargetStore, StoreError, TargetStore, TARGET_STORAGE_KEY};
