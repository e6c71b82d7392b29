//! Prelude for convenient imports.
//!
//! ```
//! use roost_core::prelude::*;
//! ```

pub use crate::error::{Result, RoostError};
pub use crate::region::{Region, DEFAULT_BLOCK_SIZE, MAX_SMALL_ALLOC};
