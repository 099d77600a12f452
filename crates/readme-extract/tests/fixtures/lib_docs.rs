//! **Pixel buffers as a 3D array.**
//!
//! ## Usage
//!   Indented continuation.  
//! ```rust
//!let x = 1;
//! ```
use std::fmt; //! not a doc line

/// Outer docs are not extracted.
pub struct Buffer;
   //! indented marker is not at line start
//!trailing
