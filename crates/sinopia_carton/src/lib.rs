//! Carton - The artist's toolbox for Sinopia.
//!
//! Like a carton (artist's portfolio case), this crate holds the small tools every
//! other Sinopia crate reaches for: tag tables for the web platform, string case
//! helpers, and fast content hashing.
//!
//! # Modules
//!
//! - **dom_tag_config**: HTML/SVG tag tables and platform predicates
//! - **general**: camelize / hyphenate / capitalize and JS string quoting
//! - **hash**: xxHash3 content hashing plus the slot content hash
//!
//! # Example
//!
//! ```
//! use sinopia_carton::{camelize, is_unary_tag};
//!
//! assert_eq!(camelize("foo-bar"), "fooBar");
//! assert!(is_unary_tag("br"));
//! ```

pub mod dom_tag_config;
pub mod general;
pub mod hash;

// Re-export compact_str::CompactString for convenience
pub use compact_str::format_compact;
pub use compact_str::CompactString;
pub use compact_str::CompactString as String;

// Re-export smallvec for stack-optimized collections
pub use smallvec::{smallvec, SmallVec};

// Re-export bitflags for flag types
pub use bitflags::bitflags;

// Re-export rustc-hash for fast hash maps/sets
pub use rustc_hash::{FxHashMap, FxHashSet};

// Re-export phf for compile-time perfect hash functions
pub use phf::{phf_map, phf_set, Map as PhfMap, Set as PhfSet};

// Re-export shared utilities
pub use dom_tag_config::*;
pub use general::*;
pub use hash::{content_hash, slot_hash};
