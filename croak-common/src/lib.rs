//! Common structs and abstractions used by `croak`

// docs
#![doc(html_root_url = "https://docs.rs/croak-common/0.1.0")]
// -
// deny
#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![cfg_attr(not(test), deny(unsafe_code))]
// -
// warnings
#![cfg_attr(not(test), warn(unreachable_pub))]
// -
// features
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc as std_alloc;

/// Array
pub mod array;
pub use array::*;

/// Cursor
pub mod cursor;
pub use cursor::*;
