//! Reqgraph TOON Codec
//!
//! A compact tabular text format for exchanging structured data with a
//! language model. A table is a header line declaring the schema name, row
//! count, and ordered field list, followed by one line per row:
//!
//! ```text
//! requirements[2]{id,name,priority}:
//!   r1,User Login,high
//!   r2,"Audit, immutable",critical
//! ```
//!
//! For the same data this is strictly smaller than a nested-object
//! serialization because field names are not repeated per row - fewer tokens
//! in the round trip to the model.
//!
//! Decoding tolerates formatting drift: prose or code fences around the
//! block, several tables in one body, and rows with the wrong field count
//! (aligned by position, padded or truncated, with a per-row warning). When
//! no table header is found at all, a generic JSON key-value fallback is
//! attempted before the decode is declared failed.
//!
//! # Examples
//!
//! ```
//! use reqgraph_toon::{decode, encode};
//!
//! let text = encode(
//!     "roles",
//!     &["id", "name"],
//!     &[vec!["role-x".to_string(), "Admin".to_string()]],
//! );
//! let decoded = decode(&text).unwrap();
//! let table = decoded.table("roles").unwrap();
//! assert_eq!(table.rows[0], vec!["role-x", "Admin"]);
//! ```

#![warn(missing_docs)]

mod decode;
mod encode;

pub use decode::{decode, Decoded, Table};
pub use encode::encode;

use thiserror::Error;

/// Errors that can occur while decoding
#[derive(Error, Debug)]
pub enum CodecError {
    /// Neither a TOON table nor a JSON object could be parsed from the body
    #[error("No structured block found: {0}")]
    NoStructuredBlock(String),
}
