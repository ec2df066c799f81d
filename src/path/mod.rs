//! Structural node addresses
//!
//! A node is addressed by the steps leading from `body` down to it. Element
//! steps count only element siblings, text steps only text siblings, so
//! inserting a text node never shifts an element index and vice versa.
//! Highlight marks are invisible to addresses: a text step names a run of
//! adjacent text nodes, and point offsets count from the start of the run.
//!
//! # Example
//!
//! ```text
//! div[1]/p[0]/text[2]
//!  │      │    └── third text node child of that <p>
//!  │      └─────── first element child of the <div>, a <p>
//!  └────────────── second element child of <body>, a <div>
//! ```
//!
//! The empty string addresses `body` itself.
//!
//! # Usage
//!
//! ```ignore
//! use page_anchor::path::{encode_path, parse, resolve_path};
//!
//! let path = encode_path(&doc, node).unwrap();
//! let parsed = parse(&path.to_string()).unwrap();
//! assert_eq!(resolve_path(&doc, &parsed), Some(node));
//! ```

mod codec;
mod parser;
mod types;

pub use codec::{encode_path, encode_point, resolve_path, resolve_point};
pub use parser::{parse, try_parse, PathParseError};
pub use types::{NodePath, PathStep};
