//! Parsing, validation, and rendering for banks of practice problems.
//!
//! Problem source (a TeX-like markup or Markdown) is parsed into a typed
//! tree ([`model::Node`]) whose shape is validated as it is built, then
//! rendered to HTML. The [`io`] module loads whole banks from disk and the
//! [`site`] module assembles them into a static site.

pub mod io;
pub mod markup;
pub mod model;
pub mod parsing;
pub mod render;
pub mod site;

pub use model::{IllegalChild, Node, NodeKind};
pub use parsing::{parse, parse_markdown, parse_raw, ParseError};
