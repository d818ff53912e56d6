//! Alert-rule template fragments.
//!
//! Loads a directory tree of YAML fragments keyed by category path and parses
//! each into a [`ParsedTemplate`] that keeps profile placeholders and
//! passthrough placeholders apart.

mod error;
mod glob;
mod parse;
mod set;


pub use self::error::{Result, TemplateError};
pub use self::glob::CategoryGlob;
pub use self::parse::{ParsedTemplate, Segment, SyntaxError};
pub(crate) use self::parse::is_identifier;
pub use self::set::{RuleTemplateSet, TemplateFragment};
