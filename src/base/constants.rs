//! Project-wide constants.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// File extension of Modelica source files (without the dot).
pub const MODELICA_EXT: &str = "mo";

/// File name of a directory-style package file.
pub const PACKAGE_FILE: &str = "package.mo";

/// Builtin scalar types. These are never declared in any library, so the
/// resolver treats them as opaque terminal types: a lookup that reaches one
/// of them stops without producing a class.
pub static BUILTIN_TYPES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["Real", "Integer", "Boolean", "String", "StateSelect", "AssertionLevel"]
        .into_iter()
        .collect()
});

/// Check whether a type name is one of the builtin scalar types.
pub fn is_builtin_type(name: &str) -> bool {
    BUILTIN_TYPES.contains(name)
}
