//! IDE features — high-level entry points for the LSP handlers.
//!
//! Pure data in, pure data out: no LSP types here; the server converts at
//! its boundary.

mod goto;
mod symbols;

pub use goto::{find_declaration, DeclarationLocation};
pub use symbols::{declarations_for_path, ClassKind, DeclaredSymbol};
