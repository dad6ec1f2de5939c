//! SQL generation: dialects, literal rendering and the statement compiler.

mod compiler;
mod dialect;
pub mod literal;

pub use compiler::SqlCompiler;
pub use dialect::{Dialect, SqlType, SqliteDialect};
