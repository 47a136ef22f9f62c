/// Module for managing the original source code.
pub mod source_buffer;

/// Module for turning the source code into a list of tokens for further processing.
pub mod tokenizing;

/// The program tree: word sequences, blocks and declarations.
pub mod ast;

/// Module for reading a list of tokens into declarations and word sequences.
pub mod parser;

/// Warnings and compile errors, with the lines they refer to.
pub mod diagnostics;

/// Module for compiling declarations into functions.  Compilation is done in two passes, first
/// every word declared in a unit is given a placeholder so that declarations can refer to each
/// other in any order.  The second pass resolves every word and fills the placeholders in.
///
/// Blocks are left unresolved until they're first run.
pub mod compilation;

/// Finding, loading and caching the modules named by import declarations.
pub mod import;
