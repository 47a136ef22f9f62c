/// Interned names.  Two symbols are the same symbol only if they were interned from the same
/// table.
pub mod symbol;

/// Module contains the Value enumeration and it's implementation.  The value is one of the core
/// data structures of the interpreter.  It is used to represent all data types that cairn code can
/// push, bind and pass around.
pub mod value;

/// The frames of captured variables that closures hold on to.
pub mod var_buffer;

/// Functions and the registry that owns them.
pub mod function;

/// The chain of name tables words are resolved against.
pub mod scope;
