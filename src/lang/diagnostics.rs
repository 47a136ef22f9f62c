use std::fmt::{self, Display, Formatter};
use thiserror::Error;

/// Everything that can make a compilation unit fail.  Each error names the source line it was
/// found on, so a whole batch can be reported at once.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("duplicate definition of ‘{name}’ at line {line} (previously defined at line {previous})")]
    DuplicateDefinition {
        name: String,
        line: usize,
        previous: usize,
    },

    #[error("cannot redefine built-in word ‘{name}’ at line {line}")]
    RedefinedBuiltin { name: String, line: usize },

    #[error("unknown word ‘{name}’ at line {line}")]
    UnknownWord { name: String, line: usize },

    #[error("variable ‘{name}’ declared more than once at line {line}")]
    DuplicateVariable { name: String, line: usize },

    #[error("‘{name}’ is already defined in this scope")]
    AlreadyDefined { name: String },

    #[error("‘{name}’ imported from module ‘{module}’ at line {line} is already defined")]
    ImportConflict {
        name: String,
        module: String,
        line: usize,
    },

    #[error("module ‘{module}’ imported at line {line} was not found")]
    ModuleNotFound { module: String, line: usize },

    #[error("module ‘{module}’ imported at line {line} is already being imported")]
    CircularImport { module: String, line: usize },

    #[error("module ‘{module}’ has no word ‘{name}’ (imported at line {line})")]
    MissingImport {
        name: String,
        module: String,
        line: usize,
    },

    #[error("module ‘{module}’ imported at line {line} failed: {message}")]
    ModuleFailed {
        module: String,
        line: usize,
        message: String,
    },

    #[error("block at line {line} has no scope to compile in")]
    DetachedBlock { line: usize },
}

impl CompileError {
    /// The line the error was found on, when it has one.
    pub fn line(&self) -> Option<usize> {
        match self {
            CompileError::DuplicateDefinition { line, .. }
            | CompileError::RedefinedBuiltin { line, .. }
            | CompileError::UnknownWord { line, .. }
            | CompileError::DuplicateVariable { line, .. }
            | CompileError::ImportConflict { line, .. }
            | CompileError::ModuleNotFound { line, .. }
            | CompileError::CircularImport { line, .. }
            | CompileError::MissingImport { line, .. }
            | CompileError::ModuleFailed { line, .. }
            | CompileError::DetachedBlock { line } => Some(*line),
            CompileError::AlreadyDefined { .. } => None,
        }
    }
}

/// A unit that failed to compile, along with every error found in it.  Nothing the unit declared
/// is left behind in its scope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("compilation aborted: {} error(s)", .errors.len())]
pub struct CompileFailure {
    pub errors: Vec<CompileError>,
}

impl CompileFailure {
    pub fn new(errors: Vec<CompileError>) -> CompileFailure {
        CompileFailure { errors }
    }

    /// Every error on its own line, the way the driver prints them.
    pub fn report(&self) -> String {
        let mut report = String::new();

        for error in &self.errors {
            report.push_str(&format!("error: {}\n", error));
        }

        report.push_str(&self.to_string());
        report
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub line: Option<usize>,
    pub message: String,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self.severity {
            Severity::Warning => write!(f, "warning: {}", self.message),
            Severity::Error => write!(f, "error: {}", self.message),
        }
    }
}

/// Messages collected while compiling.  Warnings never stop a compilation, they are kept here
/// for the host to show and also passed on to the log.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Diagnostics {
        Diagnostics::default()
    }

    pub fn warn(&mut self, line: Option<usize>, message: String) {
        log::warn!("{}", message);

        self.items.push(Diagnostic {
            severity: Severity::Warning,
            line,
            message,
        });
    }

    pub fn error(&mut self, error: &CompileError) {
        log::debug!("Compile error: {}", error);

        self.items.push(Diagnostic {
            severity: Severity::Error,
            line: error.line(),
            message: error.to_string(),
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items
            .iter()
            .filter(|item| item.severity == Severity::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items
            .iter()
            .filter(|item| item.severity == Severity::Error)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Hand the collected messages to the caller, leaving the list empty.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_carry_their_lines() {
        let error = CompileError::DuplicateDefinition {
            name: "f".to_string(),
            line: 2,
            previous: 1,
        };

        assert_eq!(error.line(), Some(2));
        assert_eq!(
            error.to_string(),
            "duplicate definition of ‘f’ at line 2 (previously defined at line 1)"
        );
    }

    #[test]
    fn diagnostics_separate_warnings_from_errors() {
        let mut diagnostics = Diagnostics::new();

        diagnostics.warn(Some(3), "shadowed".to_string());
        diagnostics.error(&CompileError::UnknownWord {
            name: "x".to_string(),
            line: 4,
        });

        assert_eq!(diagnostics.warnings().count(), 1);
        assert_eq!(diagnostics.errors().count(), 1);
        assert_eq!(diagnostics.take().len(), 2);
        assert!(diagnostics.is_empty());
    }
}
