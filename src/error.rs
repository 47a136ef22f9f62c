use crate::{
    lang::{diagnostics::CompileFailure, parser::ParseError},
    runtime::error::ScriptError,
};
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while loading and running a program.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("{}", .0.report())]
    Compile(#[from] CompileFailure),

    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("no ‘main’ word is defined")]
    MissingMain,
}

pub type Result<T> = std::result::Result<T, Error>;
