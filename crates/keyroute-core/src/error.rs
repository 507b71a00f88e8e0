use std::path::PathBuf;

use thiserror::Error;

use crate::registry::ContextId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseKeySequenceError {
    #[error("empty key chord")]
    EmptyChord,
    #[error("unknown modifier \"{0}\"")]
    UnknownModifier(String),
    #[error("unknown key \"{0}\"")]
    UnknownKey(String),
    #[error("a key sequence holds at most 4 chords, got {0}")]
    TooManyChords(usize),
}

#[derive(Debug, Error)]
pub enum InputError {
    #[error("no untracked input context named \"{0}\"")]
    UnknownContext(String),
    #[error("input context {0:?} has expired")]
    ExpiredContext(ContextId),
    #[error(transparent)]
    KeySequence(#[from] ParseKeySequenceError),
    #[error(transparent)]
    ParseConfig(#[from] ini::ParseError),
    #[error("config file {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },
    #[error("config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
