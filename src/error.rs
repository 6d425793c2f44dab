//! Configuration errors reported by the coordinator.
//!
//! Every error here is returned synchronously from the offending call.
//! Nothing is deferred into a scheduled update.

use thiserror::Error;

/// Configuration errors reported at the offending call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ViewUpdateError {
    /// The delegate view exposes no observable property at this key path.
    #[error("unknown key path `{key_path}` on delegate view")]
    UnknownKeyPath { key_path: String },

    /// A boxed dirty value is numeric but not a valid 32-bit dirty mask.
    #[error("invalid dirty value {value}: expected an unsigned 32-bit mask")]
    InvalidDirtyValue { value: String },

    /// A boxed dirty value is neither a `DirtyType` nor an integer.
    #[error("unsupported dirty object of type {type_name}")]
    UnsupportedDirtyObject { type_name: String },

    /// The coordinator has no live delegate view to observe.
    #[error("delegate view has been released or was never set")]
    DelegateReleased,
}

pub type Result<T> = std::result::Result<T, ViewUpdateError>;
