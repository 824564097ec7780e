//! Translation modes
//!
//! The translator supports a small closed set of register-mapping strategies.
//! A [`ModeSet`] fixes which of them a run uses and in which order they are
//! emitted; the order only matters for reproducible output.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Register-mapping strategy applied when translating a foreign binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationMode {
    /// Guest registers live in global variables
    Globals,
    /// Guest registers are cached in function locals
    Locals,
    /// Whole-program register allocation
    Whole,
    /// Registers are passed through the host ABI
    Abi,
}

impl TranslationMode {
    /// Every mode the translator knows about, in canonical order.
    pub const ALL: [TranslationMode; 4] = [
        TranslationMode::Globals,
        TranslationMode::Locals,
        TranslationMode::Whole,
        TranslationMode::Abi,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TranslationMode::Globals => "globals",
            TranslationMode::Locals => "locals",
            TranslationMode::Whole => "whole",
            TranslationMode::Abi => "abi",
        }
    }
}

impl fmt::Display for TranslationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TranslationMode {
    type Err = ModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TranslationMode::ALL
            .into_iter()
            .find(|m| m.as_str() == s.trim())
            .ok_or_else(|| ModeError::Unknown(s.to_string()))
    }
}

/// Errors building a mode set
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModeError {
    #[error("unknown translation mode `{0}` (expected one of globals, locals, whole, abi)")]
    Unknown(String),

    #[error("translation mode set is empty")]
    Empty,

    #[error("translation mode `{0}` listed more than once")]
    Duplicate(TranslationMode),
}

/// Ordered, non-empty, duplicate-free list of translation modes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TranslationMode>", into = "Vec<TranslationMode>")]
pub struct ModeSet(Vec<TranslationMode>);

impl ModeSet {
    pub fn new(modes: Vec<TranslationMode>) -> Result<Self, ModeError> {
        if modes.is_empty() {
            return Err(ModeError::Empty);
        }
        for (i, mode) in modes.iter().enumerate() {
            if modes[..i].contains(mode) {
                return Err(ModeError::Duplicate(*mode));
            }
        }
        Ok(Self(modes))
    }

    /// Parse a comma separated list such as `globals,locals`.
    pub fn parse_list(list: &str) -> Result<Self, ModeError> {
        let modes = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(TranslationMode::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(modes)
    }

    pub fn iter(&self) -> impl Iterator<Item = TranslationMode> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[TranslationMode] {
        &self.0
    }

    /// Comma separated form accepted by [`ModeSet::parse_list`].
    pub fn to_list(&self) -> String {
        self.0
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Default for ModeSet {
    fn default() -> Self {
        Self(vec![TranslationMode::Globals, TranslationMode::Locals])
    }
}

impl TryFrom<Vec<TranslationMode>> for ModeSet {
    type Error = ModeError;

    fn try_from(modes: Vec<TranslationMode>) -> Result<Self, Self::Error> {
        Self::new(modes)
    }
}

impl From<ModeSet> for Vec<TranslationMode> {
    fn from(set: ModeSet) -> Self {
        set.0
    }
}
