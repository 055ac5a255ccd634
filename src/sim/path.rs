//! Outcome paths
//!
//! An outcome path is the externally decided sequence of left/right biases,
//! one per row. It is stored as a bit set sized to the board's row count and
//! validated once, when it is built.

use serde::{Deserialize, Serialize};

use crate::consts::MAX_ROWS;
use crate::error::EngineError;

/// Fixed-length left/right sequence; bit `i` set means "bias right at row i"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPath")]
pub struct OutcomePath {
    bits: u64,
    len: u32,
}

/// Unchecked wire form, validated before it becomes an `OutcomePath`
#[derive(Deserialize)]
struct RawPath {
    bits: u64,
    len: u32,
}

impl TryFrom<RawPath> for OutcomePath {
    type Error = EngineError;

    fn try_from(raw: RawPath) -> Result<Self, Self::Error> {
        if raw.len == 0 || raw.len > MAX_ROWS {
            return Err(EngineError::InvalidRows { rows: raw.len });
        }
        if raw.len < u64::BITS && raw.bits >> raw.len != 0 {
            return Err(EngineError::PathBits { len: raw.len });
        }
        Ok(Self {
            bits: raw.bits,
            len: raw.len,
        })
    }
}

impl OutcomePath {
    /// Build a path for a board with `rows` rows. Rejects any length mismatch.
    pub fn new(choices: &[bool], rows: u32) -> Result<Self, EngineError> {
        if rows == 0 || rows > MAX_ROWS {
            return Err(EngineError::InvalidRows { rows });
        }
        if choices.len() != rows as usize {
            return Err(EngineError::PathLength {
                expected: rows,
                actual: choices.len(),
            });
        }
        let bits = choices
            .iter()
            .enumerate()
            .filter(|(_, right)| **right)
            .fold(0u64, |acc, (i, _)| acc | (1 << i));
        Ok(Self { bits, len: rows })
    }

    /// Parse an `L`/`R` string (case-insensitive, whitespace ignored)
    pub fn parse(text: &str, rows: u32) -> Result<Self, EngineError> {
        let choices = text
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| match c.to_ascii_uppercase() {
                'R' => Ok(true),
                'L' => Ok(false),
                _ => Err(EngineError::InvalidPathSymbol { symbol: c }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(&choices, rows)
    }

    /// Number of rows this path covers
    #[inline]
    pub fn len(&self) -> u32 {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bias at `row`; `None` past the end
    #[inline]
    pub fn goes_right(&self, row: u32) -> Option<bool> {
        (row < self.len).then(|| (self.bits & (1 << row)) != 0)
    }

    /// Canonical slot: the number of right choices, in `0..=len`
    #[inline]
    pub fn slot(&self) -> u32 {
        self.bits.count_ones()
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(move |row| (self.bits & (1 << row)) != 0)
    }
}

impl std::fmt::Display for OutcomePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for right in self.iter() {
            f.write_str(if right { "R" } else { "L" })?;
        }
        Ok(())
    }
}
