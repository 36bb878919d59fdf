//! Benign database errors.
//!
//! Some fix failures mean the desired end state was already reached, often
//! by another actor: the index is already there, the column is already gone,
//! or a concurrent DDL held the table lock. Those are tolerated; everything
//! else stops the pass. The policy is this one table.

/// Outcome of classifying a database error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tolerance {
    /// Safe to ignore; carries the reason.
    Benign(&'static str),
    /// Stops the remaining fixes for the table.
    Fatal,
}

/// A message fragment and why it is benign.
#[derive(Debug, Clone, Copy)]
pub struct BenignPattern {
    /// Lower-case fragment matched against the message.
    pub needle: &'static str,
    /// Why the error can be ignored.
    pub reason: &'static str,
}

/// Every tolerated error message fragment.
pub const BENIGN_PATTERNS: &[BenignPattern] = &[
    BenignPattern {
        needle: "duplicate key name",
        reason: "index already exists",
    },
    BenignPattern {
        needle: "already exists",
        reason: "object already exists",
    },
    BenignPattern {
        needle: "doesn't exist",
        reason: "object already dropped",
    },
    BenignPattern {
        needle: "does not exist",
        reason: "object already dropped",
    },
    // MySQL error 1091 names no "doesn't exist" of its own.
    BenignPattern {
        needle: "check that column/key exists",
        reason: "object already dropped",
    },
    BenignPattern {
        needle: "not found",
        reason: "object already dropped",
    },
    BenignPattern {
        needle: "timeout trying to lock table",
        reason: "table locked by a concurrent change",
    },
    BenignPattern {
        needle: "cannot drop last column",
        reason: "last column kept",
    },
];

/// Classifies a database error message.
#[must_use]
pub fn classify(message: &str) -> Tolerance {
    let message = message.to_lowercase();
    BENIGN_PATTERNS
        .iter()
        .find(|p| message.contains(p.needle))
        .map_or(Tolerance::Fatal, |p| Tolerance::Benign(p.reason))
}

/// Returns whether a database error message is benign.
#[must_use]
pub fn is_benign(message: &str) -> bool {
    matches!(classify(message), Tolerance::Benign(_))
}
