//! Error types for the manager.
//!
//! Every fallible operation returns a result; there is no unwinding-based
//! recovery because a failure in the middle of a level rewrite leaves the
//! manager's invariants broken (see [crate::expand]).
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
  /// An allocation limit was reached (arena cap, cache cap). A failure
  /// raised mid-rewrite leaves the manager inconsistent and must be
  /// treated as fatal for the affected functions.
  MemoryOut,
  /// A structural invariant was found broken by a debug check. This
  /// indicates a bug in the library itself and is not recoverable.
  Internal }

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Error::MemoryOut => write!(f, "out of memory (node or cache limit reached)"),
      Error::Internal => write!(f, "internal invariant violation") }}}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
