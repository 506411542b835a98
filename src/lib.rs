//! A crate for bi-kronecker functional decision diagrams (BKFDDs):
//! canonical, reduced DAGs for boolean functions where every level picks
//! one of six decomposition rules -- classical or biconditional Shannon,
//! positive Davio, negative Davio -- and the engine reorders variables and
//! re-types levels on the fly to shrink the diagram.

#![allow(clippy::many_single_char_names)]

#[macro_use] extern crate log;

/// Node IDs: complement-edge handles into the manager's arena.
pub mod nid;
pub use nid::{NID, I, O};

/// Variable IDs (stable names; levels live in the manager).
pub mod vid;
pub use vid::VID;

/// Expansion (decomposition) type codes.
pub mod expn;
pub use expn::Expn;

/// (Var, Hi, Lo) triples.
pub mod vhl;

/// Registers: arbitrarily large arrays of bits, used as input assignments.
pub mod reg;

/// Error types.
pub mod err;
pub use err::{Error, Result};

/// Computed-table cache.
pub mod memo;

/// The manager: unique table, reference counts, garbage collection.
pub mod bkf;
pub use bkf::{BkfBase, Conf, Mode, Method};

/// Recursive boolean operators (ite and the named wrappers).
pub mod apply;

/// Per-level expansion rewrites and the canonicity fixup.
pub mod expand;

/// Expansion-choice heuristics.
pub mod choose;

/// Adjacent-variable swap.
pub mod swap;

/// Dynamic variable reordering (sifting and friends).
pub mod sift;

/// Boolean-network input.
pub mod net;

/// BLIF output.
pub mod blif;
