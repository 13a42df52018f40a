//! Identifier similarity and assignment.
//!
//! These are the fallback tools for categories that carry no reliable
//! geometric or topological signal: a [`Scorer`] rates how likely two
//! identifiers name the same object, and [`solve`] turns the pairwise scores
//! into a bijection or rejects the category outright.

mod assignment;
pub use assignment::solve;

mod similarity;
pub use similarity::{Levenshtein, Scorer};
