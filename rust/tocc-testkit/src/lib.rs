//! Test utilities for the T-occurrence search crates.
//!
//! - Postings image construction from sorted lists
//! - Ready-made index fixtures over in-memory or temporary-file backing
//! - Seeded random corpora and queries
//! - A brute-force reference evaluator to compare search results against

pub mod corpus;
pub mod fixture;
pub mod postings;
pub mod reference;

pub use fixture::{IndexFixture, U32Index, decode_results};
pub use postings::PostingsBuilder;
