//! Tests for the agreement metrics engine

pub mod scores;
