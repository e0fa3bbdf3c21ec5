//! Property-based tests for exact arithmetic and row reduction.
