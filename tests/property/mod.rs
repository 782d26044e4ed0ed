// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! - `cut_partition`: segments keep partitioning the node-of-interest range
//! - `connect_disconnect`: disconnecting restores the connectivity graph
//! - `trace_symmetry`: a trace finds the same chain from any of its elements
//! - `walks`: sub-walk, reversal and concatenation laws

mod connect_disconnect;
mod cut_partition;
mod trace_symmetry;
mod walks;
