// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Entry Point
//!
//! Uses proptest to check invariants of the topology that must hold for
//! every sequence of accepted commands.

mod fixtures;
mod property;
