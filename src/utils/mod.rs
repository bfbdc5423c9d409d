// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cigraph contributors

//! Utility modules
//!
//! Common utilities for the cigraph CLI.

pub mod colors;

pub use colors::*;
