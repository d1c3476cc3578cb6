// SPDX-FileCopyrightText: © 2024 The aiert authors
// SPDX-License-Identifier: Apache-2.0

//! A diagnostic and bring-up interface for AIE spatial accelerators.
//!
//! The interesting pieces live in the member crates; this crate stitches
//! them together into one dependency for tools and tests.

pub use aiert_core::{Generation, TileLoc};
pub use aiert_if::{
    clear_shim_tile, clear_tile, compute_stats, print_dma_status, print_shimdma_status,
    print_tile_status, AieBackend, BackendMem, BackendType, CoreRegMap, DevBuffer, InitError,
    LockDesc, PlatformError, Session,
};

pub use aiert_if as hal;
pub use aiert_sim as sim;
