// SPDX-FileCopyrightText: © 2024 The aiert authors
// SPDX-License-Identifier: Apache-2.0
#![crate_type = "lib"]

pub use clear::{clear_shim_tile, clear_tile};
pub use error::{InitError, PlatformError};
pub use interface::{AieBackend, BackendMem, BackendType, LockDesc};
pub use mem::DevBuffer;
pub use regs::CoreRegMap;
pub use session::Session;
pub use stats::compute_stats;
pub use status::{print_dma_status, print_shimdma_status, print_tile_status};

/// Aiert-if implements the whole diagnostic surface in a backend agnostic
/// way: the session lifecycle, lock and register helpers, the status
/// decoders and the clear protocol. Backends plug in through `AieBackend`.
///
pub mod clear;
pub mod error;
pub mod interface;
pub mod mem;
pub mod regs;
pub mod session;
pub mod stats;
pub mod status;
