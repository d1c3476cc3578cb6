// SPDX-FileCopyrightText: © 2024 The aiert authors
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

/// Failures during session bring-up, named after the driver step that
/// reported them.
#[derive(Error, Debug)]
pub enum InitError {
    #[error("driver initialization failed: {0}")]
    CfgInitialize(Box<dyn std::error::Error>),

    #[error("failed to request tiles: {0}")]
    PmRequestTiles(Box<dyn std::error::Error>),

    #[error("failed to finish tiles: {0}")]
    Finish(Box<dyn std::error::Error>),
}

/// Buffer registry misuse and allocation/synchronization failures.
#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("buffer index {index} is out of range for a registry of {capacity} slots")]
    BufferIndexOutOfRange { index: usize, capacity: usize },

    #[error("buffer slot {0} has not been allocated")]
    UnallocatedBuffer(usize),

    #[error("refusing to allocate a zero-length buffer for slot {0}")]
    ZeroLengthAllocation(usize),

    #[error("allocation of {size} bytes for slot {index} failed: {err}")]
    AllocationFailed {
        index: usize,
        size: usize,
        err: Box<dyn std::error::Error>,
    },

    #[error("cache sync for buffer {index} failed: {err}")]
    SyncFailed {
        index: usize,
        err: Box<dyn std::error::Error>,
    },
}
