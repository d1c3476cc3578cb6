// SPDX-FileCopyrightText: © 2024 The aiert authors
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("unaligned 32-bit access at {0:#x}")]
    UnalignedAccess(u64),

    #[error("data memory access at {addr:#x} is outside the 32 KiB tile memory")]
    DataMemOutOfRange { addr: u64 },

    #[error("lock {id} {op} with value {value} timed out")]
    LockTimeout {
        op: &'static str,
        id: u8,
        value: u8,
    },

    #[error("lock id {0} is out of range")]
    InvalidLock(u8),

    #[error("no allocation at physical address {paddr:#x}")]
    UnknownAllocation { paddr: u64 },
}
