// SPDX-FileCopyrightText: © 2024 The aiert authors
// SPDX-License-Identifier: Apache-2.0

//! Host-visible buffers in device-reachable memory.
//!
//! On hardware the driver hands out cacheable allocations and performs the
//! cache maintenance; on the simulator the host heap stands in for the
//! buffer and the simulated physical address comes from a monotone cursor
//! owned by the session, so concurrent sessions stay independent. Sync
//! against the simulator is a bulk copy from/to its global-memory model.

use crate::error::PlatformError;
use crate::interface::{BackendMem, BackendType};
use crate::session::Session;

enum Backing {
    Host(Box<[u32]>),
    Driver(BackendMem),
}

/// One allocated buffer: a host view plus the device-visible physical
/// address. Owned by the registry slot it occupies; the host view stays
/// valid for the life of the session.
pub struct DevBuffer {
    paddr: u64,
    size_bytes: usize,
    backing: Backing,
}

impl DevBuffer {
    pub fn paddr(&self) -> u64 {
        self.paddr
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    pub fn words(&self) -> &[u32] {
        match &self.backing {
            Backing::Host(words) => words,
            // The driver mapping stays alive until the backend is dropped,
            // which happens after the registry.
            Backing::Driver(mem) => unsafe {
                std::slice::from_raw_parts(mem.vaddr as *const u32, self.size_bytes / 4)
            },
        }
    }

    pub fn words_mut(&mut self) -> &mut [u32] {
        match &mut self.backing {
            Backing::Host(words) => words,
            Backing::Driver(mem) => unsafe {
                std::slice::from_raw_parts_mut(mem.vaddr as *mut u32, self.size_bytes / 4)
            },
        }
    }
}

#[derive(Default)]
pub(crate) struct BufferRegistry {
    slots: Vec<Option<DevBuffer>>,
    next_aligned_addr: u64,
}

impl BufferRegistry {
    pub(crate) fn reset(&mut self, capacity: usize) {
        self.slots.clear();
        self.slots.resize_with(capacity, || None);
        self.next_aligned_addr = 0;
    }

    fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Hand out the next simulated physical address and advance the cursor
    /// to the following 128-bit boundary.
    fn assign_paddr(&mut self, size_bytes: usize) -> u64 {
        let paddr = self.next_aligned_addr;
        self.next_aligned_addr = (paddr + size_bytes as u64 + 15) & !15;
        paddr
    }

    fn slot(&self, index: usize) -> Result<&DevBuffer, PlatformError> {
        match self.slots.get(index) {
            None => Err(PlatformError::BufferIndexOutOfRange {
                index,
                capacity: self.slots.len(),
            }),
            Some(None) => Err(PlatformError::UnallocatedBuffer(index)),
            Some(Some(buffer)) => Ok(buffer),
        }
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut DevBuffer, PlatformError> {
        let capacity = self.slots.len();
        match self.slots.get_mut(index) {
            None => Err(PlatformError::BufferIndexOutOfRange { index, capacity }),
            Some(None) => Err(PlatformError::UnallocatedBuffer(index)),
            Some(Some(buffer)) => Ok(buffer),
        }
    }
}

impl Session {
    /// Reserve a buffer table with `num_bufs` slots. Any previously held
    /// buffers are dropped.
    pub fn init_mems(&mut self, num_bufs: usize) {
        self.mems.reset(num_bufs);
    }

    /// Allocate a buffer of `size_words` 32-bit words at slot `index` and
    /// return its host view.
    ///
    /// On allocation failure the slot is left unoccupied; a later sync on
    /// it reports [`PlatformError::UnallocatedBuffer`] instead of touching
    /// a dangling handle.
    pub fn mem_alloc(
        &mut self,
        index: usize,
        size_words: usize,
    ) -> Result<&mut [u32], PlatformError> {
        if size_words == 0 {
            return Err(PlatformError::ZeroLengthAllocation(index));
        }
        let capacity = self.mems.capacity();
        if index >= capacity {
            return Err(PlatformError::BufferIndexOutOfRange { index, capacity });
        }
        let size_bytes = size_words * 4;

        let buffer = match self.backend.backend_type() {
            BackendType::Simulator => {
                let words = vec![0u32; size_words].into_boxed_slice();
                let paddr = self.mems.assign_paddr(size_bytes);
                tracing::info!(
                    "simulator buffer {index}: virtual address {:p}, physical address {paddr:#x}, size {size_bytes}",
                    words.as_ptr()
                );
                DevBuffer {
                    paddr,
                    size_bytes,
                    backing: Backing::Host(words),
                }
            }
            BackendType::Hardware => {
                let mem = self
                    .backend
                    .mem_allocate(size_bytes, true)
                    .map_err(|err| PlatformError::AllocationFailed {
                        index,
                        size: size_bytes,
                        err,
                    })?;
                let paddr = mem.paddr;
                self.backend
                    .mem_sync_for_cpu(&mem)
                    .map_err(|err| PlatformError::SyncFailed { index, err })?;
                DevBuffer {
                    paddr,
                    size_bytes,
                    backing: Backing::Driver(mem),
                }
            }
        };

        Ok(self.mems.slots[index].insert(buffer).words_mut())
    }

    /// Make the buffer coherent for reads by the CPU, after the device has
    /// written into it.
    pub fn sync_mem_cpu(&mut self, index: usize) -> Result<(), PlatformError> {
        let backend = &self.backend;
        let slot = self.mems.slot_mut(index)?;
        let paddr = slot.paddr;
        match &mut slot.backing {
            Backing::Host(words) => {
                let mut bytes = vec![0u8; words.len() * 4];
                backend
                    .gm_read(paddr, &mut bytes)
                    .map_err(|err| PlatformError::SyncFailed { index, err })?;
                for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(4)) {
                    *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                }
                Ok(())
            }
            Backing::Driver(mem) => backend
                .mem_sync_for_cpu(mem)
                .map_err(|err| PlatformError::SyncFailed { index, err }),
        }
    }

    /// Make the buffer coherent for reads by the device, after the host has
    /// written into it.
    pub fn sync_mem_dev(&self, index: usize) -> Result<(), PlatformError> {
        let slot = self.mems.slot(index)?;
        match &slot.backing {
            Backing::Host(words) => {
                let mut bytes = Vec::with_capacity(slot.size_bytes);
                for word in words.iter() {
                    bytes.extend_from_slice(&word.to_le_bytes());
                }
                self.backend
                    .gm_write(slot.paddr, &bytes)
                    .map_err(|err| PlatformError::SyncFailed { index, err })
            }
            Backing::Driver(mem) => self
                .backend
                .mem_sync_for_dev(mem)
                .map_err(|err| PlatformError::SyncFailed { index, err }),
        }
    }

    /// Host view of an allocated buffer.
    pub fn mem(&self, index: usize) -> Result<&[u32], PlatformError> {
        Ok(self.mems.slot(index)?.words())
    }

    /// Mutable host view of an allocated buffer.
    pub fn mem_mut(&mut self, index: usize) -> Result<&mut [u32], PlatformError> {
        Ok(self.mems.slot_mut(index)?.words_mut())
    }

    /// Device-visible physical address of an allocated buffer.
    pub fn mem_paddr(&self, index: usize) -> Result<u64, PlatformError> {
        Ok(self.mems.slot(index)?.paddr())
    }
}
