// SPDX-FileCopyrightText: © 2024 The aiert authors
// SPDX-License-Identifier: Apache-2.0

use aiert_core::TileLoc;

/// Which flavor of backend a session is talking to.
///
/// The library only uses this to pick the buffer allocation path and the
/// cache synchronization path; everything else is backend-agnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendType {
    Hardware,
    Simulator,
}

/// Lock id/value pair handed to the acquire and release primitives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LockDesc {
    pub id: u8,
    pub value: u8,
}

impl LockDesc {
    pub fn new(id: u8, value: u8) -> Self {
        Self { id, value }
    }
}

/// One driver-owned allocation reachable by both host and device.
///
/// `vaddr` stays valid until the backend that handed it out is dropped.
#[derive(Debug)]
pub struct BackendMem {
    pub vaddr: *mut u8,
    pub paddr: u64,
    pub size: usize,
}

/// The driver contract consumed by this library.
///
/// This is a thin mirror of the vendor driver's primitive I/O surface:
/// tile-addressed 32-bit register access, data-memory word access, lock
/// acquire/release with a driver-enforced timeout, core run control,
/// partition lifecycle, and host-visible buffer management. All accesses are
/// 4-byte aligned with 32-bit payloads.
///
/// The two `gm_*` functions expose the simulator's global-memory model; a
/// silicon backend never sees them called.
pub trait AieBackend {
    fn backend_type(&self) -> BackendType;

    fn cfg_initialize(&self) -> Result<(), Box<dyn std::error::Error>>;
    fn finish(&self) -> Result<(), Box<dyn std::error::Error>>;
    fn pm_request_tiles(&self) -> Result<(), Box<dyn std::error::Error>>;
    fn turn_ecc_off(&self) -> Result<(), Box<dyn std::error::Error>>;

    fn read32(&self, addr: u64) -> Result<u32, Box<dyn std::error::Error>>;
    fn write32(&self, addr: u64, value: u32) -> Result<(), Box<dyn std::error::Error>>;

    fn data_mem_read_word(&self, tile: TileLoc, addr: u64)
        -> Result<u32, Box<dyn std::error::Error>>;
    fn data_mem_write_word(
        &self,
        tile: TileLoc,
        addr: u64,
        value: u32,
    ) -> Result<(), Box<dyn std::error::Error>>;

    /// Base byte address of the tile in the global configuration address
    /// space. The library adds architectural offsets to this value.
    fn tile_addr(&self, tile: TileLoc) -> u64;

    /// An error return means the operation did not complete within
    /// `timeout_us`.
    fn lock_acquire(
        &self,
        tile: TileLoc,
        lock: LockDesc,
        timeout_us: u32,
    ) -> Result<(), Box<dyn std::error::Error>>;
    fn lock_release(
        &self,
        tile: TileLoc,
        lock: LockDesc,
        timeout_us: u32,
    ) -> Result<(), Box<dyn std::error::Error>>;

    fn core_enable(&self, tile: TileLoc) -> Result<(), Box<dyn std::error::Error>>;
    fn core_disable(&self, tile: TileLoc) -> Result<(), Box<dyn std::error::Error>>;

    fn mem_allocate(
        &self,
        size: usize,
        cacheable: bool,
    ) -> Result<BackendMem, Box<dyn std::error::Error>>;
    fn mem_sync_for_cpu(&self, mem: &BackendMem) -> Result<(), Box<dyn std::error::Error>>;
    fn mem_sync_for_dev(&self, mem: &BackendMem) -> Result<(), Box<dyn std::error::Error>>;

    fn gm_read(&self, paddr: u64, data: &mut [u8]) -> Result<(), Box<dyn std::error::Error>>;
    fn gm_write(&self, paddr: u64, data: &[u8]) -> Result<(), Box<dyn std::error::Error>>;

    fn as_any(&self) -> &dyn std::any::Any;
}

impl<T: AieBackend + ?Sized> AieBackend for std::sync::Arc<T> {
    fn backend_type(&self) -> BackendType {
        self.as_ref().backend_type()
    }

    fn cfg_initialize(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.as_ref().cfg_initialize()
    }

    fn finish(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.as_ref().finish()
    }

    fn pm_request_tiles(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.as_ref().pm_request_tiles()
    }

    fn turn_ecc_off(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.as_ref().turn_ecc_off()
    }

    fn read32(&self, addr: u64) -> Result<u32, Box<dyn std::error::Error>> {
        self.as_ref().read32(addr)
    }

    fn write32(&self, addr: u64, value: u32) -> Result<(), Box<dyn std::error::Error>> {
        self.as_ref().write32(addr, value)
    }

    fn data_mem_read_word(
        &self,
        tile: TileLoc,
        addr: u64,
    ) -> Result<u32, Box<dyn std::error::Error>> {
        self.as_ref().data_mem_read_word(tile, addr)
    }

    fn data_mem_write_word(
        &self,
        tile: TileLoc,
        addr: u64,
        value: u32,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.as_ref().data_mem_write_word(tile, addr, value)
    }

    fn tile_addr(&self, tile: TileLoc) -> u64 {
        self.as_ref().tile_addr(tile)
    }

    fn lock_acquire(
        &self,
        tile: TileLoc,
        lock: LockDesc,
        timeout_us: u32,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.as_ref().lock_acquire(tile, lock, timeout_us)
    }

    fn lock_release(
        &self,
        tile: TileLoc,
        lock: LockDesc,
        timeout_us: u32,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.as_ref().lock_release(tile, lock, timeout_us)
    }

    fn core_enable(&self, tile: TileLoc) -> Result<(), Box<dyn std::error::Error>> {
        self.as_ref().core_enable(tile)
    }

    fn core_disable(&self, tile: TileLoc) -> Result<(), Box<dyn std::error::Error>> {
        self.as_ref().core_disable(tile)
    }

    fn mem_allocate(
        &self,
        size: usize,
        cacheable: bool,
    ) -> Result<BackendMem, Box<dyn std::error::Error>> {
        self.as_ref().mem_allocate(size, cacheable)
    }

    fn mem_sync_for_cpu(&self, mem: &BackendMem) -> Result<(), Box<dyn std::error::Error>> {
        self.as_ref().mem_sync_for_cpu(mem)
    }

    fn mem_sync_for_dev(&self, mem: &BackendMem) -> Result<(), Box<dyn std::error::Error>> {
        self.as_ref().mem_sync_for_dev(mem)
    }

    fn gm_read(&self, paddr: u64, data: &mut [u8]) -> Result<(), Box<dyn std::error::Error>> {
        self.as_ref().gm_read(paddr, data)
    }

    fn gm_write(&self, paddr: u64, data: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
        self.as_ref().gm_write(paddr, data)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self.as_ref().as_any()
    }
}
