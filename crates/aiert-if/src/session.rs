// SPDX-FileCopyrightText: © 2024 The aiert authors
// SPDX-License-Identifier: Apache-2.0

use std::io;

use aiert_core::{Generation, TileLoc};

use crate::error::InitError;
use crate::interface::{AieBackend, BackendType, LockDesc};
use crate::mem::BufferRegistry;
use crate::regs::{CoreRegMap, DATA_MEM_WORDS};

/// A live connection to one device/partition.
///
/// Owns the driver backend and the buffer registry; everything else in the
/// library is a function over `&Session`. The generation tag is fixed at
/// init and selects every generation-dependent register offset through the
/// embedded [`CoreRegMap`].
pub struct Session {
    pub(crate) mems: BufferRegistry,
    generation: Generation,
    core_regs: &'static CoreRegMap,
    pub(crate) backend: Box<dyn AieBackend>,
}

impl Session {
    /// Initialize the device represented by the backend.
    ///
    /// On anything but the simulator the partition is requested, torn down
    /// and brought back up before the final tile request: the driver
    /// requires tiles to be explicitly released before they can be owned
    /// again, so the double init is not optional. The simulator errors on
    /// tile requests and instead gets ECC disabled so scrub/report cycles
    /// don't corrupt test patterns.
    pub fn init(backend: Box<dyn AieBackend>, generation: Generation) -> Result<Self, InitError> {
        backend.cfg_initialize().map_err(|err| {
            tracing::error!("driver initialization failed: {err}");
            InitError::CfgInitialize(err)
        })?;

        if backend.backend_type() != BackendType::Simulator {
            backend.pm_request_tiles().map_err(|err| {
                tracing::error!("failed to request tiles: {err}");
                InitError::PmRequestTiles(err)
            })?;
            backend.finish().map_err(|err| {
                tracing::error!("failed to finish tiles: {err}");
                InitError::Finish(err)
            })?;
            backend.cfg_initialize().map_err(|err| {
                tracing::error!("driver initialization failed: {err}");
                InitError::CfgInitialize(err)
            })?;
            backend.pm_request_tiles().map_err(|err| {
                tracing::error!("failed to request tiles: {err}");
                InitError::PmRequestTiles(err)
            })?;
        } else {
            tracing::info!("turning ecc off");
            if let Err(err) = backend.turn_ecc_off() {
                tracing::debug!("turning ecc off failed: {err}");
            }
        }

        Ok(Session {
            mems: BufferRegistry::default(),
            generation,
            core_regs: CoreRegMap::for_generation(generation),
            backend,
        })
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn backend_type(&self) -> BackendType {
        self.backend.backend_type()
    }

    pub fn core_regs(&self) -> &'static CoreRegMap {
        self.core_regs
    }

    /// Downcast the backend to a concrete type, for callers that need to
    /// reach behind the trait.
    pub fn get_if<T: AieBackend + 'static>(&self) -> Option<&T> {
        self.backend.as_any().downcast_ref::<T>()
    }

    /// Acquire a physical lock. Returns true iff the backend reported OK
    /// within `timeout_us`; there is no retry and no sleep on this side.
    pub fn acquire_lock(
        &self,
        tile: TileLoc,
        lockid: u8,
        lockval: u8,
        timeout_us: u32,
    ) -> bool {
        self.backend
            .lock_acquire(tile, LockDesc::new(lockid, lockval), timeout_us)
            .is_ok()
    }

    /// Release a physical lock. Same contract as [`Session::acquire_lock`].
    pub fn release_lock(
        &self,
        tile: TileLoc,
        lockid: u8,
        lockval: u8,
        timeout_us: u32,
    ) -> bool {
        self.backend
            .lock_release(tile, LockDesc::new(lockid, lockval), timeout_us)
            .is_ok()
    }

    /// Read the configuration address space at the given address. A backend
    /// error silently yields 0: these routines feed best-effort diagnostics
    /// where partial truth is acceptable.
    pub fn read32(&self, addr: u64) -> u32 {
        self.backend.read32(addr).unwrap_or(0)
    }

    /// Write the configuration address space at the given address. It's
    /// almost always better to use a more indirect method of accessing
    /// configuration registers, but this is provided as a last resort.
    pub fn write32(&self, addr: u64, value: u32) {
        if let Err(err) = self.backend.write32(addr, value) {
            tracing::debug!("write32 of {value:#010x} to {addr:#x} failed: {err}");
        }
    }

    /// Read a word from the data memory of a tile. Backend errors yield 0.
    pub fn data_mem_read_word(&self, tile: TileLoc, addr: u64) -> u32 {
        self.backend.data_mem_read_word(tile, addr).unwrap_or(0)
    }

    /// Write a word to the data memory of a tile.
    pub fn data_mem_write_word(&self, tile: TileLoc, addr: u64, value: u32) {
        if let Err(err) = self.backend.data_mem_write_word(tile, addr, value) {
            tracing::debug!("data memory write to {tile} at {addr:#x} failed: {err}");
        }
    }

    /// Base address of the tile. The configuration address space of most
    /// tiles is very similar, relative to this base address.
    pub fn tile_addr(&self, tile: TileLoc) -> u64 {
        self.backend.tile_addr(tile)
    }

    pub fn core_enable(&self, tile: TileLoc) {
        if let Err(err) = self.backend.core_enable(tile) {
            tracing::debug!("enabling core {tile} failed: {err}");
        }
    }

    pub fn core_disable(&self, tile: TileLoc) {
        if let Err(err) = self.backend.core_disable(tile) {
            tracing::debug!("disabling core {tile} failed: {err}");
        }
    }

    /// Dump the data memory of the given tile to the sink. Zero words and
    /// failed reads are skipped.
    pub fn dump_tile_memory<W: io::Write>(&self, tile: TileLoc, w: &mut W) -> io::Result<()> {
        for i in 0..DATA_MEM_WORDS {
            if let Ok(value) = self.backend.data_mem_read_word(tile, (i * 4) as u64) {
                if value != 0 {
                    writeln!(w, "Tile[{}][{}]: mem[{}] = {}", tile.col, tile.row, i, value)?;
                }
            }
        }
        Ok(())
    }

    /// Fill the data memory of the given tile with zeros.
    pub fn clear_tile_memory(&self, tile: TileLoc) {
        for i in 0..DATA_MEM_WORDS {
            self.data_mem_write_word(tile, (i * 4) as u64, 0);
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Err(err) = self.backend.finish() {
            tracing::warn!("failed to finish tiles: {err}");
        }
    }
}
