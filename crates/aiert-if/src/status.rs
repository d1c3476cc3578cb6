// SPDX-FileCopyrightText: © 2024 The aiert authors
// SPDX-License-Identifier: Apache-2.0

//! Human-readable status dumps for a core, its locks and its DMA engines.
//!
//! Everything here is post-mortem diagnostics: register reads are
//! best-effort (a failed read renders as zero) and the output strings are
//! byte-stable. Consuming test scripts diff them verbatim, so field order
//! and punctuation are part of the contract.

use std::io;

use aiert_core::TileLoc;

use crate::regs::{
    aie1_lock_bits, DmaChannelStatus, ShimDmaBdControl, TileDmaBdAddr, TileDmaBdControl,
    CORE_STATUS_NAMES, NUM_BDS, NUM_LOCKS, SHIM_DMA_BD_BASE, SHIM_DMA_BD_CONTROL,
    SHIM_DMA_BD_LENGTH, SHIM_DMA_BD_STRIDE, SHIM_DMA_MM2S0_CTRL, SHIM_DMA_MM2S1_CTRL,
    SHIM_DMA_MM2S_STATUS, SHIM_DMA_S2MM0_CTRL, SHIM_DMA_S2MM1_CTRL, SHIM_DMA_S2MM_STATUS,
    TILE_DMA_BD_BASE, TILE_DMA_BD_CONTROL, TILE_DMA_BD_PACKET, TILE_DMA_BD_STRIDE,
    TILE_DMA_FIFO_COUNTER, TILE_DMA_MM2S0_CTRL, TILE_DMA_MM2S1_CTRL, TILE_DMA_MM2S_STATUS,
    TILE_DMA_S2MM0_CTRL, TILE_DMA_S2MM1_CTRL, TILE_DMA_S2MM_STATUS,
};
use crate::session::Session;

/// Print the status of the core in the given tile: status/timer/register
/// snapshot, trace status, the state of all 16 locks, and the decoded
/// status bits.
pub fn print_tile_status<W: io::Write>(
    session: &Session,
    tile: TileLoc,
    w: &mut W,
) -> io::Result<()> {
    let regs = session.core_regs();
    let tile_addr = session.tile_addr(tile);
    let (col, row) = (tile.col, tile.row);

    let status = session.read32(tile_addr + regs.status);
    let timer = session.read32(tile_addr + regs.timer_low);
    let pc = session.read32(tile_addr + regs.pc);
    let lr = session.read32(tile_addr + regs.lr);
    let sp = session.read32(tile_addr + regs.sp);
    let trace_status = session.read32(tile_addr + regs.trace_status);
    let r0 = session.read32(tile_addr + regs.r0);
    let r4 = session.read32(tile_addr + regs.r4);

    writeln!(
        w,
        "Core [{col}, {row}] status is {status:08X}, timer is {timer}, PC is {pc:08X}, \
         LR is {lr:08X}, SP is {sp:08X}, R0 is {r0:08X},R4 is {r4:08X}"
    )?;
    writeln!(w, "Core [{col}, {row}] trace status is {trace_status:08X}")?;

    if regs.lock_packed {
        let locks = session.read32(tile_addr + regs.lock_base);
        writeln!(w, "Core [{col}, {row}] AIE1 locks are {locks:08X}")?;
        for lock in 0..NUM_LOCKS as u8 {
            let two_bits = aie1_lock_bits(locks, lock);
            if two_bits != 0 {
                write!(w, "Lock {lock}: ")?;
                if two_bits & 0x1 != 0 {
                    write!(w, "Acquired ")?;
                }
                writeln!(w, "{}", if two_bits & 0x2 != 0 { "1" } else { "0" })?;
            }
        }
    } else {
        write!(w, "Core [{col}, {row}] AIE2 locks are: ")?;
        // Freeze the lock block for readback before walking the registers.
        session.write32(tile_addr + regs.lock_base, 3);
        let mut lock_addr = tile_addr + regs.lock_base;
        for _ in 0..NUM_LOCKS {
            let value = session.read32(lock_addr);
            write!(w, "{value:X} ")?;
            lock_addr += regs.lock_stride;
        }
        writeln!(w)?;
    }

    write!(w, "Core Status: ")?;
    for (bit, name) in CORE_STATUS_NAMES.iter().enumerate() {
        if (status >> bit) & 0x1 != 0 {
            write!(w, "{name} ")?;
        }
    }
    writeln!(w)
}

/// Print a summary of the status of the given tile DMA.
pub fn print_dma_status<W: io::Write>(
    session: &Session,
    tile: TileLoc,
    w: &mut W,
) -> io::Result<()> {
    let tile_addr = session.tile_addr(tile);
    let (col, row) = (tile.col, tile.row);

    let mm2s_status = session.read32(tile_addr + TILE_DMA_MM2S_STATUS);
    let s2mm_status = session.read32(tile_addr + TILE_DMA_S2MM_STATUS);
    let mm2s0_control = session.read32(tile_addr + TILE_DMA_MM2S0_CTRL);
    let mm2s1_control = session.read32(tile_addr + TILE_DMA_MM2S1_CTRL);
    let s2mm0_control = session.read32(tile_addr + TILE_DMA_S2MM0_CTRL);
    let s2mm1_control = session.read32(tile_addr + TILE_DMA_S2MM1_CTRL);
    let bd0_addr_a = session.read32(tile_addr + TILE_DMA_BD_BASE);
    let bd0_control = session.read32(tile_addr + TILE_DMA_BD_BASE + TILE_DMA_BD_CONTROL);
    let bd1_addr_a = session.read32(tile_addr + TILE_DMA_BD_BASE + TILE_DMA_BD_STRIDE);
    let bd1_control =
        session.read32(tile_addr + TILE_DMA_BD_BASE + TILE_DMA_BD_STRIDE + TILE_DMA_BD_CONTROL);

    writeln!(
        w,
        "DMA [{col}, {row}] mm2s_status/0ctrl/1ctrl is {mm2s_status:08X} {mm2s0_control:02X} \
         {mm2s1_control:02X}, s2mm_status/0ctrl/1ctrl is {s2mm_status:08X} {s2mm0_control:02X} \
         {s2mm1_control:02X}, BD0_Addr_A is {bd0_addr_a:08X}, BD0_control is {bd0_control:08X}, \
         BD1_Addr_A is {bd1_addr_a:08X}, BD1_control is {bd1_control:08X}"
    )?;

    let s2mm = DmaChannelStatus::from(s2mm_status);
    let mm2s = DmaChannelStatus::from(mm2s_status);

    for bd in 0..NUM_BDS as u8 {
        let bd_base = tile_addr + TILE_DMA_BD_BASE + TILE_DMA_BD_STRIDE * bd as u64;
        let addr_a = TileDmaBdAddr::from(session.read32(bd_base));
        let control = TileDmaBdControl::from(session.read32(bd_base + TILE_DMA_BD_CONTROL));
        if !control.valid() {
            continue;
        }
        writeln!(w, "BD {bd} valid")?;
        annotate_current_bd(w, bd, &s2mm, &mm2s)?;

        if control.enable_packet() {
            let packet = session.read32(bd_base + TILE_DMA_BD_PACKET);
            writeln!(w, "   Packet mode: {:02X}", packet & 0x1F)?;
        }

        let words_to_transfer = 1 + control.length_minus_one() as u32;
        let base_address = addr_a.base_address() as u64;
        writeln!(
            w,
            "   Transfering {words_to_transfer} 32 bit words to/from {base_address:06X}"
        )?;

        write!(w, "   ")?;
        for word in 0..7 {
            let value = session.data_mem_read_word(tile, (base_address + word) * 4);
            write!(w, "{value:08X} ")?;
        }
        writeln!(w)?;

        if addr_a.enable_acquire() {
            write!(w, "   Acquires lock {} ", addr_a.lock_id())?;
            if addr_a.use_acquire_value() {
                write!(w, "with value {} ", addr_a.acquire_value() as u32)?;
            }
            write!(w, "currently ")?;
            write_lock_state(session, tile_addr, addr_a.lock_id(), w)?;
            writeln!(w)?;
        }

        if control.fifo_mode() != 0 {
            let fifo_counter = session.read32(tile_addr + TILE_DMA_FIFO_COUNTER);
            writeln!(w, "   Using FIFO Cnt{} : {fifo_counter:08X}", control.fifo_mode())?;
        }

        writeln!(
            w,
            "   Next BD: {}, Use next BD: {}",
            control.next_bd(),
            control.use_next_bd() as u32
        )?;
    }
    Ok(())
}

/// Print a summary of the status of the given shim DMA.
pub fn print_shimdma_status<W: io::Write>(
    session: &Session,
    tile: TileLoc,
    w: &mut W,
) -> io::Result<()> {
    let tile_addr = session.tile_addr(tile);
    let (col, row) = (tile.col, tile.row);

    let mm2s_status = session.read32(tile_addr + SHIM_DMA_MM2S_STATUS);
    let s2mm_status = session.read32(tile_addr + SHIM_DMA_S2MM_STATUS);
    let mm2s0_control = session.read32(tile_addr + SHIM_DMA_MM2S0_CTRL);
    let mm2s1_control = session.read32(tile_addr + SHIM_DMA_MM2S1_CTRL);
    let s2mm0_control = session.read32(tile_addr + SHIM_DMA_S2MM0_CTRL);
    let s2mm1_control = session.read32(tile_addr + SHIM_DMA_S2MM1_CTRL);
    let bd0_addr_a = session.read32(tile_addr + SHIM_DMA_BD_BASE);
    let bd0_control = session.read32(tile_addr + SHIM_DMA_BD_BASE + SHIM_DMA_BD_CONTROL);

    writeln!(
        w,
        "DMA [{col}, {row}] mm2s_status/0ctrl/1ctrl is {mm2s_status:08X} {mm2s0_control:02X} \
         {mm2s1_control:02X}, s2mm_status/0ctrl/1ctrl is {s2mm_status:08X} {s2mm0_control:02X} \
         {s2mm1_control:02X}, BD0_Addr_A is {bd0_addr_a:08X}, BD0_control is {bd0_control:08X}"
    )?;

    let s2mm = DmaChannelStatus::from(s2mm_status);
    let mm2s = DmaChannelStatus::from(mm2s_status);

    for bd in 0..NUM_BDS as u8 {
        let bd_base = tile_addr + SHIM_DMA_BD_BASE + SHIM_DMA_BD_STRIDE * bd as u64;
        let addr_a = session.read32(bd_base);
        let buffer_length = session.read32(bd_base + SHIM_DMA_BD_LENGTH);
        let control = ShimDmaBdControl::from(session.read32(bd_base + SHIM_DMA_BD_CONTROL));
        if !control.valid() {
            continue;
        }
        writeln!(w, "BD {bd} valid")?;
        annotate_current_bd(w, bd, &s2mm, &mm2s)?;

        // Shim BDs carry a 48-bit external address; the summary keeps the
        // truncated low half the consuming scripts expect.
        let base_address = ((control.addr_high() as u64) << 32) | addr_a as u64;
        writeln!(
            w,
            "   Transfering {buffer_length} 32 bit words to/from {:06X}",
            base_address as u32
        )?;

        writeln!(
            w,
            "next_bd: {}, use_next_bd: {}",
            control.next_bd(),
            control.use_next_bd() as u32
        )?;
        writeln!(
            w,
            "lock: {}, acq(en: {}, val: {}, use: {}), rel(en: {}, val: {}, use: {})",
            control.lock_id(),
            control.enable_acquire() as u32,
            control.acquire_value() as u32,
            control.use_acquire_value() as u32,
            control.enable_release() as u32,
            control.release_value() as u32,
            control.use_release_value() as u32
        )?;

        write!(w, "   ")?;
    }
    Ok(())
}

fn annotate_current_bd<W: io::Write>(
    w: &mut W,
    bd: u8,
    s2mm: &DmaChannelStatus,
    mm2s: &DmaChannelStatus,
) -> io::Result<()> {
    for channel in 0..2 {
        if s2mm.running(channel) && bd == s2mm.current_bd(channel) {
            writeln!(w, " * Current BD for s2mm channel {channel}")?;
        }
    }
    for channel in 0..2 {
        if mm2s.running(channel) && bd == mm2s.current_bd(channel) {
            writeln!(w, " * Current BD for mm2s channel {channel}")?;
        }
    }
    Ok(())
}

/// Write the current state of one lock, reading the register the session's
/// generation actually implements.
fn write_lock_state<W: io::Write>(
    session: &Session,
    tile_addr: u64,
    lock_id: u8,
    w: &mut W,
) -> io::Result<()> {
    let regs = session.core_regs();
    if regs.lock_packed {
        let locks = session.read32(tile_addr + regs.lock_base);
        let two_bits = aie1_lock_bits(locks, lock_id);
        if two_bits != 0 {
            if two_bits & 0x1 != 0 {
                write!(w, "Acquired ")?;
            }
            write!(w, "{}", if two_bits & 0x2 != 0 { "1" } else { "0" })?;
        } else {
            write!(w, "0")?;
        }
    } else {
        let value = session.read32(tile_addr + regs.lock_base + regs.lock_stride * lock_id as u64);
        write!(w, "{value:X}")?;
    }
    Ok(())
}
