// SPDX-FileCopyrightText: © 2024 The aiert authors
// SPDX-License-Identifier: Apache-2.0

use std::io;

use clap::Parser;

use aiert::hal::regs;
use aiert::sim::SimDevice;
use aiert::{
    print_dma_status, print_shimdma_status, print_tile_status, AieBackend, Generation, Session,
    TileLoc,
};

/// Bring up a simulated AIE partition and dump diagnostics for one tile.
#[derive(Parser)]
struct Args {
    /// Column of the tile to inspect
    #[arg(long, default_value_t = 1)]
    col: u32,

    /// Row of the tile to inspect; row 0 selects the shim tile
    #[arg(long, default_value_t = 1)]
    row: u32,

    /// Silicon generation to decode for (aie1 or aie2)
    #[arg(long, default_value = "aie1")]
    generation: Generation,

    /// Also dump the tile's nonzero data memory words
    #[arg(long)]
    dump_memory: bool,
}

/// Give the fresh simulator something worth printing: a running channel on
/// a valid, lock-guarded BD, and a few recognizable data memory words.
fn seed_demo_state(
    device: &SimDevice,
    tile: TileLoc,
) -> Result<(), Box<dyn std::error::Error>> {
    let base = device.tile_addr(tile);

    if tile.is_shim() {
        let control = 0x1 | (1 << 1) | (1 << 2) | (1 << 3) | (2 << 7) | (1 << 11) | (1 << 15)
            | (0x0004 << 16);
        device.write32(base + regs::SHIM_DMA_BD_BASE, 0x0000_1000)?;
        device.write32(base + regs::SHIM_DMA_BD_BASE + regs::SHIM_DMA_BD_LENGTH, 32)?;
        device.write32(base + regs::SHIM_DMA_BD_BASE + regs::SHIM_DMA_BD_CONTROL, control)?;
        device.write32(base + regs::SHIM_DMA_S2MM_STATUS, 0x1)?;
    } else {
        device.write32(base + regs::AIE_CORE_REGS.status, 0x1)?;
        device.write32(base + regs::AIE_CORE_REGS.timer_low, 12345)?;

        let control = 0x8000_0000u32 | (1 << 13) | (1 << 17) | 15;
        let addr_a = (3 << 22) | (1 << 18) | (1 << 17) | (1 << 16) | 8;
        device.write32(base + regs::TILE_DMA_BD_BASE, addr_a)?;
        device.write32(base + regs::TILE_DMA_BD_BASE + regs::TILE_DMA_BD_CONTROL, control)?;
        device.write32(base + regs::TILE_DMA_S2MM_STATUS, 0x1)?;

        for word in 0..8u64 {
            device.data_mem_write_word(tile, (8 + word) * 4, 0x1010 + word as u32)?;
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let tile = TileLoc::new(args.col, args.row);

    let device = SimDevice::new();
    seed_demo_state(&device, tile)?;

    let session = Session::init(Box::new(device), args.generation)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if tile.is_shim() {
        print_shimdma_status(&session, tile, &mut out)?;
    } else {
        print_tile_status(&session, tile, &mut out)?;
        print_dma_status(&session, tile, &mut out)?;
    }
    if args.dump_memory {
        session.dump_tile_memory(tile, &mut out)?;
    }

    Ok(())
}
