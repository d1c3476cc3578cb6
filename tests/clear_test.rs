// SPDX-FileCopyrightText: © 2024 The aiert authors
// SPDX-License-Identifier: Apache-2.0

use aiert::sim::{LifecycleCall, SimDevice};
use aiert::{clear_shim_tile, clear_tile, print_dma_status, print_shimdma_status, Generation, Session, TileLoc};

/// Every range the clear protocol touches, as (low, high) inclusive pairs.
const TILE_RANGES: [(u64, u64); 5] = [
    (0x20000, 0x200FF),
    (0x1D000, 0x1D1F8),
    (0x3F000, 0x3F060),
    (0x3F100, 0x3F168),
    (0x3F200, 0x3F3AC),
];

fn session() -> Session {
    Session::init(Box::new(SimDevice::new()), Generation::Aie).unwrap()
}

fn scribble_tile(session: &Session, tile: TileLoc) {
    let base = session.tile_addr(tile);
    for bd in 0..8u64 {
        session.write32(base + 0x1D000 + 0x20 * bd + 0x18, 0x8000_0000 | 0x7);
        session.write32(base + 0x1D000 + 0x20 * bd, 0x1234);
    }
    for addr in [0x1DE00, 0x1DE08, 0x1DE10] {
        session.write32(base + addr, 0x1);
    }
    for (low, high) in TILE_RANGES {
        session.write32(base + low, 0xFFFF_FFFF);
        session.write32(base + (high & !3), 0xFFFF_FFFF);
    }
}

fn snapshot(session: &Session, tile: TileLoc) -> Vec<u32> {
    let base = session.tile_addr(tile);
    let mut values = Vec::new();
    for (low, high) in TILE_RANGES {
        let mut addr = low;
        while addr <= high {
            values.push(session.read32(base + addr));
            addr += 4;
        }
    }
    values
}

#[test]
fn clear_tile_invalidates_every_bd() {
    let session = session();
    let tile = TileLoc::new(2, 4);
    scribble_tile(&session, tile);

    clear_tile(&session, tile);

    let base = session.tile_addr(tile);
    for bd in 0..8u64 {
        assert_eq!(
            session.read32(base + 0x1D018 + 0x20 * bd),
            0,
            "BD {bd} control word survived the clear"
        );
    }

    let mut out = Vec::new();
    print_dma_status(&session, tile, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(!text.contains("valid"), "a BD still decodes as valid:\n{text}");
}

#[test]
fn clear_tile_zeroes_every_documented_range() {
    let session = session();
    let tile = TileLoc::new(1, 2);
    scribble_tile(&session, tile);

    clear_tile(&session, tile);
    assert!(
        snapshot(&session, tile).iter().all(|v| *v == 0),
        "a cleared range reads back nonzero"
    );
}

#[test]
fn clear_tile_is_idempotent() {
    let session = session();
    let tile = TileLoc::new(3, 3);
    scribble_tile(&session, tile);

    clear_tile(&session, tile);
    let first = snapshot(&session, tile);
    let base = session.tile_addr(tile);
    let status_after_first = session.read32(base + 0x032004);

    clear_tile(&session, tile);
    assert_eq!(first, snapshot(&session, tile));
    assert_eq!(status_after_first, session.read32(base + 0x032004));
}

#[test]
fn clear_tile_holds_the_core_in_reset_while_clearing() {
    let session = session();
    let tile = TileLoc::new(5, 2);

    clear_tile(&session, tile);

    let device = session.get_if::<SimDevice>().unwrap();
    let core_calls: Vec<_> = device
        .lifecycle_calls()
        .into_iter()
        .filter(|call| {
            matches!(
                call,
                LifecycleCall::CoreDisable(_) | LifecycleCall::CoreEnable(_)
            )
        })
        .collect();
    assert_eq!(
        core_calls,
        vec![
            LifecycleCall::CoreDisable(tile),
            LifecycleCall::CoreEnable(tile),
        ],
        "the core must be disabled before the clear and re-enabled after"
    );
}

#[test]
fn clear_shim_tile_clears_dma_and_stream_switch() {
    let session = session();
    let tile = TileLoc::new(4, 0);
    let base = session.tile_addr(tile);

    for bd in 0..8u64 {
        session.write32(base + 0x1D000 + 0x14 * bd + 0x8, 0x1);
    }
    for addr in [0x1D140, 0x1D148, 0x1D150, 0x1D158, 0x3F000, 0x3F058, 0x3F100, 0x3F15C, 0x3F200, 0x3F37C] {
        session.write32(base + addr, 0xFFFF_FFFF);
    }

    clear_shim_tile(&session, tile);

    for bd in 0..8u64 {
        assert_eq!(
            session.read32(base + 0x1D000 + 0x14 * bd + 0x8),
            0,
            "shim BD {bd} control word survived the clear"
        );
    }
    for addr in [0x1D140, 0x1D148, 0x1D150, 0x1D158, 0x3F000, 0x3F058, 0x3F100, 0x3F15C, 0x3F200, 0x3F37C] {
        assert_eq!(session.read32(base + addr), 0, "register {addr:#x} survived");
    }

    let mut out = Vec::new();
    print_shimdma_status(&session, tile, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(!text.contains("valid"), "a shim BD still decodes as valid:\n{text}");

    // Shim tiles have no core to toggle.
    let device = session.get_if::<SimDevice>().unwrap();
    assert!(device
        .lifecycle_calls()
        .iter()
        .all(|call| !matches!(
            call,
            LifecycleCall::CoreDisable(_) | LifecycleCall::CoreEnable(_)
        )));
}
