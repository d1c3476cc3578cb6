// SPDX-FileCopyrightText: © 2024 The aiert authors
// SPDX-License-Identifier: Apache-2.0

use aiert::sim::SimDevice;
use aiert::{BackendType, Generation, PlatformError, Session, TileLoc};

fn sim_session() -> Session {
    Session::init(Box::new(SimDevice::new()), Generation::Aie).unwrap()
}

#[test]
fn data_memory_round_trips() {
    let session = sim_session();
    let tile = TileLoc::new(1, 1);

    for (addr, value) in [(0u64, 0xA5A5_A5A5u32), (0x1000, 1), (0x7FFC, u32::MAX)] {
        session.data_mem_write_word(tile, addr, value);
        assert_eq!(
            session.data_mem_read_word(tile, addr),
            value,
            "word at {addr:#x} did not round trip"
        );
    }
}

#[test]
fn clear_tile_memory_zeroes_every_word() {
    let session = sim_session();
    let tile = TileLoc::new(2, 1);

    session.data_mem_write_word(tile, 0x10, 42);
    session.data_mem_write_word(tile, 0x7FFC, 43);

    session.clear_tile_memory(tile);

    for i in 0..0x2000u64 {
        assert_eq!(session.data_mem_read_word(tile, i * 4), 0);
    }
}

#[test]
fn memory_dump_prints_only_nonzero_words() {
    let session = sim_session();
    let tile = TileLoc::new(3, 2);

    session.data_mem_write_word(tile, 5 * 4, 42);
    session.data_mem_write_word(tile, 9 * 4, 7);

    let mut out = Vec::new();
    session.dump_tile_memory(tile, &mut out).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "Tile[3][2]: mem[5] = 42\nTile[3][2]: mem[9] = 7\n"
    );
}

#[test]
fn simulator_allocator_is_monotone_and_16_byte_aligned() {
    let mut session = sim_session();
    session.init_mems(4);

    // 3 words round up to one 16-byte slot, so the second buffer lands
    // exactly 16 bytes above the first.
    session.mem_alloc(0, 3).unwrap();
    session.mem_alloc(1, 1).unwrap();
    let p0 = session.mem_paddr(0).unwrap();
    let p1 = session.mem_paddr(1).unwrap();
    assert_eq!(p0 % 16, 0);
    assert_eq!(p1, p0 + 16);
    assert_eq!(session.mem(0).unwrap().len(), 3);
    assert_eq!(session.mem(1).unwrap().len(), 1);

    session.mem_alloc(2, 9).unwrap();
    session.mem_alloc(3, 1).unwrap();
    let p2 = session.mem_paddr(2).unwrap();
    let p3 = session.mem_paddr(3).unwrap();
    assert_eq!(p2, p1 + 16);
    assert_eq!(p2 % 16, 0);
    assert!(p3 >= p2 + 9 * 4, "allocations must never overlap");
    assert_eq!(p3 % 16, 0);
}

#[test]
fn sim_sync_round_trips_through_global_memory() {
    let mut session = sim_session();
    session.init_mems(1);

    let buffer = session.mem_alloc(0, 8).unwrap();
    for (i, word) in buffer.iter_mut().enumerate() {
        *word = 0x1000 + i as u32;
    }
    session.sync_mem_dev(0).unwrap();

    // Wipe the host view; a CPU sync must bring the data back from the
    // global-memory model.
    session.mem_mut(0).unwrap().fill(0);
    session.sync_mem_cpu(0).unwrap();

    let readback: Vec<u32> = session.mem(0).unwrap().to_vec();
    let expected: Vec<u32> = (0..8).map(|i| 0x1000 + i as u32).collect();
    assert_eq!(readback, expected);
}

#[test]
fn hardware_path_allocates_through_the_driver() {
    let mut session = Session::init(
        Box::new(SimDevice::with_backend_type(BackendType::Hardware)),
        Generation::Aie,
    )
    .unwrap();
    session.init_mems(2);

    let buffer = session.mem_alloc(0, 4).unwrap();
    buffer.copy_from_slice(&[1, 2, 3, 4]);
    session.sync_mem_dev(0).unwrap();

    session.mem_mut(0).unwrap().fill(0);
    session.sync_mem_cpu(0).unwrap();
    assert_eq!(session.mem(0).unwrap(), &[1, 2, 3, 4]);

    session.mem_alloc(1, 1).unwrap();
    assert_eq!(session.mem_paddr(0).unwrap() % 16, 0);
    assert_eq!(session.mem_paddr(1).unwrap() % 16, 0);
}

#[test]
fn registry_misuse_is_reported_not_dereferenced() {
    let mut session = sim_session();

    // No table reserved yet.
    assert!(matches!(
        session.mem_alloc(0, 1),
        Err(PlatformError::BufferIndexOutOfRange { .. })
    ));

    session.init_mems(2);
    assert!(matches!(
        session.sync_mem_cpu(0),
        Err(PlatformError::UnallocatedBuffer(0))
    ));
    assert!(matches!(
        session.sync_mem_dev(1),
        Err(PlatformError::UnallocatedBuffer(1))
    ));
    assert!(matches!(
        session.mem(0),
        Err(PlatformError::UnallocatedBuffer(0))
    ));
    assert!(matches!(
        session.mem_alloc(2, 1),
        Err(PlatformError::BufferIndexOutOfRange { .. })
    ));
    assert!(matches!(
        session.mem_alloc(0, 0),
        Err(PlatformError::ZeroLengthAllocation(0))
    ));
}
