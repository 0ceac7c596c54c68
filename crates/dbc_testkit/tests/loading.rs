//! Load-time behaviour of both strategies.

use dbc_core::{AllocationTracker, DbcError, DbcStorage, Layout, LoadConfig, DBC_MAGIC};
use dbc_storage::{ForwardOnlyStream, InMemoryStream};
use dbc_testkit::prelude::*;
use proptest::prelude::*;
use std::io::Cursor;

fn modes() -> [LoadConfig; 2] {
    [LoadConfig::default(), LoadConfig::new().complete_load(true)]
}

fn open(bytes: Vec<u8>, config: &LoadConfig) -> Result<DbcStorage<InMemoryStream>, DbcError> {
    DbcStorage::open(InMemoryStream::new(bytes), &sample_layout(), config)
}

#[test]
fn sample_scenario_in_both_modes() {
    let plan = sample_plan();
    for config in modes() {
        let mut storage = open(sample_file(), &config).unwrap();
        assert_eq!(storage.header().magic, DBC_MAGIC);
        assert_eq!(storage.record_count(), 2);
        assert_eq!(storage.record_size(), 12);

        assert_eq!(
            storage.get_record(1, &plan).unwrap(),
            Some(SampleRow {
                id: 1,
                value: 7,
                name: "ab".into()
            })
        );
        assert_eq!(
            storage.get_record(5, &plan).unwrap(),
            Some(SampleRow {
                id: 5,
                value: 9,
                name: "cd".into()
            })
        );
        assert_eq!(storage.get_record(3, &plan).unwrap(), None);
        storage.close();
    }
}

#[test]
fn duplicate_id_fails_in_both_modes() {
    let bytes = DbcFileBuilder::new("ni")
        .words(&[1, 0])
        .words(&[2, 0])
        .words(&[2, 0])
        .build();
    for config in modes() {
        let result = DbcStorage::open(
            InMemoryStream::new(bytes.clone()),
            &Layout::from_format("ni").unwrap(),
            &config,
        );
        assert!(matches!(
            result,
            Err(DbcError::OrderingViolation {
                index: 2,
                previous: 2,
                id: 2
            })
        ));
    }
}

#[test]
fn descending_id_fails_in_both_modes() {
    let bytes = DbcFileBuilder::new("ni").words(&[9, 0]).words(&[3, 0]).build();
    for config in modes() {
        let result = DbcStorage::open(
            InMemoryStream::new(bytes.clone()),
            &Layout::from_format("ni").unwrap(),
            &config,
        );
        assert!(matches!(result, Err(DbcError::OrderingViolation { .. })));
    }
}

#[test]
fn size_mismatch_leaks_nothing() {
    let bytes = sample_builder().with_record_size(16).build();
    for config in modes() {
        let tracker = AllocationTracker::new();
        let config = config.tracker(tracker.clone());
        let result = open(bytes.clone(), &config);
        assert!(matches!(
            result,
            Err(DbcError::SizeMismatch {
                expected: 12,
                actual: 16
            })
        ));
        assert_eq!(tracker.live_allocations(), 0);
        assert_eq!(tracker.total_allocations(), 0);
    }
}

#[test]
fn late_failure_releases_partial_load() {
    // the string check runs after the eager buffer is read
    let bytes = DbcFileBuilder::new("nis")
        .record([Field::UInt(1), Field::Int(0), Field::PoolOffset(40)])
        .raw_pool(b"x\0")
        .build();
    let tracker = AllocationTracker::new();
    let config = LoadConfig::new()
        .complete_load(true)
        .tracker(tracker.clone());
    let result = open(bytes, &config);
    assert!(matches!(
        result,
        Err(DbcError::StringOffsetOutOfBounds { offset: 40, .. })
    ));
    assert_eq!(tracker.live_allocations(), 0);
}

#[test]
fn last_pool_string_ends_at_pool_end() {
    let bytes = DbcFileBuilder::new("nis")
        .record([Field::UInt(1), Field::Int(0), Field::PoolOffset(0)])
        .record([Field::UInt(2), Field::Int(0), Field::PoolOffset(3)])
        .raw_pool(b"ab\0cd")
        .build();
    let mut with_trailer = bytes.clone();
    with_trailer.extend_from_slice(b"XYZ\0");

    for bytes in [bytes, with_trailer] {
        for config in modes() {
            let mut storage = open(bytes.clone(), &config).unwrap();
            let row = storage.get_record(2, &sample_plan()).unwrap().unwrap();
            assert_eq!(row.name, "cd");
        }
    }
}

#[test]
fn failed_lookup_leaves_no_buffers() {
    let bytes = DbcFileBuilder::new("nis")
        .record([Field::UInt(1), Field::Int(0), Field::PoolOffset(0)])
        .record([Field::UInt(2), Field::Int(0), Field::PoolOffset(77)])
        .raw_pool(b"ab\0")
        .build();
    let tracker = AllocationTracker::new();
    let config = LoadConfig::new().tracker(tracker.clone());
    let mut storage = open(bytes, &config).unwrap();
    assert!(storage.is_streaming());

    for _ in 0..3 {
        assert!(matches!(
            storage.get(2),
            Err(DbcError::StringOffsetOutOfBounds { offset: 77, .. })
        ));
    }
    assert_eq!(tracker.live_allocations(), 0);

    storage.get(1).unwrap();
    assert_eq!(tracker.live_allocations(), 2);
}

#[test]
fn bad_magic_unless_relaxed() {
    let bytes = sample_builder().with_magic(0x3142_4457).build();
    for config in modes() {
        assert!(matches!(
            open(bytes.clone(), &config),
            Err(DbcError::BadMagic {
                found: 0x3142_4457,
                ..
            })
        ));
        let mut storage = open(bytes.clone(), &config.ignore_wrong_magic(true)).unwrap();
        assert_eq!(storage.get(5).unwrap().unwrap().string(2).unwrap(), "cd");
    }
}

#[test]
fn truncated_inputs() {
    for cut in [1, 6, 10, 30] {
        let bytes = sample_builder().truncated_by(cut).build();
        for config in modes() {
            assert!(
                matches!(open(bytes.clone(), &config), Err(DbcError::TruncatedInput { .. })),
                "cut {cut}"
            );
        }
    }
    let header_only = sample_builder().truncated_by(40).build();
    assert!(matches!(
        open(header_only, &LoadConfig::default()),
        Err(DbcError::TruncatedInput { .. })
    ));
}

#[test]
fn negative_counts_are_invalid() {
    let bytes = sample_builder().with_record_count(-1).build();
    assert!(matches!(
        open(bytes, &LoadConfig::default()),
        Err(DbcError::InvalidHeader { .. })
    ));
}

#[test]
fn failed_load_closes_owned_stream() {
    let bytes = sample_builder().with_record_size(8).build();
    for config in modes() {
        let mut stream = CountingStream::new(InMemoryStream::new(bytes.clone()));
        let counters = stream.counters();
        let result = DbcStorage::open(&mut stream, &sample_layout(), &config.own_stream(true));
        assert!(result.is_err());
        drop(result);
        assert_eq!(counters.snapshot().closes, 1);
        assert!(stream.inner().is_closed());
    }
}

#[test]
fn failed_load_keeps_borrowed_stream_open() {
    let bytes = sample_builder().with_record_size(8).build();
    let mut stream = InMemoryStream::new(bytes);
    assert!(DbcStorage::open(&mut stream, &sample_layout(), &LoadConfig::default()).is_err());
    assert!(!stream.is_closed());
}

#[test]
fn forward_only_stream() {
    let streaming = DbcStorage::open(
        ForwardOnlyStream::new(Cursor::new(sample_file())),
        &sample_layout(),
        &LoadConfig::default(),
    );
    assert!(matches!(streaming, Err(DbcError::NotSeekable)));

    let mut eager = DbcStorage::open(
        ForwardOnlyStream::new(Cursor::new(sample_file())),
        &sample_layout(),
        &LoadConfig::new().complete_load(true),
    )
    .unwrap();
    assert_eq!(eager.get(1).unwrap().unwrap().string(2).unwrap(), "ab");
}

#[test]
fn empty_file_loads_eagerly() {
    let bytes = DbcFileBuilder::new("nis").build();
    let mut storage = open(bytes, &LoadConfig::default()).unwrap();
    assert!(!storage.is_streaming());
    assert_eq!(storage.record_count(), 0);
    assert_eq!(storage.min_id(), None);
    assert_eq!(storage.max_id(), None);
    assert!(storage.get(1).unwrap().is_none());
    assert!(!storage.contains(1).unwrap());
}

#[test]
fn file_backed_store() {
    let file = TempDbcFile::new(&sample_file());
    for config in modes() {
        let mut storage = DbcStorage::open_file(file.path(), &sample_layout(), &config).unwrap();
        assert_eq!(storage.get(5).unwrap().unwrap().i32(1), Some(9));
        storage.close();
    }
}

proptest! {
    #[test]
    fn eager_and_streaming_agree(rows in table_strategy(48)) {
        let bytes = table_file(&rows);
        let mut eager = open(bytes.clone(), &LoadConfig::new().complete_load(true)).unwrap();
        let mut streaming = open(bytes, &LoadConfig::default()).unwrap();
        let plan = sample_plan();

        prop_assert_eq!(eager.min_id(), rows.first().map(|r| r.id));
        prop_assert_eq!(streaming.max_id(), rows.last().map(|r| r.id));

        let present: std::collections::BTreeMap<u32, &TableRow> =
            rows.iter().map(|r| (r.id, r)).collect();
        if let (Some(min), Some(max)) = (eager.min_id(), eager.max_id()) {
            for id in min..=max {
                let a = eager.get_record(id, &plan).unwrap();
                let b = streaming.get_record(id, &plan).unwrap();
                prop_assert_eq!(&a, &b);
                match present.get(&id) {
                    Some(row) => {
                        let record = a.unwrap();
                        prop_assert_eq!(record.id, id);
                        prop_assert_eq!(record.value, row.value);
                        prop_assert_eq!(&record.name, &row.name);
                    }
                    None => prop_assert!(a.is_none()),
                }
            }
        }
    }

    #[test]
    fn pool_strings_round_trip_byte_for_byte(rows in table_strategy(16)) {
        let bytes = table_file(&rows);
        for config in modes() {
            let mut storage = open(bytes.clone(), &config).unwrap();
            for row in &rows {
                let view = storage.get(row.id).unwrap().unwrap();
                prop_assert_eq!(view.string_bytes(2).unwrap(), row.name.as_bytes());
            }
        }
    }
}
