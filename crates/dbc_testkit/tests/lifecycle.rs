//! Teardown, stream ownership and allocation tracking.

use dbc_core::{AllocationTracker, DbcError, DbcStorage, LoadConfig, StreamingStore};
use dbc_storage::{ByteStream, InMemoryStream};
use dbc_testkit::prelude::*;

fn modes() -> [LoadConfig; 2] {
    [LoadConfig::default(), LoadConfig::new().complete_load(true)]
}

#[test]
fn teardown_releases_every_allocation_once() {
    for config in modes() {
        let tracker = AllocationTracker::new();
        let config = config.tracker(tracker.clone());
        let mut storage =
            DbcStorage::open(InMemoryStream::new(sample_file()), &sample_layout(), &config)
                .unwrap();
        storage.get(5).unwrap();
        storage.get(1).unwrap();
        storage.get(5).unwrap();
        assert!(tracker.live_allocations() > 0);
        assert_eq!(tracker.live_allocations(), storage.live_allocations());

        storage.close();
        assert_eq!(tracker.live_allocations(), 0);
        assert_eq!(tracker.live_bytes(), 0);
        storage.close();
        assert_eq!(tracker.live_allocations(), 0);
    }
}

#[test]
fn operations_after_teardown_fail() {
    let plan = sample_plan();
    for config in modes() {
        let mut storage =
            DbcStorage::open(InMemoryStream::new(sample_file()), &sample_layout(), &config)
                .unwrap();
        storage.close();
        assert!(storage.is_closed());
        assert!(matches!(storage.get(1), Err(DbcError::UseAfterTeardown)));
        assert!(matches!(
            storage.get_record(1, &plan),
            Err(DbcError::UseAfterTeardown)
        ));
        assert!(matches!(storage.contains(1), Err(DbcError::UseAfterTeardown)));
        assert!(matches!(storage.ids(), Err(DbcError::UseAfterTeardown)));
        // metadata stays readable
        assert_eq!(storage.record_count(), 2);
    }
}

#[test]
fn drop_without_close_releases() {
    for config in modes() {
        let tracker = AllocationTracker::new();
        let config = config.tracker(tracker.clone());
        {
            let mut storage =
                DbcStorage::open(InMemoryStream::new(sample_file()), &sample_layout(), &config)
                    .unwrap();
            storage.get(1).unwrap();
        }
        assert_eq!(tracker.live_allocations(), 0);
    }
}

#[test]
fn owned_streaming_stream_closed_exactly_once() {
    let mut stream = CountingStream::new(InMemoryStream::new(sample_file()));
    let counters = stream.counters();
    let config = LoadConfig::new().own_stream(true);
    {
        let mut storage = DbcStorage::open(&mut stream, &sample_layout(), &config).unwrap();
        storage.get(1).unwrap();
        assert_eq!(counters.snapshot().closes, 0);
        storage.close();
        storage.close();
    }
    assert_eq!(counters.snapshot().closes, 1);
    assert!(stream.inner().is_closed());
}

#[test]
fn owned_stream_closed_after_eager_load() {
    let mut stream = CountingStream::new(InMemoryStream::new(sample_file()));
    let counters = stream.counters();
    let config = LoadConfig::new().own_stream(true).complete_load(true);
    let mut storage = DbcStorage::open(&mut stream, &sample_layout(), &config).unwrap();
    assert_eq!(counters.snapshot().closes, 1);
    assert_eq!(storage.get(1).unwrap().unwrap().string(2).unwrap(), "ab");
    storage.close();
    drop(storage);
    assert_eq!(counters.snapshot().closes, 1);
}

#[test]
fn borrowed_stream_stays_open() {
    for config in modes() {
        let mut stream = InMemoryStream::new(sample_file());
        {
            let mut storage = DbcStorage::open(&mut stream, &sample_layout(), &config).unwrap();
            storage.get(1).unwrap();
            storage.close();
        }
        assert!(!stream.is_closed());
    }
}

#[test]
fn streaming_restores_borrowed_position() {
    let builder = sample_builder().with_prefix(b"junk");
    let mut stream = InMemoryStream::new(builder.build());
    stream.seek(4).unwrap();
    {
        let store =
            StreamingStore::load(&mut stream, &sample_layout(), &LoadConfig::default()).unwrap();
        let first = store.slot(1).and_then(|slot| slot.offset());
        assert_eq!(first.map(u64::from), Some(builder.data_start()));
    }
    assert_eq!(stream.position().unwrap(), 4);
}

#[test]
fn lazy_strings_outlive_the_store() {
    let plan = lazy_sample_plan();
    for config in modes() {
        let mut storage =
            DbcStorage::open(InMemoryStream::new(sample_file()), &sample_layout(), &config)
                .unwrap();
        let mut row = storage.get_record(1, &plan).unwrap().unwrap();
        storage.close();
        assert_eq!(row.name.as_str(), "ab");
    }
}

#[test]
fn immediate_mode_materializes_lazy_strings() {
    let plan = lazy_sample_plan();
    for config in modes() {
        let config = config.materialize_lazy_strings_immediately(true);
        let mut storage =
            DbcStorage::open(InMemoryStream::new(sample_file()), &sample_layout(), &config)
                .unwrap();
        let row = storage.get_record(5, &plan).unwrap().unwrap();
        assert!(row.name.is_loaded());
        assert_eq!(row.name.to_string(), "cd");
    }
}
