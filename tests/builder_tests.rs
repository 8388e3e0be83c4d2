mod common;

use common::{foo_capture, StreamWriter};
use pretty_assertions::assert_eq;
use simpleperf_trace::parser::parse_file;
use simpleperf_trace::{parse_bytes, ErrorKind, FrameResolution, ParseOptions, TraceError};

fn strict() -> ParseOptions {
    ParseOptions::default()
}

#[test]
fn test_worked_example_resolution() {
    let trace = parse_bytes(&foo_capture(), &strict()).unwrap();

    let sample = &trace.samples()[0];
    assert_eq!(sample.thread_id, 100);
    assert_eq!(sample.process_id, 100);
    assert_eq!(sample.frames.len(), 2);

    let leaf = &sample.frames[0];
    assert_eq!(leaf.address, 0x1015);
    assert_eq!(
        leaf.resolution,
        FrameResolution::Symbol {
            file_id: 7,
            symbol_index: 0,
            offset: 0x05,
        }
    );
    assert_eq!(trace.symbol_name(leaf), Some("foo"));

    let outer = &sample.frames[1];
    assert_eq!(outer.address, 0x3000);
    assert!(outer.is_unresolved());
    assert_eq!(trace.frame_label(outer), "0x3000");
}

#[test]
fn test_parsing_is_deterministic() {
    let bytes = foo_capture();
    let first = parse_bytes(&bytes, &strict()).unwrap();
    let second = parse_bytes(&bytes, &strict()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_parallel_decode_matches_sequential() {
    let mut writer = StreamWriter::new()
        .meta(203, &["cpu-cycles"], "")
        .file(1, "/system/lib64/libc.so", &[("memcpy", 0x0, 0x40), ("strlen", 0x40, 0x40)])
        .thread(10, 10, "main")
        .map(10, 0x7000, 0x8000, Some(1), 0);
    for i in 0..200u64 {
        writer = writer.sample(i * 10, 10, i, &[0x7000 + (i % 0x80), 0x9000]);
    }
    let bytes = writer.finish();

    let sequential = parse_bytes(&bytes, &strict()).unwrap();
    for batch_size in [1, 2, 7, 64, 1024] {
        let parallel = parse_bytes(
            &bytes,
            &strict()
                .with_parallel_decode(true)
                .with_decode_batch_size(batch_size),
        )
        .unwrap();
        assert_eq!(parallel, sequential, "batch size {}", batch_size);
    }
    assert_eq!(sequential.sample_count(), 200);
}

#[test]
fn test_huge_batch_size_matches_sequential() {
    let bytes = foo_capture();
    let sequential = parse_bytes(&bytes, &strict()).unwrap();

    let clamped = parse_bytes(
        &bytes,
        &strict()
            .with_parallel_decode(true)
            .with_decode_batch_size(usize::MAX),
    )
    .unwrap();
    assert_eq!(clamped, sequential);

    // Set directly, bypassing the clamp
    let mut options = strict().with_parallel_decode(true);
    options.decode_batch_size = usize::MAX;
    let unclamped = parse_bytes(&bytes, &options).unwrap();
    assert_eq!(unclamped, sequential);
}

#[test]
fn test_parallel_decode_reports_first_error_in_stream_order() {
    let mut bytes = StreamWriter::new()
        .thread(1, 1, "main")
        .sample(10, 1, 1, &[])
        .sample(20, 99, 1, &[])
        .sample(30, 1, 1, &[])
        .finish();
    // Truncated trailing record after the semantic error
    bytes.extend_from_slice(&[5, 0, 100, 0, 0, 0, 1]);

    let sequential = parse_bytes(&bytes, &strict()).unwrap_err();
    assert_eq!(sequential.kind(), ErrorKind::UnknownThreadReference);

    for batch_size in [1, 3, 100] {
        let parallel = parse_bytes(
            &bytes,
            &strict()
                .with_parallel_decode(true)
                .with_decode_batch_size(batch_size),
        )
        .unwrap_err();
        assert_eq!(parallel.kind(), sequential.kind());
        assert_eq!(parallel.offset(), sequential.offset());
    }
}

#[test]
fn test_duplicate_file_id_is_fatal() {
    let writer = StreamWriter::new().file(3, "/a.so", &[]);
    let offset = writer.offset();
    let bytes = writer.file(3, "/b.so", &[]).finish();

    let err = parse_bytes(&bytes, &strict()).unwrap_err();
    assert!(matches!(
        err,
        TraceError::DuplicateFileId { file_id: 3, offset: at } if at == offset
    ));
}

#[test]
fn test_duplicate_thread_id_is_fatal() {
    let bytes = StreamWriter::new()
        .thread(5, 5, "main")
        .thread(5, 5, "main")
        .finish();

    let err = parse_bytes(&bytes, &ParseOptions::default().best_effort()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateThreadId);
}

#[test]
fn test_unknown_thread_strict_vs_best_effort() {
    let writer = StreamWriter::new()
        .thread(1, 1, "main")
        .sample(10, 1, 1, &[]);
    let offset = writer.offset();
    let bytes = writer
        .sample(20, 2, 1, &[])
        .sample(30, 1, 1, &[])
        .finish();

    let err = parse_bytes(&bytes, &strict()).unwrap_err();
    assert!(matches!(
        err,
        TraceError::UnknownThreadReference { thread_id: 2, offset: at } if at == offset
    ));

    let trace = parse_bytes(&bytes, &ParseOptions::default().best_effort()).unwrap();
    assert_eq!(trace.sample_count(), 2);
    assert_eq!(trace.stats().dropped_samples, 1);
    assert!(trace.samples().iter().all(|sample| sample.thread_id == 1));
}

#[test]
fn test_timestamps_must_not_decrease() {
    let bytes = StreamWriter::new()
        .thread(1, 1, "main")
        .sample(10, 1, 1, &[])
        .sample(10, 1, 1, &[])
        .sample(5, 1, 1, &[])
        .finish();

    let err = parse_bytes(&bytes, &strict()).unwrap_err();
    assert!(matches!(
        err,
        TraceError::NonMonotonicTimestamp {
            previous: 10,
            timestamp: 5,
            ..
        }
    ));

    let trace = parse_bytes(&bytes, &ParseOptions::default().best_effort()).unwrap();
    assert_eq!(trace.sample_count(), 3);
    assert_eq!(trace.stats().non_monotonic_samples, 1);
}

#[test]
fn test_strict_timestamps_are_non_decreasing() {
    let trace = parse_bytes(&foo_capture(), &strict()).unwrap();
    let timestamps: Vec<u64> = trace.samples().iter().map(|s| s.timestamp).collect();
    assert!(timestamps.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[test]
fn test_capture_without_samples() {
    let bytes = StreamWriter::new()
        .meta(2, &["cpu-clock"], "com.example.app")
        .thread(1, 1, "main")
        .file(1, "/a.so", &[])
        .finish();

    let trace = parse_bytes(&bytes, &strict()).unwrap();
    assert_eq!(trace.sample_count(), 0);
    assert!(trace.samples().is_empty());
    assert_eq!(trace.time_range(), None);
    assert_eq!(trace.threads().len(), 1);
    assert_eq!(trace.files().len(), 1);
}

#[test]
fn test_record_count_too_many() {
    let writer = StreamWriter::new().meta(1, &[], "").thread(1, 1, "main");
    let extra_offset = writer.offset();
    let bytes = writer.thread(2, 1, "worker").finish();

    let err = parse_bytes(&bytes, &strict()).unwrap_err();
    assert_eq!(
        (err.kind(), err.offset()),
        (ErrorKind::RecordCountMismatch, Some(extra_offset))
    );
}

#[test]
fn test_record_count_too_few() {
    let bytes = StreamWriter::new()
        .meta(3, &[], "")
        .thread(1, 1, "main")
        .thread(2, 1, "worker")
        .finish();

    let err = parse_bytes(&bytes, &strict()).unwrap_err();
    match err {
        TraceError::RecordCountMismatch {
            declared,
            actual,
            offset,
        } => {
            assert_eq!(declared, 3);
            assert_eq!(actual, 2);
            assert_eq!(offset, bytes.len() as u64);
        }
        other => panic!("expected RecordCountMismatch, got {:?}", other),
    }
}

#[test]
fn test_meta_must_come_first() {
    let bytes = StreamWriter::new()
        .thread(1, 1, "main")
        .meta(1, &[], "")
        .finish();

    let err = parse_bytes(&bytes, &strict()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MisplacedHeader);
}

#[test]
fn test_map_before_file_stays_unresolved_until_file_arrives() {
    let bytes = StreamWriter::new()
        .thread(1, 1, "main")
        .map(1, 0x1000, 0x2000, Some(4), 0)
        .sample(10, 1, 1, &[0x1010])
        .file(4, "/late.so", &[("late", 0x0, 0x100)])
        .sample(20, 1, 1, &[0x1010])
        .finish();

    let trace = parse_bytes(&bytes, &strict()).unwrap();
    assert!(trace.samples()[0].frames[0].is_unresolved());
    assert_eq!(trace.symbol_name(&trace.samples()[1].frames[0]), Some("late"));
}

#[test]
fn test_anonymous_map_is_unresolved() {
    let bytes = StreamWriter::new()
        .thread(1, 1, "main")
        .map(1, 0x1000, 0x2000, None, 0)
        .sample(10, 1, 1, &[0x1800])
        .finish();

    let trace = parse_bytes(&bytes, &strict()).unwrap();
    assert!(trace.samples()[0].frames[0].is_unresolved());
    assert_eq!(trace.stats().unresolved_frames, 1);
}

#[test]
fn test_meta_lost_and_range_accessors() {
    let trace = parse_bytes(&foo_capture(), &strict()).unwrap();

    let meta = trace.meta().unwrap();
    assert_eq!(meta.event_types, vec!["cpu-clock".to_string()]);
    assert_eq!(meta.app_package_name.as_deref(), Some("com.example.app"));

    assert_eq!(trace.sample_count(), 2);
    assert_eq!(trace.lost_sample_count(), 1);
    assert_eq!(trace.recorded_sample_count(), 3);
    assert_eq!(trace.time_range(), Some((1_000, 2_000)));
    assert_eq!(trace.main_thread_id(), Some(100));
}

#[test]
fn test_main_thread_prefers_busiest_process() {
    let bytes = StreamWriter::new()
        .thread(10, 10, "daemon")
        .thread(20, 20, "app")
        .thread(21, 20, "RenderThread")
        .sample(1, 10, 1, &[])
        .sample(2, 21, 1, &[])
        .sample(3, 21, 1, &[])
        .finish();

    let trace = parse_bytes(&bytes, &strict()).unwrap();
    assert_eq!(trace.main_thread_id(), Some(20));
    assert_eq!(trace.samples_for_thread(21).count(), 2);
}

#[test]
fn test_parse_file_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("perf.data");
    std::fs::write(&path, foo_capture()).unwrap();

    let from_disk = parse_file(&path, &strict()).unwrap();
    let from_memory = parse_bytes(&foo_capture(), &strict()).unwrap();
    assert_eq!(from_disk, from_memory);
}
