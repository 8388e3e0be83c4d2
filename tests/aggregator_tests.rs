mod common;

use common::{foo_capture, StreamWriter};
use pretty_assertions::assert_eq;
use simpleperf_trace::aggregator::call_tree::{build_call_tree, build_call_trees, CallNode};
use simpleperf_trace::aggregator::metrics::{
    calculate_hot_paths, calculate_weight_distribution, create_hot_path,
};
use simpleperf_trace::aggregator::stack_builder::{
    build_collapsed_stacks, stack_for_sample, CollapsedStack, StackWeight,
};
use simpleperf_trace::trace::summarize;
use simpleperf_trace::{parse_bytes, ParseOptions};

#[test]
fn test_stacks_start_with_thread_name() {
    let trace = parse_bytes(&foo_capture(), &ParseOptions::default()).unwrap();
    let stacks = build_collapsed_stacks(&trace, StackWeight::Samples);

    let lines: Vec<String> = stacks.iter().map(|s| s.to_line()).collect();
    assert_eq!(
        lines,
        vec![
            "example.app;0x3000;foo 1".to_string(),
            "example.app;foo 1".to_string(),
        ]
    );
    assert!(stacks.iter().all(|s| s.stack.starts_with("example.app")));
}

#[test]
fn test_event_count_weighting() {
    let trace = parse_bytes(&foo_capture(), &ParseOptions::default()).unwrap();
    let stacks = build_collapsed_stacks(&trace, StackWeight::EventCount);

    assert_eq!(stacks.len(), 2);
    assert!(stacks.iter().all(|s| s.weight == 250_000));
}

#[test]
fn test_identical_stacks_aggregate() {
    let bytes = StreamWriter::new()
        .file(1, "/libapp.so", &[("run", 0x0, 0x100)])
        .thread(7, 7, "worker")
        .map(7, 0x4000, 0x5000, Some(1), 0)
        .sample(1, 7, 5, &[0x4010])
        .sample(2, 7, 5, &[0x4020])
        .sample(3, 7, 5, &[0x4200])
        .finish();

    let trace = parse_bytes(&bytes, &ParseOptions::default()).unwrap();
    let stacks = build_collapsed_stacks(&trace, StackWeight::Samples);

    assert_eq!(stacks[0], CollapsedStack::new("worker;run".to_string(), 2, Some(0x4010)));
    // Mapped but outside every symbol: labeled by path and file offset
    assert_eq!(stacks[1].stack, "worker;/libapp.so+0x200");
}

#[test]
fn test_stack_for_sample_without_frames() {
    let bytes = StreamWriter::new()
        .thread(3, 3, "idle")
        .sample(1, 3, 1, &[])
        .finish();
    let trace = parse_bytes(&bytes, &ParseOptions::default()).unwrap();

    assert_eq!(stack_for_sample(&trace, &trace.samples()[0]), "idle");
}

#[test]
fn test_calculate_hot_paths() {
    let stacks = vec![
        CollapsedStack::new("main;execute".to_string(), 5000, Some(0x100)),
        CollapsedStack::new("main;storage".to_string(), 3000, Some(0x200)),
        CollapsedStack::new("main;compute".to_string(), 2000, Some(0x300)),
    ];

    let hot_paths = calculate_hot_paths(&stacks, 10000, 2);

    assert_eq!(hot_paths.len(), 2);
    assert_eq!(hot_paths[0].stack, "main;execute");
    assert_eq!(hot_paths[0].weight, 5000);
    assert_eq!(hot_paths[0].percentage, 50.0);
}

#[test]
fn test_calculate_weight_distribution() {
    let stacks = vec![
        CollapsedStack::new("stack1".to_string(), 8500, Some(0x1)),
        CollapsedStack::new("stack2".to_string(), 1000, Some(0x2)),
        CollapsedStack::new("stack3".to_string(), 250, Some(0x3)),
        CollapsedStack::new("stack4".to_string(), 250, Some(0x4)),
    ];

    let dist = calculate_weight_distribution(&stacks);

    assert_eq!(dist.total_weight, 10000);
    assert_eq!(dist.stack_count, 4);
    assert_eq!(dist.mean_weight_per_stack, 2500);
    assert!(dist.is_highly_concentrated());
}

#[test]
fn test_create_hot_path() {
    let stack = CollapsedStack::new("test;path".to_string(), 2500, Some(0x42));
    let hot_path = create_hot_path(&stack, 10000);

    assert_eq!(hot_path.stack, "test;path");
    assert_eq!(hot_path.weight, 2500);
    assert_eq!(hot_path.percentage, 25.0);
    assert_eq!(hot_path.leaf_address.as_deref(), Some("0x42"));
}

#[test]
fn test_summarize_worked_example() {
    let trace = parse_bytes(&foo_capture(), &ParseOptions::default()).unwrap();
    let summary = summarize(&trace, "perf.data", 10, StackWeight::Samples);

    assert_eq!(summary.source, "perf.data");
    assert_eq!(summary.sample_count, 2);
    assert_eq!(summary.lost_sample_count, 1);
    assert_eq!(summary.thread_count, 1);
    assert_eq!(summary.file_count, 1);
    assert_eq!(summary.main_thread_id, Some(100));
    assert_eq!(summary.threads[0].sample_count, 2);
    assert_eq!(summary.hot_paths.len(), 2);
    assert_eq!(summary.hot_paths[0].percentage, 50.0);
    assert_eq!(summary.stats.symbolized_frames, 2);
    assert_eq!(summary.stats.unresolved_frames, 1);
    assert!(summary.to_text().contains("Hot paths:"));
}

fn call_tree_capture() -> Vec<u8> {
    StreamWriter::new()
        .file(1, "/libapp.so", &[("main", 0x0, 0x100), ("draw", 0x100, 0x100), ("layout", 0x200, 0x100)])
        .thread(7, 7, "app")
        .thread(8, 7, "RenderThread")
        .map(7, 0x4000, 0x5000, Some(1), 0)
        .sample(10, 7, 1, &[0x4110, 0x4010])
        .sample(20, 8, 1, &[0x4010])
        .sample(30, 7, 1, &[0x4210, 0x4010])
        .sample(40, 7, 1, &[0x4120, 0x4010])
        .finish()
}

fn assert_depths(node: &CallNode) {
    for child in &node.children {
        assert_eq!(child.depth, node.depth + 1);
        assert_depths(child);
    }
}

#[test]
fn test_call_tree_root_is_thread_name() {
    let trace = parse_bytes(&call_tree_capture(), &ParseOptions::default()).unwrap();
    let trees = build_call_trees(&trace, StackWeight::Samples);

    let roots: Vec<(u32, &str)> = trees
        .iter()
        .map(|tree| (tree.thread_id, tree.root.label.as_str()))
        .collect();
    assert_eq!(roots, vec![(7, "app"), (8, "RenderThread")]);
    assert!(trees.iter().all(|tree| tree.root.depth == 0 && tree.process_id == 7));
}

#[test]
fn test_call_tree_depths_are_coherent() {
    let trace = parse_bytes(&call_tree_capture(), &ParseOptions::default()).unwrap();
    let tree = build_call_tree(&trace, 7, StackWeight::Samples).unwrap();

    assert_depths(&tree.root);

    let mut depth = 0;
    let mut node = Some(&tree.root);
    while let Some(current) = node {
        assert_eq!(current.depth, depth);
        depth += 1;
        node = current.first_child();
    }
    assert_eq!(tree.root.max_depth(), 2);
}

#[test]
fn test_call_tree_merges_children_by_label() {
    let trace = parse_bytes(&call_tree_capture(), &ParseOptions::default()).unwrap();
    let tree = build_call_tree(&trace, 7, StackWeight::Samples).unwrap();

    assert_eq!(tree.root.children.len(), 1);
    let main = tree.root.child("main").unwrap();
    assert_eq!(main.sample_count, 3);
    assert_eq!(main.self_weight, 0);

    let labels: Vec<&str> = main.children.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(labels, vec!["draw", "layout"]);

    let draw = main.child("draw").unwrap();
    assert_eq!(draw.sample_count, 2);
    assert_eq!(draw.self_weight, 2);
    assert_eq!(draw.address, Some(0x4110));
    assert_eq!(tree.node_count(), 4);
}

#[test]
fn test_call_tree_spans_follow_sample_timestamps() {
    let trace = parse_bytes(&call_tree_capture(), &ParseOptions::default()).unwrap();
    let tree = build_call_tree(&trace, 7, StackWeight::Samples).unwrap();

    assert_eq!((tree.root.start, tree.root.end), (10, 40));
    let main = tree.root.child("main").unwrap();
    assert_eq!((main.start, main.end), (10, 40));
    let draw = main.child("draw").unwrap();
    assert_eq!((draw.start, draw.end), (10, 40));
    let layout = main.child("layout").unwrap();
    assert_eq!((layout.start, layout.end), (30, 30));

    // Children never outlive their parent
    for node in tree.root.walk() {
        for child in &node.children {
            assert!(node.start <= child.start && child.end <= node.end);
        }
    }
}

#[test]
fn test_call_tree_for_unsampled_thread_is_none() {
    let bytes = StreamWriter::new().thread(1, 1, "quiet").finish();
    let trace = parse_bytes(&bytes, &ParseOptions::default()).unwrap();

    assert!(build_call_tree(&trace, 1, StackWeight::Samples).is_none());
    assert!(build_call_tree(&trace, 2, StackWeight::Samples).is_none());
    assert!(build_call_trees(&trace, StackWeight::Samples).is_empty());
}
