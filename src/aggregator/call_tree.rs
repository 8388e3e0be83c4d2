//! Per-thread call trees.
//!
//! Every thread with samples gets one tree. The root is labeled with the
//! thread name (depth 0); each sample walks its frames outermost first and
//! either reuses the child with the same label or adds a new one. A node's
//! time span runs from the first to the last sample that passed through it.

use super::stack_builder::StackWeight;
use crate::trace::schema::{ResolvedSample, Trace};
use log::debug;
use serde::{Deserialize, Serialize};

/// One node of a call tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallNode {
    /// Thread name for the root, frame label otherwise
    pub label: String,

    /// Address of the first frame seen at this node; `None` for the root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<u64>,

    /// Distance from the root
    pub depth: usize,

    /// Timestamp of the first sample through this node
    pub start: u64,

    /// Timestamp of the last sample through this node
    pub end: u64,

    /// Samples whose call chain passes through this node
    pub sample_count: u64,

    /// Weight of those samples
    pub weight: u64,

    /// Samples whose leaf frame is this node
    pub self_weight: u64,

    pub children: Vec<CallNode>,
}

impl CallNode {
    fn new(label: String, address: Option<u64>, depth: usize, timestamp: u64) -> Self {
        Self {
            label,
            address,
            depth,
            start: timestamp,
            end: timestamp,
            sample_count: 0,
            weight: 0,
            self_weight: 0,
            children: Vec::new(),
        }
    }

    fn record(&mut self, timestamp: u64, weight: u64) {
        self.start = self.start.min(timestamp);
        self.end = self.end.max(timestamp);
        self.sample_count += 1;
        self.weight = self.weight.saturating_add(weight);
    }

    pub fn child(&self, label: &str) -> Option<&CallNode> {
        self.children.iter().find(|child| child.label == label)
    }

    pub fn first_child(&self) -> Option<&CallNode> {
        self.children.first()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Deepest depth reached below (and including) this node
    pub fn max_depth(&self) -> usize {
        self.children
            .iter()
            .map(CallNode::max_depth)
            .max()
            .unwrap_or(self.depth)
    }

    /// Pre-order walk over this node and its descendants
    pub fn walk(&self) -> Vec<&CallNode> {
        let mut nodes = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            nodes.push(node);
            stack.extend(node.children.iter().rev());
        }
        nodes
    }
}

/// Call tree of one thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallTree {
    pub thread_id: u32,
    pub process_id: u32,
    pub root: CallNode,
}

impl CallTree {
    pub fn node_count(&self) -> usize {
        self.root.walk().len()
    }
}

/// Build the call tree of one thread
///
/// **Public** - used by `build_call_trees` and per-thread views
///
/// # Returns
/// `None` when the thread is unknown or has no samples
pub fn build_call_tree(trace: &Trace, thread_id: u32, weight: StackWeight) -> Option<CallTree> {
    let thread = trace.thread(thread_id)?;
    let mut samples = trace.samples_for_thread(thread_id).peekable();
    let first = samples.peek()?.timestamp;

    let mut root = CallNode::new(thread.name.clone(), None, 0, first);
    for sample in samples {
        insert_sample(&mut root, trace, sample, weight.of(sample));
    }

    Some(CallTree {
        thread_id,
        process_id: thread.process_id,
        root,
    })
}

/// Build one call tree per sampled thread, ordered by thread id
///
/// **Public** - main entry point for call tree building
pub fn build_call_trees(trace: &Trace, weight: StackWeight) -> Vec<CallTree> {
    let trees: Vec<CallTree> = trace
        .threads()
        .keys()
        .filter_map(|&thread_id| build_call_tree(trace, thread_id, weight))
        .collect();

    debug!("Built {} call trees", trees.len());

    trees
}

fn insert_sample(root: &mut CallNode, trace: &Trace, sample: &ResolvedSample, weight: u64) {
    root.record(sample.timestamp, weight);

    let mut node = root;
    // Frames are stored leaf first; the tree grows from the outermost frame
    for frame in sample.frames.iter().rev() {
        let label = trace.frame_label(frame);
        let index = match node.children.iter().position(|child| child.label == label) {
            Some(index) => index,
            None => {
                let depth = node.depth + 1;
                node.children
                    .push(CallNode::new(label, Some(frame.address), depth, sample.timestamp));
                node.children.len() - 1
            }
        };
        node = &mut node.children[index];
        node.record(sample.timestamp, weight);
    }

    node.self_weight = node.self_weight.saturating_add(weight);
}
