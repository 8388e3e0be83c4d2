//! Single-pass trace builder.
//!
//! Folds the decoded record stream, in arrival order, into a `Trace`. Frame
//! addresses are resolved against the file and map tables as they stand when
//! the sample arrives, so records must never be reordered before this stage.

use super::address_space::AddressSpace;
use crate::parser::records::{
    FileRecord, LostRecord, MapRecord, MetaRecord, Record, SampleRecord, ThreadRecord,
};
use crate::trace::schema::{BuildStats, FrameResolution, ResolvedFrame, ResolvedSample, Trace};
use crate::utils::config::{ParseMode, ParseOptions};
use crate::utils::error::TraceError;
use log::{debug, trace};
use std::collections::{BTreeMap, HashMap};

/// Running tables for one parse
#[derive(Debug)]
pub struct TraceBuilder {
    options: ParseOptions,
    meta: Option<MetaRecord>,
    files: BTreeMap<u32, FileRecord>,
    threads: BTreeMap<u32, ThreadRecord>,
    address_spaces: HashMap<u32, AddressSpace>,
    samples: Vec<ResolvedSample>,
    lost: LostRecord,
    last_timestamp: Option<u64>,
    stats: BuildStats,
}

impl TraceBuilder {
    pub fn new(options: ParseOptions) -> Self {
        Self {
            options,
            meta: None,
            files: BTreeMap::new(),
            threads: BTreeMap::new(),
            address_spaces: HashMap::new(),
            samples: Vec::new(),
            lost: LostRecord::default(),
            last_timestamp: None,
            stats: BuildStats::default(),
        }
    }

    /// Fold one record into the tables
    ///
    /// `offset` is the stream offset of the record and is reported by any
    /// error this record triggers.
    ///
    /// # Errors
    /// * `TraceError::MisplacedHeader` - meta record after the first record
    /// * `TraceError::RecordCountMismatch` - more records than the header declared
    /// * `TraceError::DuplicateFileId` / `TraceError::DuplicateThreadId`
    /// * `TraceError::UnknownThreadReference` - strict mode only
    /// * `TraceError::NonMonotonicTimestamp` - strict mode only
    pub fn push(&mut self, record: Record, offset: u64) -> Result<(), TraceError> {
        self.stats.records += 1;
        trace!("Building {} record at offset {}", record.kind_name(), offset);

        if let Some(meta) = &self.meta {
            let after_header = self.stats.records - 1;
            if after_header > meta.expected_record_count {
                return Err(TraceError::RecordCountMismatch {
                    declared: meta.expected_record_count,
                    actual: after_header,
                    offset,
                });
            }
        }

        match record {
            Record::Meta(meta) => self.add_meta(meta, offset),
            Record::File(file) => self.add_file(file, offset),
            Record::Thread(thread) => self.add_thread(thread, offset),
            Record::Map(map) => {
                self.add_map(map);
                Ok(())
            }
            Record::Sample(sample) => self.add_sample(sample, offset),
            Record::Lost(lost) => {
                self.lost.sample_count = self.lost.sample_count.saturating_add(lost.sample_count);
                self.lost.lost_count = self.lost.lost_count.saturating_add(lost.lost_count);
                Ok(())
            }
            Record::Unrecognized { discriminant, .. } => {
                debug!(
                    "Skipping unrecognized record discriminant {} at offset {}",
                    discriminant, offset
                );
                self.stats.unrecognized_records += 1;
                Ok(())
            }
        }
    }

    /// Finalize the trace once the record stream is exhausted
    ///
    /// `end_offset` is the stream offset just past the last record.
    ///
    /// # Errors
    /// * `TraceError::RecordCountMismatch` - fewer records than the header declared
    pub fn finish(self, end_offset: u64) -> Result<Trace, TraceError> {
        if let Some(meta) = &self.meta {
            let after_header = self.stats.records - 1;
            if after_header != meta.expected_record_count {
                return Err(TraceError::RecordCountMismatch {
                    declared: meta.expected_record_count,
                    actual: after_header,
                    offset: end_offset,
                });
            }
        }

        debug!(
            "Built trace: {} samples, {} threads, {} files ({} dropped, {} unresolved frames)",
            self.samples.len(),
            self.threads.len(),
            self.files.len(),
            self.stats.dropped_samples,
            self.stats.unresolved_frames
        );

        Ok(Trace {
            meta: self.meta,
            samples: self.samples,
            threads: self.threads,
            files: self.files,
            lost: self.lost,
            stats: self.stats,
        })
    }

    fn add_meta(&mut self, meta: MetaRecord, offset: u64) -> Result<(), TraceError> {
        if self.stats.records != 1 {
            return Err(TraceError::MisplacedHeader { offset });
        }
        debug!(
            "Header declares {} records, event types {:?}",
            meta.expected_record_count, meta.event_types
        );
        self.meta = Some(meta);
        Ok(())
    }

    fn add_file(&mut self, file: FileRecord, offset: u64) -> Result<(), TraceError> {
        if self.files.contains_key(&file.file_id) {
            return Err(TraceError::DuplicateFileId {
                file_id: file.file_id,
                offset,
            });
        }
        self.files.insert(file.file_id, file);
        Ok(())
    }

    fn add_thread(&mut self, thread: ThreadRecord, offset: u64) -> Result<(), TraceError> {
        if self.threads.contains_key(&thread.thread_id) {
            return Err(TraceError::DuplicateThreadId {
                thread_id: thread.thread_id,
                offset,
            });
        }
        self.threads.insert(thread.thread_id, thread);
        Ok(())
    }

    fn add_map(&mut self, map: MapRecord) {
        self.address_spaces
            .entry(map.process_id)
            .or_default()
            .insert(map);
    }

    fn add_sample(&mut self, sample: SampleRecord, offset: u64) -> Result<(), TraceError> {
        let best_effort = self.options.mode == ParseMode::BestEffort;

        let Some(process_id) = self
            .threads
            .get(&sample.thread_id)
            .map(|thread| thread.process_id)
        else {
            if best_effort {
                debug!(
                    "Dropping sample at offset {} for unknown thread {}",
                    offset, sample.thread_id
                );
                self.stats.dropped_samples += 1;
                return Ok(());
            }
            return Err(TraceError::UnknownThreadReference {
                thread_id: sample.thread_id,
                offset,
            });
        };

        if let Some(previous) = self.last_timestamp {
            if sample.timestamp < previous {
                if !best_effort {
                    return Err(TraceError::NonMonotonicTimestamp {
                        previous,
                        timestamp: sample.timestamp,
                        offset,
                    });
                }
                debug!(
                    "Accepting sample at offset {} with timestamp {} < {}",
                    offset, sample.timestamp, previous
                );
                self.stats.non_monotonic_samples += 1;
            }
        }
        self.last_timestamp = Some(sample.timestamp);

        let frames = sample
            .frames
            .iter()
            .map(|&address| self.resolve_frame(process_id, address))
            .collect::<Vec<_>>();

        for frame in &frames {
            match frame.resolution {
                FrameResolution::Symbol { .. } => self.stats.symbolized_frames += 1,
                FrameResolution::File { .. } => self.stats.file_only_frames += 1,
                FrameResolution::Unresolved => self.stats.unresolved_frames += 1,
            }
        }

        self.samples.push(ResolvedSample {
            timestamp: sample.timestamp,
            thread_id: sample.thread_id,
            process_id,
            event_count: sample.event_count,
            frames,
        });
        Ok(())
    }

    /// Resolve one address against the tables as they stand right now
    fn resolve_frame(&self, process_id: u32, address: u64) -> ResolvedFrame {
        match self.locate(process_id, address) {
            Some(resolution) => ResolvedFrame {
                address,
                resolution,
            },
            None => ResolvedFrame::unresolved(address),
        }
    }

    fn locate(&self, process_id: u32, address: u64) -> Option<FrameResolution> {
        let mapping = self.address_spaces.get(&process_id)?.lookup(address)?;
        let file_id = mapping.file_id()?;
        let file = self.files.get(&file_id)?;
        let file_offset = mapping.file_offset(address)?;

        Some(match file.symbol_index_for(file_offset) {
            Some(symbol_index) => FrameResolution::Symbol {
                file_id,
                symbol_index,
                offset: file_offset - file.symbols[symbol_index].start_offset,
            },
            None => FrameResolution::File {
                file_id,
                file_offset,
            },
        })
    }
}
