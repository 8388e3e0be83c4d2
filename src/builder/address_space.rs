//! Per-process address space built from map records.
//!
//! Mappings are never removed. A later mapping supersedes earlier ones on
//! exactly the addresses it overlaps; whatever an earlier mapping still covers
//! outside the new range stays active and keeps resolving exactly as before.

use crate::parser::records::MapRecord;
use std::collections::BTreeMap;

/// The still-active part `[start_addr, end_addr)` of a map record
///
/// `origin` is the record as it arrived. File offsets are always computed
/// against it, so carving a mapping never changes how its remaining
/// addresses resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveMapping {
    pub start_addr: u64,
    pub end_addr: u64,
    pub origin: MapRecord,
}

impl ActiveMapping {
    fn whole(map: MapRecord) -> Self {
        Self {
            start_addr: map.start_addr,
            end_addr: map.end_addr,
            origin: map,
        }
    }

    pub fn file_id(&self) -> Option<u32> {
        self.origin.file_id
    }

    pub fn contains(&self, address: u64) -> bool {
        self.start_addr <= address && address < self.end_addr
    }

    /// Offset of `address` within the mapped file, `None` on overflow
    pub fn file_offset(&self, address: u64) -> Option<u64> {
        if !self.contains(address) {
            return None;
        }
        (address - self.origin.start_addr).checked_add(self.origin.page_offset)
    }
}

/// Non-overlapping set of active mappings keyed by start address
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressSpace {
    mappings: BTreeMap<u64, ActiveMapping>,
}

impl AddressSpace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `map`, carving it out of any mapping it overlaps
    pub fn insert(&mut self, map: MapRecord) {
        let overlapped: Vec<u64> = self
            .mappings
            .range(..map.end_addr)
            .rev()
            .take_while(|(_, existing)| existing.end_addr > map.start_addr)
            .map(|(start, _)| *start)
            .collect();

        for start in overlapped {
            let Some(old) = self.mappings.remove(&start) else {
                continue;
            };

            if old.start_addr < map.start_addr {
                self.mappings.insert(
                    old.start_addr,
                    ActiveMapping {
                        end_addr: map.start_addr,
                        ..old
                    },
                );
            }

            if old.end_addr > map.end_addr {
                self.mappings.insert(
                    map.end_addr,
                    ActiveMapping {
                        start_addr: map.end_addr,
                        ..old
                    },
                );
            }
        }

        self.mappings.insert(map.start_addr, ActiveMapping::whole(map));
    }

    /// Mapping whose `[start_addr, end_addr)` contains `address`
    pub fn lookup(&self, address: u64) -> Option<&ActiveMapping> {
        self.mappings
            .range(..=address)
            .next_back()
            .map(|(_, mapping)| mapping)
            .filter(|mapping| address < mapping.end_addr)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Active mappings in address order
    pub fn iter(&self) -> impl Iterator<Item = &ActiveMapping> {
        self.mappings.values()
    }
}
