//! Block statistics over a filtered world.

use crate::document::{ChunkDocument, Section, SECTION_LAYER_BLOCKS};
use crate::error::{DecodeError, WalkError};
use crate::filter::{AxisRange, SpatialFilter};
use crate::region::Region;
use crate::walker::{ChunkVisitor, WorldWalker};
use log::info;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::path::Path;

/// Legacy numeric block id.
pub type BlockId = u8;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum CountRuleKind {
    /// Counts blocks with one of the ids.
    Include(BTreeSet<BlockId>),
    /// Counts blocks with none of the ids.
    Exclude(BTreeSet<BlockId>),
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CountRule {
    pub name: String,
    pub kind: CountRuleKind,
}

impl CountRule {
    pub fn include<I: IntoIterator<Item = BlockId>>(name: &str, ids: I) -> Self {
        CountRule {
            name: name.to_string(),
            kind: CountRuleKind::Include(ids.into_iter().collect()),
        }
    }

    pub fn exclude<I: IntoIterator<Item = BlockId>>(name: &str, ids: I) -> Self {
        CountRule {
            name: name.to_string(),
            kind: CountRuleKind::Exclude(ids.into_iter().collect()),
        }
    }

    fn count(&self, histogram: &Histogram, total: u64) -> u64 {
        match &self.kind {
            CountRuleKind::Include(ids) => histogram.sum(ids),
            CountRuleKind::Exclude(ids) => total - histogram.sum(ids),
        }
    }
}

/// Occurrences of every block id in a slice of a section.
struct Histogram([u64; 256]);

impl Histogram {
    fn new(blocks: &[BlockId]) -> Self {
        let mut occurrences = [0u64; 256];

        for &block in blocks {
            occurrences[block as usize] += 1;
        }

        Histogram(occurrences)
    }

    fn sum(&self, ids: &BTreeSet<BlockId>) -> u64 {
        ids.iter().map(|&id| self.0[id as usize]).sum()
    }
}

/// Per rule totals, keyed by rule name.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct BlockCounts {
    counts: BTreeMap<String, u64>,
}

impl BlockCounts {
    pub fn get(&self, name: &str) -> u64 {
        self.counts.get(name).copied().unwrap_or(0)
    }

    pub fn add(&mut self, name: &str, count: u64) {
        *self.counts.entry(name.to_string()).or_insert(0) += count;
    }

    pub fn merge(mut self, other: BlockCounts) -> BlockCounts {
        for (name, count) in other.counts {
            *self.counts.entry(name).or_insert(0) += count;
        }

        self
    }

    /// One line per rule in rule order, names padded and counts right aligned.
    pub fn report(&self, rules: &[CountRule]) -> String {
        let counts: Vec<_> = rules
            .iter()
            .map(|rule| (rule.name.as_str(), group_thousands(self.get(&rule.name))))
            .collect();

        let name_width = counts.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
        let count_width = counts.iter().map(|(_, count)| count.len()).max().unwrap_or(0);

        counts
            .iter()
            .map(|(name, count)| {
                format!(
                    "{:<name_width$} : {:>count_width$}\n",
                    name,
                    count,
                    name_width = name_width,
                    count_width = count_width
                )
            })
            .collect()
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    grouped
}

/// Tallies block ids of each chunk against named rules.
#[derive(Debug, Clone)]
pub struct BlockCounter {
    rules: Vec<CountRule>,
    /// Block heights taken into account.
    vertical: AxisRange,
}

impl BlockCounter {
    pub fn new(rules: Vec<CountRule>) -> Self {
        BlockCounter {
            rules,
            vertical: AxisRange::Unbounded,
        }
    }

    pub fn with_vertical(mut self, vertical: AxisRange) -> Self {
        self.vertical = vertical;
        self
    }

    pub fn rules(&self) -> &[CountRule] {
        &self.rules
    }

    /// Counts with every rule at zero.
    pub fn empty_counts(&self) -> BlockCounts {
        let mut counts = BlockCounts::default();

        for rule in &self.rules {
            counts.add(&rule.name, 0);
        }

        counts
    }

    pub fn count_document<D: ChunkDocument>(&self, document: &D) -> Result<BlockCounts, DecodeError> {
        let mut counts = self.empty_counts();

        for section in document.sections()? {
            self.count_section(&section, &mut counts);
        }

        Ok(counts)
    }

    fn count_section(&self, section: &Section, counts: &mut BlockCounts) {
        let section_range = AxisRange::bounded(section.min_block_y(), section.max_block_y());

        let (lo, hi) = match section_range.intersect(&self.vertical) {
            Some(AxisRange::Bounded { lo, hi }) => (lo, hi),
            _ => return,
        };

        // Blocks are stored layer by layer, Y being the slowest index.
        let first_layer = (lo - section.min_block_y()) as usize;
        let last_layer = (hi - section.min_block_y()) as usize;
        let start = (first_layer * SECTION_LAYER_BLOCKS).min(section.blocks.len());
        let end = ((last_layer + 1) * SECTION_LAYER_BLOCKS).min(section.blocks.len());

        let blocks = &section.blocks[start..end];
        let histogram = Histogram::new(blocks);

        for rule in &self.rules {
            counts.add(&rule.name, rule.count(&histogram, blocks.len() as u64));
        }
    }
}

impl ChunkVisitor for BlockCounter {
    type Accumulator = BlockCounts;

    fn visit_chunk(
        &mut self,
        region: &mut Region<File>,
        path: &Path,
        slot: usize,
        accumulator: BlockCounts,
    ) -> Result<BlockCounts, WalkError> {
        let record = match region.read_chunk(slot).map_err(WalkError::region(path))? {
            Some(record) => record,
            None => return Ok(accumulator),
        };

        let decode_error = |decode_error| WalkError::DecodeError {
            path: path.to_path_buf(),
            slot,
            decode_error,
        };

        let document = record.decode().map_err(decode_error)?;
        let counts = self.count_document(&document).map_err(decode_error)?;

        Ok(accumulator.merge(counts))
    }
}

/// Counts blocks of every chunk the filter selects in `world`.
pub fn count_blocks(
    world: &WorldWalker,
    filter: &SpatialFilter,
    counter: &mut BlockCounter,
) -> Result<BlockCounts, WalkError> {
    let initial = counter.empty_counts();
    let counts = world.walk(filter, initial, counter)?;

    info!(
        target: "anvil-world",
        "Counted {} rules over {}",
        counter.rules().len(),
        world.folder_path().display()
    );

    Ok(counts)
}
