//! Include/exclude rectangle filters.
//!
//! A [`SpatialFilter`] is narrowed to each scope it is applied to with
//! [`SpatialFilter::intersect_with_rectangle`] and only rasterized at the leaf,
//! where later rules overwrite earlier ones cell by cell.

use crate::position::{BlockPosition, RegionPosition, CHUNK_SIDE_BLOCKS, REGION_SIDE_CHUNKS};
use bitvec::prelude::*;
use std::cmp;

/// Closed range of coordinates on one axis.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum AxisRange {
    Unbounded,
    Bounded { lo: i32, hi: i32 },
}

impl AxisRange {
    /// Range with endpoints in any order.
    pub fn bounded(a: i32, b: i32) -> AxisRange {
        AxisRange::Bounded {
            lo: cmp::min(a, b),
            hi: cmp::max(a, b),
        }
    }

    /// Builds a range from zero, one or two endpoints.
    ///
    /// No endpoints means unbounded, a single endpoint is a one unit range.
    pub fn from_endpoints(endpoints: &[i32]) -> Option<AxisRange> {
        match *endpoints {
            [] => Some(AxisRange::Unbounded),
            [single] => Some(AxisRange::bounded(single, single)),
            [a, b] => Some(AxisRange::bounded(a, b)),
            _ => None,
        }
    }

    /// Returns `None` when the ranges do not overlap.
    pub fn intersect(&self, other: &AxisRange) -> Option<AxisRange> {
        match (*self, *other) {
            (AxisRange::Unbounded, range) | (range, AxisRange::Unbounded) => Some(range),
            (
                AxisRange::Bounded { lo: lo1, hi: hi1 },
                AxisRange::Bounded { lo: lo2, hi: hi2 },
            ) => {
                let lo = cmp::max(lo1, lo2);
                let hi = cmp::min(hi1, hi2);

                if lo > hi {
                    None
                } else {
                    Some(AxisRange::Bounded { lo, hi })
                }
            }
        }
    }

    /// Converts a range of coarse units into the fine units they cover.
    pub fn scale(&self, unit: i32) -> AxisRange {
        match *self {
            AxisRange::Unbounded => AxisRange::Unbounded,
            AxisRange::Bounded { lo, hi } => AxisRange::Bounded {
                lo: lo.saturating_mul(unit),
                hi: hi.saturating_mul(unit).saturating_add(unit - 1),
            },
        }
    }

    /// Cells of a `grid`-wide axis starting at `origin` touched by this range.
    fn local_cells(&self, origin: i32, cell_size: i32, grid: usize) -> Option<(usize, usize)> {
        let last = grid as i64 - 1;

        match *self {
            AxisRange::Unbounded => Some((0, last as usize)),
            AxisRange::Bounded { lo, hi } => {
                let lo = (lo as i64 - origin as i64).div_euclid(cell_size as i64);
                let hi = (hi as i64 - origin as i64).div_euclid(cell_size as i64);

                if hi < 0 || lo > last {
                    return None;
                }

                Some((cmp::max(lo, 0) as usize, cmp::min(hi, last) as usize))
            }
        }
    }
}

/// Axis-aligned rectangle on the x/z plane.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct Rectangle {
    pub x: AxisRange,
    pub z: AxisRange,
}

impl Rectangle {
    pub fn new(x: AxisRange, z: AxisRange) -> Rectangle {
        Rectangle { x, z }
    }

    pub fn unbounded() -> Rectangle {
        Rectangle::new(AxisRange::Unbounded, AxisRange::Unbounded)
    }

    pub fn intersect(&self, other: &Rectangle) -> Option<Rectangle> {
        Some(Rectangle::new(
            self.x.intersect(&other.x)?,
            self.z.intersect(&other.z)?,
        ))
    }

    pub fn scale(&self, unit: i32) -> Rectangle {
        Rectangle::new(self.x.scale(unit), self.z.scale(unit))
    }
}

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum RuleKind {
    Include,
    Exclude,
}

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct FilterRule {
    pub kind: RuleKind,
    pub rect: Rectangle,
}

impl FilterRule {
    pub fn include(rect: Rectangle) -> FilterRule {
        FilterRule {
            kind: RuleKind::Include,
            rect,
        }
    }

    pub fn exclude(rect: Rectangle) -> FilterRule {
        FilterRule {
            kind: RuleKind::Exclude,
            rect,
        }
    }
}

/// Ordered rule list, coordinates in blocks.
#[derive(Debug, Eq, PartialEq, Clone, Default)]
pub struct SpatialFilter {
    rules: Vec<FilterRule>,
}

impl SpatialFilter {
    pub fn new(rules: Vec<FilterRule>) -> SpatialFilter {
        SpatialFilter { rules }
    }

    pub fn push(&mut self, rule: FilterRule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[FilterRule] {
        &self.rules
    }

    /// An empty filter selects nothing.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Clips every rule to `outer`, dropping rules that fall outside of it.
    pub fn intersect_with_rectangle(&self, outer: &Rectangle) -> SpatialFilter {
        let rules = self
            .rules
            .iter()
            .filter_map(|rule| {
                rule.rect.intersect(outer).map(|rect| FilterRule {
                    kind: rule.kind,
                    rect,
                })
            })
            .collect();

        SpatialFilter { rules }
    }

    /// Paints rules in order onto a `grid_size`×`grid_size` mask whose first
    /// cell starts at `base` and whose cells are `cell_size` blocks wide.
    pub fn rasterize(&self, base: BlockPosition, cell_size: i32, grid_size: usize) -> SelectionMask {
        debug_assert!(cell_size > 0, "Cell size must be positive");

        let mut mask = SelectionMask::new(grid_size);

        for rule in &self.rules {
            let x_cells = rule.rect.x.local_cells(base.x, cell_size, grid_size);
            let z_cells = rule.rect.z.local_cells(base.z, cell_size, grid_size);

            let ((x0, x1), (z0, z1)) = match (x_cells, z_cells) {
                (Some(x), Some(z)) => (x, z),
                _ => continue,
            };

            let selected = rule.kind == RuleKind::Include;

            for z in z0..=z1 {
                for x in x0..=x1 {
                    mask.set(x, z, selected);
                }
            }
        }

        mask
    }

    /// Chunk selection mask for one region, indexed by slot.
    pub fn rasterize_region(&self, position: RegionPosition) -> SelectionMask {
        self.rasterize(
            position.block_origin(),
            CHUNK_SIDE_BLOCKS,
            REGION_SIDE_CHUNKS as usize,
        )
    }
}

/// Square bitmap, one bit per cell, row-major by z.
#[derive(Debug, Clone)]
pub struct SelectionMask {
    grid_size: usize,
    bits: BitVec,
}

impl SelectionMask {
    pub fn new(grid_size: usize) -> SelectionMask {
        SelectionMask {
            grid_size,
            bits: bitvec![0; grid_size * grid_size],
        }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn set(&mut self, x: usize, z: usize, selected: bool) {
        self.bits.set(x + z * self.grid_size, selected);
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.bits[index]
    }

    pub fn is_cell_selected(&self, x: usize, z: usize) -> bool {
        self.bits[x + z * self.grid_size]
    }

    pub fn selected_count(&self) -> usize {
        (0..self.len()).filter(|&index| self.is_selected(index)).count()
    }
}

impl PartialEq for SelectionMask {
    fn eq(&self, other: &Self) -> bool {
        self.grid_size == other.grid_size
            && (0..self.len()).all(|index| self.is_selected(index) == other.is_selected(index))
    }
}
