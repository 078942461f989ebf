//! Clone and count requests loaded from JSON.
//!
//! ```json
//! {
//!   "src": "world/region",
//!   "dst": "clone/region",
//!   "filter": [
//!     { "kind": "include", "x": [0, 10], "z": [-5, 5] },
//!     { "kind": "exclude", "x": [3] }
//!   ],
//!   "calc": [
//!     { "name": "stone", "include": [1] },
//!     { "name": "solid", "exclude": [0, 8, 9] }
//!   ],
//!   "y": [0, 63]
//! }
//! ```
//!
//! Filter rectangles are given in chunks and converted to blocks here, `y` is
//! in blocks. Paths are relative to the folder of the config file.
//!
//! Older configs list `keep` and `remove` rectangles instead of `filter`.
//! They become includes followed by excludes, preceded by an unbounded include
//! when nothing is kept explicitly.

use crate::counter::{BlockCounter, BlockId, CountRule, CountRuleKind};
use crate::error::ConfigError;
use crate::filter::{AxisRange, FilterRule, Rectangle, RuleKind, SpatialFilter};
use crate::position::CHUNK_SIDE_BLOCKS;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Deserialize, Debug)]
#[serde(rename_all = "lowercase")]
enum RawKind {
    Include,
    Exclude,
}

#[derive(Deserialize, Debug)]
struct RawRectangle {
    kind: Option<RawKind>,
    #[serde(default)]
    x: Vec<i32>,
    #[serde(default)]
    z: Vec<i32>,
}

#[derive(Deserialize, Debug)]
struct RawCountRule {
    name: String,
    include: Option<Vec<BlockId>>,
    exclude: Option<Vec<BlockId>>,
}

#[derive(Deserialize, Debug)]
struct RawConfig {
    src: Option<PathBuf>,
    dst: Option<PathBuf>,
    filter: Option<Vec<RawRectangle>>,
    #[serde(default)]
    keep: Vec<RawRectangle>,
    #[serde(default)]
    remove: Vec<RawRectangle>,
    #[serde(default)]
    calc: Vec<RawCountRule>,
    #[serde(default)]
    y: Vec<i32>,
}

/// Validated request.
#[derive(Debug, Clone)]
pub struct WorldConfig {
    /// Folder of the source region files.
    pub source: PathBuf,
    /// Folder the clone is written to.
    pub destination: Option<PathBuf>,
    /// Selection in blocks.
    pub filter: SpatialFilter,
    pub rules: Vec<CountRule>,
    /// Block heights to count.
    pub vertical: AxisRange,
}

impl WorldConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<WorldConfig, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|io_error| ConfigError::ReadError {
            path: path.to_path_buf(),
            io_error,
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));

        WorldConfig::from_json(&json, base_dir)
    }

    /// Parses a request, resolving relative paths against `base_dir`.
    pub fn from_json(json: &str, base_dir: &Path) -> Result<WorldConfig, ConfigError> {
        let raw: RawConfig = serde_json::from_str(json)?;

        let source = base_dir.join(raw.src.ok_or(ConfigError::MissingField { field: "src" })?);
        let destination = raw.dst.map(|dst| base_dir.join(dst));

        let filter = match raw.filter {
            Some(rectangles) => {
                if !raw.keep.is_empty() || !raw.remove.is_empty() {
                    return Err(ConfigError::ConflictingFilters);
                }
                build_filter(&rectangles, RuleKind::Include)?
            }
            None => legacy_filter(&raw.keep, &raw.remove)?,
        };

        if filter.is_empty() {
            return Err(ConfigError::NoFilterRules);
        }

        let rules = raw
            .calc
            .into_iter()
            .map(|rule| match (rule.include, rule.exclude) {
                (Some(ids), None) => Ok(CountRule {
                    name: rule.name,
                    kind: CountRuleKind::Include(ids.into_iter().collect()),
                }),
                (None, Some(ids)) => Ok(CountRule {
                    name: rule.name,
                    kind: CountRuleKind::Exclude(ids.into_iter().collect()),
                }),
                _ => Err(ConfigError::InvalidRule { name: rule.name }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let vertical = axis_range("y", &raw.y)?;

        Ok(WorldConfig {
            source,
            destination,
            filter,
            rules,
            vertical,
        })
    }

    /// Destination folder of a clone request.
    pub fn clone_destination(&self) -> Result<&Path, ConfigError> {
        self.destination
            .as_deref()
            .ok_or(ConfigError::MissingField { field: "dst" })
    }

    /// Counter of a count request.
    pub fn block_counter(&self) -> Result<BlockCounter, ConfigError> {
        if self.rules.is_empty() {
            return Err(ConfigError::NoCountRules);
        }

        Ok(BlockCounter::new(self.rules.clone()).with_vertical(self.vertical))
    }
}

fn axis_range(field: &'static str, endpoints: &[i32]) -> Result<AxisRange, ConfigError> {
    AxisRange::from_endpoints(endpoints).ok_or_else(|| ConfigError::InvalidRange {
        field,
        endpoints: endpoints.to_vec(),
    })
}

/// Chunk rectangle to blocks.
fn block_rectangle(raw: &RawRectangle) -> Result<Rectangle, ConfigError> {
    let chunks = Rectangle::new(axis_range("x", &raw.x)?, axis_range("z", &raw.z)?);

    Ok(chunks.scale(CHUNK_SIDE_BLOCKS))
}

fn build_filter(rectangles: &[RawRectangle], default_kind: RuleKind) -> Result<SpatialFilter, ConfigError> {
    let mut filter = SpatialFilter::default();

    for raw in rectangles {
        let kind = match raw.kind {
            Some(RawKind::Include) => RuleKind::Include,
            Some(RawKind::Exclude) => RuleKind::Exclude,
            None => default_kind,
        };

        filter.push(FilterRule {
            kind,
            rect: block_rectangle(raw)?,
        });
    }

    Ok(filter)
}

fn legacy_filter(keep: &[RawRectangle], remove: &[RawRectangle]) -> Result<SpatialFilter, ConfigError> {
    let mut filter = SpatialFilter::default();

    if keep.is_empty() && !remove.is_empty() {
        filter.push(FilterRule::include(Rectangle::unbounded()));
    }

    let kept = build_filter(keep, RuleKind::Include)?;
    let removed = build_filter(remove, RuleKind::Exclude)?;

    for rule in kept.rules().iter().chain(removed.rules()) {
        filter.push(*rule);
    }

    Ok(filter)
}

#[cfg(test)]
mod tests {
    use crate::config::WorldConfig;
    use crate::counter::CountRule;
    use crate::error::ConfigError;
    use crate::filter::{AxisRange, FilterRule, Rectangle};
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    fn chunks(x0: i32, x1: i32, z0: i32, z1: i32) -> Rectangle {
        Rectangle::new(AxisRange::bounded(x0, x1), AxisRange::bounded(z0, z1)).scale(16)
    }

    #[test]
    fn test_full_request() {
        let json = r#"{
            "src": "world/region",
            "dst": "clone",
            "filter": [
                { "kind": "include", "x": [10, 0], "z": [-5, 5] },
                { "kind": "exclude", "x": [3] }
            ],
            "calc": [
                { "name": "stone", "include": [1] },
                { "name": "solid", "exclude": [0, 8, 9] }
            ],
            "y": [63, 0]
        }"#;

        let config = WorldConfig::from_json(json, Path::new("/maps")).unwrap();

        assert_eq!(config.source, PathBuf::from("/maps/world/region"));
        assert_eq!(config.clone_destination().unwrap(), Path::new("/maps/clone"));
        assert_eq!(
            config.filter.rules(),
            &[
                FilterRule::include(Rectangle::new(
                    AxisRange::bounded(0, 175),
                    AxisRange::bounded(-80, 95)
                )),
                FilterRule::exclude(Rectangle::new(
                    AxisRange::bounded(48, 63),
                    AxisRange::Unbounded
                )),
            ]
        );
        assert_eq!(
            config.rules,
            vec![
                CountRule::include("stone", vec![1]),
                CountRule::exclude("solid", vec![0, 8, 9]),
            ]
        );
        assert_eq!(config.vertical, AxisRange::bounded(0, 63));
        assert_eq!(config.block_counter().unwrap().rules().len(), 2);
    }

    #[test]
    fn test_legacy_remove_only() {
        let json = r#"{ "src": ".", "remove": [ { "x": [0, 1], "z": [0, 1] } ] }"#;

        let config = WorldConfig::from_json(json, Path::new("")).unwrap();

        assert_eq!(
            config.filter.rules(),
            &[
                FilterRule::include(Rectangle::unbounded()),
                FilterRule::exclude(chunks(0, 1, 0, 1)),
            ]
        );
    }

    #[test]
    fn test_legacy_keep_and_remove() {
        let json = r#"{
            "src": ".",
            "keep": [ { "x": [0, 9], "z": [0, 9] } ],
            "remove": [ { "x": [2], "z": [2] } ]
        }"#;

        let config = WorldConfig::from_json(json, Path::new("")).unwrap();

        assert_eq!(
            config.filter.rules(),
            &[
                FilterRule::include(chunks(0, 9, 0, 9)),
                FilterRule::exclude(chunks(2, 2, 2, 2)),
            ]
        );
    }

    #[test]
    fn test_missing_fields() {
        match WorldConfig::from_json(r#"{ "filter": [ {} ] }"#, Path::new("")) {
            Err(ConfigError::MissingField { field: "src" }) => {}
            other => panic!("Expected `MissingField` but got `{:?}`", other),
        }

        match WorldConfig::from_json(r#"{ "src": "." }"#, Path::new("")) {
            Err(ConfigError::NoFilterRules) => {}
            other => panic!("Expected `NoFilterRules` but got `{:?}`", other),
        }

        let config = WorldConfig::from_json(r#"{ "src": ".", "filter": [ {} ] }"#, Path::new("")).unwrap();

        match config.clone_destination() {
            Err(ConfigError::MissingField { field: "dst" }) => {}
            other => panic!("Expected `MissingField` but got `{:?}`", other),
        }

        match config.block_counter() {
            Err(ConfigError::NoCountRules) => {}
            other => panic!("Expected `NoCountRules` but got `{:?}`", other),
        }
    }

    #[test]
    fn test_invalid_values() {
        let cases = vec![
            r#"{ "src": ".", "filter": [ { "x": [1, 2, 3] } ] }"#,
            r#"{ "src": ".", "filter": [ {} ], "calc": [ { "name": "a" } ] }"#,
            r#"{ "src": ".", "filter": [ {} ], "keep": [ {} ] }"#,
            r#"{ "src": ".", "filter": [ { "kind": "maybe" } ] }"#,
        ];

        let results: Vec<_> = cases
            .into_iter()
            .map(|json| WorldConfig::from_json(json, Path::new("")))
            .collect();

        match &results[0] {
            Err(ConfigError::InvalidRange { field: "x", .. }) => {}
            other => panic!("Expected `InvalidRange` but got `{:?}`", other),
        }
        match &results[1] {
            Err(ConfigError::InvalidRule { name }) => assert_eq!(name, "a"),
            other => panic!("Expected `InvalidRule` but got `{:?}`", other),
        }
        match &results[2] {
            Err(ConfigError::ConflictingFilters) => {}
            other => panic!("Expected `ConflictingFilters` but got `{:?}`", other),
        }
        match &results[3] {
            Err(ConfigError::ParseError { .. }) => {}
            other => panic!("Expected `ParseError` but got `{:?}`", other),
        }
    }

    #[test]
    fn test_from_file_resolves_relative_paths() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clone.json");
        std::fs::write(&path, r#"{ "src": "world", "dst": "out", "filter": [ {} ] }"#).unwrap();

        let config = WorldConfig::from_file(&path).unwrap();

        assert_eq!(config.source, dir.path().join("world"));
        assert_eq!(config.destination, Some(dir.path().join("out")));
    }

    #[test]
    fn test_from_file_missing() {
        let dir = tempdir().unwrap();

        match WorldConfig::from_file(dir.path().join("none.json")) {
            Err(ConfigError::ReadError { .. }) => {}
            other => panic!("Expected `ReadError` but got `{:?}`", other),
        }
    }
}
