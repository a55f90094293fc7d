//! Region Tree - In-memory view of the region hierarchy
//!
//! Regions are persisted as an adjacency list (`parent_id` column). After
//! loading, the rows are assembled into a `RegionTree` keyed by id. Building
//! the tree validates every parent chain: it must be acyclic, bounded by the
//! number of regions, and end at a national root.

use std::collections::{BTreeMap, HashSet};
use crate::region::{Region, RegionLevel};
use crate::{Error, Result};

/// Validated region hierarchy.
#[derive(Debug, Default)]
pub struct RegionTree {
    /// All regions indexed by id
    regions: BTreeMap<i64, Region>,
    /// Child ids per parent, ascending
    children: BTreeMap<i64, Vec<i64>>,
    /// Root (national) region ids, ascending
    roots: Vec<i64>,
}

impl RegionTree {
    /// Build and validate a tree from persisted rows
    pub fn build(rows: Vec<Region>) -> Result<Self> {
        let mut tree = Self::default();

        for region in rows {
            if tree.regions.contains_key(&region.id) {
                return Err(Error::InvalidHierarchy(format!("duplicate region id {}", region.id)));
            }
            tree.regions.insert(region.id, region);
        }

        for region in tree.regions.values() {
            if region.is_root() {
                tree.roots.push(region.id);
            } else if let Some(parent) = region.parent_id {
                tree.children.entry(parent).or_default().push(region.id);
            }
        }

        tree.validate()?;
        Ok(tree)
    }

    fn validate(&self) -> Result<()> {
        for region in self.regions.values() {
            let mut visited = HashSet::new();
            let mut current = region;

            // A chain longer than the number of regions must revisit an id
            while let Some(parent_id) = current.parent_id {
                if !visited.insert(current.id) || visited.len() > self.regions.len() {
                    return Err(Error::InvalidHierarchy(format!(
                        "cycle detected in parent chain of region {} ('{}')",
                        region.id, region.name
                    )));
                }

                let parent = self.regions.get(&parent_id).ok_or_else(|| {
                    Error::InvalidHierarchy(format!(
                        "region {} ('{}') references missing parent {}",
                        current.id, current.name, parent_id
                    ))
                })?;

                if !current.level.can_nest_under(parent.level) {
                    return Err(Error::InvalidHierarchy(format!(
                        "{} region '{}' cannot sit under {} region '{}'",
                        current.level, current.name, parent.level, parent.name
                    )));
                }
                current = parent;
            }

            if current.level != RegionLevel::National {
                return Err(Error::InvalidHierarchy(format!(
                    "region {} ('{}') terminates at {} region '{}' instead of a national root",
                    region.id, region.name, current.level, current.name
                )));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&Region> {
        self.regions.get(&id)
    }

    /// National roots, ascending by id
    pub fn roots(&self) -> Vec<&Region> {
        self.roots.iter().filter_map(|id| self.regions.get(id)).collect()
    }

    /// Direct children of a region, ascending by id
    pub fn children(&self, id: i64) -> Vec<&Region> {
        self.children
            .get(&id)
            .map(|ids| ids.iter().filter_map(|c| self.regions.get(c)).collect())
            .unwrap_or_default()
    }

    /// Regions without children
    pub fn leaves(&self) -> Vec<&Region> {
        self.regions
            .values()
            .filter(|r| !self.children.contains_key(&r.id))
            .collect()
    }

    /// Path from the root down to `id`, inclusive
    pub fn path(&self, id: i64) -> Vec<&Region> {
        let mut path = Vec::new();
        let mut current = self.regions.get(&id);
        while let Some(region) = current {
            path.push(region);
            current = region.parent_id.and_then(|p| self.regions.get(&p));
        }
        path.reverse();
        path
    }

    /// `id` and every region below it, in depth-first order
    pub fn subtree_ids(&self, id: i64) -> Vec<i64> {
        let mut out = Vec::new();
        if !self.regions.contains_key(&id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            if let Some(kids) = self.children.get(&next) {
                stack.extend(kids.iter().rev());
            }
        }
        out
    }

    /// Indented one-line-per-region rendering, roots first
    pub fn render(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for root in &self.roots {
            for id in self.subtree_ids(*root) {
                if let Some(region) = self.regions.get(&id) {
                    let indent = "  ".repeat(self.path(id).len() - 1);
                    lines.push(format!("{}{} [{}] (id {})", indent, region.name, region.level, region.id));
                }
            }
        }
        lines
    }
}
