use std::fmt;

use tracing::{debug, trace};

use crate::expression::MAX_ID;

/// Host ID that container ID 0 lands on when it is not explicitly remapped.
pub const HOST_OFFSET: u32 = 100000;

/// Whether a map covers user IDs or group IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Uid,
    Gid,
}

impl IdKind {
    /// The letter `lxc.idmap` uses for this kind.
    pub fn letter(self) -> char {
        match self {
            IdKind::Uid => 'u',
            IdKind::Gid => 'g',
        }
    }
}

impl fmt::Display for IdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IdKind::Uid => "UID",
            IdKind::Gid => "GID",
        })
    }
}

/// An explicit request to map one container ID onto one host ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdPair {
    pub container_id: u32,
    pub host_id: u32,
}

impl IdPair {
    pub fn new(container_id: u32, host_id: u32) -> IdPair {
        IdPair {
            container_id,
            host_id,
        }
    }
}

/// Map the range of IDs `[inner_id, inner_id + qty) --> [outer_id, outer_id + qty)`
#[derive(Clone, Debug, Copy, Eq, PartialEq)]
pub struct Mapping {
    pub kind: IdKind,
    pub inner_id: u32,
    pub outer_id: u32,
    pub qty: u32,
}

impl fmt::Display for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "lxc.idmap: {} {} {} {}",
            self.kind.letter(),
            self.inner_id,
            self.outer_id,
            self.qty
        )
    }
}

/// An ordered list of [`Mapping`]s of a single kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdMap {
    kind: IdKind,
    mappings: Vec<Mapping>,
}

impl IdMap {
    pub fn new(kind: IdKind) -> IdMap {
        IdMap {
            kind,
            mappings: Vec::new(),
        }
    }

    /// Build a map covering every container ID in `[0, MAX_ID]`.
    ///
    /// Each pair is mapped one-to-one. Every other container ID `c` maps to `c + HOST_OFFSET`,
    /// in one range below the first pair, one per gap between pairs, and one above the last.
    ///
    /// `pairs` must be sorted by `container_id` with no duplicates, and every `container_id` must
    /// be at most `MAX_ID`. An empty `pairs` gives an empty map.
    pub fn coalesce(kind: IdKind, pairs: &[IdPair]) -> IdMap {
        debug_assert!(
            pairs
                .windows(2)
                .all(|w| w[0].container_id < w[1].container_id),
            "pairs must be strictly ascending"
        );

        let mut map = Self::new(kind);
        let (Some(first), Some(last)) = (pairs.first(), pairs.last()) else {
            return map;
        };

        // Always emitted, even when it is empty.
        map.map_many(0, HOST_OFFSET, first.container_id);

        let mut previous: Option<&IdPair> = None;
        for pair in pairs {
            if let Some(prev) = previous {
                if pair.container_id != prev.container_id + 1 {
                    map.map_offset_range(prev.container_id + 1, pair.container_id - 1);
                }
            }
            map.map_one(pair.container_id, pair.host_id);
            previous = Some(pair);
        }

        map.map_offset_range(last.container_id + 1, MAX_ID);

        debug!(%kind, pairs = pairs.len(), ranges = map.len(), "coalesced id map");
        map
    }

    pub fn kind(&self) -> IdKind {
        self.kind
    }

    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn map_one(&mut self, inner_id: u32, outer_id: u32) {
        self.map_many(inner_id, outer_id, 1);
    }

    /// Unlike a kernel id map, a zero `qty` is kept and rendered.
    pub fn map_many(&mut self, inner_id: u32, outer_id: u32, qty: u32) {
        let mapping = Mapping {
            kind: self.kind,
            inner_id,
            outer_id,
            qty,
        };
        trace!(%mapping, "push mapping");
        self.mappings.push(mapping);
    }

    /// Map the inclusive range `[start, end]` onto the offset block.
    fn map_offset_range(&mut self, start: u32, end: u32) {
        self.map_many(start, start + HOST_OFFSET, end + 1 - start);
    }

    /// Format the [`IdMap`] as `lxc.idmap:` lines for a container config, one per mapping.
    pub fn to_lxc_config_lines(&self) -> Vec<String> {
        self.mappings.iter().map(Mapping::to_string).collect()
    }
}
