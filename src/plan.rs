use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::expression;
use crate::id_map::{IdKind, IdMap, IdPair};

/// The validated, sorted UID and GID pairs for one set of mapping expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingPlan {
    uids: Vec<IdPair>,
    gids: Vec<IdPair>,
}

impl MappingPlan {
    /// Parse every expression, stopping at the first one that fails.
    ///
    /// Fails if there are no expressions, or if two expressions remap the same container UID or
    /// the same container GID.
    pub fn from_expressions(exprs: impl IntoIterator<Item = impl AsRef<str>>) -> Result<Self> {
        let mut uids = Vec::new();
        let mut gids = Vec::new();
        let mut count = 0usize;

        for expr in exprs {
            let parsed = expression::parse(expr.as_ref())?;
            count += 1;

            if let (Some(container), Some(host)) = (parsed.container_uid, parsed.host_uid) {
                uids.push(IdPair::new(container, host));
            }
            if let (Some(container), Some(host)) = (parsed.container_gid, parsed.host_gid) {
                gids.push(IdPair::new(container, host));
            }
        }

        if count == 0 {
            return Err(Error::NoMappings);
        }

        sort_unique(IdKind::Uid, &mut uids)?;
        sort_unique(IdKind::Gid, &mut gids)?;

        info!(
            expressions = count,
            uids = uids.len(),
            gids = gids.len(),
            "built mapping plan"
        );
        Ok(MappingPlan { uids, gids })
    }

    pub fn uids(&self) -> &[IdPair] {
        &self.uids
    }

    pub fn gids(&self) -> &[IdPair] {
        &self.gids
    }

    pub fn uid_map(&self) -> IdMap {
        IdMap::coalesce(IdKind::Uid, &self.uids)
    }

    pub fn gid_map(&self) -> IdMap {
        IdMap::coalesce(IdKind::Gid, &self.gids)
    }

    /// Lines for `/etc/subuid`, one per remapped host UID.
    pub fn subuid_entries(&self) -> Vec<String> {
        subordinate_entries(&self.uids)
    }

    /// Lines for `/etc/subgid`, one per remapped host GID.
    pub fn subgid_entries(&self) -> Vec<String> {
        subordinate_entries(&self.gids)
    }

    /// The full report: container config lines, then `/etc/subuid`, then `/etc/subgid`.
    pub fn render(&self) -> String {
        let mut out = String::new();

        out.push_str("# Add to /etc/pve/lxc/<container_id>.conf:\n");
        for line in self
            .uid_map()
            .to_lxc_config_lines()
            .into_iter()
            .chain(self.gid_map().to_lxc_config_lines())
        {
            out.push_str(&line);
            out.push('\n');
        }

        out.push_str("\n# Add to /etc/subuid:\n");
        for line in self.subuid_entries() {
            out.push_str(&line);
            out.push('\n');
        }

        out.push_str("\n# Add to /etc/subgid:\n");
        for line in self.subgid_entries() {
            out.push_str(&line);
            out.push('\n');
        }

        out
    }
}

fn sort_unique(kind: IdKind, pairs: &mut [IdPair]) -> Result<()> {
    pairs.sort_by_key(|pair| pair.container_id);
    if let Some(dup) = pairs
        .windows(2)
        .find(|w| w[0].container_id == w[1].container_id)
    {
        debug!(%kind, id = dup[0].container_id, "duplicate container id");
        return Err(Error::DuplicateId {
            kind,
            id: dup[0].container_id,
        });
    }
    Ok(())
}

fn subordinate_entries(pairs: &[IdPair]) -> Vec<String> {
    pairs
        .iter()
        .map(|pair| format!("root:{}:1", pair.host_id))
        .collect()
}
