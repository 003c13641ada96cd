//! Compute `lxc.idmap` ranges and `/etc/subuid`/`/etc/subgid` entries that pass a handful of
//! container UIDs and GIDs straight through to the host, with every other ID shifted into the
//! unprivileged block at [`HOST_OFFSET`].

mod error;
pub mod expression;
pub mod id_map;
mod plan;

pub use error::{Error, Result};
pub use expression::{parse, Field, IdCorrespondence, MAX_ID, MIN_ID};
pub use id_map::{IdKind, IdMap, IdPair, Mapping, HOST_OFFSET};
pub use plan::MappingPlan;
