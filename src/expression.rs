//! Parsing of mapping expressions of the form `containeruid[:containergid][=hostuid[:hostgid]]`.
//!
//! A missing `=hostuid[:hostgid]` half mirrors the container half, and a missing `:gid` mirrors the
//! UID on its side, so `1000` maps UID and GID 1000 in the container to UID and GID 1000 on the
//! host.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};

/// Smallest ID an expression may name. Root is never remapped.
pub const MIN_ID: u32 = 1;

/// Largest ID an expression may name, and the top of the container ID space.
pub const MAX_ID: u32 = 65535;

static EXPRESSION_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]+(:[0-9]+)?(=[0-9]+(:[0-9]+)?)?$").expect("expression format is valid")
});

/// One of the four numeric fields of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    ContainerUid,
    ContainerGid,
    HostUid,
    HostGid,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::ContainerUid => "container UID",
            Field::ContainerGid => "container GID",
            Field::HostUid => "host UID",
            Field::HostGid => "host GID",
        })
    }
}

/// A parsed expression. A `None` field was left empty and contributes no entry for its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdCorrespondence {
    pub container_uid: Option<u32>,
    pub container_gid: Option<u32>,
    pub host_uid: Option<u32>,
    pub host_gid: Option<u32>,
}

/// Check that `expr` has the overall `uid[:gid][=uid[:gid]]` shape, without looking at values.
pub fn validate_syntax(expr: &str) -> Result<()> {
    if !EXPRESSION_FORMAT.is_match(expr) {
        return Err(Error::Syntax {
            expr: expr.to_owned(),
        });
    }
    Ok(())
}

/// Parse and validate a single mapping expression.
pub fn parse(expr: &str) -> Result<IdCorrespondence> {
    validate_syntax(expr)?;
    let correspondence = parse_fields(expr)?;
    debug!(expr, ?correspondence, "parsed mapping expression");
    Ok(correspondence)
}

/// Split an expression into its four fields and range-check each one, in field order.
fn parse_fields(expr: &str) -> Result<IdCorrespondence> {
    let (container, host) = expr.split_once('=').unwrap_or((expr, expr));
    let (container_uid, container_gid) = split_uid_gid(container);
    let (host_uid, host_gid) = split_uid_gid(host);

    Ok(IdCorrespondence {
        container_uid: parse_id(Field::ContainerUid, container_uid)?,
        container_gid: parse_id(Field::ContainerGid, container_gid)?,
        host_uid: parse_id(Field::HostUid, host_uid)?,
        host_gid: parse_id(Field::HostGid, host_gid)?,
    })
}

fn split_uid_gid(side: &str) -> (&str, &str) {
    side.split_once(':').unwrap_or((side, side))
}

fn parse_id(field: Field, value: &str) -> Result<Option<u32>> {
    if value.is_empty() {
        return Ok(None);
    }
    match value.parse::<u32>() {
        Ok(id) if (MIN_ID..=MAX_ID).contains(&id) => Ok(Some(id)),
        _ => Err(Error::Range {
            field,
            value: value.to_owned(),
            min: MIN_ID,
            max: MAX_ID,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all(c_uid: u32, c_gid: u32, h_uid: u32, h_gid: u32) -> IdCorrespondence {
        IdCorrespondence {
            container_uid: Some(c_uid),
            container_gid: Some(c_gid),
            host_uid: Some(h_uid),
            host_gid: Some(h_gid),
        }
    }

    fn range_field(expr: &str) -> Field {
        match parse(expr) {
            Err(Error::Range { field, min, max, .. }) => {
                assert_eq!((min, max), (MIN_ID, MAX_ID));
                field
            }
            other => panic!("expected a range error for {expr:?}, got {other:?}"),
        }
    }

    #[test]
    fn single_id_maps_everything() {
        assert_eq!(parse("1000").unwrap(), all(1000, 1000, 1000, 1000));
        assert_eq!(parse("1").unwrap(), all(1, 1, 1, 1));
        assert_eq!(parse("65535").unwrap(), all(65535, 65535, 65535, 65535));
    }

    #[test]
    fn host_mirrors_container() {
        assert_eq!(parse("1000:2000").unwrap(), all(1000, 2000, 1000, 2000));
    }

    #[test]
    fn gid_mirrors_uid_on_both_sides() {
        assert_eq!(parse("1000=2000").unwrap(), all(1000, 1000, 2000, 2000));
    }

    #[test]
    fn fully_specified() {
        assert_eq!(
            parse("1000:2000=3000:4000").unwrap(),
            all(1000, 2000, 3000, 4000)
        );
        assert_eq!(parse("1000=3000:4000").unwrap(), all(1000, 1000, 3000, 4000));
        assert_eq!(parse("1000:2000=3000").unwrap(), all(1000, 2000, 3000, 3000));
    }

    #[test]
    fn out_of_range_names_the_field() {
        assert_eq!(range_field("70000"), Field::ContainerUid);
        assert_eq!(range_field("0"), Field::ContainerUid);
        assert_eq!(range_field("1000:70000"), Field::ContainerGid);
        assert_eq!(range_field("1000=70000"), Field::HostUid);
        assert_eq!(range_field("1000:1000=1000:70000"), Field::HostGid);
        assert_eq!(range_field("1000:0=1000"), Field::ContainerGid);
    }

    #[test]
    fn value_that_overflows_is_a_range_error() {
        assert_eq!(range_field("99999999999999999999"), Field::ContainerUid);
    }

    #[test]
    fn first_bad_field_wins() {
        assert_eq!(range_field("70000:70000=70000:70000"), Field::ContainerUid);
        assert_eq!(range_field("1:70000=70000:70000"), Field::ContainerGid);
    }

    #[test]
    fn range_error_message() {
        let err = parse("70000").unwrap_err();
        assert_eq!(
            err.to_string(),
            "container UID: value '70000' is not in range 1-65535"
        );
    }

    #[test]
    fn rejects_bad_shapes_before_ranges() {
        for expr in [
            "",
            "abc",
            "1000:abc",
            "1000=abc",
            "1000:abc=1000:def",
            "1000:",
            ":1000",
            "=1000",
            "1000=",
            "1000:1000:1000",
            "1000=1000=1000",
            " 1000",
            "-1",
            "+1000",
            "70000:x",
            "١٠٠٠",
        ] {
            assert_eq!(
                parse(expr),
                Err(Error::Syntax {
                    expr: expr.to_owned()
                }),
                "{expr:?}"
            );
        }
    }

    #[test]
    fn empty_fields_are_absent() {
        // Only reachable past the syntax gate through the structural parser.
        let parsed = parse_fields("1000:=2000:").unwrap();
        assert_eq!(
            parsed,
            IdCorrespondence {
                container_uid: Some(1000),
                container_gid: None,
                host_uid: Some(2000),
                host_gid: None,
            }
        );
    }
}
