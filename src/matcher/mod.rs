//! Name matcher
//!
//! Resolves a free-text server name against the catalog. Pure functions,
//! no I/O. Every object gets the weight of the strongest tier it satisfies:
//!
//! | weight | rule |
//! |--------|------|
//! | 3 | normalized names are equal |
//! | 2 | normalized request is a substring of the lowercase display name |
//! | 1 | lowercase request is a substring of the path hint |
//!
//! Weight 0 objects are not candidates.

use crate::models::{CatalogObject, ObjectType, normalize_name};
use std::collections::BTreeMap;

pub const WEIGHT_EXACT: u8 = 3;
pub const WEIGHT_DISPLAY_NAME: u8 = 2;
pub const WEIGHT_PATH_HINT: u8 = 1;

/// A catalog object matched for one requested name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCandidate<'a> {
    pub object: &'a CatalogObject,
    pub weight: u8,
}

/// Weight of `object` for an already-normalized request
pub fn weigh(normalized_request: &str, raw_request: &str, object: &CatalogObject) -> u8 {
    if normalized_request.is_empty() {
        return 0;
    }

    if object.normalized_name() == normalized_request {
        return WEIGHT_EXACT;
    }

    if object
        .display_name()
        .to_lowercase()
        .contains(normalized_request)
    {
        return WEIGHT_DISPLAY_NAME;
    }

    let request = raw_request.trim().to_lowercase();
    if !request.is_empty() && object.path_hint().contains(&request) {
        return WEIGHT_PATH_HINT;
    }

    0
}

/// All positive-weight candidates for `requested_name`, in catalog order
pub fn match_candidates<'a>(
    requested_name: &str,
    catalog: &'a [CatalogObject],
) -> Vec<MatchCandidate<'a>> {
    let normalized = normalize_name(requested_name);

    catalog
        .iter()
        .filter_map(|object| {
            let weight = weigh(&normalized, requested_name, object);
            (weight > 0).then_some(MatchCandidate { object, weight })
        })
        .collect()
}

/// Group candidates by object type, keeping only the top weight per group.
///
/// A name may legitimately match both a fileset and a VM; each type is
/// reported on its own. Within a group the remaining candidates are tied
/// and keep catalog order, so the first one is the fallback winner.
pub fn top_candidates_by_type<'a>(
    candidates: Vec<MatchCandidate<'a>>,
) -> BTreeMap<ObjectType, Vec<MatchCandidate<'a>>> {
    let mut groups: BTreeMap<ObjectType, Vec<MatchCandidate<'a>>> = BTreeMap::new();

    for candidate in candidates {
        let group = groups.entry(candidate.object.object_type()).or_default();
        match group.first().map(|c| c.weight) {
            Some(best) if candidate.weight < best => {}
            Some(best) if candidate.weight > best => {
                group.clear();
                group.push(candidate);
            }
            _ => group.push(candidate),
        }
    }

    groups
}
