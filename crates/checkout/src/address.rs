//! Canonical address extraction from heterogeneous customer profiles.
//!
//! The commerce backend has shipped the address collection in several shapes
//! over time: a GraphQL edge list, a node list, a plain array, and a single
//! `defaultAddress` field. Instead of ad hoc shape-sniffing, extraction runs
//! an explicit ordered list of strategies, each returning a match or nothing,
//! tried in a fixed priority order.
//!
//! Finding no candidate is the empty-state default, not an error: the form
//! simply stays empty and must be filled manually.

use serde_json::Value;

use crate::types::Address;

/// Where in the profile the address collection was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressSource {
    /// `addresses.edges[].node`
    EdgeList,
    /// `addresses.nodes[]`
    NodeList,
    /// `addresses[]`
    PlainArray,
    /// A single `defaultAddress` object.
    DefaultField,
}

/// Extraction strategies, in priority order.
const STRATEGIES: &[AddressSource] = &[
    AddressSource::EdgeList,
    AddressSource::NodeList,
    AddressSource::PlainArray,
    AddressSource::DefaultField,
];

/// Default-marker keys checked on each candidate, in priority order.
const DEFAULT_FLAGS: &[&str] = &["defaultAddress", "isDefault", "default"];

/// A canonical address extracted from a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedAddress {
    /// The canonical address.
    pub address: Address,
    /// True when the form was filled from the profile rather than by hand.
    /// Used only for UI messaging.
    pub was_auto_filled: bool,
}

/// Extract one canonical address from a profile of unknown shape.
///
/// Returns `None` when the profile carries no address candidate.
#[must_use]
pub fn normalize_profile(profile: &Value, default_country: &str) -> Option<NormalizedAddress> {
    let candidates = STRATEGIES
        .iter()
        .find_map(|strategy| collect_candidates(profile, *strategy))?;

    let selected = select_candidate(&candidates)?;
    let address = map_fields(selected, default_country);

    Some(NormalizedAddress {
        address,
        was_auto_filled: true,
    })
}

/// Run one extraction strategy, returning the candidate list on a match.
fn collect_candidates(profile: &Value, strategy: AddressSource) -> Option<Vec<&Value>> {
    let candidates: Vec<&Value> = match strategy {
        AddressSource::EdgeList => profile
            .get("addresses")?
            .get("edges")?
            .as_array()?
            .iter()
            .filter_map(|edge| edge.get("node"))
            .collect(),
        AddressSource::NodeList => profile
            .get("addresses")?
            .get("nodes")?
            .as_array()?
            .iter()
            .collect(),
        AddressSource::PlainArray => profile.get("addresses")?.as_array()?.iter().collect(),
        AddressSource::DefaultField => {
            let single = profile.get("defaultAddress")?;
            if single.is_object() {
                vec![single]
            } else {
                return None;
            }
        }
    };

    if candidates.is_empty() {
        None
    } else {
        Some(candidates)
    }
}

/// Select one candidate: first explicit default marker wins, in flag priority
/// order; otherwise the first candidate in collection order.
fn select_candidate<'a>(candidates: &[&'a Value]) -> Option<&'a Value> {
    for flag in DEFAULT_FLAGS {
        if let Some(found) = candidates
            .iter()
            .find(|candidate| candidate.get(*flag).and_then(Value::as_bool) == Some(true))
        {
            return Some(found);
        }
    }
    candidates.first().copied()
}

/// Map output fields from their source-key alias lists, first alias wins.
fn map_fields(candidate: &Value, default_country: &str) -> Address {
    Address {
        first_name: alias(candidate, &["firstName", "first_name"]).unwrap_or_default(),
        last_name: alias(candidate, &["lastName", "last_name"]).unwrap_or_default(),
        address1: alias(candidate, &["address1", "addressLine1", "line1", "street"])
            .unwrap_or_default(),
        address2: alias(candidate, &["address2", "addressLine2", "line2"]),
        city: alias(candidate, &["city"]).unwrap_or_default(),
        province: alias(candidate, &["province", "provinceCode", "state", "stateCode"])
            .unwrap_or_default(),
        province_code: alias(candidate, &["provinceCode", "province_code", "stateCode"])
            .unwrap_or_default(),
        country: alias(candidate, &["country", "countryName"])
            .unwrap_or_else(|| default_country.to_owned()),
        zip: alias(candidate, &["zip", "zipCode", "postalCode", "postal_code"])
            .unwrap_or_default(),
        phone: alias(candidate, &["phone", "phoneNumber", "phone_number"]).unwrap_or_default(),
        is_default: DEFAULT_FLAGS
            .iter()
            .any(|flag| candidate.get(*flag).and_then(Value::as_bool) == Some(true)),
    }
}

/// The first present, non-empty string among the aliases.
fn alias(candidate: &Value, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .filter_map(|key| candidate.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_owned)
}
