//! Sets of zones and deciding which zone a name belongs to.
//!
//! All authority decisions in this crate, be it for routing a query,
//! finding an AutoPath relevant query or checking a fallthrough policy, go
//! through [`ZoneSet::matches`].

use core::fmt;
use core::str::FromStr;

use std::slice;

use bytes::Bytes;
use domain::base::{Name, ToName};

use crate::error::InvalidZone;

//------------ StoredName ----------------------------------------------------

/// The owned domain name type used throughout the crate.
pub type StoredName = Name<Bytes>;

//------------ ZoneSet -------------------------------------------------------

/// A set of zone apex names.
///
/// Names are kept lower-cased and absolute. Each apex is contained at most
/// once. The order in which zones were added is retained since it shapes
/// AutoPath search lists.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ZoneSet {
    zones: Vec<StoredName>,
}

impl ZoneSet {
    /// Creates a new, empty zone set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a zone set from a list of zones in presentation format.
    ///
    /// Zones are treated as absolute whether they end in a dot or not.
    pub fn from_strs<I, S>(zones: I) -> Result<Self, InvalidZone>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut res = Self::new();
        for zone in zones {
            res.insert(normalize(zone.as_ref())?);
        }
        Ok(res)
    }

    /// Creates the set containing only the root zone.
    #[must_use]
    pub fn root() -> Self {
        Self {
            zones: vec![Name::root_bytes()],
        }
    }

    /// Adds a zone to the set.
    ///
    /// Returns whether the zone was not yet present.
    pub fn insert(&mut self, zone: StoredName) -> bool {
        if self.zones.iter().any(|item| *item == zone) {
            return false;
        }
        self.zones.push(zone);
        true
    }

    /// Returns the zone `qname` belongs to.
    ///
    /// This is the longest zone of the set that is a suffix of `qname`,
    /// compared label by label and ignoring ASCII case.
    pub fn matches<N: ToName + ?Sized>(
        &self,
        qname: &N,
    ) -> Option<&StoredName> {
        self.zones
            .iter()
            .filter(|zone| qname.ends_with(*zone))
            .max_by_key(|zone| zone.label_count())
    }

    /// Returns the number of zones in the set.
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Returns whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Returns an iterator over the zones in insertion order.
    pub fn iter(&self) -> slice::Iter<'_, StoredName> {
        self.zones.iter()
    }
}

impl<'a> IntoIterator for &'a ZoneSet {
    type Item = &'a StoredName;
    type IntoIter = slice::Iter<'a, StoredName>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<StoredName> for ZoneSet {
    fn from_iter<T: IntoIterator<Item = StoredName>>(iter: T) -> Self {
        let mut res = Self::new();
        for zone in iter {
            res.insert(zone);
        }
        res
    }
}

//------------ Helper functions ----------------------------------------------

/// Parses a zone given in presentation format into a normalized name.
pub fn normalize(zone: &str) -> Result<StoredName, InvalidZone> {
    StoredName::from_str(&zone.to_ascii_lowercase())
        .map_err(|err| InvalidZone::new(zone, err))
}

/// Formats a name as lower-case text with a trailing dot.
///
/// This is the form search list entries are handed out in.
pub fn fqdn(name: &impl fmt::Display) -> String {
    let mut res = name.to_string().to_ascii_lowercase();
    if !res.ends_with('.') {
        res.push('.');
    }
    res
}

//============ Testing =======================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> StoredName {
        StoredName::from_str(s).unwrap()
    }

    #[test]
    fn longest_match_wins() {
        let zones = ZoneSet::from_strs(["local.", "cluster.local."]).unwrap();
        assert_eq!(
            zones.matches(&name("svc.cluster.local.")),
            Some(&name("cluster.local."))
        );
        assert_eq!(
            zones.matches(&name("other.local.")),
            Some(&name("local."))
        );
    }

    #[test]
    fn matches_are_label_aligned() {
        let zones = ZoneSet::from_strs(["luster.local."]).unwrap();
        assert!(zones.matches(&name("fluster.local.")).is_none());
        assert!(zones.matches(&name("a.luster.local.")).is_some());
        assert!(zones.matches(&name("luster.local.")).is_some());
    }

    #[test]
    fn matches_ignore_case() {
        let zones = ZoneSet::from_strs(["Cluster.LOCAL"]).unwrap();
        assert_eq!(zones.iter().next(), Some(&name("cluster.local.")));
        assert!(zones.matches(&name("SVC.cluster.Local.")).is_some());
    }

    #[test]
    fn root_matches_everything() {
        let zones = ZoneSet::root();
        assert!(zones.matches(&name("example.com.")).is_some());
        assert!(zones.matches(&Name::root_bytes()).is_some());
    }

    #[test]
    fn no_match() {
        let zones = ZoneSet::from_strs(["cluster.local."]).unwrap();
        assert!(zones.matches(&name("example.com.")).is_none());
        assert!(ZoneSet::new().matches(&name("example.com.")).is_none());
    }

    #[test]
    fn duplicates_are_dropped() {
        let zones =
            ZoneSet::from_strs(["cluster.local", "CLUSTER.local."]).unwrap();
        assert_eq!(zones.len(), 1);
    }

    #[test]
    fn invalid_zone() {
        assert!(ZoneSet::from_strs(["a..b"]).is_err());
    }

    #[test]
    fn fqdn_format() {
        assert_eq!(fqdn(&name("Cluster.local")), "cluster.local.");
        assert_eq!(fqdn(&Name::root_bytes()), ".");
    }
}
