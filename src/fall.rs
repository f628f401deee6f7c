//! Fallthrough policies.
//!
//! A backend that is authoritative for a name but has no data for it
//! answers NXDOMAIN. Its fallthrough policy decides whether, for a given
//! name, resolution should instead continue elsewhere.

use domain::base::ToName;
use serde::Deserialize;

use crate::error::InvalidZone;
use crate::zones::ZoneSet;

//------------ Fallthrough ---------------------------------------------------

/// When to continue resolution past an NXDOMAIN answer.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(try_from = "Vec<String>")]
pub enum Fallthrough {
    /// Never continue. An NXDOMAIN answer is final.
    #[default]
    Disabled,

    /// Continue for names that fall under any of the given zones.
    Zones(ZoneSet),
}

impl Fallthrough {
    /// Creates a policy that continues for all names.
    #[must_use]
    pub fn all() -> Self {
        Fallthrough::Zones(ZoneSet::root())
    }

    /// Creates a policy from a list of zones in presentation format.
    ///
    /// An empty list results in a policy covering all names.
    pub fn from_strs<I, S>(zones: I) -> Result<Self, InvalidZone>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let zones = ZoneSet::from_strs(zones)?;
        if zones.is_empty() {
            Ok(Self::all())
        } else {
            Ok(Fallthrough::Zones(zones))
        }
    }

    /// Returns whether resolution of `qname` should continue elsewhere.
    pub fn through<N: ToName + ?Sized>(&self, qname: &N) -> bool {
        match self {
            Fallthrough::Disabled => false,
            Fallthrough::Zones(zones) => zones.matches(qname).is_some(),
        }
    }

    /// Returns whether this policy never continues.
    pub fn is_disabled(&self) -> bool {
        matches!(self, Fallthrough::Disabled)
    }
}

impl TryFrom<Vec<String>> for Fallthrough {
    type Error = InvalidZone;

    fn try_from(zones: Vec<String>) -> Result<Self, Self::Error> {
        Self::from_strs(zones)
    }
}

//============ Testing =======================================================
