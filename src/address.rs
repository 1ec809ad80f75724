//! Discovered interface addresses.

use std::fmt;

/// Address family of a discovered address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    IPv4,
    IPv6,
}

impl AddressFamily {
    /// Family keyword used by `ip addr` output (`inet` / `inet6`).
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "inet" => Some(AddressFamily::IPv4),
            "inet6" => Some(AddressFamily::IPv6),
            _ => None,
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::IPv4 => f.write_str("IPv4"),
            AddressFamily::IPv6 => f.write_str("IPv6"),
        }
    }
}

/// One address found on an interface during a discovery cycle.
///
/// Records are rebuilt on every cycle and never mutated afterwards, so the
/// fields are only reachable through accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRecord {
    address: String,
    family: AddressFamily,
    valid_lifetime: Option<u64>,
}

impl AddressRecord {
    /// Create a record. `valid_lifetime` is in seconds; `None` means forever.
    pub fn new(
        address: impl Into<String>,
        family: AddressFamily,
        valid_lifetime: Option<u64>,
    ) -> Self {
        Self {
            address: address.into(),
            family,
            valid_lifetime,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn family(&self) -> AddressFamily {
        self.family
    }

    /// Remaining valid lifetime in seconds, `None` if indefinite.
    pub fn valid_lifetime(&self) -> Option<u64> {
        self.valid_lifetime
    }
}

impl fmt::Display for AddressRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.valid_lifetime {
            Some(secs) => write!(f, "{} ({}, valid {}s)", self.address, self.family, secs),
            None => write!(f, "{} ({}, valid forever)", self.address, self.family),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_keywords() {
        assert_eq!(AddressFamily::from_keyword("inet"), Some(AddressFamily::IPv4));
        assert_eq!(AddressFamily::from_keyword("inet6"), Some(AddressFamily::IPv6));
        assert_eq!(AddressFamily::from_keyword("link/ether"), None);
    }

    #[test]
    fn test_record_display() {
        let v4 = AddressRecord::new("10.0.0.5", AddressFamily::IPv4, Some(120));
        let v6 = AddressRecord::new("fe80::1", AddressFamily::IPv6, None);
        assert_eq!(v4.to_string(), "10.0.0.5 (IPv4, valid 120s)");
        assert_eq!(v6.to_string(), "fe80::1 (IPv6, valid forever)");
    }
}
