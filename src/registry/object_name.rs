//! Object-name addresses: `domain:key=value[,key=value...]`.

use super::RegistryError;
use std::fmt;
use std::str::FromStr;

const DOMAIN_FORBIDDEN: &[char] = &[':', '*', '?', '\n'];
const PROPERTY_FORBIDDEN: &[char] = &[',', '=', ':', '*', '?', '"', '\n'];

/// Parsed address with its key properties sorted by key.
///
/// Two addresses that differ only in property order name the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectName {
    domain: String,
    properties: Vec<(String, String)>,
}

impl ObjectName {
    pub fn parse(address: &str) -> Result<Self, RegistryError> {
        let malformed = |reason: &str| RegistryError::MalformedAddress {
            address: address.to_string(),
            reason: reason.to_string(),
        };

        let (domain, key_list) = address
            .split_once(':')
            .ok_or_else(|| malformed("missing ':' between domain and key properties"))?;

        if domain.is_empty() {
            return Err(malformed("domain is empty"));
        }
        if domain.contains(DOMAIN_FORBIDDEN) {
            return Err(malformed("domain contains a reserved character"));
        }
        if key_list.is_empty() {
            return Err(malformed("at least one key property is required"));
        }

        let mut properties = Vec::new();
        for property in key_list.split(',') {
            let (key, value) = property
                .split_once('=')
                .ok_or_else(|| malformed("key property must be key=value"))?;
            if key.is_empty() {
                return Err(malformed("key property has an empty key"));
            }
            if value.is_empty() {
                return Err(malformed("key property has an empty value"));
            }
            if key.contains(PROPERTY_FORBIDDEN) || value.contains(PROPERTY_FORBIDDEN) {
                return Err(malformed("key property contains a reserved character"));
            }
            if properties.iter().any(|(existing, _): &(String, String)| existing == key) {
                return Err(malformed("duplicate key in key properties"));
            }
            properties.push((key.to_string(), value.to_string()));
        }
        properties.sort();

        Ok(Self {
            domain: domain.to_string(),
            properties,
        })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }

    /// Canonical string form, the key used for registry entries.
    pub fn canonical(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.domain)?;
        for (index, (key, value)) in self.properties.iter().enumerate() {
            if index > 0 {
                write!(f, ",")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

impl FromStr for ObjectName {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
