//! Capability lists and the server version exchanged in headers.

use std::collections::BTreeSet;
use std::fmt;

pub const CAPABILITY_NOTES: &str = "notes";
pub const CAPABILITY_OOF: &str = "oof";
pub const CAPABILITY_OOF_TIMES: &str = "ooftime";
pub const CAPABILITY_SIGNATURES: &str = "signatures";

/// Set of capability names, rendered as a comma-separated list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities(BTreeSet<String>);

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a comma-separated list. Empty entries are skipped.
    pub fn parse(list: &str) -> Self {
        list.split(',').collect()
    }

    pub fn has(&self, capability: &str) -> bool {
        self.0.contains(capability)
    }

    pub fn add(&mut self, capability: impl Into<String>) {
        self.0.insert(capability.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for Capabilities {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Capabilities(
            iter.into_iter()
                .map(|c| c.as_ref().trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
        )
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, capability) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(capability)?;
        }
        Ok(())
    }
}

/// Z-Push version from `X-Z-Push-Version`.
///
/// Only the first `major.minor.` group is interpreted; the full string is
/// kept for display and equality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerVersion {
    major: u32,
    minor: u32,
    version: String,
}

impl ServerVersion {
    /// Returns `None` when the string has no `major.minor.` group.
    pub fn parse(version: &str) -> Option<Self> {
        let version = version.trim();
        let bytes = version.as_bytes();
        (0..bytes.len())
            .filter(|&i| bytes[i].is_ascii_digit() && (i == 0 || !bytes[i - 1].is_ascii_digit()))
            .find_map(|start| {
                let (major, rest) = leading_number(&version[start..])?;
                let (minor, rest) = leading_number(rest.strip_prefix('.')?)?;
                rest.starts_with('.').then_some((major, minor))
            })
            .map(|(major, minor)| ServerVersion {
                major,
                minor,
                version: version.to_string(),
            })
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    pub fn is_at_least(&self, major: u32, minor: u32) -> bool {
        self.major > major || (self.major == major && self.minor >= minor)
    }
}

fn leading_number(s: &str) -> Option<(u32, &str)> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let number = s[..end].parse().ok()?;
    Some((number, &s[end..]))
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_list() {
        let caps = Capabilities::parse("oof,ooftime, notes,,");
        assert!(caps.has(CAPABILITY_OOF_TIMES));
        assert!(caps.has(CAPABILITY_NOTES));
        assert!(!caps.has(CAPABILITY_SIGNATURES));
        assert_eq!(caps.to_string(), "notes,oof,ooftime");
        assert!(Capabilities::parse("").is_empty());
    }

    #[test]
    fn version_prefix() {
        let version = ServerVersion::parse("2.3.9+0-1-kopano").unwrap();
        assert_eq!((version.major(), version.minor()), (2, 3));
        assert!(version.is_at_least(2, 3));
        assert!(version.is_at_least(1, 9));
        assert!(!version.is_at_least(2, 4));
        assert_eq!(version.to_string(), "2.3.9+0-1-kopano");

        assert_eq!(ServerVersion::parse("git-12.4.x").map(|v| v.major()), Some(12));
        assert!(ServerVersion::parse("2.3").is_none());
        assert!(ServerVersion::parse("").is_none());
    }
}
