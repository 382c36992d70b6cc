//! Protocol version numbers.
//!
//! A version is negotiated once per connection, when the handshake is
//! parsed, and never changes afterwards.

use std::fmt;

/// A game protocol version number as declared in the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProtocolVersion(i32);

/// Known releases, oldest first.
const RELEASES: &[(i32, &str)] = &[
    (4, "1.7.2"),
    (5, "1.7.6"),
    (47, "1.8"),
    (107, "1.9"),
    (108, "1.9.1"),
    (109, "1.9.2"),
    (110, "1.9.4"),
    (210, "1.10"),
    (315, "1.11"),
    (316, "1.11.1"),
    (335, "1.12"),
    (338, "1.12.1"),
    (340, "1.12.2"),
    (393, "1.13"),
    (401, "1.13.1"),
    (404, "1.13.2"),
    (477, "1.14"),
    (480, "1.14.1"),
    (485, "1.14.2"),
    (490, "1.14.3"),
    (498, "1.14.4"),
    (573, "1.15"),
    (575, "1.15.1"),
    (578, "1.15.2"),
    (735, "1.16"),
    (736, "1.16.1"),
    (751, "1.16.2"),
    (753, "1.16.3"),
    (754, "1.16.4"),
    (755, "1.17"),
    (756, "1.17.1"),
    (757, "1.18"),
    (758, "1.18.2"),
    (759, "1.19"),
    (760, "1.19.1"),
    (761, "1.19.3"),
    (762, "1.19.4"),
    (763, "1.20"),
    (764, "1.20.2"),
    (765, "1.20.3"),
    (766, "1.20.5"),
    (767, "1.21"),
    (768, "1.21.2"),
    (769, "1.21.4"),
];

impl ProtocolVersion {
    /// Placeholder before a handshake has been parsed.
    pub const UNKNOWN: Self = Self(-1);
    /// Pre-netty clients (server list ping `0xFE`, old login `0x02`).
    pub const LEGACY: Self = Self(-2);

    pub const MINECRAFT_1_7_2: Self = Self(4);
    pub const MINECRAFT_1_8: Self = Self(47);
    pub const MINECRAFT_1_13: Self = Self(393);
    pub const MINECRAFT_1_16: Self = Self(735);
    pub const MINECRAFT_1_20_2: Self = Self(764);
    pub const MINECRAFT_1_21_4: Self = Self(769);

    pub const MINIMUM_SUPPORTED: Self = Self::MINECRAFT_1_7_2;
    pub const MAXIMUM_SUPPORTED: Self = Self::MINECRAFT_1_21_4;

    pub const fn new(protocol: i32) -> Self {
        Self(protocol)
    }

    pub const fn protocol(&self) -> i32 {
        self.0
    }

    pub fn is_unknown(&self) -> bool {
        *self == Self::UNKNOWN
    }

    pub fn is_legacy(&self) -> bool {
        *self == Self::LEGACY
    }

    /// True for versions inside the supported window.
    pub fn is_supported(&self) -> bool {
        *self >= Self::MINIMUM_SUPPORTED && *self <= Self::MAXIMUM_SUPPORTED
    }

    /// Clients from 1.16 onwards render RGB colours in chat.
    pub fn supports_hex_colors(&self) -> bool {
        *self >= Self::MINECRAFT_1_16
    }

    /// Release name, if this is a known release.
    pub fn name(&self) -> Option<&'static str> {
        RELEASES
            .binary_search_by_key(&self.0, |(protocol, _)| *protocol)
            .ok()
            .map(|idx| RELEASES[idx].1)
    }

    /// Human-readable supported window, e.g. `1.7.2-1.21.4`.
    pub fn supported_range() -> String {
        format!(
            "{}-{}",
            Self::MINIMUM_SUPPORTED.name().unwrap_or("?"),
            Self::MAXIMUM_SUPPORTED.name().unwrap_or("?")
        )
    }
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (*self, self.name()) {
            (Self::UNKNOWN, _) => write!(f, "unknown"),
            (Self::LEGACY, _) => write!(f, "legacy"),
            (_, Some(name)) => write!(f, "{} ({})", name, self.0),
            (_, None) => write!(f, "protocol {}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_table_is_sorted() {
        assert!(RELEASES.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn supported_window() {
        assert!(ProtocolVersion::new(47).is_supported());
        assert!(ProtocolVersion::MAXIMUM_SUPPORTED.is_supported());
        assert!(!ProtocolVersion::new(3).is_supported());
        assert!(!ProtocolVersion::new(9000).is_supported());
        assert!(!ProtocolVersion::LEGACY.is_supported());
        assert!(!ProtocolVersion::UNKNOWN.is_supported());
    }

    #[test]
    fn names_and_range() {
        assert_eq!(ProtocolVersion::new(765).name(), Some("1.20.3"));
        assert_eq!(ProtocolVersion::new(766).to_string(), "1.20.5 (766)");
        assert_eq!(ProtocolVersion::new(12345).to_string(), "protocol 12345");
        assert_eq!(ProtocolVersion::supported_range(), "1.7.2-1.21.4");
    }

    #[test]
    fn hex_colors_from_1_16() {
        assert!(!ProtocolVersion::new(578).supports_hex_colors());
        assert!(ProtocolVersion::new(735).supports_hex_colors());
    }
}
