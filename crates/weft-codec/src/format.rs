//! String format and compatibility-level dispatch.
//!
//! A text codec is constructed from a requested [`StringFormat`] and a
//! [`CompatLevel`]; the pair resolves once, at construction, to exactly one
//! [`WireTextFormat`] routine. The resolution is a single exhaustive match
//! with no wildcard arm: adding a format or a level forces every dispatch
//! site to be revisited by the compiler.

use serde::{Deserialize, Serialize};

/// Text encoding requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StringFormat {
    /// One byte per character; only U+0000..=U+00FF are representable.
    Iso8859_1,
    /// Standard variable-length UTF-8.
    Utf8,
    /// Two bytes per UTF-16 code unit; byte order follows the level.
    Utf16,
    /// Legacy UTF-8 variant where every code unit encodes in at most
    /// three bytes (supplementary characters as surrogate pairs).
    Utf8Mb3,
}

/// Wire compatibility level, ordered from oldest to newest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum CompatLevel {
    /// The lowest supported legacy level. Forces the UTF8_MB3 substitution
    /// for ISO-8859-1 and UTF-8 requests.
    V1,
    /// Intermediate level: modern text formats, big-endian UTF-16.
    V2,
    /// Current level: little-endian UTF-16.
    #[default]
    V3,
}

impl CompatLevel {
    /// The lowest supported level.
    pub const MIN: Self = Self::V1;

    /// Whether this level carries the legacy wire substitutions.
    pub const fn is_legacy(self) -> bool {
        matches!(self, Self::V1)
    }
}

/// The concrete read/write routine a text codec runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireTextFormat {
    /// One byte per character, varint character-count prefix.
    Iso8859_1,
    /// UTF-8 bytes, varint byte-count prefix.
    Utf8,
    /// Big-endian UTF-16 code units, varint code-unit-count prefix.
    Utf16Be,
    /// Little-endian UTF-16 code units, varint code-unit-count prefix.
    Utf16Le,
    /// Per-code-unit UTF-8 (at most three bytes per unit), varint
    /// byte-count prefix.
    Utf8Mb3,
}

/// Resolve a requested format and level to the routine that runs.
///
/// Old streams were written before the four-byte UTF-8 range existed in
/// this wire format, so at the legacy level ISO-8859-1 and UTF-8 requests
/// silently substitute UTF8_MB3 on both the encode and decode paths.
pub const fn resolve(format: StringFormat, level: CompatLevel) -> WireTextFormat {
    match (format, level) {
        (StringFormat::Iso8859_1 | StringFormat::Utf8, CompatLevel::V1) => WireTextFormat::Utf8Mb3,
        (StringFormat::Iso8859_1, CompatLevel::V2 | CompatLevel::V3) => WireTextFormat::Iso8859_1,
        (StringFormat::Utf8, CompatLevel::V2 | CompatLevel::V3) => WireTextFormat::Utf8,
        (StringFormat::Utf16, CompatLevel::V1 | CompatLevel::V2) => WireTextFormat::Utf16Be,
        (StringFormat::Utf16, CompatLevel::V3) => WireTextFormat::Utf16Le,
        (StringFormat::Utf8Mb3, CompatLevel::V1 | CompatLevel::V2 | CompatLevel::V3) => {
            WireTextFormat::Utf8Mb3
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_level_substitutes_mb3() {
        assert_eq!(
            resolve(StringFormat::Iso8859_1, CompatLevel::V1),
            WireTextFormat::Utf8Mb3
        );
        assert_eq!(
            resolve(StringFormat::Utf8, CompatLevel::V1),
            WireTextFormat::Utf8Mb3
        );
        // UTF-16 is never substituted.
        assert_eq!(
            resolve(StringFormat::Utf16, CompatLevel::V1),
            WireTextFormat::Utf16Be
        );
    }

    #[test]
    fn current_levels_resolve_directly() {
        for level in [CompatLevel::V2, CompatLevel::V3] {
            assert_eq!(
                resolve(StringFormat::Iso8859_1, level),
                WireTextFormat::Iso8859_1
            );
            assert_eq!(resolve(StringFormat::Utf8, level), WireTextFormat::Utf8);
            assert_eq!(
                resolve(StringFormat::Utf8Mb3, level),
                WireTextFormat::Utf8Mb3
            );
        }
    }

    #[test]
    fn utf16_byte_order_follows_level() {
        assert_eq!(
            resolve(StringFormat::Utf16, CompatLevel::V2),
            WireTextFormat::Utf16Be
        );
        assert_eq!(
            resolve(StringFormat::Utf16, CompatLevel::V3),
            WireTextFormat::Utf16Le
        );
    }

    #[test]
    fn levels_are_ordered() {
        assert!(CompatLevel::V1 < CompatLevel::V2);
        assert!(CompatLevel::V2 < CompatLevel::V3);
        assert_eq!(CompatLevel::MIN, CompatLevel::V1);
        assert!(CompatLevel::V1.is_legacy());
        assert!(!CompatLevel::V3.is_legacy());
    }
}
