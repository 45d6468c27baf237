//! Gene symbol newtype, validated before any provider is contacted.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid gene symbol {0:?}: expected 1-24 letters, digits, '-', '.' or '_'")]
pub struct InvalidSymbol(pub String);

fn symbol_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]{0,23}$").expect("static regex is valid")
    })
}

/// A trimmed, syntactically valid HGNC-style gene symbol (e.g. `EGFR`, `C9orf72`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GeneSymbol(String);

impl GeneSymbol {
    pub fn parse(raw: &str) -> Result<Self, InvalidSymbol> {
        let trimmed = raw.trim();
        if symbol_pattern().is_match(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(InvalidSymbol(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GeneSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for GeneSymbol {
    type Error = InvalidSymbol;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        GeneSymbol::parse(&value)
    }
}

impl From<GeneSymbol> for String {
    fn from(symbol: GeneSymbol) -> Self {
        symbol.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_symbols() {
        for raw in ["EGFR", " KRAS ", "C9orf72", "HLA-A", "NKX2-1"] {
            assert!(GeneSymbol::parse(raw).is_ok(), "{raw} should parse");
        }
        assert_eq!(GeneSymbol::parse("  TP53\n").unwrap().as_str(), "TP53");
    }

    #[test]
    fn test_invalid_symbols() {
        for raw in ["", "   ", "EGFR;DROP", "-EGFR", "A B", "THISSYMBOLISWAYTOOLONGTOBEREAL"] {
            assert!(GeneSymbol::parse(raw).is_err(), "{raw:?} should be rejected");
        }
    }
}
