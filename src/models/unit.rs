use serde::{Deserialize, Serialize};
use std::fmt;

/// Unit of measure attached to quantities.
///
/// Units are stored as free-form strings; only mass (kg) and discrete counts are
/// understood by the expansion engine. Nothing is ever converted between units.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Unit {
    /// Kilograms
    Mass,
    /// Discrete pieces ("un")
    Discrete,
    /// Any other unit string, kept verbatim
    Other(String),
}

impl Unit {
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase();
        match normalized.as_str() {
            "kg" | "kgs" | "kilo" | "kilos" | "kilograma" | "kilogramas" => Unit::Mass,
            "un" | "und" | "unid" | "unidade" | "unidades" | "u" | "pc" => Unit::Discrete,
            _ => Unit::Other(raw.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Unit::Mass => "kg",
            Unit::Discrete => "un",
            Unit::Other(raw) => raw,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Unit {
    fn from(raw: String) -> Self {
        Unit::parse(&raw)
    }
}

impl From<&str> for Unit {
    fn from(raw: &str) -> Self {
        Unit::parse(raw)
    }
}

impl From<Unit> for String {
    fn from(unit: Unit) -> Self {
        unit.as_str().to_string()
    }
}
