//! Parsing and conversion of IAM unit strings.
//!
//! Scenario data uses a small family of units: a (prefixed) mass or energy, optionally
//! followed by a chemical species and optionally expressed per year, e.g.
//! `Mt CO2/yr`, `Gt CO2 / yr`, `GtC`, `EJ/yr` or `TWh/yr`.
//!
//! Whitespace is not significant, so `Gt CO2 / yr` and `GtCO2/yr` are the same unit.
//! Carbon and carbon dioxide masses convert into each other using the molecular
//! weight ratio 44/12.
//!
//! ```
//! use scenmeta_core::units::Unit;
//!
//! let mt = Unit::parse("Mt CO2/yr").unwrap();
//! let gt = Unit::parse("Gt CO2 / yr").unwrap();
//! assert!(mt.is_compatible(&gt));
//! assert!((mt.conversion_factor(&gt).unwrap() - 1e-3).abs() < 1e-12);
//! ```

use crate::errors::{CriteriaError, CriteriaResult};
use std::fmt;

/// Molecular weight ratio of CO2 to C.
const CO2_PER_C: f64 = 44.0 / 12.0;

/// Physical quantity of the numerator of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Mass,
    Energy,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Mass => write!(f, "mass"),
            Dimension::Energy => write!(f, "energy"),
        }
    }
}

struct BaseUnit {
    symbol: &'static str,
    dimension: Dimension,
    /// Multiplier to kg or J
    factor: f64,
}

static BASE_UNITS: &[BaseUnit] = &[
    BaseUnit {
        symbol: "Wh",
        dimension: Dimension::Energy,
        factor: 3600.0,
    },
    BaseUnit {
        symbol: "J",
        dimension: Dimension::Energy,
        factor: 1.0,
    },
    BaseUnit {
        symbol: "t",
        dimension: Dimension::Mass,
        factor: 1e3,
    },
    BaseUnit {
        symbol: "g",
        dimension: Dimension::Mass,
        factor: 1e-3,
    },
];

static PREFIXES: &[(&str, f64)] = &[
    ("E", 1e18),
    ("P", 1e15),
    ("T", 1e12),
    ("G", 1e9),
    ("M", 1e6),
    ("k", 1e3),
    ("", 1.0),
];

static PER_YEAR: &[&str] = &["yr", "a", "year"];

/// A parsed unit.
#[derive(Debug, Clone)]
pub struct Unit {
    original: String,
    dimension: Dimension,
    scale: f64,
    species: String,
    per_year: bool,
}

impl Unit {
    pub fn parse(input: &str) -> CriteriaResult<Self> {
        let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
        let parse_error = |details: &str| CriteriaError::UnitParse {
            unit: input.to_string(),
            details: details.to_string(),
        };

        let (numerator, per_year) = match compact.split_once('/') {
            None => (compact.as_str(), false),
            Some((num, denom)) => {
                if !PER_YEAR.contains(&denom) {
                    return Err(parse_error("only per-year rates are supported"));
                }
                (num, true)
            }
        };
        if numerator.is_empty() {
            return Err(parse_error("empty unit"));
        }

        for (prefix, prefix_factor) in PREFIXES {
            let Some(rest) = numerator.strip_prefix(prefix) else {
                continue;
            };
            for base in BASE_UNITS {
                if let Some(species) = rest.strip_prefix(base.symbol) {
                    return Ok(Self {
                        original: input.to_string(),
                        dimension: base.dimension,
                        scale: prefix_factor * base.factor,
                        species: species.to_string(),
                        per_year,
                    });
                }
            }
        }
        Err(parse_error("unknown mass or energy unit"))
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn species(&self) -> &str {
        &self.species
    }

    pub fn is_rate(&self) -> bool {
        self.per_year
    }

    fn species_factor(&self, other: &Unit) -> Option<f64> {
        match (self.species.as_str(), other.species.as_str()) {
            (a, b) if a == b => Some(1.0),
            ("C", "CO2") => Some(CO2_PER_C),
            ("CO2", "C") => Some(1.0 / CO2_PER_C),
            _ => None,
        }
    }

    pub fn is_compatible(&self, other: &Unit) -> bool {
        self.dimension == other.dimension
            && self.per_year == other.per_year
            && self.species_factor(other).is_some()
    }

    /// Multiplier converting a value in `self` to a value in `other`.
    pub fn conversion_factor(&self, other: &Unit) -> CriteriaResult<f64> {
        if self.dimension != other.dimension || self.per_year != other.per_year {
            return Err(self.incompatible(other));
        }
        let species = self
            .species_factor(other)
            .ok_or_else(|| self.incompatible(other))?;
        Ok(self.scale / other.scale * species)
    }

    fn incompatible(&self, other: &Unit) -> CriteriaError {
        CriteriaError::IncompatibleUnits {
            from: self.original.clone(),
            to: other.original.clone(),
        }
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.dimension == other.dimension
            && self.per_year == other.per_year
            && self.species == other.species
            && (self.scale - other.scale).abs() <= f64::EPSILON * self.scale.abs()
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}

/// Conversion factor between two unit strings.
///
/// Identical strings short-circuit to 1 without parsing, so labels the parser
/// does not understand still work when no conversion is needed.
pub fn conversion_factor(from: &str, to: &str) -> CriteriaResult<f64> {
    if from == to {
        return Ok(1.0);
    }
    Unit::parse(from)?.conversion_factor(&Unit::parse(to)?)
}
