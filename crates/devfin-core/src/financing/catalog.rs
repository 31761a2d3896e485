use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::DevFinError;
use crate::types::Rate;
use crate::DevFinResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A source of capital for a development project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FinancingMethod {
    #[serde(rename = "Bank Loan")]
    BankLoan,
    #[serde(rename = "Senior Debt")]
    SeniorDebt,
    #[serde(rename = "Mezzanine Debt")]
    MezzanineDebt,
    #[serde(rename = "ICO")]
    Ico,
    /// The developer's own equity. Always the residual, never selected directly.
    #[serde(rename = "Developers Own Capital")]
    DevelopersOwnCapital,
    #[serde(rename = "CrowdLending")]
    CrowdLending,
    #[serde(rename = "Private Equity")]
    PrivateEquity,
    #[serde(rename = "Crowdfunding Recap")]
    CrowdfundingRecap,
}

impl FinancingMethod {
    pub const ALL: [FinancingMethod; 8] = [
        FinancingMethod::BankLoan,
        FinancingMethod::SeniorDebt,
        FinancingMethod::MezzanineDebt,
        FinancingMethod::Ico,
        FinancingMethod::DevelopersOwnCapital,
        FinancingMethod::CrowdLending,
        FinancingMethod::PrivateEquity,
        FinancingMethod::CrowdfundingRecap,
    ];

    /// Human-readable name, identical to the serialized form.
    pub fn name(&self) -> &'static str {
        match self {
            FinancingMethod::BankLoan => "Bank Loan",
            FinancingMethod::SeniorDebt => "Senior Debt",
            FinancingMethod::MezzanineDebt => "Mezzanine Debt",
            FinancingMethod::Ico => "ICO",
            FinancingMethod::DevelopersOwnCapital => "Developers Own Capital",
            FinancingMethod::CrowdLending => "CrowdLending",
            FinancingMethod::PrivateEquity => "Private Equity",
            FinancingMethod::CrowdfundingRecap => "Crowdfunding Recap",
        }
    }

    pub fn is_own_capital(&self) -> bool {
        matches!(self, FinancingMethod::DevelopersOwnCapital)
    }
}

impl fmt::Display for FinancingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FinancingMethod {
    type Err = DevFinError;

    /// Accepts the display name ("Bank Loan") or a kebab/snake alias
    /// ("bank-loan", "bank_loan"), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize_name(s);
        FinancingMethod::ALL
            .into_iter()
            .find(|m| normalize_name(m.name()) == key)
            .or(match key.as_str() {
                "own" | "own-capital" | "developer" => Some(FinancingMethod::DevelopersOwnCapital),
                "mezzanine" | "mezz" => Some(FinancingMethod::MezzanineDebt),
                "pe" => Some(FinancingMethod::PrivateEquity),
                _ => None,
            })
            .ok_or_else(|| DevFinError::UnknownName {
                kind: "financing method",
                value: s.to_string(),
            })
    }
}

/// Lower-cases and maps spaces/underscores to hyphens so that
/// "Crowdfunding Recap", "crowdfunding_recap" and "crowdfunding-recap" agree.
pub(crate) fn normalize_name(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| match c {
            ' ' | '_' => '-',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// Inclusive band of fractions: a method's annual cost-of-capital range, or
/// the [0, cap] band a leverage selection must fall in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostRange {
    pub min: Rate,
    pub max: Rate,
}

impl CostRange {
    pub const fn new(min: Rate, max: Rate) -> Self {
        CostRange { min, max }
    }

    /// Default interest rate for a method: the arithmetic mean of the range.
    pub fn midpoint(&self) -> Rate {
        (self.min + self.max) / dec!(2)
    }

    /// Inclusive on both ends.
    pub fn contains(&self, value: Rate) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn clamp(&self, value: Rate) -> Rate {
        value.max(self.min).min(self.max)
    }
}

/// One catalog row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub method: FinancingMethod,
    pub cost_range: CostRange,
}

/// Immutable catalog of cost-of-capital ranges keyed by financing method.
///
/// Built either from the standard table (`FinancingCatalog::standard`) or
/// from caller-supplied entries, which are validated on construction and on
/// deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CatalogEntry>", into = "Vec<CatalogEntry>")]
pub struct FinancingCatalog {
    entries: Vec<CatalogEntry>,
}

const STANDARD_ENTRIES: &[CatalogEntry] = &[
    CatalogEntry {
        method: FinancingMethod::BankLoan,
        cost_range: CostRange::new(dec!(0.03), dec!(0.06)),
    },
    CatalogEntry {
        method: FinancingMethod::SeniorDebt,
        cost_range: CostRange::new(dec!(0.15), dec!(0.20)),
    },
    CatalogEntry {
        method: FinancingMethod::MezzanineDebt,
        cost_range: CostRange::new(dec!(0.20), dec!(0.25)),
    },
    CatalogEntry {
        method: FinancingMethod::Ico,
        cost_range: CostRange::new(dec!(0.01), dec!(0.03)),
    },
    CatalogEntry {
        method: FinancingMethod::DevelopersOwnCapital,
        cost_range: CostRange::new(dec!(0.0), dec!(0.0)),
    },
    CatalogEntry {
        method: FinancingMethod::CrowdLending,
        cost_range: CostRange::new(dec!(0.12), dec!(0.15)),
    },
    CatalogEntry {
        method: FinancingMethod::PrivateEquity,
        cost_range: CostRange::new(dec!(0.20), dec!(0.25)),
    },
    CatalogEntry {
        method: FinancingMethod::CrowdfundingRecap,
        cost_range: CostRange::new(dec!(0.15), dec!(0.20)),
    },
];

static STANDARD_CATALOG: OnceLock<FinancingCatalog> = OnceLock::new();

impl FinancingCatalog {
    /// Build a catalog from explicit entries.
    ///
    /// Every range must satisfy 0 <= min <= max <= 1 and each method may
    /// appear at most once.
    pub fn new(entries: Vec<CatalogEntry>) -> DevFinResult<Self> {
        let mut seen = BTreeSet::new();
        for entry in &entries {
            let CostRange { min, max } = entry.cost_range;
            let field = format!("cost_range:{}", entry.method);
            if min < Decimal::ZERO || max > Decimal::ONE {
                return Err(DevFinError::InvalidInput {
                    field,
                    reason: format!("Cost of capital must lie within [0, 1], got [{min}, {max}]"),
                });
            }
            if min > max {
                return Err(DevFinError::InvalidInput {
                    field,
                    reason: format!("Minimum cost {min} exceeds maximum {max}"),
                });
            }
            if !seen.insert(entry.method) {
                return Err(DevFinError::InvalidInput {
                    field: "method".into(),
                    reason: format!("Duplicate catalog entry for {}", entry.method),
                });
            }
        }
        Ok(FinancingCatalog { entries })
    }

    /// The built-in catalog, initialised once per process.
    pub fn standard() -> &'static FinancingCatalog {
        STANDARD_CATALOG.get_or_init(|| FinancingCatalog {
            entries: STANDARD_ENTRIES.to_vec(),
        })
    }

    pub fn cost_range(&self, method: FinancingMethod) -> Option<CostRange> {
        self.entries
            .iter()
            .find(|e| e.method == method)
            .map(|e| e.cost_range)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }
}

impl TryFrom<Vec<CatalogEntry>> for FinancingCatalog {
    type Error = DevFinError;

    fn try_from(entries: Vec<CatalogEntry>) -> Result<Self, Self::Error> {
        FinancingCatalog::new(entries)
    }
}

impl From<FinancingCatalog> for Vec<CatalogEntry> {
    fn from(catalog: FinancingCatalog) -> Self {
        catalog.entries
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
