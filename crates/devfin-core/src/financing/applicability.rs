use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::catalog::{normalize_name, FinancingMethod};
use crate::error::DevFinError;
use crate::types::Rate;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Project lifecycle stage. Restricts which financing methods apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DevelopmentPhase {
    #[serde(rename = "Pre-Construction")]
    PreConstruction,
    #[serde(rename = "Construction")]
    Construction,
    #[serde(rename = "Post-Construction")]
    PostConstruction,
}

impl DevelopmentPhase {
    pub const ALL: [DevelopmentPhase; 3] = [
        DevelopmentPhase::PreConstruction,
        DevelopmentPhase::Construction,
        DevelopmentPhase::PostConstruction,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DevelopmentPhase::PreConstruction => "Pre-Construction",
            DevelopmentPhase::Construction => "Construction",
            DevelopmentPhase::PostConstruction => "Post-Construction",
        }
    }

    /// Phase-level exclusions applied on top of the applicability table.
    /// Recapitalisation capital is never raised while construction is running.
    pub fn excludes(&self, method: FinancingMethod) -> bool {
        matches!(
            (self, method),
            (
                DevelopmentPhase::Construction,
                FinancingMethod::PrivateEquity | FinancingMethod::CrowdfundingRecap
            )
        )
    }
}

impl fmt::Display for DevelopmentPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DevelopmentPhase {
    type Err = DevFinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_name(s).as_str() {
            "pre-construction" | "preconstruction" | "pre" => Ok(DevelopmentPhase::PreConstruction),
            "construction" => Ok(DevelopmentPhase::Construction),
            "post-construction" | "postconstruction" | "post" => {
                Ok(DevelopmentPhase::PostConstruction)
            }
            _ => Err(DevFinError::UnknownName {
                kind: "development phase",
                value: s.to_string(),
            }),
        }
    }
}

/// Real-estate product being developed. Only consulted in the Construction phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DevelopmentType {
    #[default]
    #[serde(rename = "Build to Sell (BTS)")]
    BuildToSell,
    #[serde(rename = "Build to Rent (BTR)")]
    BuildToRent,
    #[serde(rename = "Flex Living")]
    FlexLiving,
    #[serde(rename = "Data centers")]
    DataCenters,
    #[serde(rename = "Hotels")]
    Hotels,
    #[serde(rename = "Logistics")]
    Logistics,
    #[serde(rename = "Subsidized")]
    Subsidized,
}

impl DevelopmentType {
    pub const ALL: [DevelopmentType; 7] = [
        DevelopmentType::BuildToSell,
        DevelopmentType::BuildToRent,
        DevelopmentType::FlexLiving,
        DevelopmentType::DataCenters,
        DevelopmentType::Hotels,
        DevelopmentType::Logistics,
        DevelopmentType::Subsidized,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DevelopmentType::BuildToSell => "Build to Sell (BTS)",
            DevelopmentType::BuildToRent => "Build to Rent (BTR)",
            DevelopmentType::FlexLiving => "Flex Living",
            DevelopmentType::DataCenters => "Data centers",
            DevelopmentType::Hotels => "Hotels",
            DevelopmentType::Logistics => "Logistics",
            DevelopmentType::Subsidized => "Subsidized",
        }
    }
}

impl fmt::Display for DevelopmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DevelopmentType {
    type Err = DevFinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize_name(s);
        let by_alias = match key.as_str() {
            "bts" | "build-to-sell" => Some(DevelopmentType::BuildToSell),
            "btr" | "build-to-rent" => Some(DevelopmentType::BuildToRent),
            "flex" => Some(DevelopmentType::FlexLiving),
            "data-center" | "datacenter" | "datacenters" => Some(DevelopmentType::DataCenters),
            "hotel" => Some(DevelopmentType::Hotels),
            _ => None,
        };
        by_alias
            .or_else(|| {
                DevelopmentType::ALL
                    .into_iter()
                    .find(|t| normalize_name(t.name()) == key)
            })
            .ok_or_else(|| DevFinError::UnknownName {
                kind: "development type",
                value: s.to_string(),
            })
    }
}

/// Maximum leverage a financing method may contribute, as a fraction of total investment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodLimit {
    pub method: FinancingMethod,
    pub max_leverage: Rate,
}

const fn limit(method: FinancingMethod, max_leverage: Decimal) -> MethodLimit {
    MethodLimit {
        method,
        max_leverage,
    }
}

/// The financing methods applicable to a phase (and, during construction,
/// a development type), in table order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicableMethods {
    pub phase: DevelopmentPhase,
    /// Present only when the phase is Construction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub development_type: Option<DevelopmentType>,
    pub limits: Vec<MethodLimit>,
}

impl ApplicableMethods {
    pub fn max_leverage(&self, method: FinancingMethod) -> Option<Rate> {
        self.limits
            .iter()
            .find(|l| l.method == method)
            .map(|l| l.max_leverage)
    }

    /// A method is offered when it is in the table with a positive maximum,
    /// is not excluded by the phase, and is not the developer's own capital.
    pub fn is_offered(&self, method: FinancingMethod) -> bool {
        !method.is_own_capital()
            && !self.phase.excludes(method)
            && self
                .max_leverage(method)
                .is_some_and(|max| max > Decimal::ZERO)
    }

    pub fn offered(&self) -> impl Iterator<Item = &MethodLimit> + '_ {
        self.limits.iter().filter(|l| self.is_offered(l.method))
    }
}

// ---------------------------------------------------------------------------
// Static applicability tables
// ---------------------------------------------------------------------------

use FinancingMethod::*;

const PRE_CONSTRUCTION: &[MethodLimit] = &[
    limit(SeniorDebt, dec!(0.7)),
    limit(CrowdLending, dec!(0.7)),
    limit(DevelopersOwnCapital, dec!(1.0)),
];

const POST_CONSTRUCTION: &[MethodLimit] = &[
    limit(PrivateEquity, dec!(0.7)),
    limit(CrowdfundingRecap, dec!(0.7)),
];

const BUILD_TO_SELL: &[MethodLimit] = &[
    limit(BankLoan, dec!(0.5)),
    limit(SeniorDebt, dec!(0.6)),
    limit(MezzanineDebt, dec!(0.3)),
    limit(CrowdLending, dec!(0.6)),
    limit(DevelopersOwnCapital, dec!(1.0)),
    limit(Ico, dec!(0)),
    limit(PrivateEquity, dec!(0.7)),
    limit(CrowdfundingRecap, dec!(0.7)),
];

const BUILD_TO_RENT: &[MethodLimit] = &[
    limit(BankLoan, dec!(0.6)),
    limit(SeniorDebt, dec!(0.7)),
    limit(MezzanineDebt, dec!(0.4)),
    limit(CrowdLending, dec!(0.7)),
    limit(DevelopersOwnCapital, dec!(1.0)),
    limit(Ico, dec!(0)),
    limit(PrivateEquity, dec!(0.7)),
    limit(CrowdfundingRecap, dec!(0.7)),
];

const FLEX_LIVING: &[MethodLimit] = &[
    limit(BankLoan, dec!(0.40)),
    limit(SeniorDebt, dec!(0.6)),
    limit(MezzanineDebt, dec!(0.2)),
    limit(CrowdLending, dec!(0.6)),
    limit(DevelopersOwnCapital, dec!(1.0)),
    limit(Ico, dec!(0)),
    limit(PrivateEquity, dec!(0.7)),
    limit(CrowdfundingRecap, dec!(0.7)),
];

const DATA_CENTERS: &[MethodLimit] = &[
    limit(BankLoan, dec!(0.3)),
    limit(SeniorDebt, dec!(0.6)),
    limit(MezzanineDebt, dec!(0.3)),
    limit(CrowdLending, dec!(0.6)),
    limit(DevelopersOwnCapital, dec!(1.0)),
    limit(Ico, dec!(0)),
    limit(PrivateEquity, dec!(0.7)),
    limit(CrowdfundingRecap, dec!(0.7)),
];

// Hotels and Logistics share the Build to Sell limits.

const SUBSIDIZED: &[MethodLimit] = &[
    limit(BankLoan, dec!(0.5)),
    limit(SeniorDebt, dec!(0.6)),
    limit(MezzanineDebt, dec!(0.3)),
    limit(CrowdLending, dec!(0.6)),
    limit(DevelopersOwnCapital, dec!(1.0)),
    limit(Ico, dec!(0.3)),
    limit(PrivateEquity, dec!(0.7)),
    limit(CrowdfundingRecap, dec!(0.7)),
];

fn construction_limits(development_type: DevelopmentType) -> &'static [MethodLimit] {
    match development_type {
        DevelopmentType::BuildToSell | DevelopmentType::Hotels | DevelopmentType::Logistics => {
            BUILD_TO_SELL
        }
        DevelopmentType::BuildToRent => BUILD_TO_RENT,
        DevelopmentType::FlexLiving => FLEX_LIVING,
        DevelopmentType::DataCenters => DATA_CENTERS,
        DevelopmentType::Subsidized => SUBSIDIZED,
    }
}

/// Look up the financing methods and leverage caps for a phase.
///
/// Pre- and Post-Construction use a fixed method set; `development_type` is
/// only consulted for the Construction phase.
pub fn get_applicable_methods(
    phase: DevelopmentPhase,
    development_type: DevelopmentType,
) -> ApplicableMethods {
    let (limits, development_type) = match phase {
        DevelopmentPhase::PreConstruction => (PRE_CONSTRUCTION, None),
        DevelopmentPhase::Construction => {
            (construction_limits(development_type), Some(development_type))
        }
        DevelopmentPhase::PostConstruction => (POST_CONSTRUCTION, None),
    };
    ApplicableMethods {
        phase,
        development_type,
        limits: limits.to_vec(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn offered_methods(applicable: &ApplicableMethods) -> Vec<FinancingMethod> {
        applicable.offered().map(|l| l.method).collect()
    }

    #[test]
    fn test_pre_construction_ignores_type() {
        let a = get_applicable_methods(DevelopmentPhase::PreConstruction, DevelopmentType::Hotels);
        let b = get_applicable_methods(
            DevelopmentPhase::PreConstruction,
            DevelopmentType::Subsidized,
        );
        assert_eq!(a, b);
        assert!(a.development_type.is_none());
        assert_eq!(offered_methods(&a), vec![SeniorDebt, CrowdLending]);
    }

    #[test]
    fn test_post_construction_offers_recap_capital() {
        let a = get_applicable_methods(
            DevelopmentPhase::PostConstruction,
            DevelopmentType::BuildToRent,
        );
        assert_eq!(offered_methods(&a), vec![PrivateEquity, CrowdfundingRecap]);
        assert_eq!(a.max_leverage(PrivateEquity), Some(dec!(0.7)));
    }

    #[test]
    fn test_construction_excludes_recap_capital() {
        let a = get_applicable_methods(DevelopmentPhase::Construction, DevelopmentType::BuildToSell);
        assert_eq!(a.max_leverage(PrivateEquity), Some(dec!(0.7)));
        assert!(!a.is_offered(PrivateEquity));
        assert!(!a.is_offered(CrowdfundingRecap));
        assert_eq!(
            offered_methods(&a),
            vec![BankLoan, SeniorDebt, MezzanineDebt, CrowdLending]
        );
    }

    #[test]
    fn test_zero_cap_method_not_offered() {
        let bts = get_applicable_methods(DevelopmentPhase::Construction, DevelopmentType::BuildToSell);
        assert_eq!(bts.max_leverage(Ico), Some(Decimal::ZERO));
        assert!(!bts.is_offered(Ico));

        let subsidized =
            get_applicable_methods(DevelopmentPhase::Construction, DevelopmentType::Subsidized);
        assert!(subsidized.is_offered(Ico));
        assert_eq!(subsidized.max_leverage(Ico), Some(dec!(0.3)));
    }

    #[test]
    fn test_own_capital_never_offered() {
        for phase in DevelopmentPhase::ALL {
            for dev_type in DevelopmentType::ALL {
                let a = get_applicable_methods(phase, dev_type);
                assert!(!a.is_offered(DevelopersOwnCapital));
            }
        }
    }

    #[test]
    fn test_construction_caps_by_type() {
        let flex = get_applicable_methods(DevelopmentPhase::Construction, DevelopmentType::FlexLiving);
        assert_eq!(flex.max_leverage(BankLoan), Some(dec!(0.4)));
        assert_eq!(flex.max_leverage(MezzanineDebt), Some(dec!(0.2)));

        let dc = get_applicable_methods(DevelopmentPhase::Construction, DevelopmentType::DataCenters);
        assert_eq!(dc.max_leverage(BankLoan), Some(dec!(0.3)));

        let logistics =
            get_applicable_methods(DevelopmentPhase::Construction, DevelopmentType::Logistics);
        assert_eq!(logistics.limits, BUILD_TO_SELL.to_vec());
        assert_eq!(logistics.development_type, Some(DevelopmentType::Logistics));
    }

    #[test]
    fn test_phase_and_type_parsing() {
        assert_eq!(
            "Pre-Construction".parse::<DevelopmentPhase>().unwrap(),
            DevelopmentPhase::PreConstruction
        );
        assert_eq!(
            "post".parse::<DevelopmentPhase>().unwrap(),
            DevelopmentPhase::PostConstruction
        );
        assert_eq!(
            "Build to Rent (BTR)".parse::<DevelopmentType>().unwrap(),
            DevelopmentType::BuildToRent
        );
        assert_eq!(
            "data_centers".parse::<DevelopmentType>().unwrap(),
            DevelopmentType::DataCenters
        );
        assert_eq!(
            "BTS".parse::<DevelopmentType>().unwrap(),
            DevelopmentType::BuildToSell
        );
        assert!("Demolition".parse::<DevelopmentPhase>().is_err());
        assert!("Castle".parse::<DevelopmentType>().is_err());
    }
}
