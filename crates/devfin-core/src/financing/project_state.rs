use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use super::applicability::DevelopmentPhase;
use super::catalog::{normalize_name, FinancingMethod};
use crate::error::DevFinError;
use crate::types::{with_metadata, ComputationOutput, Rate};
use crate::DevFinResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DevelopmentLocation {
    #[default]
    #[serde(rename = "Urban of a growing or coastal city")]
    UrbanGrowing,
    #[serde(rename = "Suburbs of a growing city")]
    SuburbsGrowing,
    #[serde(rename = "Non-growing or coastal city")]
    NonGrowing,
}

impl DevelopmentLocation {
    pub fn name(&self) -> &'static str {
        match self {
            DevelopmentLocation::UrbanGrowing => "Urban of a growing or coastal city",
            DevelopmentLocation::SuburbsGrowing => "Suburbs of a growing city",
            DevelopmentLocation::NonGrowing => "Non-growing or coastal city",
        }
    }
}

impl fmt::Display for DevelopmentLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DevelopmentLocation {
    type Err = DevFinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize_name(s);
        match key.as_str() {
            "urban" => return Ok(DevelopmentLocation::UrbanGrowing),
            "suburbs" | "suburban" => return Ok(DevelopmentLocation::SuburbsGrowing),
            "non-growing" | "nongrowing" => return Ok(DevelopmentLocation::NonGrowing),
            _ => {}
        }
        [
            DevelopmentLocation::UrbanGrowing,
            DevelopmentLocation::SuburbsGrowing,
            DevelopmentLocation::NonGrowing,
        ]
        .into_iter()
        .find(|l| normalize_name(l.name()) == key)
        .ok_or_else(|| DevFinError::UnknownName {
            kind: "development location",
            value: s.to_string(),
        })
    }
}

/// Where the project stands today.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectState {
    pub land_acquired: bool,
    /// Share of units pre-sold (0.25 = 25%)
    pub presales: Rate,
    /// Share of construction completed
    pub construction_progress: Rate,
    #[serde(default)]
    pub location: DevelopmentLocation,
}

/// Financing route suited to the project's current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinancingAdvice {
    /// Replace the developer's equity with external capital for the final stages
    Recapitalization,
    /// Layer mezzanine debt over existing senior financing
    MezzanineTopUp,
    /// Project meets bank requirements for a construction loan
    TraditionalBankLoan,
    /// Below bank requirements: private senior debt or crowd-lending
    AlternativeConstructionDebt,
    /// Short-term bridge until bank requirements are met
    BridgeLoan,
}

impl FinancingAdvice {
    pub fn suggested_methods(&self) -> &'static [FinancingMethod] {
        match self {
            FinancingAdvice::Recapitalization => &[
                FinancingMethod::PrivateEquity,
                FinancingMethod::CrowdfundingRecap,
            ],
            FinancingAdvice::MezzanineTopUp => {
                &[FinancingMethod::MezzanineDebt, FinancingMethod::BankLoan]
            }
            FinancingAdvice::TraditionalBankLoan => &[FinancingMethod::BankLoan],
            FinancingAdvice::AlternativeConstructionDebt | FinancingAdvice::BridgeLoan => {
                &[FinancingMethod::SeniorDebt, FinancingMethod::CrowdLending]
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectAssessment {
    /// Phase to preselect when building a scenario
    pub suggested_phase: DevelopmentPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advice: Option<FinancingAdvice>,
    pub suggested_methods: Vec<FinancingMethod>,
    /// Location may constrain access to financing
    pub location_caution: bool,
}

// ---------------------------------------------------------------------------
// Assessment
// ---------------------------------------------------------------------------

/// Derive the default development phase and a financing route from the
/// project's land, pre-sales and construction status.
pub fn assess_project(state: &ProjectState) -> DevFinResult<ComputationOutput<ProjectAssessment>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_state(state)?;

    let suggested_phase = suggest_phase(state);
    let advice = financing_advice(state);
    let location_caution = state.location == DevelopmentLocation::NonGrowing;
    if location_caution {
        warnings.push(
            "Non-growing location: access to financing and its conditions may be constrained"
                .into(),
        );
    }

    log::debug!(
        "project assessment: phase {suggested_phase}, advice {advice:?}, caution {location_caution}"
    );

    let output = ProjectAssessment {
        suggested_phase,
        advice,
        suggested_methods: advice
            .map(|a| a.suggested_methods().to_vec())
            .unwrap_or_default(),
        location_caution,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Project state assessment (land, pre-sales, construction progress)",
        state,
        warnings,
        elapsed,
        output,
    ))
}

/// No land: Pre-Construction. Land with pre-sales under 60%: Construction.
/// Otherwise Post-Construction.
pub fn suggest_phase(state: &ProjectState) -> DevelopmentPhase {
    if !state.land_acquired {
        DevelopmentPhase::PreConstruction
    } else if state.presales < dec!(0.60) {
        DevelopmentPhase::Construction
    } else {
        DevelopmentPhase::PostConstruction
    }
}

fn financing_advice(state: &ProjectState) -> Option<FinancingAdvice> {
    let presales = state.presales;
    let progress = state.construction_progress;
    let half = dec!(0.50);
    let in_band = |v: Decimal| v >= half && v <= dec!(0.60);

    if !state.land_acquired {
        return (presales < half && progress < half).then_some(FinancingAdvice::BridgeLoan);
    }
    if presales > dec!(0.70) && progress > half {
        Some(FinancingAdvice::Recapitalization)
    } else if in_band(presales) && in_band(progress) {
        Some(FinancingAdvice::MezzanineTopUp)
    } else if presales >= half && progress < half {
        Some(FinancingAdvice::TraditionalBankLoan)
    } else if presales < half && progress < half {
        Some(FinancingAdvice::AlternativeConstructionDebt)
    } else {
        None
    }
}

fn validate_state(state: &ProjectState) -> DevFinResult<()> {
    for (field, value) in [
        ("presales", state.presales),
        ("construction_progress", state.construction_progress),
    ] {
        if value < Decimal::ZERO || value > Decimal::ONE {
            return Err(DevFinError::OutOfRange {
                field: field.into(),
                value,
                min: Decimal::ZERO,
                max: Decimal::ONE,
            });
        }
    }
    if !state.land_acquired {
        if state.presales > dec!(0.25) {
            return Err(DevFinError::InvalidInput {
                field: "presales".into(),
                reason: "Pre-sales are limited to 25% until land is acquired".into(),
            });
        }
        if !state.construction_progress.is_zero() {
            return Err(DevFinError::InvalidInput {
                field: "construction_progress".into(),
                reason: "Construction cannot progress before land is acquired".into(),
            });
        }
    }
    if state.construction_progress > state.presales {
        return Err(DevFinError::InvalidInput {
            field: "construction_progress".into(),
            reason: "Construction progress cannot exceed pre-sales".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
