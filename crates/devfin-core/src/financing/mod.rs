pub mod applicability;
pub mod catalog;
pub mod scenario;

#[cfg(feature = "project_state")]
pub mod project_state;

pub use applicability::{
    get_applicable_methods, ApplicableMethods, DevelopmentPhase, DevelopmentType, MethodLimit,
};
pub use catalog::{CatalogEntry, CostRange, FinancingCatalog, FinancingMethod};
pub use scenario::{
    evaluate_scenario, BoundPolicy, DeveloperBreakdown, EquityMultiplier, MethodBreakdown,
    ScenarioInput, ScenarioResult,
};
