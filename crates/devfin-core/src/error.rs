use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DevFinError {
    #[error("Invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Over-allocation: selected leverage totals {total}; total equity cannot exceed 100%")]
    OverAllocation { total: Decimal },

    #[error("Out of range: {field} = {value} must lie within [{min}, {max}]")]
    OutOfRange {
        field: String,
        value: Decimal,
        min: Decimal,
        max: Decimal,
    },

    #[error("Financing method '{method}' is not offered in the {phase} phase")]
    MethodNotOffered { method: String, phase: String },

    #[error("Unknown {kind}: '{value}'")]
    UnknownName { kind: &'static str, value: String },

    #[error("Arithmetic overflow in {context}")]
    ArithmeticOverflow { context: String },
}
