use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    #[error("line item key `{key}` is declared by both `{first_case}` and `{second_case}`")]
    DuplicateCalculatorKey {
        key: String,
        first_case: String,
        second_case: String,
    },

    #[error("case key `{0}` is used more than once")]
    DuplicateCaseKey(String),

    #[error("line item key `{key}` in case `{case}` is reserved for the engine")]
    ReservedKey { key: String, case: String },
}
