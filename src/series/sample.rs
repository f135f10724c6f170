use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct ScalarSample {
    pub time: f64,
    pub value: f64,
}

/// Outcome of offering a sample to a rate-limited series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Admission {
    Accepted(ScalarSample),
    /// Arrived less than one sample period after the last accepted sample.
    Decimated,
}

impl Admission {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Admission::Accepted(_))
    }
}
