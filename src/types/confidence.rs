use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};

/// A 0-100 score estimating how likely a column-to-meaning assignment is correct.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Confidence(u8);

impl Confidence {
    pub const MAX: Confidence = Confidence(100);
    pub const MIN: Confidence = Confidence(0);

    pub fn new(value: u8) -> Option<Self> {
        (value <= Self::MAX.0).then_some(Confidence(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Lowers the score, flooring at zero.
    pub fn penalize(self, amount: u8) -> Self {
        Confidence(self.0.saturating_sub(amount))
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Self::MAX
    }
}

impl TryFrom<u8> for Confidence {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Confidence::new(value).ok_or_else(|| format!("Confidence [{value}] must be between 0 and 100"))
    }
}

impl From<Confidence> for u8 {
    fn from(confidence: Confidence) -> Self {
        confidence.0
    }
}

impl Display for Confidence {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}
