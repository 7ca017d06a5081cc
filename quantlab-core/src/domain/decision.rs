//! Decision — the per-bar output of a strategy.

use serde::{Deserialize, Serialize};

/// What a strategy wants to do at the close of the current bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Buy,
    Sell,
    #[default]
    Hold,
}

impl Decision {
    /// Trade side implied by the decision; `None` for `Hold`.
    pub fn side(self) -> Option<Side> {
        match self {
            Decision::Buy => Some(Side::Buy),
            Decision::Sell => Some(Side::Sell),
            Decision::Hold => None,
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::Buy => write!(f, "BUY"),
            Decision::Sell => write!(f, "SELL"),
            Decision::Hold => write!(f, "HOLD"),
        }
    }
}

/// Direction of an executed trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hold_has_no_side() {
        assert_eq!(Decision::Hold.side(), None);
        assert_eq!(Decision::Buy.side(), Some(Side::Buy));
        assert_eq!(Decision::Sell.side(), Some(Side::Sell));
    }

    #[test]
    fn serializes_uppercase() {
        let json = serde_json::to_string(&Decision::Sell).unwrap();
        assert_eq!(json, "\"SELL\"");
        let back: Decision = serde_json::from_str("\"BUY\"").unwrap();
        assert_eq!(back, Decision::Buy);
    }
}
