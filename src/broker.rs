// src/broker.rs
use serde::{Serialize, Serializer};
use std::fmt;

/// Brokerage account labels used for grouping holdings. The set and its
/// display colors are fixed configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Broker {
    Kiwoom,
    MiraeAsset,
    Toss,
    KoreaInvestment,
    SamsungSecurities,
    NhInvestment,
}

impl Broker {
    pub const ALL: [Broker; 6] = [
        Broker::Kiwoom,
        Broker::MiraeAsset,
        Broker::Toss,
        Broker::KoreaInvestment,
        Broker::SamsungSecurities,
        Broker::NhInvestment,
    ];

    /// Fallback when a submitted broker name does not match any entry.
    pub const DEFAULT: Broker = Broker::Kiwoom;

    pub fn display_name(&self) -> &'static str {
        match self {
            Broker::Kiwoom => "키움증권",
            Broker::MiraeAsset => "미래에셋",
            Broker::Toss => "토스증권",
            Broker::KoreaInvestment => "한국투자",
            Broker::SamsungSecurities => "삼성증권",
            Broker::NhInvestment => "NH투자",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Broker::Kiwoom => "#FF6B00",
            Broker::MiraeAsset => "#0066CC",
            Broker::Toss => "#3182F6",
            Broker::KoreaInvestment => "#00A651",
            Broker::SamsungSecurities => "#0033A0",
            Broker::NhInvestment => "#00833E",
        }
    }

    pub fn resolve(name: &str) -> Broker {
        Broker::ALL
            .iter()
            .copied()
            .find(|b| b.display_name() == name)
            .unwrap_or(Broker::DEFAULT)
    }
}

impl fmt::Display for Broker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl Serialize for Broker {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.display_name())
    }
}
