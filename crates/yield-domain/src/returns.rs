use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Named return period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
    AllTime,
}

impl Period {
    /// All periods, shortest first.
    pub const ALL: [Period; 4] = [
        Period::Daily,
        Period::Weekly,
        Period::Monthly,
        Period::AllTime,
    ];

    /// Nominal window length in days.
    pub fn nominal_days(&self) -> u32 {
        match self {
            Self::Daily => 1,
            Self::Weekly => 7,
            Self::Monthly => 30,
            Self::AllTime => 2000,
        }
    }

    /// The next shorter period, if any.
    pub fn shorter(&self) -> Option<Period> {
        match self {
            Self::Daily => None,
            Self::Weekly => Some(Self::Daily),
            Self::Monthly => Some(Self::Weekly),
            Self::AllTime => Some(Self::Monthly),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::AllTime => "allTime",
        };
        f.write_str(name)
    }
}

/// Annualized fee return over one resolved window.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodReturn {
    pub total_period_seconds: i64,
    pub cum_fee_return: f64,
    pub fee_apr: f64,
    pub fee_apy: f64,
}

impl PeriodReturn {
    /// The canonical empty result.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether annualization blew up (infinite or NaN).
    pub fn is_divergent(&self) -> bool {
        !(self.fee_apr.is_finite() && self.fee_apy.is_finite())
    }
}

/// Mapping of period to its computed return.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeriodReturns(BTreeMap<Period, PeriodReturn>);

impl PeriodReturns {
    /// The canonical empty result: every period present, all fields zero.
    pub fn empty() -> Self {
        Self(
            Period::ALL
                .iter()
                .map(|period| (*period, PeriodReturn::empty()))
                .collect(),
        )
    }

    pub fn get(&self, period: Period) -> Option<&PeriodReturn> {
        self.0.get(&period)
    }

    pub fn insert(&mut self, period: Period, value: PeriodReturn) -> Option<PeriodReturn> {
        self.0.insert(period, value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Period, &PeriodReturn)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Period, PeriodReturn)> for PeriodReturns {
    fn from_iter<I: IntoIterator<Item = (Period, PeriodReturn)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
