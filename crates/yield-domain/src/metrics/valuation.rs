use crate::conversion::ConversionContext;
use crate::error::ValuationError;
use crate::math::fee_growth::UncollectedFees;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Uncollected fees in whole token units and in USD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeeValuation {
    pub token0: Decimal,
    pub token1: Decimal,
    #[serde(rename = "token0USD")]
    pub token0_usd: Decimal,
    #[serde(rename = "token1USD")]
    pub token1_usd: Decimal,
}

impl FeeValuation {
    pub fn total_usd(&self) -> Result<Decimal, ValuationError> {
        self.token0_usd
            .checked_add(self.token1_usd)
            .ok_or(ValuationError::SumOverflow)
    }

    /// Field-wise sum; fails when any field leaves the decimal range.
    pub fn checked_add(&self, rhs: &Self) -> Result<Self, ValuationError> {
        let add = |a: Decimal, b: Decimal| a.checked_add(b).ok_or(ValuationError::SumOverflow);
        Ok(Self {
            token0: add(self.token0, rhs.token0)?,
            token1: add(self.token1, rhs.token1)?,
            token0_usd: add(self.token0_usd, rhs.token0_usd)?,
            token1_usd: add(self.token1_usd, rhs.token1_usd)?,
        })
    }

    /// Attaches the total value locked of the position.
    pub fn with_tvl(self, tvl_usd: Decimal) -> UncollectedFeesUsd {
        UncollectedFeesUsd {
            token0: self.token0,
            token1: self.token1,
            token0_usd: self.token0_usd,
            token1_usd: self.token1_usd,
            tvl_usd,
        }
    }
}

/// Valued uncollected fees together with the position TVL used for gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UncollectedFeesUsd {
    pub token0: Decimal,
    pub token1: Decimal,
    #[serde(rename = "token0USD")]
    pub token0_usd: Decimal,
    #[serde(rename = "token1USD")]
    pub token1_usd: Decimal,
    #[serde(rename = "tvlUSD")]
    pub tvl_usd: Decimal,
}

impl UncollectedFeesUsd {
    pub fn total_usd(&self) -> Result<Decimal, ValuationError> {
        self.token0_usd
            .checked_add(self.token1_usd)
            .ok_or(ValuationError::SumOverflow)
    }
}

/// Values raw uncollected amounts in whole units and USD.
///
/// An invalid conversion context still scales the token amounts but values
/// both of them at zero USD. The per-token values are not summed here, see
/// [`FeeValuation::total_usd`].
pub fn value_fees(
    fees: &UncollectedFees,
    decimals0: u8,
    decimals1: u8,
    conversion: &ConversionContext,
) -> Result<FeeValuation, ValuationError> {
    let token0 = fees.amount0.to_decimal(decimals0)?;
    let token1 = fees.amount1.to_decimal(decimals1)?;

    let to_usd = |amount: Decimal, index: u8| -> Result<Decimal, ValuationError> {
        match conversion.usd_per_token(index)? {
            Some(price) => amount
                .checked_mul(price)
                .ok_or(ValuationError::ArithmeticOverflow { token: index }),
            None => Ok(Decimal::ZERO),
        }
    };

    Ok(FeeValuation {
        token0,
        token1,
        token0_usd: to_usd(token0, 0)?,
        token1_usd: to_usd(token1, 1)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenAmount;
    use rust_decimal_macros::dec;

    fn fees() -> UncollectedFees {
        UncollectedFees {
            // 1.5 USDC, 0.002 WETH
            amount0: TokenAmount::from(1_500_000u64),
            amount1: TokenAmount::from(2_000_000_000_000_000u64),
        }
    }

    #[test]
    fn test_base_token0() {
        // token0 is the USD-priced base, token1 quoted in token0
        let ctx = ConversionContext::new(0, dec!(2000), dec!(1));
        let v = value_fees(&fees(), 6, 18, &ctx).unwrap();

        assert_eq!(v.token0, dec!(1.5));
        assert_eq!(v.token1, dec!(0.002));
        assert_eq!(v.token0_usd, dec!(1.5));
        assert_eq!(v.token1_usd, dec!(4.000));
        assert_eq!(v.total_usd(), Ok(dec!(5.5)));
    }

    #[test]
    fn test_base_token1() {
        let ctx = ConversionContext::new(1, dec!(0.0005), dec!(2000));
        let v = value_fees(&fees(), 6, 18, &ctx).unwrap();

        assert_eq!(v.token0_usd, dec!(1.5));
        assert_eq!(v.token1_usd, dec!(4));
    }

    #[test]
    fn test_invalid_base_index_values_nothing() {
        for index in [-1, 2, 42] {
            let ctx = ConversionContext::new(index, dec!(3), dec!(7));
            let v = value_fees(&fees(), 6, 18, &ctx).unwrap();
            assert_eq!(v.token0_usd, Decimal::ZERO);
            assert_eq!(v.token1_usd, Decimal::ZERO);
        }
    }

    #[test]
    fn test_with_tvl() {
        let ctx = ConversionContext::new(0, dec!(2000), dec!(1));
        let v = value_fees(&fees(), 6, 18, &ctx)
            .unwrap()
            .with_tvl(dec!(25000));
        assert_eq!(v.tvl_usd, dec!(25000));
        assert_eq!(v.total_usd(), Ok(dec!(5.5)));

        let json = serde_json::to_value(v).unwrap();
        assert!(json.get("token0USD").is_some());
        assert!(json.get("tvlUSD").is_some());
    }

    #[test]
    fn test_sums_near_decimal_max_fail_instead_of_panicking() {
        // each side fits, their sum does not
        let half = dec!(42000000000000000000000000000);
        let v = FeeValuation {
            token0: half,
            token1: half,
            token0_usd: half,
            token1_usd: half,
        };

        assert_eq!(v.total_usd(), Err(ValuationError::SumOverflow));
        assert_eq!(v.with_tvl(dec!(1)).total_usd(), Err(ValuationError::SumOverflow));
        assert_eq!(v.checked_add(&v), Err(ValuationError::SumOverflow));

        let small = FeeValuation {
            token0: dec!(1),
            token1: dec!(2),
            token0_usd: dec!(3),
            token1_usd: dec!(4),
        };
        let sum = small.checked_add(&small).unwrap();
        assert_eq!(sum.token1, dec!(4));
        assert_eq!(sum.total_usd(), Ok(dec!(14)));
    }

    #[test]
    fn test_cross_price_overflow_propagates() {
        let ctx = ConversionContext::new(0, Decimal::MAX, dec!(2));
        assert!(matches!(
            value_fees(&fees(), 6, 18, &ctx),
            Err(ValuationError::ArithmeticOverflow { token: 1 })
        ));
    }
}
