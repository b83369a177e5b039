//! Fixed-point currency helpers.
//!
//! All amounts are CHF values held in a [`Decimal`]. Percentages and
//! whole-franc rounding use banker's rounding; the 5-centime step used by
//! tariff evaluation rounds half away from zero.

use rust_decimal::{Decimal, RoundingStrategy};

/// Computes `amount * percent / 100`, rounded half-to-even to `scale` decimals.
pub fn multiply_percent(amount: Decimal, percent: Decimal, scale: u32) -> Decimal {
    (amount * percent / Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(scale, RoundingStrategy::MidpointNearestEven)
}

/// Rounds to whole francs, half-to-even.
pub fn round_chf(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
}

/// Rounds to the nearest 5 centimes, then to 2 decimals.
pub fn round_to_5_centimes(amount: Decimal) -> Decimal {
    let twenty = Decimal::from(20);
    ((amount * twenty).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero) / twenty)
        .round_dp(2)
}

#[cfg(test)]
mod test {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn percent_rounds_to_even() {
        assert_eq!(multiply_percent(dec!(1000), dec!(1), 2), dec!(10));
        assert_eq!(multiply_percent(dec!(12345), dec!(0.03), 2), dec!(3.70));
        // 0.125 -> 0.12, 0.135 -> 0.14
        assert_eq!(multiply_percent(dec!(12.5), dec!(1), 2), dec!(0.12));
        assert_eq!(multiply_percent(dec!(13.5), dec!(1), 2), dec!(0.14));
        assert_eq!(multiply_percent(dec!(1), dec!(33.333333), 5), dec!(0.33333));
    }

    #[test]
    fn whole_francs() {
        assert_eq!(round_chf(dec!(100.5)), dec!(100));
        assert_eq!(round_chf(dec!(101.5)), dec!(102));
        assert_eq!(round_chf(dec!(101.49)), dec!(101));
    }

    #[test]
    fn five_centimes() {
        assert_eq!(round_to_5_centimes(dec!(1.024)), dec!(1.00));
        assert_eq!(round_to_5_centimes(dec!(1.025)), dec!(1.05));
        assert_eq!(round_to_5_centimes(dec!(1.074)), dec!(1.05));
        assert_eq!(round_to_5_centimes(dec!(-1.025)), dec!(-1.05));
        assert_eq!(round_to_5_centimes(dec!(7654.321987)), dec!(7654.30));
    }

    #[test]
    fn five_centimes_is_idempotent() {
        for value in [dec!(0), dec!(0.05), dec!(12.35), dec!(99999.95), dec!(-3.10)] {
            assert_eq!(round_to_5_centimes(value), value);
            assert_eq!(round_to_5_centimes(round_to_5_centimes(value)), value);
        }
    }
}
