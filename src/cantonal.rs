use crate::canton::statutory_reduction;
use crate::input::TaxInput;
use crate::money::{multiply_percent, round_chf};
use crate::schema::TaxFactors;
use log::debug;
use rust_decimal::Decimal;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct CantonCityTaxes {
    pub canton_income: Decimal,
    pub city_income: Decimal,
    /// Always zero, see [`crate::church`].
    pub church_income: Decimal,
    pub canton_wealth: Decimal,
    pub city_wealth: Decimal,
    /// Always zero, see [`crate::church`].
    pub church_wealth: Decimal,
}

/// Applies the cantonal and municipal multipliers to the simple tax bases.
///
/// `_income_church_base` is unused: church taxes come from [`crate::church`].
pub fn calculate_canton_and_city(
    input: &TaxInput,
    factors: &TaxFactors,
    income_base: Decimal,
    _income_church_base: Decimal,
    wealth_base: Decimal,
) -> CantonCityTaxes {
    let mut canton_income = levy(income_base, factors.income_rate_canton);
    let city_income = levy(income_base, factors.income_rate_city);
    let mut canton_wealth = levy(wealth_base, factors.fortune_rate_canton);
    let city_wealth = levy(wealth_base, factors.fortune_rate_city);

    if let Some(factor) = statutory_reduction(input.canton_id(), input.year()) {
        debug!(
            "Reducing cantonal share of canton {} in {} by {factor}",
            input.canton_id(),
            input.year()
        );
        canton_income = round_chf(canton_income * factor);
        canton_wealth = round_chf(canton_wealth * factor);
    }

    CantonCityTaxes {
        canton_income,
        city_income,
        church_income: Decimal::ZERO,
        canton_wealth,
        city_wealth,
        church_wealth: Decimal::ZERO,
    }
}

fn levy(base: Decimal, rate: Decimal) -> Decimal {
    round_chf(multiply_percent(base, rate, 5))
}
