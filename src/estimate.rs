use crate::cantonal::calculate_canton_and_city;
use crate::church::{ChurchTaxBases, calculate_church_tax};
use crate::error::DataError;
use crate::factor::FactorProvider;
use crate::input::{TaxInput, TaxableAmount};
use crate::money::round_chf;
use crate::schema::{TaxTarif, TaxType};
use crate::table::{self, TariffProvider, select_tarif};
use log::debug;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;

/// Cantonal, municipal and church taxes of a household, in whole francs.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxResult {
    #[serde(with = "rust_decimal::serde::float")]
    pub canton_income: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub city_income: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub church_income: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub canton_wealth: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub city_wealth: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub church_wealth: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

pub struct Estimator {
    factors: Arc<dyn FactorProvider>,
    tarifs: Arc<dyn TariffProvider>,
}

impl Estimator {
    pub fn new(factors: Arc<dyn FactorProvider>, tarifs: Arc<dyn TariffProvider>) -> Self {
        Self { factors, tarifs }
    }

    pub async fn estimate(
        &self,
        input: &TaxInput,
        taxable_income: TaxableAmount,
        taxable_wealth: TaxableAmount,
    ) -> Result<TaxResult, DataError> {
        let (taxable_income, taxable_wealth) = (taxable_income.value(), taxable_wealth.value());
        let factors = self.factors.tax_factors(input).await?;
        let tarifs = self.tarifs.tarifs(input.year()).await?;

        let income_base = simple_tax(&tarifs, input, TaxType::EinkommensSteuer, taxable_income)?;
        let wealth_base = simple_tax(&tarifs, input, TaxType::VermoegensSteuer, taxable_wealth)?;
        debug!(
            "Simple taxes for canton {} in {}: income {income_base}, wealth {wealth_base}",
            input.canton_id(),
            input.year()
        );

        let taxes =
            calculate_canton_and_city(input, &factors, income_base, income_base, wealth_base);
        let bases = ChurchTaxBases {
            income_base,
            income_canton: taxes.canton_income,
            income_city: taxes.city_income,
            fortune_base: wealth_base,
            fortune_canton: taxes.canton_wealth,
            fortune_city: taxes.city_wealth,
            taxable_income_canton: taxable_income,
            taxable_fortune_canton: taxable_wealth,
        };
        let church = calculate_church_tax(input, &bases, &factors);

        let church_income = round_chf(church.income);
        let church_wealth = round_chf(church.wealth);
        Ok(TaxResult {
            canton_income: taxes.canton_income,
            city_income: taxes.city_income,
            church_income,
            canton_wealth: taxes.canton_wealth,
            city_wealth: taxes.city_wealth,
            church_wealth,
            total: taxes.canton_income
                + taxes.city_income
                + church_income
                + taxes.canton_wealth
                + taxes.city_wealth
                + church_wealth,
        })
    }
}

/// Zero amounts need no tariff.
fn simple_tax(
    tarifs: &[TaxTarif],
    input: &TaxInput,
    tax_type: TaxType,
    amount: Decimal,
) -> Result<Decimal, DataError> {
    if amount.is_zero() {
        return Ok(Decimal::ZERO);
    }
    let relationship = input.relationship();
    let tarif = select_tarif(tarifs, input.canton_id(), tax_type, relationship).ok_or(
        DataError::TarifNotFound {
            canton_id: input.canton_id(),
            year: input.year(),
            tax_type,
        },
    )?;
    Ok(table::evaluate(tarif, amount, relationship))
}
