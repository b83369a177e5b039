use crate::error::DataError;
use crate::input::{Confession, TaxInput};
use crate::schema::TaxFactors;
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Source of the rate factors that apply to a taxpayer.
#[async_trait]
pub trait FactorProvider: Send + Sync {
    async fn tax_factors(&self, input: &TaxInput) -> Result<TaxFactors, DataError>;
}

pub fn church_income_rate(confession: Confession, factors: &TaxFactors) -> Decimal {
    match confession {
        Confession::Christ => factors.income_rate_christ,
        Confession::Roman => factors.income_rate_roman,
        Confession::Protestant => factors.income_rate_protestant,
        Confession::None => Decimal::ZERO,
    }
}

pub fn church_fortune_rate(confession: Confession, factors: &TaxFactors) -> Decimal {
    match confession {
        Confession::Christ => factors.fortune_rate_christ,
        Confession::Roman => factors.fortune_rate_roman,
        Confession::Protestant => factors.fortune_rate_protestant,
        Confession::None => Decimal::ZERO,
    }
}
