use crate::schema::TaxType;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("No locations data found (checked {min_year}..{max_year})")]
    NoLocationData { min_year: u32, max_year: u32 },

    #[error("No {file} for {year}")]
    YearNotFound { year: u32, file: &'static str },

    #[error("Location not found for {city_id}, {year}")]
    LocationNotFound { city_id: u32, year: u32 },

    #[error("Tax factors not found for {city_id}, {year}")]
    FactorsNotFound { city_id: u32, year: u32 },

    #[error("Tariff not found for canton {canton_id}, {year}, {tax_type:?}")]
    TarifNotFound {
        canton_id: u32,
        year: u32,
        tax_type: TaxType,
    },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl DataError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DataError::YearNotFound { .. }
                | DataError::LocationNotFound { .. }
                | DataError::FactorsNotFound { .. }
                | DataError::TarifNotFound { .. }
        )
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("A tax input needs at least one person")]
    NoPersons,

    #[error("Taxable amount {amount} is out of range (maximum {max})")]
    AmountOutOfRange { amount: Decimal, max: Decimal },
}
