use crate::error::InputError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Largest taxable income or wealth accepted, in CHF.
pub const MAX_TAXABLE_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confession {
    #[default]
    None,
    /// Christian catholic (old catholic).
    Christ,
    Roman,
    Protestant,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Person {
    pub confession: Confession,
}

impl Person {
    pub fn new(confession: Confession) -> Self {
        Self { confession }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Relationship {
    Single,
    Married,
}

/// Taxpayer profile of one computation. The person list is never empty.
#[derive(Clone, Debug)]
pub struct TaxInput {
    canton_id: u32,
    city_id: u32,
    year: u32,
    persons: Vec<Person>,
}

impl TaxInput {
    pub fn new(
        canton_id: u32,
        city_id: u32,
        year: u32,
        persons: Vec<Person>,
    ) -> Result<Self, InputError> {
        if persons.is_empty() {
            return Err(InputError::NoPersons);
        }
        Ok(Self {
            canton_id,
            city_id,
            year,
            persons,
        })
    }

    pub fn canton_id(&self) -> u32 {
        self.canton_id
    }

    pub fn city_id(&self) -> u32 {
        self.city_id
    }

    pub fn year(&self) -> u32 {
        self.year
    }

    pub fn persons(&self) -> &[Person] {
        &self.persons
    }

    pub fn relationship(&self) -> Relationship {
        if self.persons.len() >= 2 {
            Relationship::Married
        } else {
            Relationship::Single
        }
    }
}

/// A taxable income or wealth. Its magnitude is at most
/// [`MAX_TAXABLE_AMOUNT`], which keeps every levy within [`Decimal`] range.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct TaxableAmount(Decimal);

impl TaxableAmount {
    pub const ZERO: TaxableAmount = TaxableAmount(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Result<Self, InputError> {
        if amount.abs() > MAX_TAXABLE_AMOUNT {
            return Err(InputError::AmountOutOfRange {
                amount,
                max: MAX_TAXABLE_AMOUNT,
            });
        }
        Ok(Self(amount))
    }

    pub fn value(self) -> Decimal {
        self.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rejects_empty_persons() {
        assert!(matches!(
            TaxInput::new(26, 261, 2025, vec![]),
            Err(InputError::NoPersons)
        ));
    }

    #[test]
    fn relationship_by_household_size() {
        let single = TaxInput::new(5, 2701, 2024, vec![Person::new(Confession::Roman)]).unwrap();
        assert_eq!(single.relationship(), Relationship::Single);

        let persons = vec![Person::new(Confession::Roman), Person::new(Confession::None)];
        let married = TaxInput::new(5, 2701, 2024, persons).unwrap();
        assert_eq!(married.canton_id(), 5);
        assert_eq!(
            married.persons(),
            &[Person::new(Confession::Roman), Person::new(Confession::None)]
        );
        assert_eq!(married.relationship(), Relationship::Married);
    }

    #[test]
    fn parse_person() {
        let person: Person = serde_json::from_str(r#"{ "confession": "protestant" }"#).unwrap();
        assert_eq!(person, Person::new(Confession::Protestant));
    }

    #[test]
    fn bounded_taxable_amounts() {
        assert_eq!(MAX_TAXABLE_AMOUNT, Decimal::from(1_000_000_000_000u64));
        assert_eq!(
            TaxableAmount::new(MAX_TAXABLE_AMOUNT).map(TaxableAmount::value),
            Ok(MAX_TAXABLE_AMOUNT)
        );
        assert_eq!(
            TaxableAmount::new(-Decimal::ONE).map(TaxableAmount::value),
            Ok(-Decimal::ONE)
        );

        let huge: Decimal = serde_json::from_str("5e28").unwrap();
        assert!(matches!(
            TaxableAmount::new(huge),
            Err(InputError::AmountOutOfRange { .. })
        ));
        assert!(TaxableAmount::new(-huge).is_err());
        assert!(TaxableAmount::new(MAX_TAXABLE_AMOUNT + Decimal::ONE).is_err());
    }
}
