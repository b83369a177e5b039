//! Church tax (Kirchensteuer).
//!
//! Cantons differ in which amount the church multipliers apply to: the simple
//! tax, the cantonal or municipal tax amount, the taxable amount itself, or a
//! composite of taxable income and wealth. Some add a flat fee or enforce a
//! minimum on top.

use crate::canton::Canton;
use crate::factor::{church_fortune_rate, church_income_rate};
use crate::input::{Confession, Person, TaxInput};
use crate::money::multiply_percent;
use crate::schema::TaxFactors;
use log::debug;
use rust_decimal::Decimal;

const INCOME_SCALE: u32 = 2;
const WEALTH_SCALE: u32 = 5;

/// Every amount a canton may use as church tax base.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct ChurchTaxBases {
    pub income_base: Decimal,
    pub income_canton: Decimal,
    pub income_city: Decimal,
    pub fortune_base: Decimal,
    pub fortune_canton: Decimal,
    pub fortune_city: Decimal,
    pub taxable_income_canton: Decimal,
    pub taxable_fortune_canton: Decimal,
}

impl ChurchTaxBases {
    fn income(&self, source: BaseSource) -> Decimal {
        match source {
            BaseSource::SimpleTax => self.income_base,
            BaseSource::CantonalTax => self.income_canton,
            BaseSource::MunicipalTax => self.income_city,
            BaseSource::Taxable => self.taxable_income_canton,
        }
    }

    fn fortune(&self, source: BaseSource) -> Decimal {
        match source {
            BaseSource::SimpleTax => self.fortune_base,
            BaseSource::CantonalTax => self.fortune_canton,
            BaseSource::MunicipalTax => self.fortune_city,
            BaseSource::Taxable => self.taxable_fortune_canton,
        }
    }

    /// 1% of taxable income, plus 0.3‰ of taxable wealth, plus 30 CHF.
    fn composite(&self) -> Decimal {
        multiply_percent(self.taxable_income_canton, Decimal::ONE, 2)
            + multiply_percent(self.taxable_fortune_canton, Decimal::new(3, 2), 2)
            + Decimal::from(30)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BaseSource {
    SimpleTax,
    CantonalTax,
    MunicipalTax,
    Taxable,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ChurchRule {
    /// A single composite base, levied on income only.
    Composite,
    /// The base depends on each person's confession.
    PerConfession,
    /// One base for the household, split evenly across persons.
    Shared(BaseSource),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Surcharge {
    None,
    /// Added to the income church tax.
    Flat(Decimal),
    /// Floor for both income and wealth church tax.
    Minimum(Decimal),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ChurchPolicy {
    pub rule: ChurchRule,
    pub surcharge: Surcharge,
}

impl ChurchPolicy {
    const DEFAULT: ChurchPolicy = ChurchPolicy {
        rule: ChurchRule::Shared(BaseSource::SimpleTax),
        surcharge: Surcharge::None,
    };

    pub fn for_canton(canton: Canton) -> Self {
        let (rule, surcharge) = match canton {
            Canton::Uri => (ChurchRule::Composite, Surcharge::None),
            Canton::BaselLandschaft => (ChurchRule::PerConfession, Surcharge::None),
            Canton::BaselStadt | Canton::Ticino | Canton::Jura => {
                (ChurchRule::Shared(BaseSource::CantonalTax), Surcharge::None)
            }
            Canton::Neuchatel => (
                ChurchRule::Shared(BaseSource::CantonalTax),
                Surcharge::Flat(Decimal::TEN),
            ),
            Canton::Valais => (ChurchRule::Shared(BaseSource::MunicipalTax), Surcharge::None),
            Canton::Geneva => (
                ChurchRule::Shared(BaseSource::SimpleTax),
                Surcharge::Minimum(Decimal::TEN),
            ),
            Canton::Aargau
            | Canton::AppenzellInnerrhoden
            | Canton::AppenzellAusserrhoden
            | Canton::Bern
            | Canton::Fribourg
            | Canton::Glarus
            | Canton::Graubuenden
            | Canton::Lucerne
            | Canton::Nidwalden
            | Canton::Obwalden
            | Canton::StGallen
            | Canton::Schaffhausen
            | Canton::Solothurn
            | Canton::Schwyz
            | Canton::Thurgau
            | Canton::Vaud
            | Canton::Zug
            | Canton::Zurich => return Self::DEFAULT,
        };
        ChurchPolicy { rule, surcharge }
    }

    /// Unknown identifiers fall back to the simple tax base.
    pub fn for_canton_id(canton_id: u32) -> Self {
        match Canton::from_id(canton_id) {
            Some(canton) => Self::for_canton(canton),
            None => {
                debug!("Unknown canton {canton_id}, using the simple tax as church tax base");
                Self::DEFAULT
            }
        }
    }
}

/// Basel-Landschaft: christian catholic and protestant church taxes are levied
/// on the taxable amount, roman catholic ones on the cantonal tax.
fn per_confession_source(confession: Confession) -> Option<BaseSource> {
    match confession {
        Confession::Christ | Confession::Protestant => Some(BaseSource::Taxable),
        Confession::Roman => Some(BaseSource::CantonalTax),
        Confession::None => None,
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct ChurchTaxes {
    pub income: Decimal,
    pub wealth: Decimal,
}

pub fn calculate_church_tax(
    input: &TaxInput,
    bases: &ChurchTaxBases,
    factors: &TaxFactors,
) -> ChurchTaxes {
    let policy = ChurchPolicy::for_canton_id(input.canton_id());
    let persons = input.persons();

    let mut taxes = match policy.rule {
        ChurchRule::Composite => ChurchTaxes {
            income: split(bases.composite(), persons, INCOME_SCALE, |c| {
                church_income_rate(c, factors)
            }),
            wealth: Decimal::ZERO,
        },
        ChurchRule::PerConfession => ChurchTaxes {
            income: persons
                .iter()
                .map(|person| {
                    let base = per_confession_source(person.confession)
                        .map_or(Decimal::ZERO, |source| bases.income(source));
                    multiply_percent(
                        base,
                        church_income_rate(person.confession, factors),
                        INCOME_SCALE,
                    )
                })
                .sum(),
            wealth: persons
                .iter()
                .map(|person| {
                    let base = per_confession_source(person.confession)
                        .map_or(Decimal::ZERO, |source| bases.fortune(source));
                    multiply_percent(
                        base,
                        church_fortune_rate(person.confession, factors),
                        WEALTH_SCALE,
                    )
                })
                .sum(),
        },
        ChurchRule::Shared(source) => ChurchTaxes {
            income: split(bases.income(source), persons, INCOME_SCALE, |c| {
                church_income_rate(c, factors)
            }),
            wealth: split(bases.fortune(source), persons, WEALTH_SCALE, |c| {
                church_fortune_rate(c, factors)
            }),
        },
    };

    match policy.surcharge {
        Surcharge::None => {}
        Surcharge::Flat(amount) => taxes.income += amount,
        Surcharge::Minimum(minimum) => {
            taxes.income = taxes.income.max(minimum);
            taxes.wealth = taxes.wealth.max(minimum);
        }
    }

    taxes
}

/// Sums each person's share of `base`, weighted by their own rate.
fn split(
    base: Decimal,
    persons: &[Person],
    scale: u32,
    rate: impl Fn(Confession) -> Decimal,
) -> Decimal {
    let count = Decimal::from(persons.len());
    persons
        .iter()
        .map(|person| multiply_percent(base, rate(person.confession) / count, scale))
        .sum()
}

#[cfg(test)]
mod test {
    use super::*;
    use rust_decimal_macros::dec;

    fn factors() -> TaxFactors {
        TaxFactors {
            income_rate_christ: dec!(12),
            income_rate_roman: dec!(10),
            income_rate_protestant: dec!(14),
            fortune_rate_christ: dec!(13),
            fortune_rate_roman: dec!(11),
            fortune_rate_protestant: dec!(15),
            ..Default::default()
        }
    }

    fn bases() -> ChurchTaxBases {
        ChurchTaxBases {
            income_base: dec!(5000),
            income_canton: dec!(7000),
            income_city: dec!(6000),
            fortune_base: dec!(800),
            fortune_canton: dec!(1000),
            fortune_city: dec!(900),
            taxable_income_canton: dec!(80000),
            taxable_fortune_canton: dec!(500000),
        }
    }

    fn input(canton_id: u32, confessions: &[Confession]) -> TaxInput {
        let persons = confessions.iter().copied().map(Person::new).collect();
        TaxInput::new(canton_id, 1, 2025, persons).unwrap()
    }

    #[test]
    fn policy_per_canton() {
        use ChurchRule::*;
        assert_eq!(ChurchPolicy::for_canton_id(22).rule, Composite);
        assert_eq!(ChurchPolicy::for_canton_id(5).rule, PerConfession);
        for id in [6, 21, 11, 13] {
            assert_eq!(
                ChurchPolicy::for_canton_id(id).rule,
                Shared(BaseSource::CantonalTax)
            );
        }
        assert_eq!(
            ChurchPolicy::for_canton_id(24).rule,
            Shared(BaseSource::MunicipalTax)
        );
        assert_eq!(
            ChurchPolicy::for_canton_id(13).surcharge,
            Surcharge::Flat(dec!(10))
        );
        assert_eq!(
            ChurchPolicy::for_canton_id(8),
            ChurchPolicy {
                rule: Shared(BaseSource::SimpleTax),
                surcharge: Surcharge::Minimum(dec!(10)),
            }
        );
        assert_eq!(ChurchPolicy::for_canton_id(26), ChurchPolicy::DEFAULT);
        assert_eq!(ChurchPolicy::for_canton_id(0), ChurchPolicy::DEFAULT);
        assert_eq!(ChurchPolicy::for_canton_id(99), ChurchPolicy::DEFAULT);
    }

    #[test]
    fn default_canton_splits_base_across_persons() {
        let input = input(26, &[Confession::Roman, Confession::Protestant]);
        let taxes = calculate_church_tax(&input, &bases(), &factors());
        // 5000 * 10% / 2 + 5000 * 14% / 2
        assert_eq!(taxes.income, dec!(600));
        // 800 * 11% / 2 + 800 * 15% / 2
        assert_eq!(taxes.wealth, dec!(104));
    }

    #[test]
    fn shared_base_matches_sum_of_shares() {
        let confessions = [Confession::Christ, Confession::Roman, Confession::None];
        let input = input(26, &confessions);
        let bases = ChurchTaxBases {
            income_base: dec!(4321.35),
            fortune_base: dec!(777.77),
            ..bases()
        };
        let factors = factors();
        let taxes = calculate_church_tax(&input, &bases, &factors);

        let three = dec!(3);
        let expected_income: Decimal = confessions
            .iter()
            .map(|&c| {
                (bases.income_base * church_income_rate(c, &factors) / three / dec!(100))
                    .round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointNearestEven)
            })
            .sum();
        assert_eq!(taxes.income, expected_income);
        // 172.85 + 144.04, 144.045 rounds to even
        assert_eq!(taxes.income, dec!(316.89));

        let expected_wealth: Decimal = confessions
            .iter()
            .map(|&c| {
                (bases.fortune_base * church_fortune_rate(c, &factors) / three / dec!(100))
                    .round_dp_with_strategy(5, rust_decimal::RoundingStrategy::MidpointNearestEven)
            })
            .sum();
        assert_eq!(taxes.wealth, expected_wealth);
    }

    #[test]
    fn no_confession_pays_nothing() {
        let input = input(26, &[Confession::None, Confession::None]);
        assert_eq!(
            calculate_church_tax(&input, &bases(), &factors()),
            ChurchTaxes::default()
        );
    }

    #[test]
    fn unknown_canton_uses_simple_tax() {
        let unknown = calculate_church_tax(&input(99, &[Confession::Roman]), &bases(), &factors());
        let zurich = calculate_church_tax(&input(26, &[Confession::Roman]), &bases(), &factors());
        assert_eq!(unknown, zurich);
        assert_eq!(unknown.income, dec!(500));
        assert_eq!(unknown.wealth, dec!(88));
    }

    #[test]
    fn cantonal_tax_base() {
        for canton_id in [6, 21, 11] {
            let taxes =
                calculate_church_tax(&input(canton_id, &[Confession::Roman]), &bases(), &factors());
            assert_eq!(taxes.income, dec!(700));
            assert_eq!(taxes.wealth, dec!(110));
        }
    }

    #[test]
    fn municipal_tax_base() {
        let taxes = calculate_church_tax(&input(24, &[Confession::Protestant]), &bases(), &factors());
        assert_eq!(taxes.income, dec!(840));
        assert_eq!(taxes.wealth, dec!(135));
    }

    #[test]
    fn composite_base() {
        // 800 + 150 + 30 = 980
        let taxes = calculate_church_tax(&input(22, &[Confession::Roman]), &bases(), &factors());
        assert_eq!(taxes.income, dec!(98));
        assert_eq!(taxes.wealth, Decimal::ZERO);

        let taxes = calculate_church_tax(
            &input(22, &[Confession::Roman, Confession::None]),
            &bases(),
            &factors(),
        );
        assert_eq!(taxes.income, dec!(49));
        assert_eq!(taxes.wealth, Decimal::ZERO);
    }

    #[test]
    fn composite_base_rounds_each_term() {
        let bases = ChurchTaxBases {
            taxable_income_canton: dec!(12345.67),
            taxable_fortune_canton: dec!(123456),
            ..Default::default()
        };
        // 123.4567 -> 123.46, 37.0368 -> 37.04
        assert_eq!(bases.composite(), dec!(190.50));
    }

    #[test]
    fn base_depends_on_confession() {
        let taxes = calculate_church_tax(
            &input(5, &[Confession::Protestant, Confession::Roman]),
            &bases(),
            &factors(),
        );
        // 80000 * 14% + 7000 * 10%, without splitting
        assert_eq!(taxes.income, dec!(11900));
        // 500000 * 15% + 1000 * 11%
        assert_eq!(taxes.wealth, dec!(75110));

        let taxes = calculate_church_tax(
            &input(5, &[Confession::Christ, Confession::Roman]),
            &bases(),
            &factors(),
        );
        // only the first person's share changes
        assert_eq!(taxes.income, dec!(9600) + dec!(700));
        assert_eq!(taxes.wealth, dec!(65000) + dec!(110));

        let taxes = calculate_church_tax(
            &input(5, &[Confession::None, Confession::Roman]),
            &bases(),
            &factors(),
        );
        assert_eq!(taxes.income, dec!(700));
    }

    #[test]
    fn flat_fee_is_always_added() {
        let taxes = calculate_church_tax(&input(13, &[Confession::Roman]), &bases(), &factors());
        assert_eq!(taxes.income, dec!(710));
        assert_eq!(taxes.wealth, dec!(110));

        let taxes = calculate_church_tax(
            &input(13, &[Confession::Roman]),
            &ChurchTaxBases::default(),
            &factors(),
        );
        assert_eq!(taxes.income, dec!(10));
        assert_eq!(taxes.wealth, Decimal::ZERO);
    }

    #[test]
    fn minimum_tax_is_a_floor() {
        let small = ChurchTaxBases {
            income_base: dec!(20),
            fortune_base: dec!(3),
            ..Default::default()
        };
        let taxes = calculate_church_tax(&input(8, &[Confession::Roman]), &small, &factors());
        assert_eq!(taxes.income, dec!(10));
        assert_eq!(taxes.wealth, dec!(10));

        let taxes = calculate_church_tax(&input(8, &[Confession::None]), &small, &factors());
        assert_eq!(taxes.income, dec!(10));
        assert_eq!(taxes.wealth, dec!(10));

        let taxes = calculate_church_tax(&input(8, &[Confession::Roman]), &bases(), &factors());
        assert_eq!(taxes.income, dec!(500));
        assert_eq!(taxes.wealth, dec!(88));
    }
}
