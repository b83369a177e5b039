use crate::canton::Canton;
use crate::error::DataError;
use crate::formula;
use crate::input::Relationship;
use crate::money::round_to_5_centimes;
use crate::schema::{Group, TableType, TariffRow, Target, TaxTarif, TaxType};
use anyhow::anyhow;
use async_trait::async_trait;
use log::{debug, warn};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Source of the tariffs published for a year.
#[async_trait]
pub trait TariffProvider: Send + Sync {
    async fn tarifs(&self, year: u32) -> Result<Arc<Vec<TaxTarif>>, DataError>;
}

/// Finds the cantonal tariff of `tax_type` that applies to the household.
pub fn select_tarif(
    tarifs: &[TaxTarif],
    canton_id: u32,
    tax_type: TaxType,
    relationship: Relationship,
) -> Option<&TaxTarif> {
    tarifs.iter().find(|tarif| {
        tarif.canton_id == canton_id
            && tarif.target == Target::Kanton
            && tarif.tax_type == tax_type
            && match relationship {
                Relationship::Single => is_single(&tarif.group),
                Relationship::Married => is_married(&tarif.group),
            }
    })
}

pub fn is_single(group: &[Group]) -> bool {
    group.iter().any(|&x| {
        matches!(
            x,
            Group::Alle
                | Group::LedigAlleine
                | Group::LedigKonkubinat
                | Group::LedigMitKinder
                | Group::LedigOhneKinder
        )
    }) && !group.contains(&Group::Verheiratet)
}

pub fn is_married(group: &[Group]) -> bool {
    group
        .iter()
        .any(|&x| x == Group::Alle || x == Group::Verheiratet)
}

/// Computes the simple tax of `amount` under `tarif`, rounded to 5 centimes.
///
/// Married households use the tariff's splitting divisor. Unsupported or
/// malformed tables yield zero.
pub fn evaluate(tarif: &TaxTarif, amount: Decimal, relationship: Relationship) -> Decimal {
    if amount < Decimal::ZERO {
        return Decimal::ZERO;
    }
    let table = match RawTable::try_from(tarif) {
        Ok(table) => table,
        Err(e) => {
            warn!("Unusable tariff {:?} of canton {}: {e:?}", tarif.name, tarif.canton_id);
            return Decimal::ZERO;
        }
    };
    let policy = EvalPolicy::for_canton_id(tarif.canton_id);
    let split = match relationship {
        Relationship::Single => Decimal::ZERO,
        Relationship::Married => tarif.splitting,
    };
    round_to_5_centimes(table.eval_split(amount, split, policy))
}

/// How a canton feeds the taxable amount into its tariff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalPolicy {
    Raw,
    Round100,
    DoubleRound100,
    NoSplitRaw,
    NoSplitRound100,
}

impl EvalPolicy {
    pub fn for_canton(canton: Canton) -> Self {
        match canton {
            Canton::BaselLandschaft
            | Canton::Geneva
            | Canton::Graubuenden
            | Canton::Solothurn
            | Canton::Valais => EvalPolicy::Raw,
            Canton::Uri => EvalPolicy::NoSplitRaw,
            Canton::Aargau => EvalPolicy::Round100,
            Canton::AppenzellInnerrhoden
            | Canton::Fribourg
            | Canton::Glarus
            | Canton::Neuchatel
            | Canton::Nidwalden
            | Canton::StGallen
            | Canton::Schaffhausen
            | Canton::Schwyz
            | Canton::Thurgau
            | Canton::Vaud => EvalPolicy::DoubleRound100,
            Canton::AppenzellAusserrhoden
            | Canton::Bern
            | Canton::BaselStadt
            | Canton::Jura
            | Canton::Lucerne
            | Canton::Obwalden
            | Canton::Ticino
            | Canton::Zug
            | Canton::Zurich => EvalPolicy::NoSplitRound100,
        }
    }

    pub fn for_canton_id(canton_id: u32) -> Self {
        Canton::from_id(canton_id).map_or(EvalPolicy::Raw, Self::for_canton)
    }
}

enum RawTable<'a> {
    Bund(TableBund),
    Flattax(TableFlattax),
    Formel(&'a TaxTarif),
    Freiburg(TableFreiburg),
    Zuerich(TableZuerich),
}

impl<'a> TryFrom<&'a TaxTarif> for RawTable<'a> {
    type Error = anyhow::Error;

    fn try_from(tarif: &'a TaxTarif) -> Result<Self, Self::Error> {
        match tarif.table_type {
            TableType::Bund => Ok(RawTable::Bund(TableBund::try_from(tarif.table.as_slice())?)),
            TableType::Flattax => Ok(RawTable::Flattax(TableFlattax::try_from(
                tarif.table.as_slice(),
            )?)),
            TableType::Formel => Ok(RawTable::Formel(tarif)),
            TableType::Freiburg => Ok(RawTable::Freiburg(TableFreiburg::try_from(
                tarif.table.as_slice(),
            )?)),
            TableType::Zuerich => Ok(RawTable::Zuerich(TableZuerich::try_from(
                tarif.table.as_slice(),
            )?)),
            TableType::Unknown => Err(anyhow!("Unsupported table type: {:?}", tarif.table_type)),
        }
    }
}

impl RawTable<'_> {
    fn eval_raw(&self, x: Decimal) -> Decimal {
        match self {
            RawTable::Bund(table) => table.eval(x),
            RawTable::Flattax(table) => table.eval(x),
            RawTable::Formel(tarif) => formula::evaluate(x, tarif),
            RawTable::Freiburg(table) => table.eval(x),
            RawTable::Zuerich(table) => table.eval(x),
        }
    }

    fn eval_split(&self, x: Decimal, split: Decimal, policy: EvalPolicy) -> Decimal {
        match policy {
            EvalPolicy::Raw => self.eval_split_raw(x, split),
            EvalPolicy::Round100 => self.eval_split_round100(x, split),
            EvalPolicy::DoubleRound100 => self.eval_split_double_round100(x, split),
            EvalPolicy::NoSplitRaw => {
                if !split.is_zero() {
                    debug!("Ignoring splitting {split} of a no-split tariff");
                }
                self.eval_raw(x)
            }
            EvalPolicy::NoSplitRound100 => {
                if !split.is_zero() {
                    debug!("Ignoring splitting {split} of a no-split tariff");
                }
                self.eval_raw(Self::floor_100(x))
            }
        }
    }

    fn eval_split_raw(&self, x: Decimal, split: Decimal) -> Decimal {
        if split.is_zero() {
            self.eval_raw(x)
        } else {
            self.eval_raw(x / split) * split
        }
    }

    fn eval_split_round100(&self, x: Decimal, split: Decimal) -> Decimal {
        // Round down to multiple of 100 CHF.
        let xx = Self::floor_100(x);
        if split.is_zero() {
            self.eval_raw(xx)
        } else {
            self.rate_at(xx / split) * xx
        }
    }

    fn eval_split_double_round100(&self, x: Decimal, split: Decimal) -> Decimal {
        let xx = Self::floor_100(x);
        if split.is_zero() {
            self.eval_raw(xx)
        } else {
            self.rate_at(Self::floor_100(xx / split)) * xx
        }
    }

    /// Average tax rate at `yy`.
    fn rate_at(&self, yy: Decimal) -> Decimal {
        if yy.is_zero() {
            Decimal::ZERO
        } else {
            self.eval_raw(yy) / yy
        }
    }

    fn floor_100(x: Decimal) -> Decimal {
        (x / Decimal::ONE_HUNDRED).floor() * Decimal::ONE_HUNDRED
    }
}

/// Base tax at the bracket start plus a marginal rate above it.
#[derive(Debug, Clone)]
struct TableBund(Vec<TableBundEntry>);

impl TryFrom<&[TariffRow]> for TableBund {
    type Error = anyhow::Error;

    fn try_from(table: &[TariffRow]) -> Result<Self, Self::Error> {
        Ok(TableBund(
            table
                .iter()
                .enumerate()
                .map(|(i, entry)| {
                    if !entry.formula.is_empty() {
                        Err(anyhow!(
                            "Non-empty formula in table of type Bund: {:?}",
                            entry.formula
                        ))
                    } else {
                        if i == 0 && !entry.amount.is_zero() {
                            warn!("No entry found for 0 in table of type Bund");
                        }
                        Ok(TableBundEntry {
                            bracket_start: entry.amount,
                            base_tax: entry.taxes,
                            marginal_rate: entry.percent,
                        })
                    }
                })
                .collect::<anyhow::Result<_>>()?,
        ))
    }
}

impl TableBund {
    fn eval(&self, x: Decimal) -> Decimal {
        for entry in self.0.iter().rev() {
            if x >= entry.bracket_start {
                return entry.base_tax
                    + (x - entry.bracket_start) * entry.marginal_rate / Decimal::ONE_HUNDRED;
            }
        }
        Decimal::ZERO
    }
}

#[derive(Debug, Clone, Copy)]
struct TableBundEntry {
    bracket_start: Decimal,
    base_tax: Decimal,
    marginal_rate: Decimal,
}

#[derive(Debug, Clone, Copy)]
struct TableFlattax(Decimal);

impl TryFrom<&[TariffRow]> for TableFlattax {
    type Error = anyhow::Error;

    fn try_from(table: &[TariffRow]) -> Result<Self, Self::Error> {
        match table {
            [entry] if !entry.formula.is_empty() => Err(anyhow!(
                "Non-empty formula in table of type Flattax: {:?}",
                entry.formula
            )),
            [entry] if !entry.amount.is_zero() => Err(anyhow!(
                "Non-empty amount in table of type Flattax: {}",
                entry.amount
            )),
            [entry] => Ok(TableFlattax(entry.percent)),
            _ => Err(anyhow!(
                "Table of type Flattax doesn't have size 1: {}",
                table.len()
            )),
        }
    }
}

impl TableFlattax {
    fn eval(&self, x: Decimal) -> Decimal {
        x * self.0 / Decimal::ONE_HUNDRED
    }
}

/// Average tax rate interpolated linearly between bracket starts.
#[derive(Debug, Clone)]
struct TableFreiburg(Vec<TableFreiburgEntry>);

impl TryFrom<&[TariffRow]> for TableFreiburg {
    type Error = anyhow::Error;

    fn try_from(table: &[TariffRow]) -> Result<Self, Self::Error> {
        Ok(TableFreiburg(
            table
                .iter()
                .enumerate()
                .map(|(i, entry)| {
                    if !entry.formula.is_empty() {
                        Err(anyhow!(
                            "Non-empty formula in table of type Freiburg: {:?}",
                            entry.formula
                        ))
                    } else if !entry.taxes.is_zero() {
                        Err(anyhow!(
                            "Non-empty taxes in table of type Freiburg: {}",
                            entry.taxes
                        ))
                    } else {
                        if i == 0 && !entry.amount.is_zero() {
                            warn!("No entry found for 0 in table of type Freiburg");
                        }
                        Ok(TableFreiburgEntry {
                            bracket_start: entry.amount,
                            tax_rate: entry.percent,
                        })
                    }
                })
                .collect::<anyhow::Result<_>>()?,
        ))
    }
}

impl TableFreiburg {
    fn eval(&self, x: Decimal) -> Decimal {
        for (i, entry) in self.0.iter().enumerate().rev() {
            if x >= entry.bracket_start {
                let tax_rate = match self.0.get(i + 1) {
                    None => entry.tax_rate,
                    Some(next) => {
                        let width = next.bracket_start - entry.bracket_start;
                        if width.is_zero() {
                            entry.tax_rate
                        } else {
                            let weight = (x - entry.bracket_start) / width;
                            entry.tax_rate + weight * (next.tax_rate - entry.tax_rate)
                        }
                    }
                };
                return x * tax_rate / Decimal::ONE_HUNDRED;
            }
        }
        Decimal::ZERO
    }
}

#[derive(Debug, Clone, Copy)]
struct TableFreiburgEntry {
    bracket_start: Decimal,
    tax_rate: Decimal,
}

/// Consecutive slices, each taxed at its own marginal rate.
#[derive(Debug, Clone)]
struct TableZuerich(Vec<TableZuerichEntry>);

impl TryFrom<&[TariffRow]> for TableZuerich {
    type Error = anyhow::Error;

    fn try_from(table: &[TariffRow]) -> Result<Self, Self::Error> {
        let open_ended = Decimal::from(10_000_000);
        Ok(TableZuerich(
            table
                .iter()
                .map(|entry| {
                    if !entry.formula.is_empty() {
                        Err(anyhow!(
                            "Non-empty formula in table of type Zuerich: {:?}",
                            entry.formula
                        ))
                    } else if !entry.taxes.is_zero() {
                        Err(anyhow!(
                            "Non-empty taxes in table of type Zuerich: {}",
                            entry.taxes
                        ))
                    } else {
                        let bracket_len = (entry.amount < open_ended).then_some(entry.amount);
                        Ok(TableZuerichEntry {
                            bracket_len,
                            marginal_rate: entry.percent,
                        })
                    }
                })
                .collect::<anyhow::Result<_>>()?,
        ))
    }
}

impl TableZuerich {
    fn eval(&self, mut x: Decimal) -> Decimal {
        let mut tax = Decimal::ZERO;
        for entry in &self.0 {
            match entry.bracket_len {
                Some(len) if x > len => {
                    tax += len * entry.marginal_rate / Decimal::ONE_HUNDRED;
                    x -= len;
                }
                _ => {
                    tax += x * entry.marginal_rate / Decimal::ONE_HUNDRED;
                    break;
                }
            }
        }
        tax
    }
}

#[derive(Debug, Clone, Copy)]
struct TableZuerichEntry {
    /// `None` for the open-ended last slice.
    bracket_len: Option<Decimal>,
    marginal_rate: Decimal,
}
