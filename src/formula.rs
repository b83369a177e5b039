//! Evaluation of `FORMEL` tariffs.
//!
//! Formula strings come from external data files. They are rendered into a
//! concrete arithmetic expression, checked against a character whitelist and
//! then parsed by a small grammar that only knows numbers, `+ - * /`,
//! parentheses and the natural logarithm `ln(...)`. Anything else evaluates to
//! zero.

use crate::money::round_to_5_centimes;
use crate::schema::{TariffRow, TaxTarif};
use anyhow::anyhow;
use log::{debug, warn};
use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::multispace0;
use nom::combinator::{map, map_res};
use nom::multi::many;
use nom::number::complete::recognize_float;
use nom::sequence::{delimited, preceded};
use nom::{IResult, Parser};
use ordered_float::OrderedFloat;
use regex::{NoExpand, Regex};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use std::sync::LazyLock;

const PLACEHOLDER: &str = "$wert$";

static LOG_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"log\s*\$wert\$").expect("invalid log marker regex"));

static WHITELIST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[0-9.eE\s+\-*/(),]|ln)+$").expect("invalid whitelist regex"));

/// Computes the simple tax of `amount` under a `FORMEL` tariff.
///
/// The applicable row is the last one whose threshold does not exceed
/// `amount`, or the first row if there is none. Negative amounts, empty tables,
/// blank or rejected formulas and non-finite results all yield zero.
pub fn evaluate(amount: Decimal, tarif: &TaxTarif) -> Decimal {
    if amount < Decimal::ZERO {
        return Decimal::ZERO;
    }
    let Some(row) = select_row(&tarif.table, amount) else {
        return Decimal::ZERO;
    };

    let formula = row.formula.trim();
    if formula.is_empty() {
        return Decimal::ZERO;
    }

    let expr = render(formula, amount);
    if !WHITELIST.is_match(&expr) {
        warn!(
            "Rejected formula of tariff {:?} at {}: {formula:?}",
            tarif.name, row.amount
        );
        return Decimal::ZERO;
    }

    let value = match Formula::try_from(expr.as_str()) {
        Ok(formula) => formula.eval(),
        Err(e) => {
            debug!("Failed to evaluate {expr:?}: {e:?}");
            return Decimal::ZERO;
        }
    };
    if !value.is_finite() {
        debug!("Non-finite result for {expr:?}: {value}");
        return Decimal::ZERO;
    }

    Decimal::from_f64(value).map_or(Decimal::ZERO, round_to_5_centimes)
}

pub fn select_row(table: &[TariffRow], amount: Decimal) -> Option<&TariffRow> {
    table
        .iter()
        .rev()
        .find(|row| row.amount <= amount)
        .or(table.first())
}

/// Substitutes `amount` into the formula, turning `log $wert$` into `ln(...)`.
pub fn render(formula: &str, amount: Decimal) -> String {
    let value = amount.normalize().to_string();
    LOG_MARKER
        .replace_all(formula, NoExpand("ln($wert$)"))
        .replace(PLACEHOLDER, &value)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Formula {
    Const(OrderedFloat<f64>),
    Neg(Box<Formula>),
    Ln(Box<Formula>),
    Add(Box<Formula>, Box<Formula>),
    Sub(Box<Formula>, Box<Formula>),
    Mul(Box<Formula>, Box<Formula>),
    Div(Box<Formula>, Box<Formula>),
}

#[cfg(test)]
impl Formula {
    fn constant(x: f64) -> Self {
        Self::Const(OrderedFloat(x))
    }

    fn ln(f: Formula) -> Self {
        Self::Ln(Box::new(f))
    }

    fn add(f: Formula, g: Formula) -> Self {
        Self::Add(Box::new(f), Box::new(g))
    }

    fn sub(f: Formula, g: Formula) -> Self {
        Self::Sub(Box::new(f), Box::new(g))
    }

    fn mul(f: Formula, g: Formula) -> Self {
        Self::Mul(Box::new(f), Box::new(g))
    }

    fn div(f: Formula, g: Formula) -> Self {
        Self::Div(Box::new(f), Box::new(g))
    }
}

impl Formula {
    pub fn eval(&self) -> f64 {
        match self {
            Formula::Const(c) => **c,
            Formula::Neg(f) => -f.eval(),
            Formula::Ln(f) => f.eval().ln(),
            Formula::Add(f, g) => f.eval() + g.eval(),
            Formula::Sub(f, g) => f.eval() - g.eval(),
            Formula::Mul(f, g) => f.eval() * g.eval(),
            Formula::Div(f, g) => f.eval() / g.eval(),
        }
    }
}

impl TryFrom<&str> for Formula {
    type Error = anyhow::Error;

    fn try_from(text: &str) -> Result<Self, Self::Error> {
        match expr(text) {
            Ok((remainder, formula)) => {
                if remainder.is_empty() {
                    Ok(formula)
                } else {
                    Err(anyhow!(
                        "Incomplete parsing, formula: {formula:?}, remainder: {remainder}"
                    ))
                }
            }
            Err(e) => Err(anyhow!("Failed to parse: {e:?}")),
        }
    }
}

enum Operation {
    Add,
    Sub,
    Mul,
    Div,
}

fn parens(i: &str) -> IResult<&str, Formula> {
    delimited(
        multispace0,
        delimited(tag("("), expr, tag(")")),
        multispace0,
    )
    .parse(i)
}

fn expr(i: &str) -> IResult<&str, Formula> {
    let (i, initial) = term(i)?;
    let (i, remainder) = many(
        0..,
        alt((
            |i| {
                let (i, add) = preceded(tag("+"), term).parse(i)?;
                Ok((i, (Operation::Add, add)))
            },
            |i| {
                let (i, sub) = preceded(tag("-"), term).parse(i)?;
                Ok((i, (Operation::Sub, sub)))
            },
        )),
    )
    .parse(i)?;

    Ok((i, fold_exprs(initial, remainder)))
}

fn term(i: &str) -> IResult<&str, Formula> {
    let (i, initial) = factor(i)?;
    let (i, remainder) = many(
        0..,
        alt((
            |i| {
                let (i, mul) = preceded(tag("*"), factor).parse(i)?;
                Ok((i, (Operation::Mul, mul)))
            },
            |i| {
                let (i, div) = preceded(tag("/"), factor).parse(i)?;
                Ok((i, (Operation::Div, div)))
            },
        )),
    )
    .parse(i)?;

    Ok((i, fold_exprs(initial, remainder)))
}

fn factor(i: &str) -> IResult<&str, Formula> {
    alt((
        parens,
        map(
            preceded(delimited(multispace0, tag("ln"), multispace0), parens),
            |f| Formula::Ln(Box::new(f)),
        ),
        map(
            map_res(
                delimited(multispace0, recognize_float, multispace0),
                |s: &str| s.parse::<f64>().map(OrderedFloat),
            ),
            Formula::Const,
        ),
        map(
            preceded(delimited(multispace0, tag("-"), multispace0), factor),
            |f| Formula::Neg(Box::new(f)),
        ),
    ))
    .parse(i)
}

fn fold_exprs(initial: Formula, remainder: Vec<(Operation, Formula)>) -> Formula {
    remainder.into_iter().fold(initial, |acc, pair| {
        let (operation, expr) = pair;
        match operation {
            Operation::Add => Formula::Add(Box::new(acc), Box::new(expr)),
            Operation::Sub => Formula::Sub(Box::new(acc), Box::new(expr)),
            Operation::Mul => Formula::Mul(Box::new(acc), Box::new(expr)),
            Operation::Div => Formula::Div(Box::new(acc), Box::new(expr)),
        }
    })
}
