use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{self, Display};
use std::marker::PhantomData;
use std::str::FromStr;

// Locations
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Location {
    #[serde(rename = "BfsID")]
    pub bfs_id: u32,
    pub bfs_name: String,
    #[serde(rename = "CantonID")]
    pub canton_id: u32,
    pub canton: String,
    pub city: String,
    #[serde(rename = "TaxLocationID")]
    pub tax_location_id: u32,
    pub zip_code: String,
}

// Factors
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FactorRecord {
    pub location: Location,
    #[serde(flatten)]
    pub factors: TaxFactors,
}

/// Rate factors of one location and year, in percent.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaxFactors {
    pub income_rate_canton: Decimal,
    pub income_rate_city: Decimal,
    pub fortune_rate_canton: Decimal,
    pub fortune_rate_city: Decimal,
    pub income_rate_christ: Decimal,
    pub income_rate_roman: Decimal,
    pub income_rate_protestant: Decimal,
    pub fortune_rate_christ: Decimal,
    pub fortune_rate_roman: Decimal,
    pub fortune_rate_protestant: Decimal,
}

// Tariffs
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaxTarif {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "CantonID")]
    pub canton_id: u32,
    #[serde(deserialize_with = "comma_separated")]
    pub group: Vec<Group>,
    #[serde(default)]
    pub splitting: Decimal,
    pub table_type: TableType,
    pub target: Target,
    pub tax_type: TaxType,
    pub table: Vec<TariffRow>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TariffRow {
    #[serde(default)]
    pub formula: String,
    #[serde(default)]
    pub taxes: Decimal,
    #[serde(default)]
    pub percent: Decimal,
    pub amount: Decimal,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TableType {
    #[serde(rename = "")]
    Unknown,
    Bund,
    Flattax,
    Formel,
    Freiburg,
    Zuerich,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Target {
    Bund,
    Gemeinde,
    Kanton,
    Kirche,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaxType {
    EinkommensSteuer,
    Erbschaft,
    GewinnSteuer,
    KapitalSteuer,
    VermoegensSteuer,
    VorsorgeSteuer,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Group {
    Alle,
    LedigAlleine,
    LedigKonkubinat,
    LedigMitKinder,
    LedigOhneKinder,
    Verheiratet,
    /// Inheritance and gift relationships, irrelevant for income and wealth.
    Other,
}

impl FromStr for Group {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ALLE" => Ok(Group::Alle),
            "LEDIG_ALLEINE" => Ok(Group::LedigAlleine),
            "LEDIG_KONKUBINAT" => Ok(Group::LedigKonkubinat),
            "LEDIG_OHNE_KINDER" => Ok(Group::LedigOhneKinder),
            "LEDIG_MIT_KINDER" => Ok(Group::LedigMitKinder),
            "VERHEIRATET" => Ok(Group::Verheiratet),
            s if s.starts_with("TYP_") => Ok(Group::Other),
            _ => Err(format!("Unknown group: {s}")),
        }
    }
}

// Helpers
fn comma_separated<'de, V, T, D>(deserializer: D) -> Result<V, D::Error>
where
    V: FromIterator<T>,
    T: FromStr,
    T::Err: Display,
    D: Deserializer<'de>,
{
    struct CommaSeparated<V, T>(PhantomData<V>, PhantomData<T>);

    impl<'de, V, T> Visitor<'de> for CommaSeparated<V, T>
    where
        V: FromIterator<T>,
        T: FromStr,
        T::Err: Display,
    {
        type Value = V;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("string containing comma-separated elements")
        }

        fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            let iter = s.split(",").filter_map(|x| {
                if x.is_empty() {
                    None
                } else {
                    Some(FromStr::from_str(x))
                }
            });
            Result::from_iter(iter).map_err(de::Error::custom)
        }
    }

    let visitor = CommaSeparated(PhantomData, PhantomData);
    deserializer.deserialize_str(visitor)
}
