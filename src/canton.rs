use rust_decimal::Decimal;
use std::ops::RangeInclusive;

/// The 26 cantons, with their ESTV identifiers.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Canton {
    Aargau,
    AppenzellInnerrhoden,
    AppenzellAusserrhoden,
    Bern,
    BaselLandschaft,
    BaselStadt,
    Fribourg,
    Geneva,
    Glarus,
    Graubuenden,
    Jura,
    Lucerne,
    Neuchatel,
    Nidwalden,
    Obwalden,
    StGallen,
    Schaffhausen,
    Solothurn,
    Schwyz,
    Thurgau,
    Ticino,
    Uri,
    Vaud,
    Valais,
    Zug,
    Zurich,
}

impl Canton {
    pub const ALL: [Canton; 26] = [
        Canton::Aargau,
        Canton::AppenzellInnerrhoden,
        Canton::AppenzellAusserrhoden,
        Canton::Bern,
        Canton::BaselLandschaft,
        Canton::BaselStadt,
        Canton::Fribourg,
        Canton::Geneva,
        Canton::Glarus,
        Canton::Graubuenden,
        Canton::Jura,
        Canton::Lucerne,
        Canton::Neuchatel,
        Canton::Nidwalden,
        Canton::Obwalden,
        Canton::StGallen,
        Canton::Schaffhausen,
        Canton::Solothurn,
        Canton::Schwyz,
        Canton::Thurgau,
        Canton::Ticino,
        Canton::Uri,
        Canton::Vaud,
        Canton::Valais,
        Canton::Zug,
        Canton::Zurich,
    ];

    /// ESTV identifiers are assigned alphabetically by canton code, from 1.
    pub fn from_id(id: u32) -> Option<Self> {
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        Self::ALL.get(index).copied()
    }

    pub fn id(self) -> u32 {
        self as u32 + 1
    }

    pub fn code(self) -> &'static str {
        match self {
            Canton::Aargau => "AG",
            Canton::AppenzellInnerrhoden => "AI",
            Canton::AppenzellAusserrhoden => "AR",
            Canton::Bern => "BE",
            Canton::BaselLandschaft => "BL",
            Canton::BaselStadt => "BS",
            Canton::Fribourg => "FR",
            Canton::Geneva => "GE",
            Canton::Glarus => "GL",
            Canton::Graubuenden => "GR",
            Canton::Jura => "JU",
            Canton::Lucerne => "LU",
            Canton::Neuchatel => "NE",
            Canton::Nidwalden => "NW",
            Canton::Obwalden => "OW",
            Canton::StGallen => "SG",
            Canton::Schaffhausen => "SH",
            Canton::Solothurn => "SO",
            Canton::Schwyz => "SZ",
            Canton::Thurgau => "TG",
            Canton::Ticino => "TI",
            Canton::Uri => "UR",
            Canton::Vaud => "VD",
            Canton::Valais => "VS",
            Canton::Zug => "ZG",
            Canton::Zurich => "ZH",
        }
    }
}

/// A statutory reduction of the cantonal share, valid for a range of tax years.
#[derive(Clone, Debug)]
pub struct StatutoryReduction {
    pub canton: Canton,
    pub years: RangeInclusive<u32>,
    pub factor: Decimal,
}

// See https://www.vd.ch/actualites/communiques-de-presse-de-letat-de-vaud/detail/communique/le-conseil-detat-respecte-ses-engagements-et-detaille-sa-feuille-de-route-fiscale-1695286975
pub static STATUTORY_REDUCTIONS: [StatutoryReduction; 1] = [StatutoryReduction {
    canton: Canton::Vaud,
    years: 2024..=2025,
    factor: Decimal::from_parts(965, 0, 0, false, 3),
}];

pub fn statutory_reduction(canton_id: u32, year: u32) -> Option<Decimal> {
    let canton = Canton::from_id(canton_id)?;
    STATUTORY_REDUCTIONS
        .iter()
        .find(|reduction| reduction.canton == canton && reduction.years.contains(&year))
        .map(|reduction| reduction.factor)
}

#[cfg(test)]
mod test {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn ids_round_trip() {
        for canton in Canton::ALL {
            assert_eq!(Canton::from_id(canton.id()), Some(canton));
        }
        assert_eq!(Canton::from_id(0), None);
        assert_eq!(Canton::from_id(27), None);
    }

    #[test]
    fn known_ids() {
        assert_eq!(Canton::from_id(5), Some(Canton::BaselLandschaft));
        assert_eq!(Canton::from_id(6), Some(Canton::BaselStadt));
        assert_eq!(Canton::from_id(8), Some(Canton::Geneva));
        assert_eq!(Canton::from_id(11), Some(Canton::Jura));
        assert_eq!(Canton::from_id(13), Some(Canton::Neuchatel));
        assert_eq!(Canton::from_id(21), Some(Canton::Ticino));
        assert_eq!(Canton::from_id(22), Some(Canton::Uri));
        assert_eq!(Canton::from_id(23), Some(Canton::Vaud));
        assert_eq!(Canton::from_id(24), Some(Canton::Valais));
        assert_eq!(Canton::Zurich.code(), "ZH");
    }

    #[test]
    fn vaud_reduction() {
        assert_eq!(statutory_reduction(23, 2023), None);
        assert_eq!(statutory_reduction(23, 2024), Some(dec!(0.965)));
        assert_eq!(statutory_reduction(23, 2025), Some(dec!(0.965)));
        assert_eq!(statutory_reduction(23, 2026), None);
        assert_eq!(statutory_reduction(24, 2024), None);
        assert_eq!(statutory_reduction(99, 2024), None);
    }
}
