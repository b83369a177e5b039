use crate::cache::YearCache;
use crate::canton::Canton;
use crate::error::DataError;
use crate::factor::FactorProvider;
use crate::input::TaxInput;
use crate::location::{Locations, LocationProvider, current_year, nearest_year_with_data};
use crate::schema::{FactorRecord, Location, TaxFactors, TaxTarif};
use crate::table::TariffProvider;
use async_trait::async_trait;
use log::{debug, trace, warn};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const LOCATIONS_FILE: &str = "locations.json";
const FACTORS_FILE: &str = "factors.json";
const TARIFS_FILE: &str = "tarifs.json";

/// Tax data parsed into one directory per year.
pub struct DataStore {
    dir: PathBuf,
    locations: YearCache<Locations>,
    factors: YearCache<HashMap<u32, TaxFactors>>,
    tarifs: YearCache<Vec<TaxTarif>>,
}

impl DataStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            locations: YearCache::new(),
            factors: YearCache::new(),
            tarifs: YearCache::new(),
        }
    }

    fn path(&self, year: u32, file: &str) -> PathBuf {
        self.dir.join(year.to_string()).join(file)
    }

    /// Reads one data file of `year`. A missing file means the year has no data.
    async fn read_year<T: DeserializeOwned>(
        &self,
        year: u32,
        file: &'static str,
    ) -> Result<T, DataError> {
        match read_json(&self.path(year, file)).await {
            Err(DataError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
                debug!("No {file} for {year}");
                Err(DataError::YearNotFound { year, file })
            }
            result => result,
        }
    }

    pub async fn nearest_year_with_data(&self, current_year: u32) -> Result<u32, DataError> {
        nearest_year_with_data(current_year, |year| {
            let path = self.path(year, LOCATIONS_FILE);
            async move { tokio::fs::try_exists(&path).await.unwrap_or(false) }
        })
        .await
    }

    async fn load_locations(&self, year: u32) -> Result<Arc<Locations>, DataError> {
        self.locations
            .get_or_load(year, move || async move {
                let list: Vec<Location> = self.read_year(year, LOCATIONS_FILE).await?;
                debug!("Loaded {} locations for {year}", list.len());
                for location in &list {
                    check_canton(location, year);
                }
                Ok::<_, DataError>(Locations::new(list))
            })
            .await
    }

    async fn load_factors(&self, year: u32) -> Result<Arc<HashMap<u32, TaxFactors>>, DataError> {
        self.factors
            .get_or_load(year, move || async move {
                let records: Vec<FactorRecord> = self.read_year(year, FACTORS_FILE).await?;
                debug!("Loaded {} factor records for {year}", records.len());

                let mut by_city = HashMap::new();
                for record in records {
                    trace!("Factors: {record:?}");
                    match by_city.entry(record.location.bfs_id) {
                        Entry::Occupied(entry) => {
                            if *entry.get() != record.factors {
                                warn!(
                                    "Inconsistent factors for {} in {year}, keeping the first record",
                                    record.location.bfs_id
                                );
                            }
                        }
                        Entry::Vacant(entry) => {
                            entry.insert(record.factors);
                        }
                    }
                }
                Ok::<_, DataError>(by_city)
            })
            .await
    }
}

#[async_trait]
impl LocationProvider for DataStore {
    async fn tax_locations(&self, year: Option<u32>) -> Result<Arc<Locations>, DataError> {
        let year = match year {
            Some(year) => year,
            None => self.nearest_year_with_data(current_year()).await?,
        };
        self.load_locations(year).await
    }
}

#[async_trait]
impl FactorProvider for DataStore {
    async fn tax_factors(&self, input: &TaxInput) -> Result<TaxFactors, DataError> {
        let (city_id, year) = (input.city_id(), input.year());
        self.load_factors(year)
            .await?
            .get(&city_id)
            .cloned()
            .ok_or(DataError::FactorsNotFound { city_id, year })
    }
}

#[async_trait]
impl TariffProvider for DataStore {
    async fn tarifs(&self, year: u32) -> Result<Arc<Vec<TaxTarif>>, DataError> {
        self.tarifs
            .get_or_load(year, move || async move {
                let tarifs: Vec<TaxTarif> = self.read_year(year, TARIFS_FILE).await?;
                debug!("Loaded {} tariffs for {year}", tarifs.len());
                Ok::<_, DataError>(tarifs)
            })
            .await
    }
}

fn check_canton(location: &Location, year: u32) {
    match Canton::from_id(location.canton_id) {
        Some(canton) if canton.code() == location.canton => {}
        Some(canton) => warn!(
            "Location {} in {year} has canton {} but canton ID {} ({})",
            location.bfs_id,
            location.canton,
            location.canton_id,
            canton.code()
        ),
        None => warn!(
            "Location {} in {year} has unknown canton ID {}",
            location.bfs_id, location.canton_id
        ),
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, DataError> {
    trace!("Reading {}", path.display());
    let bytes = tokio::fs::read(path).await.map_err(|source| DataError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| DataError::Json {
        path: path.display().to_string(),
        source,
    })
}
