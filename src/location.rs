use crate::error::DataError;
use crate::schema::Location;
use async_trait::async_trait;
use chrono::{Datelike, Local};
use log::debug;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// Oldest year considered when looking for location data.
pub const MIN_YEAR: u32 = 2000;

#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Locations of `year`, or of the most recent year with data.
    async fn tax_locations(&self, year: Option<u32>) -> Result<Arc<Locations>, DataError>;

    async fn canton_id_by_city_id(&self, city_id: u32, year: u32) -> Result<u32, DataError> {
        let locations = self.tax_locations(Some(year)).await?;
        locations
            .by_city(city_id)
            .map(|location| location.canton_id)
            .ok_or(DataError::LocationNotFound { city_id, year })
    }
}

/// The locations of one year, indexed by BFS number.
#[derive(Debug, Default)]
pub struct Locations {
    list: Vec<Location>,
    by_city: HashMap<u32, usize>,
}

impl Locations {
    pub fn new(list: Vec<Location>) -> Self {
        let by_city = list
            .iter()
            .enumerate()
            .map(|(i, location)| (location.bfs_id, i))
            .collect();
        Self { list, by_city }
    }

    pub fn list(&self) -> &[Location] {
        &self.list
    }

    pub fn by_city(&self, city_id: u32) -> Option<&Location> {
        self.by_city.get(&city_id).map(|&i| &self.list[i])
    }
}

pub fn current_year() -> u32 {
    u32::try_from(Local::now().year()).unwrap_or(MIN_YEAR)
}

/// Walks back from `current_year` to [`MIN_YEAR`] and returns the first year
/// for which `has_data` holds.
pub async fn nearest_year_with_data<F, Fut>(
    current_year: u32,
    mut has_data: F,
) -> Result<u32, DataError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = bool>,
{
    for year in (MIN_YEAR..=current_year).rev() {
        if has_data(year).await {
            debug!("Nearest year with data: {year}");
            return Ok(year);
        }
    }
    Err(DataError::NoLocationData {
        min_year: MIN_YEAR,
        max_year: current_year,
    })
}
