#![forbid(unsafe_code)]

pub mod api;
pub mod cache;
pub mod canton;
pub mod cantonal;
pub mod church;
pub mod error;
pub mod estimate;
pub mod factor;
pub mod formula;
pub mod input;
pub mod load;
pub mod location;
pub mod money;
pub mod schema;
pub mod table;
