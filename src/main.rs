#![forbid(unsafe_code)]

use anyhow::Result;
use cantonal_taxes::api::{self, AppState};
use cantonal_taxes::estimate::Estimator;
use cantonal_taxes::load::DataStore;
use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

/// Serves cantonal, municipal and church tax estimates over HTTP.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Directory containing one sub-directory of parsed data per year.
    #[arg(long, env = "TAXES_DATA_DIR", default_value = "data/parsed")]
    data_dir: PathBuf,

    /// Address to listen on.
    #[arg(long, env = "TAXES_LISTEN", default_value = "127.0.0.1:3000")]
    listen: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    info!("Loading tax data from {}", args.data_dir.display());
    let store = Arc::new(DataStore::new(args.data_dir));
    let state = AppState {
        locations: store.clone(),
        estimator: Arc::new(Estimator::new(store.clone(), store)),
    };
    api::serve(&args.listen, state).await
}
