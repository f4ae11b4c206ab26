use std::sync::Arc;

use crate::cli::build_generator;
use crate::error::Result;
use crate::server::{self, AppState};
use crate::settings::load_settings;

pub fn run(addr: Option<String>, taxonomy: Option<String>) -> Result<()> {
    let settings = load_settings();
    let generator = build_generator(&settings, taxonomy.as_deref())?;
    let addr = addr.unwrap_or_else(|| settings.bind_addr.clone());
    let state = AppState {
        generator: Arc::new(generator),
        limits: settings.count_limits(),
        download_filename: settings.download_filename,
    };

    eprintln!("Serving on http://{addr}/api/data/generate");
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server::serve(&addr, state))
}
