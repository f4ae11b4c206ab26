use std::path::Path;

use crate::error::Result;
use crate::settings::{load_settings_from, save_settings_to, settings_path, shellexpand_path};
use crate::taxonomy::Taxonomy;

pub fn run(taxonomy: Option<String>, force: bool) -> Result<()> {
    let path = settings_path();
    run_at(&path, taxonomy, force)
}

fn run_at(path: &Path, taxonomy: Option<String>, force: bool) -> Result<()> {
    if path.exists() && !force {
        println!("Settings already exist at {} (use --force to overwrite).", path.display());
        return Ok(());
    }

    let mut settings = load_settings_from(path);
    if let Some(t) = taxonomy {
        let resolved = shellexpand_path(&t);
        // Refuse to record a taxonomy that would fail at startup.
        Taxonomy::load(Path::new(&resolved))?;
        settings.taxonomy_path = Some(resolved);
    }

    save_settings_to(path, &settings)?;
    println!("Wrote settings to {}", path.display());
    Ok(())
}
