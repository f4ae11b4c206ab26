use std::io::{BufWriter, Write};
use std::path::PathBuf;

use chrono::{Datelike, Local};

use crate::cli::build_generator;
use crate::encoder::{write_csv, CsvSchema};
use crate::error::Result;
use crate::request::GenerateParams;
use crate::settings::{load_settings, shellexpand_path};

pub struct GenerateArgs {
    pub params: GenerateParams,
    pub schema: CsvSchema,
    pub output: Option<String>,
    pub taxonomy: Option<String>,
}

pub fn run(args: GenerateArgs) -> Result<()> {
    let settings = load_settings();
    let today = Local::now().date_naive();
    let request = args.params.validate(settings.count_limits(), today.year())?;
    let generator = build_generator(&settings, args.taxonomy.as_deref())?.with_today(today);
    let records = generator.generate(&request, &mut rand::thread_rng())?;

    match args.output {
        Some(out) => {
            let path = PathBuf::from(shellexpand_path(&out));
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let mut writer = BufWriter::new(std::fs::File::create(&path)?);
            write_csv(&mut writer, &records, args.schema)?;
            eprintln!("Wrote {} records to {}", records.len(), path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            write_csv(&mut writer, &records, args.schema)?;
            writer.flush()?;
        }
    }
    Ok(())
}
