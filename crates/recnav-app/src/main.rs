//! Walk a CSV file as a master/detail session from the command line

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use recnav_core::{
    ControllerOwnership, CursorController, DataSource, FieldValue, MasterSource,
    NavigationSettings,
};
use recnav_data::{load_csv_file, CsvLoadConfig, DynamicRecord, RecordGrid};
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: recnav <file.csv> [--settings settings.json] [--csv-config load.json] \
                     [--where column=value] [--export out.csv]";

#[derive(Debug, Default, PartialEq)]
struct Args {
    path: PathBuf,
    settings: Option<PathBuf>,
    csv_config: Option<PathBuf>,
    filter: Option<(String, String)>,
    export: Option<PathBuf>,
}

impl Args {
    fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self> {
        let mut parsed = Args::default();
        let mut path = None;
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--settings" => parsed.settings = Some(Self::value(&mut args, &arg)?.into()),
                "--csv-config" => parsed.csv_config = Some(Self::value(&mut args, &arg)?.into()),
                "--export" => parsed.export = Some(Self::value(&mut args, &arg)?.into()),
                "--where" => {
                    let clause = Self::value(&mut args, &arg)?;
                    let Some((column, value)) = clause.split_once('=') else {
                        bail!("--where expects column=value, got '{}'", clause);
                    };
                    parsed.filter = Some((column.trim().to_string(), value.to_string()));
                }
                flag if flag.starts_with("--") => bail!("unknown option '{}'\n{}", flag, USAGE),
                _ if path.is_none() => path = Some(PathBuf::from(arg)),
                _ => bail!("unexpected argument '{}'\n{}", arg, USAGE),
            }
        }

        parsed.path = path.context(USAGE)?;
        Ok(parsed)
    }

    fn value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
        args.next().with_context(|| format!("{} needs a value", flag))
    }
}

fn read_settings(args: &Args) -> Result<(NavigationSettings, CsvLoadConfig)> {
    let settings = match &args.settings {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            NavigationSettings::from_json(&text)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => NavigationSettings::default(),
    };
    let csv_config = match &args.csv_config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            CsvLoadConfig::from_json(&text)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => CsvLoadConfig::default(),
    };
    Ok((settings, csv_config))
}

fn build_view(
    master: &MasterSource<DynamicRecord>,
    filter: Option<&(String, String)>,
    settings: NavigationSettings,
) -> Arc<DataSource<DynamicRecord>> {
    match filter {
        Some((column, raw)) => {
            let wanted = FieldValue::parse(raw);
            DataSource::derive_view_with(master, format!("{}={}", column, raw), settings, |record: &DynamicRecord| {
                record.get(column).as_ref() == Some(&wanted)
            })
        }
        None => DataSource::derive_view_with(master, "all", settings, |_: &DynamicRecord| true),
    }
}

/// Print every position of the view, front to back
fn walk(view: &DataSource<DynamicRecord>) -> Result<()> {
    let navigator = view.navigate()?;
    println!("{}", view.record_position_displayer()?);

    while navigator.write().go_next() {
        let record = navigator.read().current_record()?;
        let key = record
            .map(|record| record.record_key().to_string())
            .unwrap_or_default();
        println!("{}  [{}]", view.record_position_displayer()?, key);
    }

    if navigator.write().go_new() {
        println!("{}", view.record_position_displayer()?);
    }
    Ok(())
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse(std::env::args().skip(1))?;
    let (settings, csv_config) = read_settings(&args)?;

    let entity = args
        .path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("records")
        .to_string();
    let master = load_csv_file(&args.path, &entity, &csv_config)
        .with_context(|| format!("loading {}", args.path.display()))?;

    let view = build_view(&master, args.filter.as_ref(), settings);
    view.attach_controller(
        Arc::new(CursorController::new(&view)),
        ControllerOwnership::Owned,
    );
    info!(entity = %entity, records = master.len(), view = view.name(), selected = view.len(), "session ready");

    walk(&view)?;

    if let Some(path) = &args.export {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        RecordGrid::from_source(&view).write_csv(BufWriter::new(file))?;
        info!(path = %path.display(), "exported view");
    }

    view.dispose();
    master.dispose();
    Ok(())
}
