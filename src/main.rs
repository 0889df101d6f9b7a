use std::{env, path::PathBuf, str::FromStr};

use anyhow::{anyhow, bail, Context, Error};
use chrono::Utc;
use shift_grid::config::Config;
use shift_grid::schedule::options::{generate, ShiftPolicy};
use shift_grid::schedule::snapshot::ScheduleSnapshot;
use shift_grid::schedule::transport;
use shift_grid::schedule::week::{resolve_week_param, WeekKey};
use shift_grid::storage::{open_week, rename_store, save_snapshot, JsonDirStore};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const USAGE: &str = "usage: shift_grid <command>
  summary <snapshot.json>        weekly hours per employee
  share <snapshot.json>          print a share token
  open <token>                   decode a share token
  options [capped|unrestricted]  list selectable shifts
  week [YYYY-MM-DD] [delta]      canonical week key, optionally shifted
  load <store> [YYYY-MM-DD]      open a week from the data directory
  save <snapshot.json> <secret>  save a snapshot to the data directory
  name <store> <name> <secret>   set the store's display name";

fn init_logging() -> Result<(), Error> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow!("Failed to set up logging: {}", e))
}

fn read_snapshot(file_path: &str) -> Result<ScheduleSnapshot, Error> {
    let path = PathBuf::from_str(file_path)?;
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to open file: {}", path.to_string_lossy()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Not a schedule snapshot: {}", path.to_string_lossy()))
}

fn arg(args: &[String], index: usize) -> Result<&str, Error> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("missing argument\n{}", USAGE))
}

fn main() -> Result<(), Error> {
    init_logging()?;

    let args: Vec<String> = env::args().collect();
    let config = Config::load(None).context("Failed to load configuration")?;

    match args.get(1).map(String::as_str) {
        Some("summary") => {
            let snapshot = read_snapshot(arg(&args, 2)?)?;
            println!("{}", serde_json::to_string_pretty(&snapshot.summarize())?);
        }
        Some("share") => {
            let snapshot = read_snapshot(arg(&args, 2)?)?;
            println!("{}", transport::encode(&snapshot)?);
        }
        Some("open") => {
            let snapshot = transport::decode(arg(&args, 2)?)
                .context("Share link is broken or incomplete")?
                .into_snapshot();
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Some("options") => {
            let policy = match args.get(2) {
                Some(name) => {
                    ShiftPolicy::preset(name).ok_or_else(|| anyhow!("unknown preset {:?}", name))?
                }
                None => config.shift_policy()?,
            };
            for label in generate(&policy).iter() {
                println!("{}", label);
            }
        }
        Some("week") => {
            let week = match args.get(2) {
                Some(date) => WeekKey::from_str(date)?,
                None => config.current_week()?,
            };
            let delta: i64 = match args.get(3) {
                Some(delta) => delta.parse().context("delta must be a whole number of weeks")?,
                None => 0,
            };
            let week = week.shift_weeks(delta)?;
            println!("{}\t{}", week, week.week_label());
        }
        Some("load") => {
            let store_id = arg(&args, 2)?;
            let week = resolve_week_param(args.get(3).map(String::as_str), config.today()?);
            let store = JsonDirStore::new(&config.data_dir);
            let snapshot = open_week(&store, &config, store_id, week)
                .with_context(|| format!("Could not load {} week {}", store_id, week))?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Some("save") => {
            let snapshot = read_snapshot(arg(&args, 2)?)?;
            if !config.is_authorized(arg(&args, 3)?) {
                bail!("Wrong password, schedule not saved");
            }
            let store = JsonDirStore::new(&config.data_dir);
            let saved = save_snapshot(&store, &snapshot, Utc::now()).with_context(|| {
                format!(
                    "Save failed for {} week {}. Check that {} is writable and try again",
                    snapshot.store_id,
                    snapshot.week,
                    store.root().display()
                )
            })?;
            info!(
                "Saved {} employees for {} week {}",
                saved.employees.len(),
                saved.store_id,
                saved.week
            );
        }
        Some("name") => {
            let store_id = arg(&args, 2)?;
            if !config.is_authorized(arg(&args, 4)?) {
                bail!("Wrong password, store name not saved");
            }
            let store = JsonDirStore::new(&config.data_dir);
            let week = config.current_week()?;
            let snapshot = open_week(&store, &config, store_id, week)
                .with_context(|| format!("Could not load {} week {}", store_id, week))?;
            let renamed = rename_store(&store, &snapshot, arg(&args, 3)?)
                .with_context(|| format!("Could not rename {}", store_id))?;
            save_snapshot(&store, &renamed, Utc::now())
                .with_context(|| format!("Save failed for {} week {}", store_id, week))?;
            info!("{} is now shown as {:?}", store_id, renamed.store_name);
        }
        _ => bail!("{}", USAGE),
    }

    Ok(())
}
