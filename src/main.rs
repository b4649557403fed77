use anyhow::{anyhow, Context, Result};
use clap::{Arg, ArgMatches, Command};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use learning_paths::duration::format_duration;
use learning_paths::{Config, ContentItem, JsonFileStore, Session};

/// Item as exported from the video search API: either whole seconds or an ISO-8601 duration
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemRecord {
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    duration_seconds: Option<u64>,
    duration: Option<String>,
}

impl ItemRecord {
    fn into_item(self) -> Result<ContentItem> {
        match (self.duration_seconds, self.duration) {
            (Some(seconds), _) => Ok(ContentItem::new(self.id, self.title, self.description, seconds)),
            (None, Some(iso)) => Ok(ContentItem::with_iso_duration(self.id, self.title, self.description, &iso)?),
            (None, None) => Ok(ContentItem::new(self.id, self.title, self.description, 0)),
        }
    }
}

fn cli() -> Command {
    Command::new("learning-paths")
        .version("0.1.0")
        .author("TigreRoll")
        .about("Classify videos into learning paths, track progress and get recommendations")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file (TOML)")
                .global(true)
        )
        .arg(
            Arg::new("data-dir")
                .short('d')
                .long("data-dir")
                .value_name("DIR")
                .help("Directory holding paths.json and progress.json")
                .global(true)
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue)
                .global(true)
        )
        .subcommand(Command::new("paths").about("List learning paths with completion"))
        .subcommand(
            Command::new("classify")
                .about("Classify items without changing any path")
                .arg(items_arg())
        )
        .subcommand(
            Command::new("assign")
                .about("Classify items and add them to their learning paths")
                .arg(items_arg())
        )
        .subcommand(
            Command::new("watch")
                .about("Record a watch event")
                .arg(Arg::new("path-id").required(true))
                .arg(items_arg())
                .arg(Arg::new("item-id").required(true))
                .arg(
                    Arg::new("seconds")
                        .required(true)
                        .value_parser(clap::value_parser!(u64))
                )
        )
        .subcommand(
            Command::new("analytics")
                .about("Show analytics for a learning path")
                .arg(Arg::new("path-id").required(true))
        )
        .subcommand(Command::new("recommend").about("Show recommended learning paths"))
        .subcommand(Command::new("summary").about("Show dashboard totals"))
        .subcommand(
            Command::new("delete-path")
                .about("Delete a learning path and its progress")
                .arg(Arg::new("path-id").required(true))
        )
}

fn items_arg() -> Arg {
    Arg::new("items")
        .value_name("ITEMS_JSON")
        .help("JSON file with an array of video items")
        .required(true)
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a String> {
    matches
        .get_one::<String>(name)
        .ok_or_else(|| anyhow!("missing argument: {}", name))
}

/// Global args may be given before or after the subcommand
fn global_value<'a>(matches: &'a ArgMatches, name: &str) -> Option<&'a String> {
    matches
        .subcommand()
        .and_then(|(_, sub)| sub.get_one::<String>(name))
        .or_else(|| matches.get_one::<String>(name))
}

fn verbose(matches: &ArgMatches) -> bool {
    matches.get_flag("verbose")
        || matches
            .subcommand()
            .map_or(false, |(_, sub)| sub.get_flag("verbose"))
}

fn load_items(path: &Path) -> Result<Vec<ContentItem>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let records: Vec<ItemRecord> = serde_json::from_str(&content)
        .with_context(|| format!("parsing {}", path.display()))?;
    records.into_iter().map(ItemRecord::into_item).collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();

    let mut config = match global_value(&matches, "config") {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    if let Some(dir) = global_value(&matches, "data-dir") {
        config.storage.data_dir = PathBuf::from(dir);
    }
    config.validate()?;

    // Initialize logging
    let filter = if verbose(&matches) {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .init();

    debug!("{}", config.summary());

    let store = JsonFileStore::from_config(&config);
    let mut session = Session::open(store, &config).await?;

    match matches.subcommand() {
        Some(("paths", _)) => {
            let engine = session.engine();
            for path in engine.paths() {
                let analytics = engine.analytics(&path.id)?;
                println!(
                    "{:<16} {:<12} {:>5.1}%  {} items  {}",
                    path.id,
                    path.level,
                    analytics.completion_rate,
                    path.items.len(),
                    path.name
                );
            }
        }
        Some(("classify", sub)) => {
            let items = load_items(Path::new(required(sub, "items")?))?;
            for item in &items {
                match session.engine().classify(item) {
                    Some(result) => println!("{}", serde_json::to_string(&result)?),
                    None => println!("{}: unclassified", item.id),
                }
            }
        }
        Some(("assign", sub)) => {
            let items = load_items(Path::new(required(sub, "items")?))?;
            for item in items {
                let id = item.id.clone();
                match session.assign_item(item).await? {
                    Some(assignment) if assignment.added => println!("{} -> {}", id, assignment.path_id),
                    Some(assignment) => println!("{} already in {}", id, assignment.path_id),
                    None => println!("{}: unclassified", id),
                }
            }
        }
        Some(("watch", sub)) => {
            let path_id = required(sub, "path-id")?;
            let item_id = required(sub, "item-id")?;
            let seconds = *sub
                .get_one::<u64>("seconds")
                .ok_or_else(|| anyhow!("missing argument: seconds"))?;

            let items = load_items(Path::new(required(sub, "items")?))?;
            let item = items
                .into_iter()
                .find(|item| &item.id == item_id)
                .ok_or_else(|| anyhow!("item {} not found in items file", item_id))?;

            let progress = session.record_watch(path_id, &item, seconds).await?;
            info!("✅ Recorded {} of {}", format_duration(seconds), item.title);
            println!("{}", serde_json::to_string_pretty(&progress)?);
        }
        Some(("analytics", sub)) => {
            let analytics = session.engine().analytics(required(sub, "path-id")?)?;
            println!("{}", serde_json::to_string_pretty(&analytics)?);
        }
        Some(("recommend", _)) => {
            for rec in session.engine().recommendations() {
                println!("{:<16} {:>5.2}  {}", rec.path.id, rec.score, rec.path.name);
            }
        }
        Some(("summary", _)) => {
            let summary = session.engine().summary();
            println!("Videos watched:  {}", summary.total_videos_watched);
            println!("Time watched:    {}", format_duration(summary.total_seconds_watched));
            println!("Active paths:    {}", summary.active_paths);
            println!("Completed paths: {}", summary.completed_paths);
        }
        Some(("delete-path", sub)) => {
            let removed = session.delete_path(required(sub, "path-id")?).await?;
            println!("Deleted {}", removed.name);
        }
        _ => unreachable!("subcommand_required is set"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        cli().debug_assert();
    }

    #[test]
    fn test_item_record_accepts_iso_duration() {
        let records: Vec<ItemRecord> = serde_json::from_str(
            r#"[{"id":"a","title":"A","duration":"PT2M"},{"id":"b","title":"B","durationSeconds":5}]"#,
        )
        .unwrap();
        let items: Vec<ContentItem> = records
            .into_iter()
            .map(|r| r.into_item().unwrap())
            .collect();

        assert_eq!(items[0].duration_seconds, 120);
        assert_eq!(items[1].duration_seconds, 5);
    }
}
