use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use compute::analysis::temporal::TemporalAnalysis;
use formats::{BoundaryDocument, load_recordings};
use foundation::Year;
use layers::{MapConfig, MapModel, Selection};
use render::{SvgRenderer, ViewportConfig};
use runtime::{Timeline, TimelineEvent, TimelinePlayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect, query and render a recordings table")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report rejected rows, blank cities and recordings per year
    Check { csv: PathBuf },

    /// List scouts with their visit and recording totals
    Scouts { csv: PathBuf },

    /// Print the points for a scout/year selection as JSON
    Query {
        csv: PathBuf,
        #[arg(long)]
        scout: Option<String>,
        #[arg(long)]
        year: Option<Year>,
        /// Print the detail panel for one city instead
        #[arg(long)]
        city: Option<String>,
    },

    /// Write the map for a selection as SVG
    Render {
        csv: PathBuf,
        #[arg(long)]
        out: PathBuf,
        /// GeoJSON outlines drawn under the points
        #[arg(long = "boundary")]
        boundaries: Vec<PathBuf>,
        #[arg(long)]
        scout: Option<String>,
        #[arg(long)]
        year: Option<Year>,
    },

    /// Step through the years, printing what each one shows
    Play {
        csv: PathBuf,
        #[arg(long)]
        scout: Option<String>,
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main(Args::parse()) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn real_main(args: Args) -> Result<()> {
    match args.command {
        Command::Check { csv } => cmd_check(&csv),
        Command::Scouts { csv } => cmd_scouts(&csv),
        Command::Query {
            csv,
            scout,
            year,
            city,
        } => cmd_query(&csv, Selection::new(scout.as_deref(), year), city.as_deref()),
        Command::Render {
            csv,
            out,
            boundaries,
            scout,
            year,
        } => cmd_render(&csv, &out, &boundaries, Selection::new(scout.as_deref(), year)),
        Command::Play {
            csv,
            scout,
            interval_ms,
        } => cmd_play(&csv, scout.as_deref(), Duration::from_millis(interval_ms)),
    }
}

fn load_model(csv: &Path) -> Result<MapModel> {
    MapModel::load(csv, MapConfig::default()).with_context(|| format!("load {}", csv.display()))
}

fn cmd_check(csv: &Path) -> Result<()> {
    let report = load_recordings(csv).with_context(|| format!("load {}", csv.display()))?;
    println!(
        "{}: {} recordings, {} rejected rows",
        csv.display(),
        report.recordings.len(),
        report.rejected.len()
    );
    for err in &report.rejected {
        println!("  {err}");
    }

    let model = MapModel::from_report(report, MapConfig::default());
    let aggregates = model.aggregates();
    for id in &aggregates.skipped {
        if let Some(rec) = model.dataset().get(*id) {
            println!("  {id} has no city ({}, {})", rec.country, rec.span);
        }
    }

    if let Some(bounds) = aggregates.year_bounds {
        let spans = model.dataset().recordings().iter().map(|r| r.span);
        println!("years {bounds}:");
        for (year, active) in TemporalAnalysis::activity(spans, bounds) {
            println!("  {year} {}", activity_bar(active));
        }
    }
    Ok(())
}

fn activity_bar(active: usize) -> String {
    if active == 0 {
        "-".to_string()
    } else {
        format!("{} {active}", "#".repeat(active.min(60)))
    }
}

fn cmd_scouts(csv: &Path) -> Result<()> {
    let model = load_model(csv)?;
    for scout in model.aggregates().scouts.values() {
        println!(
            "{:<24} {:>4} visits {:>6} recordings {:>3} cities",
            scout.name,
            scout.visits,
            scout.total_recordings,
            scout.cities.len()
        );
    }
    Ok(())
}

fn cmd_query(csv: &Path, selection: Selection, city: Option<&str>) -> Result<()> {
    let model = load_model(csv)?;
    if let Some(name) = city {
        let Some(record) = model.city(name) else {
            bail!("unknown city {name:?}");
        };
        for line in model.metadata(&record, &selection).lines() {
            println!("{line}");
        }
        return Ok(());
    }

    let result = model.select(&selection);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn cmd_render(csv: &Path, out: &Path, boundaries: &[PathBuf], selection: Selection) -> Result<()> {
    let model = load_model(csv)?;
    let mut docs = Vec::with_capacity(boundaries.len());
    for path in boundaries {
        let payload = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("boundary")
            .to_string();
        docs.push(
            BoundaryDocument::from_geojson_str(name, &payload)
                .with_context(|| format!("parse {}", path.display()))?,
        );
    }

    let result = model.select(&selection);
    let mut svg = SvgRenderer::for_model(ViewportConfig::default(), &model, &docs);
    fs::write(out, svg.render_selection(&model, &result))
        .with_context(|| format!("write {}", out.display()))?;
    info!("wrote {} points to {}", result.records.len(), out.display());
    Ok(())
}

fn cmd_play(csv: &Path, scout: Option<&str>, interval: Duration) -> Result<()> {
    let model = load_model(csv)?;
    let timeline = Timeline::from_bounds(model.year_bounds())?;
    println!("{}", timeline.label());

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    rt.block_on(async {
        let mut player = TimelinePlayer::spawn(timeline, interval);
        while let Some(event) = player.next_event().await {
            match event.kind {
                TimelineEvent::YearChanged(year) => {
                    let result = model.select(&Selection::new(scout, Some(year)));
                    match &result.message {
                        Some(message) => println!("{year}: {message}"),
                        None => println!(
                            "{year}: {} points, {} recordings",
                            result.records.len(),
                            result.total_recordings()
                        ),
                    }
                }
                TimelineEvent::Finished => println!("done"),
                _ => {}
            }
        }
        player.join().await?;
        Ok::<_, anyhow::Error>(())
    })
}
