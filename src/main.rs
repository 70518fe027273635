use chrono::NaiveDate;
use tracing::info;

use slotgrid::config::GridConfig;
use slotgrid::provider::JsonDirProvider;
use slotgrid::session::Scheduler;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    slotgrid::observability::init_tracing();

    let date_arg = std::env::args()
        .nth(1)
        .ok_or("usage: slotgrid <YYYY-MM-DD>")?;
    let date = NaiveDate::parse_from_str(&date_arg, "%Y-%m-%d")?;
    let data_dir = std::env::var("SLOTGRID_DATA_DIR").unwrap_or_else(|_| "./data".into());
    let config = GridConfig::from_env()?;

    info!("slotgrid loading {date}");
    info!("  data_dir: {data_dir}");
    info!(
        "  axis: {}-{}h, {} min slots",
        config.axis.start_hour, config.axis.end_hour, config.axis.slot_minutes
    );
    info!("  overlap policy: {:?}", config.overlap_policy);

    let provider = JsonDirProvider::new(&data_dir);
    let scheduler = Scheduler::load(&provider, date, config).await?;

    let grid = scheduler.grid();
    for (resource, a, b) in grid.settle_violations() {
        tracing::warn!("resource {resource}: {a:?} overlaps {b:?}");
    }
    println!("{}", serde_json::to_string_pretty(grid)?);
    Ok(())
}
