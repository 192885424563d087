use anyhow::Result;
use tempfile::TempDir;

use crate::{
    cli::{create_spinner, DataOpts},
    erddap::{SicDataset, CDR_DAILY_ID, CELL_AREA_ID, CONC_VARIABLE},
    export,
    extent::total_area_km2,
    regions::Region,
};

use super::{clip_to_region, output_path};

/// Reports the total valid ocean area per region in km², from the most
/// recent CDR day. Cells flagged as pole hole, land, lake or coast carry no
/// observation and are excluded.
pub async fn area(opts: &DataOpts) -> Result<String> {
    let work_dir = TempDir::new()?;
    let dataset = SicDataset::new(&opts.server, CDR_DAILY_ID, CONC_VARIABLE);
    let latest = dataset.latest_date(&work_dir).await?;

    let mut rows = Vec::new();
    for region in Region::all() {
        let bbox = region.bounding_box();

        let bar = create_spinner(format!("{}: downloading...", region.name()));
        let mut grid = dataset
            .fetch_range(latest, latest, &bbox, &work_dir)
            .await?;
        let mut areas = dataset
            .fetch_cell_areas(CELL_AREA_ID, &bbox, &work_dir)
            .await?;

        clip_to_region(region, &mut grid, &mut areas)?;
        let total = total_area_km2(&grid.values, &areas.values)?;
        bar.finish_with_message(format!("{}: {:.0} km²", region.name(), total));

        rows.push((region.name().to_string(), total));
    }

    let path = output_path(&opts.data_dir, "region_area.csv");
    export::write_area_csv(&path, &rows)?;

    Ok(path.to_string_lossy().to_string())
}
