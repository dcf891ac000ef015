//! CSV export of the full pitch table, unresolved rows included.

use csv::Writer;
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::error::Result;
use crate::models::PitchTable;

/// Write `table` as CSV. Columns are the fixed identity/coordinate columns,
/// then every tag key seen in any row (sorted), then the region column.
pub fn write_csv<W: Write>(table: &PitchTable, region_name: &str, out: W) -> Result<()> {
    let mut writer = Writer::from_writer(out);
    let keys: Vec<&str> = table.field_keys().into_iter().collect();
    let region_column = format!("In {}", region_name);

    let mut header = vec!["OSM ID", "Type", "Latitude", "Longitude"];
    header.extend(keys.iter().copied());
    header.push(&region_column);
    writer.write_record(&header)?;

    for row in &table.rows {
        let mut record: Vec<String> = Vec::with_capacity(header.len());
        record.push(row.osm_id.to_string());
        record.push(row.osm_type.to_string());
        record.push(row.lat().map(|v| v.to_string()).unwrap_or_default());
        record.push(row.lon().map(|v| v.to_string()).unwrap_or_default());
        for key in &keys {
            record.push(row.field(key).unwrap_or_default().to_string());
        }
        record.push(row.region.yes_no().to_string());
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn save_csv(table: &PitchTable, region_name: &str, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_csv(table, region_name, file)?;
    info!("Wrote {} rows to {}", table.len(), path.display());
    Ok(())
}
