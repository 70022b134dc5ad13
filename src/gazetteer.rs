//! Gazetteer ingest: reference place data for the place index.
//!
//! The supported source is a zip archive containing `DATA/*.csv` files of
//! 34-column gazetteer records (one populated place or other named feature
//! per row, bounding boxes already in planar grid coordinates). Parsing a
//! full archive takes a while, so the filtered region list can be persisted
//! to a compact binary cache and reloaded at startup.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{Result, SummaryError};
use crate::places::NamedRegion;

const FIELD_COUNT: usize = 34;

// Column offsets in a gazetteer record.
const COL_NAME: usize = 2;
const COL_TYPE: usize = 6;
const COL_LOCAL_TYPE: usize = 7;
const COL_MBR_XMIN: usize = 12;
const COL_MBR_YMIN: usize = 13;
const COL_MBR_XMAX: usize = 14;
const COL_MBR_YMAX: usize = 15;
const COL_DISTRICT_BOROUGH: usize = 21;
const COL_COUNTY_UNITARY: usize = 24;

/// Read gazetteer records from one CSV stream, keeping populated places
/// suitable for the place index.
///
/// Kept rows have type `populatedPlace`, a local type other than
/// `Suburban Area`, and a bounding box with positive area. The admin area
/// is the county/unitary authority when present, otherwise the
/// district/borough.
pub fn read_regions<R: Read>(mut reader: R) -> Result<Vec<NamedRegion>> {
    let mut data = Vec::new();
    reader
        .read_to_end(&mut data)
        .map_err(|e| SummaryError::gazetteer(e.to_string()))?;
    // Gazetteer CSV files start with a UTF-8 byte order mark.
    let data = data
        .strip_prefix(&[0xef, 0xbb, 0xbf][..])
        .unwrap_or(&data[..]);

    let mut regions = Vec::new();
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(data);
    for row in csv_reader.records() {
        let record = row.map_err(|e| SummaryError::gazetteer(e.to_string()))?;
        if record.len() != FIELD_COUNT {
            return Err(SummaryError::gazetteer(format!(
                "expected {} fields, got {}",
                FIELD_COUNT,
                record.len()
            )));
        }
        if &record[COL_TYPE] != "populatedPlace" || &record[COL_LOCAL_TYPE] == "Suburban Area" {
            continue;
        }
        let region = NamedRegion {
            name: record[COL_NAME].to_string(),
            kind: record[COL_LOCAL_TYPE].to_string(),
            admin_area: coalesce(&record[COL_COUNTY_UNITARY], &record[COL_DISTRICT_BOROUGH]),
            xmin: parse_coord(&record, COL_MBR_XMIN)?,
            ymin: parse_coord(&record, COL_MBR_YMIN)?,
            xmax: parse_coord(&record, COL_MBR_XMAX)?,
            ymax: parse_coord(&record, COL_MBR_YMAX)?,
        };
        if (region.xmax - region.xmin) * (region.ymax - region.ymin) > 0.0 {
            regions.push(region);
        }
    }
    Ok(regions)
}

/// Load every `DATA/*.csv` member of a gazetteer zip archive.
pub fn load_zip(path: &Path) -> Result<Vec<NamedRegion>> {
    let file = File::open(path)
        .map_err(|e| SummaryError::gazetteer(format!("opening {}: {e}", path.display())))?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| SummaryError::gazetteer(format!("reading {}: {e}", path.display())))?;

    let mut regions = Vec::new();
    for i in 0..archive.len() {
        let entry = archive
            .by_index(i)
            .map_err(|e| SummaryError::gazetteer(e.to_string()))?;
        let name = entry.name().to_string();
        if !(name.starts_with("DATA/") && name.ends_with(".csv")) {
            continue;
        }
        let mut parsed = read_regions(entry)
            .map_err(|e| SummaryError::gazetteer(format!("parsing {name}: {e}")))?;
        regions.append(&mut parsed);
    }
    log::info!(
        "loaded {} place records from {}",
        regions.len(),
        path.display()
    );
    Ok(regions)
}

/// Persist a parsed region list as a binary cache file.
pub fn save_cache(path: &Path, regions: &[NamedRegion]) -> Result<()> {
    let bytes = postcard::to_allocvec(regions)
        .map_err(|e| SummaryError::gazetteer(format!("encoding cache: {e}")))?;
    std::fs::write(path, bytes)
        .map_err(|e| SummaryError::gazetteer(format!("writing {}: {e}", path.display())))
}

/// Load a region list previously written by [`save_cache`].
pub fn load_cache(path: &Path) -> Result<Vec<NamedRegion>> {
    let bytes = std::fs::read(path)
        .map_err(|e| SummaryError::gazetteer(format!("reading {}: {e}", path.display())))?;
    let regions: Vec<NamedRegion> = postcard::from_bytes(&bytes)
        .map_err(|e| SummaryError::gazetteer(format!("decoding {}: {e}", path.display())))?;
    log::info!(
        "loaded {} place records from cache {}",
        regions.len(),
        path.display()
    );
    Ok(regions)
}

fn coalesce(first: &str, second: &str) -> String {
    if !first.is_empty() {
        first.to_string()
    } else {
        second.to_string()
    }
}

fn parse_coord(record: &csv::StringRecord, index: usize) -> Result<f64> {
    let raw = &record[index];
    if raw.is_empty() {
        return Ok(0.0);
    }
    raw.parse::<f64>()
        .map_err(|e| SummaryError::gazetteer(format!("bad coordinate {raw:?}: {e}")))
}
