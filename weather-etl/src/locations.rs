use std::{fs::File, io::Read, path::Path};

use csv::{ReaderBuilder, Trim};

use crate::{
    error::{EtlError, Result},
    model::Location,
};

const REQUIRED_COLUMNS: [&str; 3] = ["city", "lat", "lon"];

/// Read every location from a CSV file with at least `city`, `lat` and `lon` columns.
///
/// Fails on the first bad row; there is no partial result.
pub fn load_locations(path: &Path) -> Result<Vec<Location>> {
    let file = File::open(path).map_err(|source| EtlError::LocationsUnavailable {
        path: path.to_path_buf(),
        source,
    })?;

    let locations = read_locations(file)?;
    tracing::info!(path = %path.display(), count = locations.len(), "loaded locations");
    Ok(locations)
}

pub fn read_locations<R: Read>(reader: R) -> Result<Vec<Location>> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);

    let headers = reader.headers()?;
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .collect();
    if !missing.is_empty() {
        return Err(EtlError::LocationsMalformed(format!(
            "missing column(s): {}",
            missing.join(", ")
        )));
    }

    let locations = reader
        .deserialize::<Location>()
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(locations)
}
