//! CSV persistence of the canonical dataset.

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::DatasetError;

use super::DatasetRow;

/// Canonical column order.
pub const HEADER: [&str; 9] = [
    "INVOICE",
    "DATE",
    "VEHICLE",
    "DESCRIPTION",
    "QUANTITY",
    "UNIT_COST",
    "TOTAL",
    "SUPPLIER",
    "OWNER",
];

/// Read the dataset at `path`. A missing file is an empty dataset.
pub fn read_dataset(path: &Path) -> Result<Vec<DatasetRow>, DatasetError> {
    if !path.exists() {
        debug!("No dataset at {}, starting empty", path.display());
        return Ok(Vec::new());
    }
    let rows = read_rows(BufReader::new(File::open(path)?))?;
    debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Read dataset rows from CSV.
///
/// Fails on a header that differs from [`HEADER`] or on any row that does
/// not fit the schema; no partial result is returned.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<DatasetRow>, DatasetError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.is_empty() {
        return Ok(Vec::new());
    }
    if !headers.iter().eq(HEADER.iter().copied()) {
        return Err(DatasetError::Header {
            expected: HEADER.join(","),
            found: headers.iter().collect::<Vec<_>>().join(","),
        });
    }

    let mut rows = Vec::new();
    for result in rdr.deserialize::<DatasetRow>() {
        let row = result.map_err(|e| DatasetError::Malformed {
            line: e.position().map_or(0, |p| p.line()),
            reason: e.to_string(),
        })?;
        rows.push(row);
    }
    Ok(rows)
}

/// Write dataset rows as CSV, header first.
pub fn write_rows<W: Write>(writer: W, rows: &[DatasetRow]) -> Result<(), DatasetError> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(HEADER)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Replace the dataset at `path` as a whole.
///
/// Rows go to a temporary file in the same directory which is then renamed
/// over `path`, so readers see either the old or the new dataset.
pub fn write_dataset(path: &Path, rows: &[DatasetRow]) -> Result<(), DatasetError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    write_rows(&mut tmp, rows)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| DatasetError::Io(e.error))?;

    info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn sample() -> Vec<DatasetRow> {
        vec![
            DatasetRow {
                invoice: "1023".into(),
                date: "05/04/2024".into(),
                vehicle: "KCA 123A".into(),
                description: "Oil filter, synthetic".into(),
                quantity: Decimal::from(2),
                unit_cost: Decimal::from(200),
                total: Decimal::from(400),
                supplier: "TYREMART".into(),
                owner: "FIRESIDE".into(),
            },
            DatasetRow {
                invoice: "C-9".into(),
                date: "".into(),
                vehicle: "".into(),
                description: "Labour".into(),
                quantity: Decimal::ONE,
                unit_cost: Decimal::from_str("33.33").unwrap(),
                total: Decimal::from_str("33.33").unwrap(),
                supplier: "CMC MOTORS".into(),
                owner: "FIRESIDE".into(),
            },
        ]
    }

    #[test]
    fn test_csv_round_trip() {
        let mut buf = Vec::new();
        write_rows(&mut buf, &sample()).unwrap();

        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with("INVOICE,DATE,VEHICLE,DESCRIPTION,QUANTITY,UNIT_COST,TOTAL,SUPPLIER,OWNER\n"));
        assert!(text.contains("1023,05/04/2024,KCA 123A,\"Oil filter, synthetic\",2,200,400,TYREMART,FIRESIDE"));

        assert_eq!(read_rows(buf.as_slice()).unwrap(), sample());
    }

    #[test]
    fn test_blank_numbers_read_as_zero() {
        let csv = "INVOICE,DATE,VEHICLE,DESCRIPTION,QUANTITY,UNIT_COST,TOTAL,SUPPLIER,OWNER\n\
                   1,,,Tyre,,,,TYREMART,FIRESIDE\n";
        let rows = read_rows(csv.as_bytes()).unwrap();
        assert_eq!(rows[0].total, Decimal::ZERO);
        assert_eq!(rows[0].quantity, Decimal::ZERO);
    }

    #[test]
    fn test_wrong_header_fails() {
        let csv = "INVOICE,DESCRIPTION,DATE\n1,Tyre,01/01/2024\n";
        assert!(matches!(read_rows(csv.as_bytes()), Err(DatasetError::Header { .. })));
    }

    #[test]
    fn test_malformed_row_fails() {
        let csv = "INVOICE,DATE,VEHICLE,DESCRIPTION,QUANTITY,UNIT_COST,TOTAL,SUPPLIER,OWNER\n\
                   1,01/01/2024,KCA 123A,Tyre,1,100,100,TYREMART,FIRESIDE\n\
                   2,01/01/2024,KCA 123A,Tyre,one,100,100,TYREMART,FIRESIDE\n";
        match read_rows(csv.as_bytes()) {
            Err(DatasetError::Malformed { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected malformed row, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_dataset(&dir.path().join("none.csv")).unwrap().is_empty());
    }

    #[test]
    fn test_write_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("master_data.csv");

        write_dataset(&path, &sample()).unwrap();
        write_dataset(&path, &sample()[..1]).unwrap();

        assert_eq!(read_dataset(&path).unwrap(), sample()[..1].to_vec());
        let leftovers = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
