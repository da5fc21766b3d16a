use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};

use crate::ingest::extract::RowRecord;

fn reader<R: Read>(input: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        // exports routinely carry ragged trailing columns
        .flexible(true)
        .trim(Trim::None)
        .from_reader(input)
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    Ok(BufReader::with_capacity(1 << 20, file))
}

/// Read every data row of a CSV file, keyed by header.
pub fn read_rows(path: &Path) -> Result<Vec<RowRecord>> {
    read_rows_from(open(path)?).with_context(|| format!("reading {}", path.display()))
}

pub fn read_rows_from<R: Read>(input: R) -> Result<Vec<RowRecord>> {
    let mut rdr = reader(input);
    let headers = rdr.headers().context("reading header row")?.clone();

    let mut rows = Vec::new();
    let mut record = StringRecord::new();
    while rdr.read_record(&mut record).context("reading record")? {
        let row: RowRecord = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.to_string(), v.to_string()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

pub fn read_headers(path: &Path) -> Result<Vec<String>> {
    let mut rdr = reader(open(path)?);
    let headers = rdr
        .headers()
        .with_context(|| format!("reading header row of {}", path.display()))?;
    Ok(headers.iter().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_cells_by_header_in_order() {
        let csv = "Style,MSRP,Pattern\nModern,129.99,Floral;Striped\nCasual,45,\n";
        let rows = read_rows_from(csv.as_bytes()).unwrap();

        assert_eq!(rows.len(), 2);
        let columns: Vec<_> = rows[0].keys().map(String::as_str).collect();
        assert_eq!(columns, vec!["Style", "MSRP", "Pattern"]);
        assert_eq!(rows[0]["Pattern"], "Floral;Striped");
        assert_eq!(rows[1]["Pattern"], "");
    }

    #[test]
    fn tolerates_short_rows() {
        let csv = "Style,MSRP\nModern\n";
        let rows = read_rows_from(csv.as_bytes()).unwrap();
        assert_eq!(rows[0].len(), 1);
        assert_eq!(rows[0]["Style"], "Modern");
    }

    #[test]
    fn keeps_quoted_delimiters() {
        let csv = "Rug Copy,Style\n\"Soft, dense pile\",Modern\n";
        let rows = read_rows_from(csv.as_bytes()).unwrap();
        assert_eq!(rows[0]["Rug Copy"], "Soft, dense pile");
    }
}
