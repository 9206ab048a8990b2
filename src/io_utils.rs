//! CSV reading and writing shared by the tabular sources and the report sink.
//!
//! - **Input**: delimiter resolution by extension (`.tsv` → tab), BOM sniffing
//!   and optional transcoding through `encoding_rs_io`, ragged rows allowed.
//! - **Output**: UTF-8 CSV with `QuoteStyle::Always` and an optional BOM so
//!   spreadsheet applications pick the right encoding on open.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::Encoding;
use encoding_rs_io::DecodeReaderBytesBuilder;

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub fn resolve_encoding(label: Option<&str>) -> Result<Option<&'static Encoding>> {
    label
        .map(|value| {
            Encoding::for_label(value.trim().as_bytes())
                .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
        })
        .transpose()
}

pub fn resolve_input_delimiter(path: &Path) -> u8 {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    }
}

/// Opens a header-less CSV reader. Without an explicit encoding the input is
/// treated as UTF-8 unless a BOM says otherwise.
pub fn open_csv_reader(
    path: &Path,
    encoding: Option<&'static Encoding>,
) -> Result<csv::Reader<Box<dyn Read>>> {
    let file = File::open(path).with_context(|| format!("Opening input file {path:?}"))?;
    let decoded = DecodeReaderBytesBuilder::new()
        .encoding(encoding)
        .bom_sniffing(true)
        .build(BufReader::new(file));
    let reader: Box<dyn Read> = Box::new(decoded);
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .delimiter(resolve_input_delimiter(path))
        .double_quote(true)
        .flexible(true);
    Ok(builder.from_reader(reader))
}

pub fn open_csv_writer(path: &Path, with_bom: bool) -> Result<csv::Writer<Box<dyn Write>>> {
    let mut file = BufWriter::new(
        File::create(path).with_context(|| format!("Creating output file {path:?}"))?,
    );
    if with_bom {
        file.write_all(UTF8_BOM)
            .with_context(|| format!("Writing byte order mark to {path:?}"))?;
    }
    let writer: Box<dyn Write> = Box::new(file);
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(DEFAULT_CSV_DELIMITER)
        .quote_style(QuoteStyle::Always)
        .double_quote(true)
        .flexible(false);
    Ok(builder.from_writer(writer))
}
