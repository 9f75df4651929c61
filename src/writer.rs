//! Delimited interchange output.
//!
//! One document becomes exactly two rows: the header row of grammar tokens
//! and the data row of encoded values. The same quoting rules drive the
//! inner encoding pass that [`crate::compound`] applies to nested
//! sub-records.
use crate::converter::Options;
use crate::error::Result;
use std::io::Write;

/// Header token of the attachment column, always the final column.
pub const SPECIAL_DOCUMENT: &str = "special_document";

/// Write the header row and the data row with the configured delimiter and
/// enclosure. Fields are quoted only when they contain the delimiter, the
/// enclosure, or a line break.
pub fn write_row<W: Write>(
    headers: &[String],
    values: &[String],
    options: &Options,
    writer: W,
) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(options.delimiter_byte()?)
        .quote(options.enclosure_byte()?)
        .from_writer(writer);
    writer.write_record(headers)?;
    writer.write_record(values)?;
    writer.flush()?;
    Ok(())
}

/// Encode one sub-record as a single delimited line, without a terminator.
/// This is the inner encoding pass applied to compound values before they
/// are placed into an outer cell.
pub(crate) fn encode_record<S: AsRef<[u8]>>(values: &[S], options: &Options) -> Result<String> {
    let mut buf = Vec::new();
    {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(options.delimiter_byte()?)
            .quote(options.enclosure_byte()?)
            .from_writer(&mut buf);
        writer.write_record(values)?;
        writer.flush()?;
    }
    let mut line = String::from_utf8_lossy(&buf).into_owned();
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(line)
}
