//! CSV reader and writer
//!
//! One header row, then one row per record:
//! `Id,First Name,Last Name,Date of Birth,Weight,Account,Letter`.

use std::io::{Read, Write};

use super::errors::{ImportRowError, SnapshotError, SnapshotResult};
use super::{ImportReport, Snapshot, CSV_HEADER};
use crate::record::{self, ConversionResult, Record, RecordFields};

pub(super) fn write_records<W: Write>(records: &[Record], writer: W) -> SnapshotResult<()> {
    let mut writer = ::csv::Writer::from_writer(writer);

    writer.write_record(CSV_HEADER)?;

    for r in records {
        writer.write_record([
            r.id.to_string(),
            r.first_name.clone(),
            r.last_name.clone(),
            record::format_date(r.date_of_birth),
            r.weight.to_string(),
            r.account.to_string(),
            r.letter.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

pub(super) fn read_records<R: Read>(reader: R) -> SnapshotResult<ImportReport> {
    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(::csv::Trim::Headers)
        .from_reader(reader);

    let headers = reader.headers()?;
    if headers.iter().ne(CSV_HEADER.iter().copied()) {
        return Err(SnapshotError::UnexpectedHeader(
            headers.iter().collect::<Vec<_>>().join(","),
        ));
    }

    let mut records = Vec::new();
    let mut errors = Vec::new();

    for result in reader.records() {
        let row = result?;
        let line = row.position().map_or(0, |p| p.line() as usize);

        if row.len() != CSV_HEADER.len() {
            errors.push(ImportRowError::ColumnCount {
                row: line,
                expected: CSV_HEADER.len(),
                found: row.len(),
            });
            continue;
        }

        let raw_id = row[0].to_string();
        let field = |name: &'static str, index: usize| RowField {
            row: line,
            raw_id: &raw_id,
            name,
            text: &row[index],
        };

        let converted = (|| {
            let id = field("id", 0).convert(record::parse_id)?;
            let fields = RecordFields::new(
                field("first_name", 1).convert(record::parse_name)?,
                field("last_name", 2).convert(record::parse_name)?,
                field("date_of_birth", 3).convert(record::parse_date)?,
                field("weight", 4).convert(record::parse_weight)?,
                field("account", 5).convert(record::parse_account)?,
                field("letter", 6).convert(record::parse_letter)?,
            );
            Ok::<_, ImportRowError>(fields.with_id(id))
        })();

        match converted {
            Ok(record) => records.push(record),
            Err(e) => errors.push(e),
        }
    }

    Ok(ImportReport {
        snapshot: Snapshot::new(records),
        errors,
    })
}

/// One cell plus the context needed to report it.
struct RowField<'a> {
    row: usize,
    raw_id: &'a str,
    name: &'static str,
    text: &'a str,
}

impl RowField<'_> {
    fn convert<T>(&self, parse: fn(&str) -> ConversionResult<T>) -> Result<T, ImportRowError> {
        parse(self.text).map_err(|source| ImportRowError::InvalidField {
            row: self.row,
            raw_id: self.raw_id.to_string(),
            field: self.name,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "Id,First Name,Last Name,Date of Birth,Weight,Account,Letter\n\
                       1,Ann,Lee,01/05/1990,60,1000.00,A\n\
                       2,Bob,Lee,31/02/1985,80,500.00,B\n\
                       3,Cid,\"Moe, Jr\",03/03/1980,75,12.5,C\n\
                       4,Dan,Kim,03/03/1980\n";

    #[test]
    fn test_read_skips_bad_rows() {
        let report = read_records(DOC.as_bytes()).unwrap();

        let ids: Vec<_> = report.snapshot.records().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(report.snapshot.records()[1].last_name, "Moe, Jr");

        assert_eq!(report.errors.len(), 2);
        match &report.errors[0] {
            ImportRowError::InvalidField { row, raw_id, field, .. } => {
                assert_eq!(*row, 3);
                assert_eq!(raw_id, "2");
                assert_eq!(*field, "date_of_birth");
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(matches!(
            report.errors[1],
            ImportRowError::ColumnCount { expected: 7, found: 4, .. }
        ));
    }

    #[test]
    fn test_wrong_header_rejected() {
        let err = read_records("id;name\n1;Ann\n".as_bytes()).unwrap_err();
        assert!(matches!(err, SnapshotError::UnexpectedHeader(_)));
    }

    #[test]
    fn test_write_format() {
        let record = RecordFields::new(
            "Ann",
            "Lee",
            chrono::NaiveDate::from_ymd_opt(1990, 5, 1).unwrap(),
            60,
            rust_decimal::Decimal::new(100_000, 2),
            'A',
        )
        .with_id(1);

        let mut out = Vec::new();
        write_records(&[record], &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Id,First Name,Last Name,Date of Birth,Weight,Account,Letter\n\
             1,Ann,Lee,01/05/1990,60,1000.00,A\n"
        );
    }
}
