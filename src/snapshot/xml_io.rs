//! XML reader and writer
//!
//! ```xml
//! <?xml version="1.0" encoding="utf-8"?>
//! <records>
//!   <record id="1">
//!     <name first="Ann" last="Lee"/>
//!     <dateOfBirth>01/05/1990</dateOfBirth>
//!     <weight>60</weight>
//!     <account>1000.00</account>
//!     <letter>A</letter>
//!   </record>
//! </records>
//! ```
//!
//! Every value is read as text so a bad field fails only its own record.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use super::errors::{ImportRowError, SnapshotResult};
use super::{ImportReport, Snapshot};
use crate::record::{self, Record, RecordFields};

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

#[derive(Debug, Default, Serialize, Deserialize)]
struct XmlRecords {
    #[serde(rename = "record", default)]
    records: Vec<XmlRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct XmlRecord {
    #[serde(rename = "@id", default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<XmlName>,
    #[serde(rename = "dateOfBirth", default)]
    date_of_birth: Option<String>,
    #[serde(default)]
    weight: Option<String>,
    #[serde(default)]
    account: Option<String>,
    #[serde(default)]
    letter: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct XmlName {
    #[serde(rename = "@first", default)]
    first: Option<String>,
    #[serde(rename = "@last", default)]
    last: Option<String>,
}

impl From<&Record> for XmlRecord {
    fn from(r: &Record) -> Self {
        Self {
            id: Some(r.id.to_string()),
            name: Some(XmlName {
                first: Some(r.first_name.clone()),
                last: Some(r.last_name.clone()),
            }),
            date_of_birth: Some(record::format_date(r.date_of_birth)),
            weight: Some(r.weight.to_string()),
            account: Some(r.account.to_string()),
            letter: Some(r.letter.to_string()),
        }
    }
}

pub(super) fn write_records<W: Write>(records: &[Record], mut writer: W) -> SnapshotResult<()> {
    let document = XmlRecords {
        records: records.iter().map(XmlRecord::from).collect(),
    };

    let mut body = String::new();
    let mut serializer = quick_xml::se::Serializer::with_root(&mut body, Some("records"))?;
    serializer.indent(' ', 2);
    document.serialize(serializer)?;

    writeln!(writer, "{}", XML_DECLARATION)?;
    writeln!(writer, "{}", body)?;
    writer.flush()?;
    Ok(())
}

pub(super) fn read_records<R: Read>(mut reader: R) -> SnapshotResult<ImportReport> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;

    let document: XmlRecords = quick_xml::de::from_str(&text)?;

    let mut records = Vec::new();
    let mut errors = Vec::new();

    for (index, element) in document.records.iter().enumerate() {
        match convert(index + 1, element) {
            Ok(record) => records.push(record),
            Err(e) => errors.push(e),
        }
    }

    Ok(ImportReport {
        snapshot: Snapshot::new(records),
        errors,
    })
}

fn convert(row: usize, element: &XmlRecord) -> Result<Record, ImportRowError> {
    let raw_id = element.id.clone().unwrap_or_default();

    let field = |name: &'static str, value: Option<&String>| -> Result<String, ImportRowError> {
        value.cloned().ok_or_else(|| ImportRowError::MissingField {
            row,
            raw_id: raw_id.clone(),
            field: name,
        })
    };
    let name = element.name.as_ref();
    let id_text = field("id", element.id.as_ref())?;
    let first = field("first_name", name.and_then(|n| n.first.as_ref()))?;
    let last = field("last_name", name.and_then(|n| n.last.as_ref()))?;
    let date = field("date_of_birth", element.date_of_birth.as_ref())?;
    let weight = field("weight", element.weight.as_ref())?;
    let account = field("account", element.account.as_ref())?;
    let letter = field("letter", element.letter.as_ref())?;

    let invalid = |name: &'static str| {
        let raw_id = raw_id.clone();
        move |source| ImportRowError::InvalidField {
            row,
            raw_id,
            field: name,
            source,
        }
    };

    let id = record::parse_id(&id_text).map_err(invalid("id"))?;
    let fields = RecordFields::new(
        record::parse_name(&first).map_err(invalid("first_name"))?,
        record::parse_name(&last).map_err(invalid("last_name"))?,
        record::parse_date(&date).map_err(invalid("date_of_birth"))?,
        record::parse_weight(&weight).map_err(invalid("weight"))?,
        record::parse_account(&account).map_err(invalid("account"))?,
        record::parse_letter(&letter).map_err(invalid("letter"))?,
    );

    Ok(fields.with_id(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_shape() {
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
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with(XML_DECLARATION));
        assert!(text.contains(r#"<record id="1">"#));
        assert!(text.contains(r#"<name first="Ann" last="Lee"/>"#));
        assert!(text.contains("<dateOfBirth>01/05/1990</dateOfBirth>"));
        assert!(text.contains("<account>1000.00</account>"));
    }

    #[test]
    fn test_read_reports_bad_and_missing_fields() {
        let doc = r#"<?xml version="1.0" encoding="utf-8"?>
<records>
  <record id="1">
    <name first="Ann" last="Lee"/>
    <dateOfBirth>01/05/1990</dateOfBirth>
    <weight>60</weight>
    <account>1000.00</account>
    <letter>A</letter>
  </record>
  <record id="2">
    <name first="Bob" last="Lee"/>
    <dateOfBirth>03/03/1985</dateOfBirth>
    <weight>heavy</weight>
    <account>500</account>
    <letter>B</letter>
  </record>
  <record id="3">
    <name first="Cid" last="Moe"/>
    <dateOfBirth>03/03/1980</dateOfBirth>
    <weight>70</weight>
    <account>500</account>
  </record>
</records>"#;

        let report = read_records(doc.as_bytes()).unwrap();
        assert_eq!(report.snapshot.len(), 1);
        assert_eq!(report.snapshot.records()[0].first_name, "Ann");

        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.errors[0].row(), 2);
        assert_eq!(report.errors[0].field(), Some("weight"));
        assert!(matches!(
            report.errors[1],
            ImportRowError::MissingField { field: "letter", .. }
        ));
    }

    #[test]
    fn test_empty_document() {
        let report = read_records("<records/>".as_bytes()).unwrap();
        assert!(report.snapshot.is_empty());
        assert!(report.is_clean());
    }

    #[test]
    fn test_malformed_document_is_error() {
        assert!(read_records("<records><record id=\"1\">".as_bytes()).is_err());
    }
}
