use rust_xlsxwriter::{Format, Workbook};
use serde_json::{Map, Value};

use crate::domain::StudyMetadata;
use crate::error::MetasheetError;
use crate::format::{CellValue, format_value};
use crate::sheets::SheetNameConfig;

/// Width applied to every written column.
pub const COLUMN_WIDTH: f64 = 26.0;

const INTEGER_FORMAT: &str = "0";
const DECIMAL_FORMAT: &str = "0.00";

/// Columns promoted to the leading slots of every sheet, in order of
/// precedence.
const LEADING_COLUMNS: [&str; 2] = ["alias", "accession"];

/// Converts a metadata document into a multi-sheet workbook.
///
/// One sheet per non-empty content property. The column set of a sheet is the
/// union of the keys of all rows in first-seen order, with `alias` and
/// `accession` promoted to the front when present.
#[derive(Debug, Clone)]
pub struct Transpiler {
    config: SheetNameConfig,
}

impl Transpiler {
    pub fn new(config: SheetNameConfig) -> Self {
        Self { config }
    }

    pub fn transpile(&self, metadata: &StudyMetadata) -> Result<Workbook, MetasheetError> {
        let mut workbook = Workbook::new();
        let bold = Format::new().set_bold();
        let integer = Format::new().set_num_format(INTEGER_FORMAT);
        let decimal = Format::new().set_num_format(DECIMAL_FORMAT);

        for (property, value) in &metadata.content {
            let rows = property_rows(property, value)?;
            if rows.is_empty() {
                continue;
            }
            let columns = column_order(&rows);
            let sheet_name = self.config.translate(property)?;

            let sheet = workbook.add_worksheet();
            sheet.set_name(sheet_name.as_str())?;
            for (index, column) in columns.iter().enumerate() {
                let col = index as u16;
                sheet.set_column_width(col, COLUMN_WIDTH)?;
                sheet.write_string_with_format(0, col, column.as_str(), &bold)?;
            }

            for (row_index, row) in rows.iter().enumerate() {
                let row_num = row_index as u32 + 1;
                for (index, column) in columns.iter().enumerate() {
                    let col = index as u16;
                    let Some(raw) = row.get(column) else {
                        continue;
                    };
                    match format_value(raw) {
                        CellValue::Empty => {}
                        CellValue::Bool(flag) => {
                            sheet.write_boolean(row_num, col, flag)?;
                        }
                        CellValue::Int(int) => {
                            // number cells are IEEE doubles; magnitudes beyond
                            // 2^53 lose precision in the file format itself
                            sheet.write_number_with_format(row_num, col, int as f64, &integer)?;
                        }
                        CellValue::Float(float) => {
                            sheet.write_number_with_format(row_num, col, float, &decimal)?;
                        }
                        CellValue::Text(text) => {
                            sheet.write_string(row_num, col, text)?;
                        }
                    }
                }
            }
        }

        Ok(workbook)
    }

    /// Transpile and serialize to XLSX bytes in one step.
    pub fn transpile_to_bytes(&self, metadata: &StudyMetadata) -> Result<Vec<u8>, MetasheetError> {
        let mut workbook = self.transpile(metadata)?;
        Ok(workbook.save_to_buffer()?)
    }
}

fn property_rows<'a>(
    property: &str,
    value: &'a Value,
) -> Result<Vec<&'a Map<String, Value>>, MetasheetError> {
    let Value::Array(items) = value else {
        return Err(MetasheetError::MalformedContent {
            property: property.to_string(),
            reason: "expected an array of rows".to_string(),
        });
    };
    items
        .iter()
        .map(|item| {
            item.as_object().ok_or_else(|| MetasheetError::MalformedContent {
                property: property.to_string(),
                reason: "expected every row to be an object".to_string(),
            })
        })
        .collect()
}

fn column_order(rows: &[&Map<String, Value>]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.iter().any(|column| column == key) {
                columns.push(key.clone());
            }
        }
    }

    let mut slot = 0;
    for special in LEADING_COLUMNS {
        if let Some(position) = columns.iter().position(|column| column == special) {
            let column = columns.remove(position);
            columns.insert(slot, column);
            slot += 1;
        }
    }
    columns
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn rows_from(value: &Value) -> Vec<&Map<String, Value>> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|row| row.as_object().unwrap())
            .collect()
    }

    #[test]
    fn column_union_keeps_first_seen_order() {
        let rows = json!([
            {"col1": 1, "col3": 3},
            {"col2": 2, "col1": 1},
        ]);
        assert_eq!(column_order(&rows_from(&rows)), ["col1", "col3", "col2"]);
    }

    #[test]
    fn alias_then_accession_lead() {
        let rows = json!([{"col1": 1, "accession": "a", "alias": "b"}]);
        assert_eq!(
            column_order(&rows_from(&rows)),
            ["alias", "accession", "col1"]
        );
    }

    #[test]
    fn accession_leads_when_alias_absent() {
        let rows = json!([{"col1": 1, "accession": "a"}]);
        assert_eq!(column_order(&rows_from(&rows)), ["accession", "col1"]);
    }
}
