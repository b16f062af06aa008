use crate::utils::error::{ReconError, Result};
use serde::Serialize;
use std::path::Path;

/// Cell values treated as missing, following the usual dataframe NA markers.
pub const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Latin1,
}

/// 先以 UTF-8 解碼，失敗時退回 Latin-1
pub fn decode_text(bytes: Vec<u8>) -> (String, TextEncoding) {
    match String::from_utf8(bytes) {
        Ok(text) => {
            let text = match text.strip_prefix('\u{feff}') {
                Some(stripped) => stripped.to_string(),
                None => text,
            };
            (text, TextEncoding::Utf8)
        }
        Err(e) => {
            let text = e.into_bytes().into_iter().map(char::from).collect();
            (text, TextEncoding::Latin1)
        }
    }
}

pub fn is_missing(value: &str) -> bool {
    MISSING_MARKERS.contains(&value)
}

/// Tab for `.tsv` files, comma otherwise.
pub fn delimiter_for(path: &str) -> u8 {
    match Path::new(path).extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
        _ => b',',
    }
}

/// A decoded delimited table with header lookup.
#[derive(Debug, Clone)]
pub struct Table {
    path: String,
    headers: Vec<String>,
    rows: Vec<csv::StringRecord>,
    encoding: TextEncoding,
}

impl Table {
    pub fn parse(path: &str, text: &str, encoding: TextEncoding) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(delimiter_for(path))
            .from_reader(text.as_bytes());

        let table_error = |e: csv::Error| ReconError::TableError {
            path: path.to_string(),
            message: e.to_string(),
        };

        let headers = reader
            .headers()
            .map_err(table_error)?
            .iter()
            .map(|h| h.to_string())
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record.map_err(table_error)?);
        }

        Ok(Self {
            path: path.to_string(),
            headers,
            rows,
            encoding,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// 檢查必要欄位，缺少時回傳 SchemaError
    pub fn require_columns(&self, required: &[&str]) -> Result<()> {
        let missing: Vec<String> = required
            .iter()
            .filter(|name| self.column(name).is_none())
            .map(|name| name.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ReconError::SchemaError {
                path: self.path.clone(),
                missing,
            })
        }
    }

    /// Cell text, or None when the column is absent, the row is short or the
    /// cell holds a missing marker.
    pub fn cell(&self, row: usize, column: Option<usize>) -> Option<&str> {
        let value = self.rows.get(row)?.get(column?)?;
        if is_missing(value) {
            None
        } else {
            Some(value)
        }
    }
}

/// Reads, decodes and parses the table at `path`, then checks its header.
pub fn load_table(path: &str, required_columns: &[&str]) -> Result<Table> {
    let bytes = std::fs::read(Path::new(path)).map_err(|source| ReconError::InputError {
        path: path.to_string(),
        source,
    })?;

    let (text, encoding) = decode_text(bytes);
    if encoding == TextEncoding::Latin1 {
        tracing::warn!("⚠️ {} is not valid UTF-8, decoded as Latin-1", path);
    }

    let table = Table::parse(path, &text, encoding)?;
    table.require_columns(required_columns)?;

    if table.is_empty() {
        tracing::warn!("⚠️ {} has a header but no data rows", path);
    } else {
        tracing::info!("📥 Loaded {} rows from {}", table.len(), path);
    }
    Ok(table)
}

/// 輸出 CSV；即使沒有資料列也會寫入表頭
pub fn write_table<T: Serialize>(header: &[&str], rows: &[T]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(header)?;
    for row in rows {
        writer.serialize(row)?;
    }

    writer.into_inner().map_err(|e| ReconError::StorageError {
        message: format!("Failed to flush CSV buffer: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_decode_utf8_strips_bom() {
        let (text, encoding) = decode_text("\u{feff}a,b\n1,2\n".as_bytes().to_vec());
        assert_eq!(encoding, TextEncoding::Utf8);
        assert_eq!(text, "a,b\n1,2\n");
    }

    #[test]
    fn test_decode_falls_back_to_latin1() {
        // "Café" encoded as Latin-1
        let (text, encoding) = decode_text(vec![b'C', b'a', b'f', 0xE9]);
        assert_eq!(encoding, TextEncoding::Latin1);
        assert_eq!(text, "Café");
    }

    #[test]
    fn test_missing_cells() {
        let table = Table::parse(
            "mem.csv",
            "id,status\n1,NaN\n2\n3,ok\n",
            TextEncoding::Utf8,
        )
        .unwrap();
        let status = table.column("status");

        assert_eq!(table.len(), 3);
        assert_eq!(table.cell(0, status), None);
        assert_eq!(table.cell(1, status), None);
        assert_eq!(table.cell(2, status), Some("ok"));
        assert_eq!(table.cell(2, table.column("absent")), None);
    }

    #[test]
    fn test_spreadsheet_na_markers_are_missing() {
        for marker in ["#NA", "-NaN", "-nan", "#N/A N/A", "1.#IND", "-1.#IND", "1.#QNAN", "-1.#QNAN"] {
            assert!(is_missing(marker), "{marker} should count as missing");
        }
        assert!(!is_missing("0"));
        assert!(!is_missing("Not Found"));
    }

    #[test]
    fn test_tsv_splits_on_tabs() {
        let table = Table::parse(
            "data/recon.TSV",
            "txn_ref_id\trecon_status\nT1\tNot Found\n",
            TextEncoding::Utf8,
        )
        .unwrap();

        assert!(table.require_columns(&["txn_ref_id", "recon_status"]).is_ok());
        assert_eq!(table.cell(0, table.column("recon_status")), Some("Not Found"));
    }

    #[test]
    fn test_load_table_tsv_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("comments.tsv");
        std::fs::write(&path, "Order ID\tComments\n42\tfixed, after resync\n").unwrap();

        let table = load_table(path.to_str().unwrap(), &["Order ID", "Comments"]).unwrap();
        assert_eq!(table.cell(0, table.column("Comments")), Some("fixed, after resync"));
    }

    #[test]
    fn test_require_columns_reports_all_missing() {
        let table = Table::parse("mem.csv", "a\n1\n", TextEncoding::Utf8).unwrap();
        match table.require_columns(&["a", "b", "c"]) {
            Err(ReconError::SchemaError { missing, .. }) => {
                assert_eq!(missing, vec!["b".to_string(), "c".to_string()])
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_load_table_missing_file_is_input_error() {
        let result = load_table("/definitely/not/here.csv", &[]);
        assert!(matches!(result, Err(ReconError::InputError { .. })));
    }

    #[test]
    fn test_load_table_latin1_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"name\nJos\xe9\n").unwrap();

        let table = load_table(file.path().to_str().unwrap(), &["name"]).unwrap();
        assert_eq!(table.encoding(), TextEncoding::Latin1);
        assert_eq!(table.cell(0, table.column("name")), Some("José"));
    }

    #[test]
    fn test_write_table_empty_keeps_header() {
        #[derive(Serialize)]
        struct Row {
            a: String,
        }
        let bytes = write_table::<Row>(&["a"], &[]).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "a\n");
    }
}
