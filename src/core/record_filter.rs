use crate::core::table::{load_table, write_table, Table};
use crate::core::{DiscrepancyRecord, FilterReport, Storage, TransactionRecord};
use crate::utils::error::Result;

pub const TXN_REF_ID: &str = "txn_ref_id";
pub const AMOUNT: &str = "sys_a_amount_attribute_1";
pub const DATE: &str = "sys_a_date";
pub const RECON_STATUS: &str = "recon_status";

/// Exact status that marks a discrepancy. Matched case-sensitively.
pub const NOT_FOUND_STATUS: &str = "Not Found";

pub const DISCREPANCY_COLUMNS: [&str; 3] = ["Order ID", "Amount", "Date"];

/// 從交易表篩選出未配對 (Not Found) 的紀錄
pub struct RecordFilter<S: Storage> {
    storage: S,
}

impl<S: Storage> RecordFilter<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub async fn filter_transactions(&self, input_path: &str, output_key: &str) -> Result<FilterReport> {
        tracing::info!("🔎 Preprocessing transactions from {}", input_path);

        let table = load_table(input_path, &[TXN_REF_ID, AMOUNT, DATE, RECON_STATUS])?;
        let records = transaction_records(&table);
        let rows_read = records.len();
        let rows_incomplete = records.iter().filter(|r| !r.is_complete()).count();

        let discrepancies = select_discrepancies(&records);
        tracing::debug!(
            "Dropped {} incomplete rows, kept {} discrepancies",
            rows_incomplete,
            discrepancies.len()
        );

        let data = write_table(&DISCREPANCY_COLUMNS, &discrepancies)?;
        self.storage.write_file(output_key, &data).await?;

        let output_path = self.storage.location(output_key);
        tracing::info!("📤 Exported {} discrepancies to {}", discrepancies.len(), output_path);

        Ok(FilterReport {
            output_path,
            rows_read,
            rows_incomplete,
            discrepancies: discrepancies.len(),
        })
    }
}

pub fn transaction_records(table: &Table) -> Vec<TransactionRecord> {
    let txn_ref_id = table.column(TXN_REF_ID);
    let amount = table.column(AMOUNT);
    let date = table.column(DATE);
    let status = table.column(RECON_STATUS);

    (0..table.len())
        .map(|row| TransactionRecord {
            txn_ref_id: table.cell(row, txn_ref_id).map(str::to_string),
            amount: table.cell(row, amount).map(str::to_string),
            date: table.cell(row, date).map(str::to_string),
            recon_status: table.cell(row, status).map(str::to_string),
        })
        .collect()
}

/// Drops incomplete rows, keeps exact "Not Found" rows and projects them,
/// preserving input order.
pub fn select_discrepancies(records: &[TransactionRecord]) -> Vec<DiscrepancyRecord> {
    records
        .iter()
        .filter(|r| r.is_complete())
        .filter(|r| r.recon_status.as_deref() == Some(NOT_FOUND_STATUS))
        .filter_map(|r| {
            Some(DiscrepancyRecord {
                order_id: r.txn_ref_id.clone()?,
                amount: r.amount.clone()?,
                date: r.date.clone()?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::table::TextEncoding;
    use crate::utils::error::ReconError;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn get_text(&self, path: &str) -> Option<String> {
            let files = self.files.lock().await;
            files.get(path).map(|d| String::from_utf8_lossy(d).to_string())
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| ReconError::StorageError {
                message: format!("File not found: {}", path),
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }

        fn location(&self, path: &str) -> String {
            format!("mem://{}", path)
        }
    }

    fn record(id: Option<&str>, status: Option<&str>) -> TransactionRecord {
        TransactionRecord {
            txn_ref_id: id.map(str::to_string),
            amount: Some("10.00".to_string()),
            date: Some("2024-03-01".to_string()),
            recon_status: status.map(str::to_string),
        }
    }

    #[test]
    fn test_status_match_is_exact() {
        let records = vec![
            record(Some("A"), Some("Not Found")),
            record(Some("B"), Some("not found")),
            record(Some("C"), Some("Not Found ")),
            record(Some("D"), Some("Matched")),
            record(Some("E"), Some("Not Found - pending")),
        ];

        let selected = select_discrepancies(&records);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].order_id, "A");
    }

    #[test]
    fn test_incomplete_rows_never_selected() {
        let mut missing_amount = record(Some("B"), Some("Not Found"));
        missing_amount.amount = None;

        let records = vec![
            record(None, Some("Not Found")),
            missing_amount,
            record(Some("C"), None),
            record(Some("D"), Some("Not Found")),
        ];

        let selected = select_discrepancies(&records);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].order_id, "D");
    }

    #[test]
    fn test_records_from_reordered_columns() {
        let table = Table::parse(
            "mem.csv",
            "recon_status,sys_a_date,extra,sys_a_amount_attribute_1,txn_ref_id\n\
             Not Found,2024-01-02,x,99.5,T-9\n",
            TextEncoding::Utf8,
        )
        .unwrap();

        let records = transaction_records(&table);
        let selected = select_discrepancies(&records);
        assert_eq!(
            selected,
            vec![DiscrepancyRecord {
                order_id: "T-9".to_string(),
                amount: "99.5".to_string(),
                date: "2024-01-02".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_filter_writes_projected_table() {
        let mut input = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut input,
            b"sys_a_date,txn_ref_id,recon_status,sys_a_amount_attribute_1,other\n\
              2024-01-01,T1,Not Found,100.50,a\n\
              2024-01-02,T2,Matched,20,b\n\
              ,T3,Not Found,30,c\n",
        )
        .unwrap();

        let storage = MockStorage::new();
        let filter = RecordFilter::new(storage.clone());
        let report = filter
            .filter_transactions(input.path().to_str().unwrap(), "discrepancies/discrepancies.csv")
            .await
            .unwrap();

        assert_eq!(report.rows_read, 3);
        assert_eq!(report.rows_incomplete, 1);
        assert_eq!(report.discrepancies, 1);
        assert_eq!(report.output_path, "mem://discrepancies/discrepancies.csv");

        let text = storage.get_text("discrepancies/discrepancies.csv").await.unwrap();
        assert_eq!(text, "Order ID,Amount,Date\nT1,100.50,2024-01-01\n");
    }

    #[tokio::test]
    async fn test_filter_with_no_matches_writes_header_only() {
        let mut input = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut input,
            b"txn_ref_id,sys_a_amount_attribute_1,sys_a_date,recon_status\nT1,1,2024-01-01,Matched\n",
        )
        .unwrap();

        let storage = MockStorage::new();
        let filter = RecordFilter::new(storage.clone());
        let report = filter
            .filter_transactions(input.path().to_str().unwrap(), "out.csv")
            .await
            .unwrap();

        assert_eq!(report.discrepancies, 0);
        assert_eq!(
            storage.get_text("out.csv").await.unwrap(),
            "Order ID,Amount,Date\n"
        );
    }

    #[tokio::test]
    async fn test_filter_missing_column_is_schema_error() {
        let mut input = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut input, b"txn_ref_id,recon_status\nT1,Not Found\n").unwrap();

        let filter = RecordFilter::new(MockStorage::new());
        let result = filter
            .filter_transactions(input.path().to_str().unwrap(), "out.csv")
            .await;

        assert!(matches!(result, Err(ReconError::SchemaError { .. })));
    }
}
