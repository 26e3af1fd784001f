use crate::backend::SpreadsheetBackend;
use crate::error::{DashboardError, Result};
use crate::table::RecordTable;

/// Outcome of reading a worksheet for display.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SheetRead {
    pub table: RecordTable,
    /// Message to show the viewer when the worksheet could not be found.
    pub warning: Option<String>,
}

/// Read every record of `sheet_name` into a [`RecordTable`].
///
/// A missing worksheet is not an error: the result holds an empty table and
/// a warning for the page. Any other backend failure is returned as-is.
///
/// # Errors
///
/// * `DashboardError::InvalidInput` if `sheet_name` is empty
/// * whatever the backend reports for lookup or read failures
pub async fn read_table(backend: &dyn SpreadsheetBackend, sheet_name: &str) -> Result<SheetRead> {
    if sheet_name.is_empty() {
        return Err(DashboardError::InvalidInput(
            "worksheet name cannot be empty".to_string(),
        ));
    }

    let Some(worksheet) = backend.find_worksheet(sheet_name).await? else {
        log::warn!("Worksheet '{}' not found", sheet_name);
        return Ok(SheetRead {
            table: RecordTable::empty(),
            warning: Some(format!("Worksheet '{}' not found.", sheet_name)),
        });
    };

    let values = backend.get_all_values(&worksheet).await?;
    let table = RecordTable::from_values(values);
    log::debug!("Read {} records from '{}'", table.len(), sheet_name);

    Ok(SheetRead {
        table,
        warning: None,
    })
}
