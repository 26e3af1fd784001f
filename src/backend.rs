//! The remote tabular store the dashboard reads from and appends to.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::config::TrackedTable;
use crate::error::{DashboardError, Result};
use crate::table::CellValue;

/// Handle to a worksheet that exists in the backing spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worksheet {
    /// Backend-assigned sheet id.
    pub id: i64,
    /// Tab title, which is also how the dashboard addresses the worksheet.
    pub title: String,
}

/// Operations the dashboard needs from a spreadsheet, keyed by worksheet name.
///
/// Implementations do not retry; every failure is returned to the caller.
#[async_trait]
pub trait SpreadsheetBackend: Send + Sync {
    /// Look up a worksheet by its exact title.
    async fn find_worksheet(&self, title: &str) -> Result<Option<Worksheet>>;

    /// Every populated row of the worksheet, header included.
    async fn get_all_values(&self, worksheet: &Worksheet) -> Result<Vec<Vec<CellValue>>>;

    /// Append one row after the last populated row.
    async fn append_row(&self, worksheet: &Worksheet, row: &[CellValue]) -> Result<()>;

    /// Create an empty worksheet with the given grid size.
    async fn add_worksheet(&self, title: &str, rows: u32, cols: u32) -> Result<Worksheet>;
}

struct MemorySheet {
    worksheet: Worksheet,
    grid: (u32, u32),
    values: Vec<Vec<CellValue>>,
}

/// A spreadsheet held entirely in process memory.
///
/// Used by the test suite and by the server's demo mode.
#[derive(Default)]
pub struct MemoryBackend {
    sheets: Mutex<Vec<MemorySheet>>,
    failing: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a worksheet with the given rows (header first).
    pub fn with_worksheet(self, title: &str, values: Vec<Vec<CellValue>>) -> Self {
        {
            let mut sheets = self.sheets.lock().unwrap_or_else(PoisonError::into_inner);
            let id = sheets.len() as i64;
            let cols = values.iter().map(Vec::len).max().unwrap_or(0) as u32;
            sheets.push(MemorySheet {
                worksheet: Worksheet {
                    id,
                    title: title.to_string(),
                },
                grid: (values.len().max(1000) as u32, cols.max(26)),
                values,
            });
        }
        self
    }

    /// A backend with a few sample records in every data worksheet of `tables`.
    pub fn demo(tables: &[TrackedTable]) -> Self {
        tables.iter().fold(Self::new(), |backend, table| {
            let slug: String = table
                .data_sheet
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
                .to_lowercase();
            let rows = (1..=3)
                .map(|n| {
                    vec![
                        CellValue::from(format!("{} project {}", table.title, n)),
                        CellValue::Int(2022 + n),
                        CellValue::from(format!("https://example.org/{}/{}", slug, n)),
                    ]
                })
                .collect::<Vec<_>>();

            let mut values = vec![vec![
                CellValue::from("Project"),
                CellValue::from("Jaar"),
                CellValue::from(crate::config::DEFAULT_LINK_COLUMN),
            ]];
            values.extend(rows);
            backend.with_worksheet(&table.data_sheet, values)
        })
    }

    /// Make every subsequent call fail as if the remote service were unavailable.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Titles of all worksheets, in creation order.
    pub fn worksheet_titles(&self) -> Vec<String> {
        self.sheets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|s| s.worksheet.title.clone())
            .collect()
    }

    /// Snapshot of a worksheet's rows, or `None` if it does not exist.
    pub fn values(&self, title: &str) -> Option<Vec<Vec<CellValue>>> {
        self.sheets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|s| s.worksheet.title == title)
            .map(|s| s.values.clone())
    }

    /// Grid size a worksheet was created with.
    pub fn grid_size(&self, title: &str) -> Option<(u32, u32)> {
        self.sheets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|s| s.worksheet.title == title)
            .map(|s| s.grid)
    }

    fn check_available(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DashboardError::Api {
                status: 503,
                message: "The service is currently unavailable.".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SpreadsheetBackend for MemoryBackend {
    async fn find_worksheet(&self, title: &str) -> Result<Option<Worksheet>> {
        self.check_available()?;
        let sheets = self.sheets.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(sheets
            .iter()
            .find(|s| s.worksheet.title == title)
            .map(|s| s.worksheet.clone()))
    }

    async fn get_all_values(&self, worksheet: &Worksheet) -> Result<Vec<Vec<CellValue>>> {
        self.check_available()?;
        let sheets = self.sheets.lock().unwrap_or_else(PoisonError::into_inner);
        sheets
            .iter()
            .find(|s| s.worksheet.id == worksheet.id)
            .map(|s| s.values.clone())
            .ok_or_else(|| DashboardError::Api {
                status: 400,
                message: format!("Unable to parse range: '{}'", worksheet.title),
            })
    }

    async fn append_row(&self, worksheet: &Worksheet, row: &[CellValue]) -> Result<()> {
        self.check_available()?;
        let mut sheets = self.sheets.lock().unwrap_or_else(PoisonError::into_inner);
        let sheet = sheets
            .iter_mut()
            .find(|s| s.worksheet.id == worksheet.id)
            .ok_or_else(|| DashboardError::Api {
                status: 400,
                message: format!("Unable to parse range: '{}'", worksheet.title),
            })?;
        sheet.values.push(row.to_vec());
        Ok(())
    }

    async fn add_worksheet(&self, title: &str, rows: u32, cols: u32) -> Result<Worksheet> {
        self.check_available()?;
        let mut sheets = self.sheets.lock().unwrap_or_else(PoisonError::into_inner);
        if sheets.iter().any(|s| s.worksheet.title == title) {
            return Err(DashboardError::WorksheetExists {
                name: title.to_string(),
            });
        }

        let worksheet = Worksheet {
            id: sheets.iter().map(|s| s.worksheet.id).max().map_or(0, |m| m + 1),
            title: title.to_string(),
        };
        sheets.push(MemorySheet {
            worksheet: worksheet.clone(),
            grid: (rows, cols),
            values: Vec::new(),
        });
        Ok(worksheet)
    }
}
