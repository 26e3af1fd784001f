//! HTML rendering of the dashboard page.

use handlebars::Handlebars;
use serde::Serialize;

use crate::config::TrackedTable;
use crate::error::{DashboardError, Result};
use crate::reader::SheetRead;

const DASHBOARD_TEMPLATE: &str = include_str!("./static/dashboard.hbs");

/// A rendered cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellView {
    pub text: String,
    /// Render `text` as a hyperlink to itself.
    pub link: bool,
}

/// One tracked table as shown on the page.
#[derive(Debug, Clone, Serialize)]
pub struct TableView {
    pub index: usize,
    pub title: String,
    pub icon: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellView>>,
    pub row_count: usize,
    pub warning: Option<String>,
    pub collect_email: bool,
    pub acknowledgment: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub title: String,
    pub filter: String,
    pub tables: Vec<TableView>,
}

fn is_web_link(text: &str) -> bool {
    text.starts_with("http://") || text.starts_with("https://")
}

impl TableView {
    /// Build the view of `table` from a fresh read, applying `filter`.
    pub fn new(index: usize, table: &TrackedTable, read: &SheetRead, filter: &str) -> Self {
        let records = read.table.filtered(filter);

        let link_cols: Vec<bool> = records
            .columns()
            .iter()
            .map(|c| table.link_columns.iter().any(|l| l == c))
            .collect();

        let rows: Vec<Vec<CellView>> = records
            .rows()
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&link_cols)
                    .map(|(cell, &link_col)| {
                        let text = cell.to_string();
                        CellView {
                            link: link_col && is_web_link(&text),
                            text,
                        }
                    })
                    .collect()
            })
            .collect();

        Self {
            index,
            title: table.title.clone(),
            icon: table.icon.clone(),
            columns: records.columns().to_vec(),
            row_count: rows.len(),
            rows,
            warning: read.warning.clone(),
            collect_email: table.collect_email,
            acknowledgment: None,
        }
    }
}

/// Compiled page templates.
pub struct DashboardPage {
    registry: Handlebars<'static>,
}

impl DashboardPage {
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        registry
            .register_template_string("dashboard", DASHBOARD_TEMPLATE)
            .map_err(|e| DashboardError::Template(e.to_string()))?;
        Ok(Self { registry })
    }

    pub fn render(&self, view: &PageView) -> Result<String> {
        self.registry
            .render("dashboard", view)
            .map_err(|e| DashboardError::Template(e.to_string()))
    }
}
