/*!
# Sheetboard

A browser dashboard over a Google spreadsheet, with a feedback form per table.

## Overview

A fixed list of worksheets ("tracked tables") is read from one spreadsheet and
shown as HTML tables on a single page. Below every table sits a small form;
submitted feedback is appended as a row to a dedicated feedback worksheet,
which is created with a header row the first time someone submits.

## Architecture

### Backend Layer
- **SpreadsheetBackend** - the four remote operations the dashboard needs
  (lookup, read all values, append row, add worksheet)
- **SheetsClient** - Google Sheets API v4 implementation over `reqwest`
- **MemoryBackend** - in-process implementation for tests and demo mode

### Core
- **Sheet Reader** - worksheet rows to a `RecordTable`; a missing worksheet
  gives an empty table and a warning
- **Feedback Writer** - form to `FeedbackEntry`, header-ensuring append;
  blank feedback is ignored

### Web Layer (feature `web`)
- Dashboard page rendered with handlebars, live filter in the browser
- Feedback form handling with redirect-after-post
- JSON table endpoint and health check

## Modules

- **table**: cell values and record tables
- **backend**: backend trait and the in-memory backend
- **sheets_api**: Google Sheets client
- **reader**: worksheet reading
- **feedback**: feedback capture
- **config**: command line and tracked-table configuration
- **render**: page view models and template
- **app**: routing and middleware

## REST API Endpoints

- `GET /` - Dashboard page (`filter`, `submitted` query parameters)
- `POST /feedback/{index}` - Submit feedback for a tracked table
- `GET /api/tables/{index}` - Table records as JSON (`filter` query parameter)
- `GET /health` - Health check
*/

pub mod backend;
pub mod config;
pub mod error;
pub mod feedback;
pub mod reader;
pub mod sheets_api;
pub mod table;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod render;

pub use backend::{MemoryBackend, SpreadsheetBackend, Worksheet};
pub use error::{DashboardError, Result};
pub use feedback::{FeedbackEntry, FeedbackForm, SubmitOutcome, submit_feedback};
pub use reader::{SheetRead, read_table};
pub use table::{CellValue, RecordTable};
