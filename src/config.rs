//! Command line, environment and tracked-table configuration.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::error::{DashboardError, Result};
use crate::sheets_api::DEFAULT_API_BASE;

/// Column rendered as a hyperlink when a table config does not say otherwise.
pub const DEFAULT_LINK_COLUMN: &str = "URL:";

/// One worksheet shown on the dashboard together with its feedback form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedTable {
    /// Worksheet holding the records to display.
    pub data_sheet: String,

    /// Worksheet that receives feedback about this table.
    pub feedback_sheet: String,

    /// Heading shown above the table.
    pub title: String,

    /// Optional emoji or short label shown before the title.
    #[serde(default)]
    pub icon: String,

    /// Whether the feedback form asks for an email address.
    #[serde(default)]
    pub collect_email: bool,

    /// Columns whose values are rendered as hyperlinks.
    #[serde(default = "default_link_columns")]
    pub link_columns: Vec<String>,
}

fn default_link_columns() -> Vec<String> {
    vec![DEFAULT_LINK_COLUMN.to_string()]
}

impl TrackedTable {
    pub fn new(data_sheet: &str, feedback_sheet: &str, title: &str) -> Self {
        Self {
            data_sheet: data_sheet.to_string(),
            feedback_sheet: feedback_sheet.to_string(),
            title: title.to_string(),
            icon: String::new(),
            collect_email: false,
            link_columns: default_link_columns(),
        }
    }

    pub fn with_icon(mut self, icon: &str) -> Self {
        self.icon = icon.to_string();
        self
    }

    pub fn collecting_email(mut self, collect_email: bool) -> Self {
        self.collect_email = collect_email;
        self
    }
}

/// The built-in set of tracked worksheets.
pub fn default_tables() -> Vec<TrackedTable> {
    vec![
        TrackedTable::new("Gebouwdeomgeving", "Feedback_Gebouwdeomgeving", "Gebouwde omgeving")
            .with_icon("🏠")
            .collecting_email(true),
        TrackedTable::new("Mobiliteit", "Feedback_Mobiliteit", "Mobiliteit")
            .with_icon("🚗")
            .collecting_email(true),
        TrackedTable::new("Bedrijventerrein", "Feedback_Bedrijventerrein", "Bedrijventerrein")
            .with_icon("🚗")
            .collecting_email(true),
        TrackedTable::new("Cluster 6", "Feedback_Cluster6", "Cluster 6")
            .with_icon("🚗")
            .collecting_email(true),
        TrackedTable::new("Andere", "Feedback_Andere", "Andere")
            .with_icon("🚗")
            .collecting_email(true),
    ]
}

/// Load a tracked-table list from a JSON file.
pub fn load_tables(path: impl AsRef<Path>) -> Result<Vec<TrackedTable>> {
    let path = path.as_ref();
    let data = fs::read_to_string(path)?;
    let tables: Vec<TrackedTable> = serde_json::from_str(&data)?;
    log::info!("Loaded {} tracked tables from {}", tables.len(), path.display());
    Ok(tables)
}

/// Check that a tracked-table list can be served.
///
/// # Errors
/// * the list is empty
/// * a sheet name or title is blank
/// * two tables share a feedback worksheet
/// * a feedback worksheet is also a data worksheet
pub fn validate_tables(tables: &[TrackedTable]) -> Result<()> {
    if tables.is_empty() {
        return Err(DashboardError::Config("no tables configured".to_string()));
    }

    let data_sheets: HashSet<&str> = tables.iter().map(|t| t.data_sheet.as_str()).collect();
    let mut feedback_sheets = HashSet::new();

    for table in tables {
        if table.data_sheet.trim().is_empty()
            || table.feedback_sheet.trim().is_empty()
            || table.title.trim().is_empty()
        {
            return Err(DashboardError::Config(format!(
                "table '{}' has a blank sheet name or title",
                table.title
            )));
        }
        if !feedback_sheets.insert(table.feedback_sheet.as_str()) {
            return Err(DashboardError::Config(format!(
                "feedback worksheet '{}' is used more than once",
                table.feedback_sheet
            )));
        }
        if data_sheets.contains(table.feedback_sheet.as_str()) {
            return Err(DashboardError::Config(format!(
                "feedback worksheet '{}' is also a data worksheet",
                table.feedback_sheet
            )));
        }
    }

    Ok(())
}

/// Command line arguments. Every flag can also come from the environment or a `.env` file.
#[derive(Parser, Debug, Clone)]
#[command(name = "sheetboard", version, about = "Spreadsheet dashboard with feedback forms")]
pub struct Args {
    /// Key of the backing Google spreadsheet
    #[arg(long, env = "SHEETBOARD_SPREADSHEET_ID")]
    pub spreadsheet_id: Option<String>,

    /// Address to listen on
    #[arg(long, env = "SHEETBOARD_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// OAuth access token with the spreadsheets and drive scopes
    #[arg(long, env = "SHEETBOARD_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// File containing the access token
    #[arg(long, env = "SHEETBOARD_TOKEN_FILE", conflicts_with = "access_token")]
    pub token_file: Option<PathBuf>,

    /// JSON file listing the tracked tables
    #[arg(long, env = "SHEETBOARD_TABLES")]
    pub tables: Option<PathBuf>,

    /// Sheets API endpoint
    #[arg(long, env = "SHEETBOARD_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Page heading
    #[arg(long, env = "SHEETBOARD_TITLE", default_value = "Sheetboard")]
    pub title: String,

    /// Directory served under /static
    #[arg(long, env = "SHEETBOARD_STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,

    /// Serve seeded in-memory data instead of a real spreadsheet
    #[arg(long)]
    pub demo: bool,
}

/// Where worksheet data comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendSource {
    Demo,
    Sheets {
        api_base: String,
        spreadsheet_id: String,
        access_token: String,
    },
}

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub title: String,
    pub bind: SocketAddr,
    pub static_dir: PathBuf,
    pub source: BackendSource,
    pub tables: Vec<TrackedTable>,
}

impl DashboardConfig {
    /// Demo-backed configuration for the given tables.
    pub fn with_tables(title: &str, tables: Vec<TrackedTable>) -> Self {
        Self {
            title: title.to_string(),
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            static_dir: PathBuf::from("static"),
            source: BackendSource::Demo,
            tables,
        }
    }

    /// Resolve arguments into a validated configuration.
    ///
    /// Reads the tables file and token file if given.
    pub fn from_args(args: Args) -> Result<Self> {
        let tables = match &args.tables {
            Some(path) => load_tables(path)?,
            None => default_tables(),
        };
        validate_tables(&tables)?;

        let source = if args.demo {
            BackendSource::Demo
        } else {
            let spreadsheet_id = args
                .spreadsheet_id
                .filter(|id| !id.trim().is_empty())
                .ok_or_else(|| DashboardError::Config("a spreadsheet id is required".to_string()))?;

            let access_token = match (args.access_token, &args.token_file) {
                (Some(token), _) => token,
                (None, Some(path)) => fs::read_to_string(path)?,
                (None, None) => String::new(),
            };
            let access_token = access_token.trim().to_string();
            if access_token.is_empty() {
                return Err(DashboardError::Config(
                    "an access token is required unless --demo is set".to_string(),
                ));
            }

            BackendSource::Sheets {
                api_base: args.api_base,
                spreadsheet_id,
                access_token,
            }
        };

        Ok(Self {
            title: args.title,
            bind: args.bind,
            static_dir: args.static_dir,
            source,
            tables,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_default_tables_are_valid() {
        let tables = default_tables();
        assert_eq!(tables.len(), 5);
        assert!(validate_tables(&tables).is_ok());
        assert_eq!(tables[3].feedback_sheet, "Feedback_Cluster6");
        assert!(tables.iter().all(|t| t.collect_email));
    }

    #[test]
    fn test_duplicate_feedback_sheet_is_rejected() {
        let tables = vec![
            TrackedTable::new("A", "Feedback", "A"),
            TrackedTable::new("B", "Feedback", "B"),
        ];
        assert!(matches!(validate_tables(&tables), Err(DashboardError::Config(_))));
    }

    #[test]
    fn test_feedback_sheet_cannot_be_data_sheet() {
        let tables = vec![
            TrackedTable::new("A", "B", "A"),
            TrackedTable::new("B", "Feedback_B", "B"),
        ];
        assert!(validate_tables(&tables).is_err());
    }

    #[test]
    fn test_blank_names_are_rejected() {
        let tables = vec![TrackedTable::new(" ", "Feedback", "A")];
        assert!(validate_tables(&tables).is_err());
        assert!(validate_tables(&[]).is_err());
    }

    #[test]
    fn test_load_tables_applies_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"data_sheet": "Andere", "feedback_sheet": "Feedback_Andere", "title": "Andere"}}]"#
        )
        .unwrap();

        let tables = load_tables(file.path()).unwrap();
        assert_eq!(tables.len(), 1);
        assert!(!tables[0].collect_email);
        assert_eq!(tables[0].link_columns, vec!["URL:".to_string()]);
    }

    #[test]
    fn test_demo_needs_no_credentials() {
        let config = DashboardConfig::from_args(parse(&["sheetboard", "--demo"])).unwrap();
        assert_eq!(config.source, BackendSource::Demo);
        assert_eq!(config.tables.len(), 5);
    }

    #[test]
    fn test_sheets_source_requires_token() {
        let args = parse(&["sheetboard", "--spreadsheet-id", "abc"]);
        // Ignore whatever the environment provides
        let args = Args {
            access_token: None,
            token_file: None,
            ..args
        };
        assert!(matches!(
            DashboardConfig::from_args(args),
            Err(DashboardError::Config(_))
        ));
    }

    #[test]
    fn test_token_file_is_trimmed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ya29.token-value").unwrap();

        let args = Args {
            spreadsheet_id: Some("abc".to_string()),
            access_token: None,
            token_file: Some(file.path().to_path_buf()),
            tables: None,
            demo: false,
            ..parse(&["sheetboard"])
        };
        let config = DashboardConfig::from_args(args).unwrap();
        match config.source {
            BackendSource::Sheets {
                spreadsheet_id,
                access_token,
                ..
            } => {
                assert_eq!(spreadsheet_id, "abc");
                assert_eq!(access_token, "ya29.token-value");
            }
            BackendSource::Demo => panic!("expected sheets source"),
        }
    }
}
