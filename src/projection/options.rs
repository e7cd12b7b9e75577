use serde::{Deserialize, Deserializer};

use crate::error::{IngestionError, IngestionResult};
use crate::types::CellValue;

use super::range::CellRange;

/// Caller-supplied configuration, as the host pipeline passes it (camelCase keys).
///
/// Keys this crate does not interpret are kept in [`PluginOptions::extra`] and forwarded to
/// the projector untouched. Call [`PluginOptions::resolve`] to get the typed
/// [`ProjectionOptions`].
///
/// ```
/// use sheet_nodes::projection::PluginOptions;
///
/// # fn main() -> Result<(), sheet_nodes::IngestionError> {
/// let opts = PluginOptions::from_json_str(r#"{ "rawOutput": false, "defaultValue": "" }"#)?;
/// let resolved = opts.resolve()?;
/// assert_eq!(resolved.raw, Some(false));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginOptions {
    /// Emit typed values (`true`) or display text (`false`).
    #[serde(default)]
    pub raw: Option<bool>,
    /// Legacy alias for `raw`.
    #[serde(default)]
    pub raw_output: Option<bool>,
    /// Value used for empty cells. `null` is a valid explicit value.
    #[serde(default, deserialize_with = "present")]
    pub defval: Option<serde_json::Value>,
    /// Legacy alias for `defval`.
    #[serde(default, deserialize_with = "present")]
    pub default_value: Option<serde_json::Value>,
    /// `"A"` for column-letter keys, or an explicit list of keys.
    #[serde(default)]
    pub header: Option<HeaderOption>,
    /// First row to read (0-based), or an A1 range such as `"A2:C10"`.
    #[serde(default)]
    pub range: Option<RangeOption>,
    /// Keep rows without any value.
    #[serde(default, rename = "blankrows")]
    pub blank_rows: Option<bool>,
    /// `chrono` format used for dates when `raw` is `false`.
    #[serde(default, rename = "dateNF")]
    pub date_format: Option<String>,
    /// Everything else.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Wire form of the `header` option.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum HeaderOption {
    Named(String),
    Keys(Vec<String>),
}

/// Wire form of the `range` option.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RangeOption {
    StartRow(u32),
    Cells(String),
}

/// Keeps an explicit JSON `null` as `Some(Value::Null)`; only a missing key is `None`.
fn present<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

impl PluginOptions {
    /// Parse options from a JSON object.
    pub fn from_json_str(input: &str) -> IngestionResult<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Parse options from an already-parsed JSON value.
    pub fn from_json_value(value: serde_json::Value) -> IngestionResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// `raw` if set, else the legacy `rawOutput`, else unset.
    pub fn effective_raw(&self) -> Option<bool> {
        self.raw.or(self.raw_output)
    }

    /// `defval` if set, else the legacy `defaultValue`, else unset.
    pub fn effective_defval(&self) -> Option<&serde_json::Value> {
        self.defval.as_ref().or(self.default_value.as_ref())
    }

    /// Validate and normalize into [`ProjectionOptions`].
    ///
    /// Errors with [`IngestionError::InvalidOption`] for an unknown header mode, an empty key
    /// list, a malformed range, or a `defval` that is an array or object.
    pub fn resolve(&self) -> IngestionResult<ProjectionOptions> {
        let header = match &self.header {
            None => HeaderMode::FirstRow,
            Some(HeaderOption::Named(name)) if name == "A" => HeaderMode::Letters,
            Some(HeaderOption::Named(name)) => {
                return Err(IngestionError::InvalidOption {
                    option: "header".to_string(),
                    message: format!("expected \"A\" or a list of keys, got \"{name}\""),
                });
            }
            Some(HeaderOption::Keys(keys)) if keys.is_empty() => {
                return Err(IngestionError::InvalidOption {
                    option: "header".to_string(),
                    message: "key list is empty".to_string(),
                });
            }
            Some(HeaderOption::Keys(keys)) => HeaderMode::Keys(keys.clone()),
        };

        let range = match &self.range {
            None => None,
            Some(RangeOption::StartRow(row)) => Some(RowRange::StartRow(*row)),
            Some(RangeOption::Cells(a1)) => Some(RowRange::Cells(a1.parse()?)),
        };

        let defval = self.effective_defval().map(cell_from_json).transpose()?;

        Ok(ProjectionOptions {
            header,
            range,
            raw: self.effective_raw(),
            defval,
            blank_rows: self.blank_rows,
            date_format: self.date_format.clone(),
            extra: self.extra.clone(),
        })
    }
}

fn cell_from_json(value: &serde_json::Value) -> IngestionResult<CellValue> {
    match value {
        serde_json::Value::Null => Ok(CellValue::Empty),
        serde_json::Value::Bool(b) => Ok(CellValue::Bool(*b)),
        serde_json::Value::String(s) => Ok(CellValue::String(s.clone())),
        serde_json::Value::Number(n) => n.as_f64().map(CellValue::Number).ok_or_else(|| {
            IngestionError::InvalidOption {
                option: "defval".to_string(),
                message: format!("number {n} is out of range"),
            }
        }),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
            Err(IngestionError::InvalidOption {
                option: "defval".to_string(),
                message: "expected a string, number, boolean or null".to_string(),
            })
        }
    }
}

/// How record keys are chosen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HeaderMode {
    /// The first row of the range holds the keys (default).
    #[default]
    FirstRow,
    /// Keys are column letters (`A`, `B`, ...); every row is data.
    Letters,
    /// Keys are taken positionally from the list; every row is data.
    Keys(Vec<String>),
}

/// Restriction of the rows/cells a sheet is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowRange {
    /// Start at this absolute (0-based) row; columns are unchanged.
    StartRow(u32),
    /// Read exactly this rectangle (clamped to the used range at the bottom/right).
    Cells(CellRange),
}

/// Resolved options for [`super::project_sheet`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectionOptions {
    pub header: HeaderMode,
    pub range: Option<RowRange>,
    /// `None` means the projector default (`true`).
    pub raw: Option<bool>,
    /// `None` means empty cells are left out of records.
    pub defval: Option<CellValue>,
    /// `None` means the projector default (`false`).
    pub blank_rows: Option<bool>,
    pub date_format: Option<String>,
    /// Options passed through without interpretation.
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ProjectionOptions {
    /// Whether values keep their type.
    pub fn raw_values(&self) -> bool {
        self.raw.unwrap_or(true)
    }

    /// Whether rows without any value are kept.
    pub fn include_blank_rows(&self) -> bool {
        self.blank_rows.unwrap_or(false)
    }
}
