use std::collections::BTreeSet;
use std::fmt;

/// Column holding the category label used for filtering and grouping.
pub const CATEGORY_COLUMN: &str = "category_name";

/// Raw numeric category id, present in the upstream exports.
pub const CATEGORY_ID_COLUMN: &str = "categoryId";

/// Columns coerced to numbers before any chart computation.
pub const NUMERIC_COLUMNS: [&str; 5] = [
    "view_count",
    "likes",
    "dislikes",
    "comment_count",
    "like_ratio",
];

// ---------------------------------------------------------------------------
// CellValue – a single cell of the table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring common dataframe dtypes.
/// Cells are typed once at load time; numeric coercion happens per request.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v:?}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Coerce to a finite `f64`. Text is parsed after trimming; anything
    /// that does not yield a finite number is missing.
    pub fn to_numeric(&self) -> Option<f64> {
        let v = match self {
            CellValue::Integer(i) => *i as f64,
            CellValue::Float(v) => *v,
            CellValue::String(s) => s.trim().parse::<f64>().ok()?,
            CellValue::Bool(_) | CellValue::Null => return None,
        };
        v.is_finite().then_some(v)
    }

    /// String form used for category labels; `None` for Null.
    pub fn as_label(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            other => Some(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Column typing
// ---------------------------------------------------------------------------

/// Storage type chosen for a whole column from its raw text.
///
/// A column is numeric or boolean only when every non-empty cell fits, so
/// a text column keeps each label exactly as written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float,
    Bool,
    Text,
}

fn parse_finite(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

impl ColumnType {
    /// Narrowest type every non-empty cell parses as.
    pub fn infer<S: AsRef<str>>(raw: &[S]) -> Self {
        let present = || {
            raw.iter()
                .map(<S as AsRef<str>>::as_ref)
                .filter(|s| !s.is_empty())
        };
        if present().all(|s| s.parse::<i64>().is_ok()) {
            ColumnType::Integer
        } else if present().all(|s| parse_finite(s).is_some()) {
            ColumnType::Float
        } else if present().all(|s| s == "true" || s == "false") {
            ColumnType::Bool
        } else {
            ColumnType::Text
        }
    }

    /// Convert one raw cell; empty text is Null.
    pub fn cell(self, s: &str) -> CellValue {
        if s.is_empty() {
            return CellValue::Null;
        }
        let typed = match self {
            ColumnType::Integer => s.parse().ok().map(CellValue::Integer),
            ColumnType::Float => parse_finite(s).map(CellValue::Float),
            ColumnType::Bool => Some(CellValue::Bool(s == "true")),
            ColumnType::Text => None,
        };
        typed.unwrap_or_else(|| CellValue::String(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Column / Dataset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<CellValue>,
}

/// The full loaded table, stored column-wise.
///
/// Built once at startup and shared read-only between requests.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<Column>,
    n_rows: usize,
}

impl Dataset {
    /// Zero rows, zero columns. Substituted when loading fails.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a dataset from a header and row-major raw text records, typing
    /// each column as a whole.
    ///
    /// Every record must have exactly `headers.len()` cells.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let n_rows = rows.len();
        let mut raw: Vec<Vec<String>> = headers
            .iter()
            .map(|_| Vec::with_capacity(n_rows))
            .collect();
        for row in rows {
            for (col, cell) in raw.iter_mut().zip(row) {
                col.push(cell);
            }
        }

        let columns = headers
            .into_iter()
            .zip(raw)
            .map(|(name, raw)| {
                let kind = ColumnType::infer(&raw);
                Column {
                    name,
                    values: raw.iter().map(|s| kind.cell(s)).collect(),
                }
            })
            .collect();

        Dataset { columns, n_rows }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.n_rows
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Derive `category_name` from `categoryId` when only the latter exists.
    /// Returns whether a column was added.
    pub fn derive_category_name(&mut self) -> bool {
        if self.has_column(CATEGORY_COLUMN) {
            return false;
        }
        let Some(ids) = self.column(CATEGORY_ID_COLUMN) else {
            return false;
        };
        let values = ids
            .values
            .iter()
            .map(|v| match v.as_label() {
                Some(label) => CellValue::String(label),
                None => CellValue::Null,
            })
            .collect();
        self.columns.push(Column {
            name: CATEGORY_COLUMN.to_string(),
            values,
        });
        true
    }

    /// Sorted distinct non-null category labels.
    pub fn categories(&self) -> Vec<String> {
        let Some(col) = self.column(CATEGORY_COLUMN) else {
            return Vec::new();
        };
        col.values
            .iter()
            .filter_map(CellValue::as_label)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
