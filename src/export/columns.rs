use crate::error::EfiscenError;
use crate::models::{AGE_CLASS_COUNT, AGE_CLASS_WIDTH};

/// A single cell value headed for an output table.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Int(i64),
    Real(f64),
    Text(String),
}

impl std::fmt::Display for ColumnValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnValue::Int(v) => write!(f, "{v}"),
            ColumnValue::Real(v) => write!(f, "{v}"),
            ColumnValue::Text(v) => write!(f, "{v}"),
        }
    }
}

impl ColumnValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ColumnValue::Int(v) => Some(*v as f64),
            ColumnValue::Real(v) => Some(*v),
            ColumnValue::Text(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ColumnValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// SQLite column type used when creating a table for this value.
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnValue::Int(_) => "INTEGER",
            ColumnValue::Real(_) => "REAL",
            ColumnValue::Text(_) => "TEXT",
        }
    }
}

/// Named value in an ordered row.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub value: ColumnValue,
}

/// Column name of one age-class bucket: `<prefix>_<i*10>_<(i+1)*10>`,
/// or `<prefix>_>150` for the last bucket.
pub fn age_class_column(prefix: &str, index: usize) -> String {
    if index + 1 >= AGE_CLASS_COUNT {
        format!("{prefix}_>{}", (AGE_CLASS_COUNT - 1) * AGE_CLASS_WIDTH)
    } else {
        format!(
            "{prefix}_{}_{}",
            index * AGE_CLASS_WIDTH,
            (index + 1) * AGE_CLASS_WIDTH
        )
    }
}

/// All 16 column names for an age-class prefix, in bucket order.
pub fn age_class_columns(prefix: &str) -> Vec<String> {
    (0..AGE_CLASS_COUNT)
        .map(|i| age_class_column(prefix, i))
        .collect()
}

/// Reject an age-class array that does not have exactly 16 buckets.
pub fn check_age_classes(
    table: &'static str,
    array: &'static str,
    values: &[f64],
) -> Result<(), EfiscenError> {
    if values.len() != AGE_CLASS_COUNT {
        return Err(EfiscenError::AgeClassLength {
            table,
            array,
            len: values.len(),
        });
    }
    Ok(())
}

/// Reassemble an age-class array from named columns.
pub fn read_age_classes(prefix: &str, columns: &[Column]) -> Option<Vec<f64>> {
    age_class_columns(prefix)
        .iter()
        .map(|name| {
            columns
                .iter()
                .find(|c| &c.name == name)
                .and_then(|c| c.value.as_f64())
        })
        .collect()
}

/// Look up a column value by name.
pub fn column<'a>(columns: &'a [Column], name: &str) -> Option<&'a ColumnValue> {
    columns.iter().find(|c| c.name == name).map(|c| &c.value)
}

/// Accumulates an ordered column list.
#[derive(Debug, Default)]
pub struct ColumnsBuilder {
    columns: Vec<Column>,
}

impl ColumnsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn int(mut self, name: &str, value: i64) -> Self {
        self.columns.push(Column {
            name: name.to_string(),
            value: ColumnValue::Int(value),
        });
        self
    }

    pub fn real(mut self, name: &str, value: f64) -> Self {
        self.columns.push(Column {
            name: name.to_string(),
            value: ColumnValue::Real(value),
        });
        self
    }

    /// Append one column per bucket. The array must already be validated.
    pub fn age_classes(mut self, prefix: &str, values: &[f64]) -> Self {
        for (i, v) in values.iter().enumerate() {
            self.columns.push(Column {
                name: age_class_column(prefix, i),
                value: ColumnValue::Real(*v),
            });
        }
        self
    }

    pub fn build(self) -> Vec<Column> {
        self.columns
    }
}
