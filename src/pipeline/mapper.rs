//! Bin index -> continuous estimate lookup
//!
//! Bin indices reach the mapper as integers (binned rows), text (decoded
//! predictions) or floats (tables that went through a float column). All are
//! reduced to one canonical text form and matched exactly against the table
//! keys `"0" .. "N-1"`: `"7"` matches bin 7, `"07"`, `" 7"` and `"7.5"` do not.

use std::borrow::Cow;

use polars::prelude::*;

use super::error::PipelineResult;
use super::missing::require_column;
use super::quantizer::{BinTable, BIN_COLUMN, MEAN_VALUE_COLUMN};

/// A bin index in whatever representation the producing stage used
#[derive(Debug, Clone, PartialEq)]
pub enum BinKey {
    Index(i64),
    Text(String),
    Float(f64),
    Missing,
}

impl BinKey {
    /// Canonical text form; `None` for a missing key.
    ///
    /// Floats print in Rust's shortest form, so `3.0` becomes `"3"`.
    pub fn canonical(&self) -> Option<Cow<'_, str>> {
        match self {
            BinKey::Index(i) => Some(Cow::Owned(i.to_string())),
            BinKey::Text(s) => Some(Cow::Borrowed(s.as_str())),
            BinKey::Float(f) if f.is_finite() => Some(Cow::Owned(format!("{}", f))),
            BinKey::Float(_) | BinKey::Missing => None,
        }
    }

    /// The table bin this key names, if any.
    pub fn resolve(&self, table: &BinTable) -> Option<usize> {
        let text = self.canonical()?;
        let bin: usize = text.parse().ok()?;
        // Only the exact decimal spelling of the key matches
        if bin.to_string() != text {
            return None;
        }
        table.contains(bin).then_some(bin)
    }
}

impl From<i64> for BinKey {
    fn from(value: i64) -> Self {
        BinKey::Index(value)
    }
}

impl From<usize> for BinKey {
    fn from(value: usize) -> Self {
        BinKey::Index(value as i64)
    }
}

impl From<&str> for BinKey {
    fn from(value: &str) -> Self {
        BinKey::Text(value.to_string())
    }
}

impl From<String> for BinKey {
    fn from(value: String) -> Self {
        BinKey::Text(value)
    }
}

impl<T: Into<BinKey>> From<Option<T>> for BinKey {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(BinKey::Missing)
    }
}

/// Result of mapping a sequence of keys through a bin table
#[derive(Debug, Clone, PartialEq)]
pub struct Mapping {
    /// Estimate per input position; `None` for unmatched positions
    pub estimates: Vec<Option<f64>>,
    /// Positions whose key is not a table bin
    pub unmatched: Vec<usize>,
}

impl Mapping {
    pub fn len(&self) -> usize {
        self.estimates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.estimates.is_empty()
    }

    pub fn matched_count(&self) -> usize {
        self.estimates.len() - self.unmatched.len()
    }

    pub fn is_fully_matched(&self) -> bool {
        self.unmatched.is_empty()
    }
}

/// Look every key up in the table.
pub fn apply(keys: &[BinKey], table: &BinTable) -> Mapping {
    let mut estimates = Vec::with_capacity(keys.len());
    let mut unmatched = Vec::new();

    for (row, key) in keys.iter().enumerate() {
        match key.resolve(table) {
            Some(bin) => estimates.push(table.get(bin)),
            None => {
                unmatched.push(row);
                estimates.push(None);
            }
        }
    }

    Mapping {
        estimates,
        unmatched,
    }
}

/// Read a column of bin indices as keys, keeping its representation.
pub fn keys_from_column(col: &Column) -> PipelineResult<Vec<BinKey>> {
    let dtype = col.dtype();

    let keys = if dtype.is_integer() {
        col.cast(&DataType::Int64)?
            .i64()?
            .into_iter()
            .map(BinKey::from)
            .collect()
    } else if dtype.is_float() {
        col.cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|v| v.map(BinKey::Float).unwrap_or(BinKey::Missing))
            .collect()
    } else if matches!(dtype, DataType::String) {
        col.str()?.into_iter().map(BinKey::from).collect()
    } else {
        col.cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(BinKey::from)
            .collect()
    };

    Ok(keys)
}

/// Attach `mean_value` to binned rows by looking up their `bins` column.
///
/// Rows whose bin is missing or unknown get a null `mean_value` and are
/// listed in the returned mapping.
pub fn map_binned_rows(df: &DataFrame, table: &BinTable) -> PipelineResult<(DataFrame, Mapping)> {
    let keys = keys_from_column(require_column(df, BIN_COLUMN)?)?;
    let mapping = apply(&keys, table);

    if !mapping.is_fully_matched() {
        log::warn!(
            "{} binned row(s) did not match a bin: {:?}",
            mapping.unmatched.len(),
            mapping.unmatched
        );
    }

    let mut mapped = df.clone();
    mapped.with_column(Column::new(
        MEAN_VALUE_COLUMN.into(),
        mapping.estimates.clone(),
    ))?;

    Ok((mapped, mapping))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> BinTable {
        BinTable::from_bin_means(&[Some(10.0), Some(20.0), None, Some(40.0)])
    }

    #[test]
    fn test_integer_and_text_keys_match_the_same_bin() {
        let t = table();
        assert_eq!(BinKey::from(1i64).resolve(&t), Some(1));
        assert_eq!(BinKey::from("1").resolve(&t), Some(1));
        assert_eq!(BinKey::Float(1.0).resolve(&t), Some(1));
    }

    #[test]
    fn test_non_canonical_text_does_not_match() {
        let t = table();
        for key in ["01", " 1", "1 ", "+1", "1.0", "", "bin 1"] {
            assert_eq!(BinKey::from(key).resolve(&t), None, "key {:?}", key);
        }
        assert_eq!(BinKey::Float(1.5).resolve(&t), None);
        assert_eq!(BinKey::Float(f64::NAN).resolve(&t), None);
    }

    #[test]
    fn test_out_of_range_and_negative_keys() {
        let t = table();
        assert_eq!(BinKey::from(4i64).resolve(&t), None);
        assert_eq!(BinKey::from(-1i64).resolve(&t), None);
        assert_eq!(BinKey::from("-1").resolve(&t), None);
        assert_eq!(BinKey::Missing.resolve(&t), None);
    }

    #[test]
    fn test_apply_reports_unmatched_positions() {
        let keys: Vec<BinKey> = vec!["0".into(), "9".into(), "".into(), 3i64.into()];
        let mapping = apply(&keys, &table());

        assert_eq!(mapping.estimates, vec![Some(10.0), None, None, Some(40.0)]);
        assert_eq!(mapping.unmatched, vec![1, 2]);
        assert_eq!(mapping.matched_count(), 2);
    }

    #[test]
    fn test_forward_filled_bin_is_matched() {
        // bin 2 was empty at build time and carries bin 1's value
        let mapping = apply(&[BinKey::from(2i64)], &table());
        assert_eq!(mapping.estimates, vec![Some(20.0)]);
        assert!(mapping.is_fully_matched());
    }

    #[test]
    fn test_gap_bin_is_matched_but_undefined() {
        let gap_table = BinTable::from_bin_means(&[None, Some(5.0)]);
        let mapping = apply(&[BinKey::from(0i64)], &gap_table);
        assert!(mapping.is_fully_matched());
        assert_eq!(mapping.estimates, vec![None]);
    }

    #[test]
    fn test_keys_from_columns_of_each_type() {
        let ints = Column::new("bins".into(), [Some(1i64), None]);
        assert_eq!(
            keys_from_column(&ints).unwrap(),
            vec![BinKey::Index(1), BinKey::Missing]
        );

        let text = Column::new("predict".into(), [Some("07"), None]);
        assert_eq!(
            keys_from_column(&text).unwrap(),
            vec![BinKey::Text("07".to_string()), BinKey::Missing]
        );

        let floats = Column::new("bins".into(), [2.0f64]);
        assert_eq!(keys_from_column(&floats).unwrap(), vec![BinKey::Float(2.0)]);
    }

    #[test]
    fn test_map_binned_rows_attaches_mean_value() {
        let df = df! {
            "Yield" => [11.0f64, 19.0, 42.0],
            "bins" => [Some(0i64), Some(1), None],
        }
        .unwrap();

        let (mapped, mapping) = map_binned_rows(&df, &table()).unwrap();
        let means: Vec<Option<f64>> = mapped
            .column("mean_value")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(means, vec![Some(10.0), Some(20.0), None]);
        assert_eq!(mapping.unmatched, vec![2]);
    }
}
