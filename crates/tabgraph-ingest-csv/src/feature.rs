//! Feature columns.
//!
//! A feature column is either one value per row (`Int`, `Float`, `Bool`) or a
//! fixed-width numeric vector per row (`IntRows`, `FloatRows`, stored
//! row-major). Whether a CSV column becomes 1-D or 2-D is decided once, at
//! parse time.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tabgraph_schema::{DataError, Result};

/// Column name -> feature column. Ordered so artifacts and logs are stable.
pub type FeatureMap = BTreeMap<String, Feature>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Feature {
    Int(Vec<i64>),
    Float(Vec<f64>),
    Bool(Vec<bool>),
    IntRows { width: usize, data: Vec<i64> },
    FloatRows { width: usize, data: Vec<f64> },
}

impl Feature {
    /// Build a 2-D float column from per-row vectors; rows must share a width.
    pub fn float_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let (width, data) = flatten_rows("<float rows>", rows)?;
        Ok(Feature::FloatRows { width, data })
    }

    /// Build a 2-D integer column from per-row vectors; rows must share a width.
    pub fn int_rows(rows: Vec<Vec<i64>>) -> Result<Self> {
        let (width, data) = flatten_rows("<int rows>", rows)?;
        Ok(Feature::IntRows { width, data })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        match self {
            Feature::Int(v) => v.len(),
            Feature::Float(v) => v.len(),
            Feature::Bool(v) => v.len(),
            Feature::IntRows { width, data } => rows_of(*width, data.len()),
            Feature::FloatRows { width, data } => rows_of(*width, data.len()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Values per row: 1 for scalar columns.
    pub fn width(&self) -> usize {
        match self {
            Feature::Int(_) | Feature::Float(_) | Feature::Bool(_) => 1,
            Feature::IntRows { width, .. } | Feature::FloatRows { width, .. } => *width,
        }
    }

    pub fn is_matrix(&self) -> bool {
        matches!(self, Feature::IntRows { .. } | Feature::FloatRows { .. })
    }

    /// Select rows by index, in the order given. Indices must be in range.
    pub fn gather(&self, indices: &[usize]) -> Feature {
        match self {
            Feature::Int(v) => Feature::Int(indices.iter().map(|&i| v[i]).collect()),
            Feature::Float(v) => Feature::Float(indices.iter().map(|&i| v[i]).collect()),
            Feature::Bool(v) => Feature::Bool(indices.iter().map(|&i| v[i]).collect()),
            Feature::IntRows { width, data } => Feature::IntRows {
                width: *width,
                data: gather_rows(*width, data, indices),
            },
            Feature::FloatRows { width, data } => Feature::FloatRows {
                width: *width,
                data: gather_rows(*width, data, indices),
            },
        }
    }

    /// Stack columns row-wise.
    ///
    /// Parts must share a width. Integer and float parts mix, widening the
    /// result to float. Returns `None` for an empty input or when the parts
    /// disagree otherwise.
    pub fn concat(parts: &[Feature]) -> Option<Feature> {
        let (first, rest) = parts.split_first()?;
        rest.iter().try_fold(first.clone(), append)
    }

    pub fn as_int(&self) -> Option<&[i64]> {
        match self {
            Feature::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<&[f64]> {
        match self {
            Feature::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<&[bool]> {
        match self {
            Feature::Bool(v) => Some(v),
            _ => None,
        }
    }

    /// Row `i` of a 2-D float column.
    pub fn float_row(&self, i: usize) -> Option<&[f64]> {
        match self {
            Feature::FloatRows { width, data } => data.get(i * width..(i + 1) * width),
            _ => None,
        }
    }

    /// Row `i` of a 2-D integer column.
    pub fn int_row(&self, i: usize) -> Option<&[i64]> {
        match self {
            Feature::IntRows { width, data } => data.get(i * width..(i + 1) * width),
            _ => None,
        }
    }
}

impl From<Vec<i64>> for Feature {
    fn from(v: Vec<i64>) -> Self {
        Feature::Int(v)
    }
}

impl From<Vec<f64>> for Feature {
    fn from(v: Vec<f64>) -> Self {
        Feature::Float(v)
    }
}

impl From<Vec<bool>> for Feature {
    fn from(v: Vec<bool>) -> Self {
        Feature::Bool(v)
    }
}

fn rows_of(width: usize, len: usize) -> usize {
    if width == 0 {
        0
    } else {
        len / width
    }
}

fn gather_rows<T: Copy>(width: usize, data: &[T], indices: &[usize]) -> Vec<T> {
    let mut out = Vec::with_capacity(indices.len() * width);
    for &i in indices {
        out.extend_from_slice(&data[i * width..(i + 1) * width]);
    }
    out
}

pub(crate) fn flatten_rows<T>(column: &str, rows: Vec<Vec<T>>) -> Result<(usize, Vec<T>)> {
    let width = rows.first().map(Vec::len).unwrap_or(0);
    if !rows.is_empty() && width == 0 {
        return Err(DataError::parse(column, "empty vector cell"));
    }
    let mut data = Vec::with_capacity(rows.len() * width);
    for (row, values) in rows.into_iter().enumerate() {
        if values.len() != width {
            return Err(DataError::parse(
                column,
                format!(
                    "ragged vector cells: row {row} has {} values, expected {width}",
                    values.len()
                ),
            ));
        }
        data.extend(values);
    }
    Ok((width, data))
}

fn append(acc: Feature, part: &Feature) -> Option<Feature> {
    let widen = |v: &[i64]| v.iter().map(|&x| x as f64).collect::<Vec<f64>>();
    let out = match (acc, part) {
        (Feature::Int(mut a), Feature::Int(b)) => {
            a.extend_from_slice(b);
            Feature::Int(a)
        }
        (Feature::Float(mut a), Feature::Float(b)) => {
            a.extend_from_slice(b);
            Feature::Float(a)
        }
        (Feature::Int(a), Feature::Float(b)) => {
            let mut a = widen(&a);
            a.extend_from_slice(b);
            Feature::Float(a)
        }
        (Feature::Float(mut a), Feature::Int(b)) => {
            a.extend(widen(b));
            Feature::Float(a)
        }
        (Feature::Bool(mut a), Feature::Bool(b)) => {
            a.extend_from_slice(b);
            Feature::Bool(a)
        }
        (Feature::IntRows { width, mut data }, Feature::IntRows { width: w, data: d })
            if width == *w =>
        {
            data.extend_from_slice(d);
            Feature::IntRows { width, data }
        }
        (Feature::FloatRows { width, mut data }, Feature::FloatRows { width: w, data: d })
            if width == *w =>
        {
            data.extend_from_slice(d);
            Feature::FloatRows { width, data }
        }
        (Feature::IntRows { width, data }, Feature::FloatRows { width: w, data: d })
            if width == *w =>
        {
            let mut data = widen(&data);
            data.extend_from_slice(d);
            Feature::FloatRows { width, data }
        }
        (Feature::FloatRows { width, mut data }, Feature::IntRows { width: w, data: d })
            if width == *w =>
        {
            data.extend(widen(d));
            Feature::FloatRows { width, data }
        }
        _ => return None,
    };
    Some(out)
}
