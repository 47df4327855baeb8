//! Labelled N-dimensional datasets.
//!
//! A [`Dataset`] is a bag of named [`Variable`]s that share named dimensions,
//! plus the [`Coordinate`]s that label positions along those dimensions. A
//! coordinate whose name equals its dimension is an *index coordinate* and
//! takes part in alignment; others (such as per-station `lat`/`lon`) simply
//! ride along.
//!
//! ```text
//! Dataset
//! ├── coords     valid_time[valid_time]  latitude[latitude]  longitude[longitude]
//! ├── data_vars  t2m[valid_time, latitude, longitude]  r850[...]
//! └── attrs
//! ```
//!
//! Every dimension has exactly one length across the dataset; the `insert_*`
//! methods refuse anything that would break that.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use ndarray::{ArrayD, Axis, IxDyn};

use crate::error::{Error, Result};

/// Canonical name of the time coordinate in cleaned datasets.
pub const VALID_TIME: &str = "valid_time";

/// A single attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Free text, e.g. `units`
    Text(String),
    /// Scalar number, e.g. `scale_factor`
    Number(f64),
    /// Numeric vector, e.g. `valid_range`
    Numbers(Vec<f64>),
}

impl AttrValue {
    /// Text content, if this is a text attribute.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Scalar value, if this is a number (or a one-element vector).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            AttrValue::Numbers(v) if v.len() == 1 => Some(v[0]),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Number(value)
    }
}

/// Attribute table attached to datasets, variables and coordinates.
pub type Attrs = BTreeMap<String, AttrValue>;

/// Values of a one-dimensional coordinate.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordValues {
    /// Timestamps (naive, interpreted in the dataset's time zone)
    Time(Vec<NaiveDateTime>),
    /// Numeric labels such as latitude or pressure level
    Numeric(Vec<f64>),
    /// String labels such as station names
    Labels(Vec<String>),
}

/// Hashable key used to intersect coordinate values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CoordKey {
    Time(NaiveDateTime),
    Numeric(u64),
    Label(String),
}

impl CoordValues {
    /// Number of labels.
    pub fn len(&self) -> usize {
        match self {
            CoordValues::Time(v) => v.len(),
            CoordValues::Numeric(v) => v.len(),
            CoordValues::Labels(v) => v.len(),
        }
    }

    /// True when there are no labels.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True for timestamp coordinates.
    pub fn is_time(&self) -> bool {
        matches!(self, CoordValues::Time(_))
    }

    /// Pick labels by position. Callers check bounds.
    fn take(&self, indices: &[usize]) -> Self {
        match self {
            CoordValues::Time(v) => CoordValues::Time(indices.iter().map(|&i| v[i]).collect()),
            CoordValues::Numeric(v) => {
                CoordValues::Numeric(indices.iter().map(|&i| v[i]).collect())
            }
            CoordValues::Labels(v) => {
                CoordValues::Labels(indices.iter().map(|&i| v[i].clone()).collect())
            }
        }
    }

    fn keys(&self) -> Vec<CoordKey> {
        match self {
            CoordValues::Time(v) => v.iter().copied().map(CoordKey::Time).collect(),
            CoordValues::Numeric(v) => v
                .iter()
                .map(|x| {
                    // +0.0 and -0.0 label the same grid line
                    let x = if *x == 0.0 { 0.0_f64 } else { *x };
                    CoordKey::Numeric(x.to_bits())
                })
                .collect(),
            CoordValues::Labels(v) => v.iter().cloned().map(CoordKey::Label).collect(),
        }
    }
}

/// A coordinate: labels along one dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinate {
    /// Dimension the labels run along
    pub dim: String,
    /// The labels
    pub values: CoordValues,
    /// Attributes (`units`, `long_name`, ...)
    pub attrs: Attrs,
}

impl Coordinate {
    /// Creates a coordinate along `dim`.
    pub fn new(dim: impl Into<String>, values: CoordValues) -> Self {
        Self {
            dim: dim.into(),
            values,
            attrs: Attrs::new(),
        }
    }

    /// Adds an attribute.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when there are no labels.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A data variable: an N-d array with named axes.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    dims: Vec<String>,
    data: ArrayD<f32>,
    /// Attributes (`units`, `GRIB_units`, `long_name`, ...)
    pub attrs: Attrs,
}

impl Variable {
    /// Wraps an array, naming each of its axes.
    pub fn new<S: Into<String>>(dims: Vec<S>, data: ArrayD<f32>) -> Result<Self> {
        let dims: Vec<String> = dims.into_iter().map(Into::into).collect();
        if dims.len() != data.ndim() {
            return Err(Error::shape(format!(
                "{} dimension names for a {}-d array",
                dims.len(),
                data.ndim()
            )));
        }
        let unique: BTreeSet<&String> = dims.iter().collect();
        if unique.len() != dims.len() {
            return Err(Error::shape(format!("repeated dimension in {dims:?}")));
        }
        Ok(Self {
            dims,
            data,
            attrs: Attrs::new(),
        })
    }

    /// Builds a variable from row-major values.
    pub fn from_vec<S: Into<String>>(dims: Vec<S>, shape: &[usize], values: Vec<f32>) -> Result<Self> {
        let data = ArrayD::from_shape_vec(IxDyn(shape), values)
            .map_err(|e| Error::shape(format!("shape {shape:?}: {e}")))?;
        Self::new(dims, data)
    }

    /// Adds an attribute.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Axis names in storage order.
    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    /// The underlying array.
    pub fn data(&self) -> &ArrayD<f32> {
        &self.data
    }

    /// Array shape.
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Position of a named axis.
    pub fn axis_of(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }

    /// The `units` attribute, if textual.
    pub fn units(&self) -> Option<&str> {
        self.attrs.get("units").and_then(AttrValue::as_str)
    }

    /// Applies `f` to every element, keeping dims and attributes.
    pub fn map_values(&self, f: impl Fn(f32) -> f32) -> Self {
        Self {
            dims: self.dims.clone(),
            data: self.data.mapv(f),
            attrs: self.attrs.clone(),
        }
    }

    /// Drops one axis by fixing it at `index`.
    pub fn index_axis(&self, dim: &str, index: usize) -> Result<Self> {
        let axis = self
            .axis_of(dim)
            .ok_or_else(|| Error::shape(format!("variable has no dimension {dim}")))?;
        let len = self.data.shape()[axis];
        if index >= len {
            return Err(Error::shape(format!(
                "index {index} out of range for {dim} of length {len}"
            )));
        }
        let mut dims = self.dims.clone();
        dims.remove(axis);
        Ok(Self {
            dims,
            data: self.data.index_axis(Axis(axis), index).to_owned(),
            attrs: self.attrs.clone(),
        })
    }

    fn take(&self, dim: &str, indices: &[usize]) -> Self {
        match self.axis_of(dim) {
            Some(axis) => Self {
                dims: self.dims.clone(),
                data: self.data.select(Axis(axis), indices),
                attrs: self.attrs.clone(),
            },
            None => self.clone(),
        }
    }

    fn rename_dim(&mut self, old: &str, new: &str) {
        for d in &mut self.dims {
            if d == old {
                *d = new.to_string();
            }
        }
    }
}

/// A collection of variables sharing named dimensions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    coords: BTreeMap<String, Coordinate>,
    data_vars: BTreeMap<String, Variable>,
    /// Global attributes
    pub attrs: Attrs,
}

impl Dataset {
    /// Creates an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Dimension name to length.
    pub fn dims(&self) -> BTreeMap<String, usize> {
        let mut dims = BTreeMap::new();
        for coord in self.coords.values() {
            dims.insert(coord.dim.clone(), coord.len());
        }
        for var in self.data_vars.values() {
            for (d, n) in var.dims.iter().zip(var.shape()) {
                dims.insert(d.clone(), *n);
            }
        }
        dims
    }

    /// Length of one dimension.
    pub fn dim_len(&self, dim: &str) -> Option<usize> {
        self.dims().get(dim).copied()
    }

    /// True when `name` is a data variable or a coordinate.
    pub fn contains(&self, name: &str) -> bool {
        self.data_vars.contains_key(name) || self.coords.contains_key(name)
    }

    /// True when the dataset holds no data variables.
    pub fn is_empty(&self) -> bool {
        self.data_vars.is_empty()
    }

    /// Looks up a coordinate.
    pub fn coord(&self, name: &str) -> Option<&Coordinate> {
        self.coords.get(name)
    }

    /// Looks up a data variable.
    pub fn var(&self, name: &str) -> Option<&Variable> {
        self.data_vars.get(name)
    }

    /// All coordinates by name.
    pub fn coords(&self) -> &BTreeMap<String, Coordinate> {
        &self.coords
    }

    /// All data variables by name.
    pub fn data_vars(&self) -> &BTreeMap<String, Variable> {
        &self.data_vars
    }

    /// Data variable names in sorted order.
    pub fn var_names(&self) -> Vec<String> {
        self.data_vars.keys().cloned().collect()
    }

    /// Timestamps of a time coordinate.
    pub fn time_values(&self, name: &str) -> Option<&[NaiveDateTime]> {
        match self.coords.get(name).map(|c| &c.values) {
            Some(CoordValues::Time(v)) => Some(v),
            _ => None,
        }
    }

    fn check_dim(&self, dim: &str, len: usize, what: &str) -> Result<()> {
        match self.dim_len(dim) {
            Some(existing) if existing != len => Err(Error::shape(format!(
                "{what}: dimension {dim} has length {len}, dataset has {existing}"
            ))),
            _ => Ok(()),
        }
    }

    /// Adds or replaces a coordinate.
    pub fn insert_coord(&mut self, name: impl Into<String>, coord: Coordinate) -> Result<()> {
        let name = name.into();
        self.check_dim(&coord.dim, coord.len(), &name)?;
        self.coords.insert(name, coord);
        Ok(())
    }

    /// Adds or replaces a data variable.
    pub fn insert_var(&mut self, name: impl Into<String>, var: Variable) -> Result<()> {
        let name = name.into();
        for (d, n) in var.dims.iter().zip(var.shape()) {
            self.check_dim(d, *n, &name)?;
        }
        self.data_vars.insert(name, var);
        Ok(())
    }

    /// Builder form of [`insert_coord`](Self::insert_coord).
    pub fn with_coord(mut self, name: impl Into<String>, coord: Coordinate) -> Result<Self> {
        self.insert_coord(name, coord)?;
        Ok(self)
    }

    /// Builder form of [`insert_var`](Self::insert_var).
    pub fn with_var(mut self, name: impl Into<String>, var: Variable) -> Result<Self> {
        self.insert_var(name, var)?;
        Ok(self)
    }

    /// Removes a data variable.
    pub fn remove_var(&mut self, name: &str) -> Option<Variable> {
        self.data_vars.remove(name)
    }

    /// Keeps only the named variables and the coordinates they use.
    ///
    /// A name may also refer to a coordinate, which is then kept as-is.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Dataset> {
        let mut out = Dataset {
            attrs: self.attrs.clone(),
            ..Dataset::default()
        };
        let mut used_dims = BTreeSet::new();
        for name in names {
            let name = name.as_ref();
            if let Some(var) = self.data_vars.get(name) {
                used_dims.extend(var.dims.iter().cloned());
                out.data_vars.insert(name.to_string(), var.clone());
            } else if let Some(coord) = self.coords.get(name) {
                out.coords.insert(name.to_string(), coord.clone());
            } else {
                return Err(Error::MissingVariables {
                    requested: vec![name.to_string()],
                });
            }
        }
        for (name, coord) in &self.coords {
            if used_dims.contains(&coord.dim) {
                out.coords.insert(name.clone(), coord.clone());
            }
        }
        Ok(out)
    }

    /// Reindexes `dim` by position.
    pub fn take(&self, dim: &str, indices: &[usize]) -> Result<Dataset> {
        if let Some(len) = self.dim_len(dim)
            && let Some(bad) = indices.iter().find(|&&i| i >= len)
        {
            return Err(Error::shape(format!(
                "index {bad} out of range for {dim} of length {len}"
            )));
        }
        let coords = self
            .coords
            .iter()
            .map(|(name, c)| {
                let c = if c.dim == dim {
                    Coordinate {
                        dim: c.dim.clone(),
                        values: c.values.take(indices),
                        attrs: c.attrs.clone(),
                    }
                } else {
                    c.clone()
                };
                (name.clone(), c)
            })
            .collect();
        let data_vars = self
            .data_vars
            .iter()
            .map(|(name, v)| (name.clone(), v.take(dim, indices)))
            .collect();
        Ok(Dataset {
            coords,
            data_vars,
            attrs: self.attrs.clone(),
        })
    }

    /// Renames a coordinate or data variable.
    ///
    /// Renaming an index coordinate renames its dimension everywhere.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<()> {
        if old == new {
            return Ok(());
        }
        if self.contains(new) {
            return Err(Error::shape(format!("cannot rename {old}: {new} already exists")));
        }
        if let Some(mut coord) = self.coords.remove(old) {
            if coord.dim == old {
                for c in self.coords.values_mut() {
                    if c.dim == old {
                        c.dim = new.to_string();
                    }
                }
                for v in self.data_vars.values_mut() {
                    v.rename_dim(old, new);
                }
                coord.dim = new.to_string();
            }
            self.coords.insert(new.to_string(), coord);
            return Ok(());
        }
        if let Some(var) = self.data_vars.remove(old) {
            self.data_vars.insert(new.to_string(), var);
            return Ok(());
        }
        Err(Error::MissingVariables {
            requested: vec![old.to_string()],
        })
    }

    /// Adds a whole-hour offset to a time coordinate; absent coordinate is a no-op.
    pub fn shift_time(&mut self, name: &str, hours: i64) -> Result<()> {
        let Some(coord) = self.coords.get_mut(name) else {
            return Ok(());
        };
        let CoordValues::Time(times) = &mut coord.values else {
            return Err(Error::shape(format!("{name} is not a time coordinate")));
        };
        let delta = TimeDelta::try_hours(hours)
            .ok_or_else(|| Error::config(format!("time shift of {hours}h is out of range")))?;
        for t in times.iter_mut() {
            *t = t
                .checked_add_signed(delta)
                .ok_or_else(|| Error::shape(format!("shifting {t} by {hours}h overflows")))?;
        }
        Ok(())
    }

    /// Makes sure the time coordinate is called `valid_time`.
    ///
    /// Renames `time` if present, otherwise the first timestamp coordinate.
    pub fn ensure_valid_time(mut self) -> Result<Dataset> {
        if self.coords.contains_key(VALID_TIME) {
            return Ok(self);
        }
        if self.coords.contains_key("time") {
            self.rename("time", VALID_TIME)?;
            return Ok(self);
        }
        let candidate = self
            .coords
            .iter()
            .find(|(_, c)| c.values.is_time())
            .map(|(name, _)| name.clone());
        match candidate {
            Some(name) => {
                self.rename(&name, VALID_TIME)?;
                Ok(self)
            }
            None => Err(Error::MissingTimeCoordinate),
        }
    }

    /// Distinct calendar dates of a time coordinate, ascending.
    pub fn dates(&self, name: &str) -> Vec<NaiveDate> {
        let set: BTreeSet<NaiveDate> = self
            .time_values(name)
            .unwrap_or_default()
            .iter()
            .map(NaiveDateTime::date)
            .collect();
        set.into_iter().collect()
    }

    /// All time steps of `name` falling on `date`.
    pub fn day_slice(&self, name: &str, date: NaiveDate) -> Result<Dataset> {
        let times = self.time_values(name).ok_or(Error::MissingTimeCoordinate)?;
        let dim = self
            .coords
            .get(name)
            .map(|c| c.dim.clone())
            .unwrap_or_else(|| name.to_string());
        let indices: Vec<usize> = times
            .iter()
            .enumerate()
            .filter(|(_, t)| t.date() == date)
            .map(|(i, _)| i)
            .collect();
        self.take(&dim, &indices)
    }

    /// Inner-joins datasets on every index coordinate held by two or more of them.
    ///
    /// The surviving labels keep the order of the first dataset holding the index.
    pub fn align_inner(datasets: &mut [Dataset]) -> Result<()> {
        let index_names: BTreeSet<String> = datasets
            .iter()
            .flat_map(|ds| {
                ds.coords
                    .iter()
                    .filter(|(name, c)| *name == &c.dim)
                    .map(|(name, _)| name.clone())
            })
            .collect();

        for name in index_names {
            let holders: Vec<usize> = datasets
                .iter()
                .enumerate()
                .filter(|(_, ds)| ds.coords.get(&name).is_some_and(|c| c.dim == name))
                .map(|(i, _)| i)
                .collect();
            if holders.len() < 2 {
                continue;
            }

            let key_sets: Vec<Vec<CoordKey>> = holders
                .iter()
                .map(|&i| datasets[i].coords[&name].values.keys())
                .collect();
            let lookups: Vec<HashMap<&CoordKey, usize>> = key_sets
                .iter()
                .map(|keys| {
                    let mut map = HashMap::with_capacity(keys.len());
                    for (pos, k) in keys.iter().enumerate() {
                        map.entry(k).or_insert(pos);
                    }
                    map
                })
                .collect();

            let mut emitted = HashSet::new();
            let unique: Vec<&CoordKey> = key_sets[0]
                .iter()
                .filter(|k| lookups.iter().all(|m| m.contains_key(k)))
                .filter(|k| emitted.insert(*k))
                .collect();

            for (slot, &ds_index) in holders.iter().enumerate() {
                let positions: Vec<usize> = unique.iter().map(|k| lookups[slot][k]).collect();
                let identity = positions.len() == key_sets[slot].len()
                    && positions.iter().enumerate().all(|(i, p)| i == *p);
                if !identity {
                    tracing::debug!(
                        coord = %name,
                        before = key_sets[slot].len(),
                        after = positions.len(),
                        "trimming index to common labels"
                    );
                    datasets[ds_index] = datasets[ds_index].take(&name, &positions)?;
                }
            }
        }
        Ok(())
    }

    /// Merges datasets; the first occurrence of any name wins.
    pub fn merge(datasets: &[Dataset]) -> Result<Dataset> {
        let mut out = Dataset::new();
        for ds in datasets {
            for (name, coord) in &ds.coords {
                if !out.coords.contains_key(name) {
                    out.insert_coord(name.clone(), coord.clone())?;
                }
            }
            for (name, var) in &ds.data_vars {
                if !out.data_vars.contains_key(name) {
                    out.insert_var(name.clone(), var.clone())?;
                }
            }
            for (key, value) in &ds.attrs {
                out.attrs.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
        Ok(out)
    }
}
