//! NetCDF backend (feature `netcdf`).
//!
//! Reading decodes CF time axes into timestamps and unpacks
//! `scale_factor`/`add_offset` variables into `f32`. Writing produces plain
//! NetCDF-4: time as `seconds since 1970-01-01 00:00:00`, numeric
//! coordinates as `f64`, label coordinates as strings, data as `f32`.

use std::path::Path;

use ndarray::{ArrayD, IxDyn};
use netcdf::AttributeValue;

use crate::cf::{self, Packing, TimeUnits};
use crate::dataset::{AttrValue, Attrs, CoordValues, Coordinate, Dataset, Variable};
use crate::error::{Error, Result};
use crate::store::{DatasetReader, DatasetWriter};

/// Attributes consumed while unpacking; never copied to the output.
const PACKING_ATTRS: [&str; 4] = ["scale_factor", "add_offset", "_FillValue", "missing_value"];

/// Reads and writes NetCDF files through `libnetcdf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetcdfStore;

impl NetcdfStore {
    /// Creates the store.
    pub fn new() -> Self {
        Self
    }
}

fn to_attr(value: AttributeValue) -> Option<AttrValue> {
    use AttributeValue as A;
    let nums = |v: Vec<f64>| {
        if v.len() == 1 {
            AttrValue::Number(v[0])
        } else {
            AttrValue::Numbers(v)
        }
    };
    Some(match value {
        A::Str(s) => AttrValue::Text(s),
        A::Strs(s) => AttrValue::Text(s.join(", ")),
        A::Uchar(v) => AttrValue::Number(f64::from(v)),
        A::Schar(v) => AttrValue::Number(f64::from(v)),
        A::Ushort(v) => AttrValue::Number(f64::from(v)),
        A::Short(v) => AttrValue::Number(f64::from(v)),
        A::Uint(v) => AttrValue::Number(f64::from(v)),
        A::Int(v) => AttrValue::Number(f64::from(v)),
        A::Ulonglong(v) => AttrValue::Number(v as f64),
        A::Longlong(v) => AttrValue::Number(v as f64),
        A::Float(v) => AttrValue::Number(f64::from(v)),
        A::Double(v) => AttrValue::Number(v),
        A::Uchars(v) => nums(v.into_iter().map(f64::from).collect()),
        A::Schars(v) => nums(v.into_iter().map(f64::from).collect()),
        A::Ushorts(v) => nums(v.into_iter().map(f64::from).collect()),
        A::Shorts(v) => nums(v.into_iter().map(f64::from).collect()),
        A::Uints(v) => nums(v.into_iter().map(f64::from).collect()),
        A::Ints(v) => nums(v.into_iter().map(f64::from).collect()),
        A::Ulonglongs(v) => nums(v.into_iter().map(|x| x as f64).collect()),
        A::Longlongs(v) => nums(v.into_iter().map(|x| x as f64).collect()),
        A::Floats(v) => nums(v.into_iter().map(f64::from).collect()),
        A::Doubles(v) => nums(v),
        #[allow(unreachable_patterns)]
        _ => return None,
    })
}

fn read_attrs<'a>(attrs: impl Iterator<Item = netcdf::Attribute<'a>>) -> Attrs {
    attrs
        .filter_map(|a| {
            let name = a.name().to_string();
            a.value().ok().and_then(to_attr).map(|v| (name, v))
        })
        .collect()
}

fn packing_of(attrs: &Attrs) -> Packing {
    let get = |k: &str| attrs.get(k).and_then(AttrValue::as_f64);
    Packing {
        scale_factor: get("scale_factor"),
        add_offset: get("add_offset"),
        fill_value: get("_FillValue"),
        missing_value: get("missing_value"),
    }
}

impl DatasetReader for NetcdfStore {
    fn read(&self, path: &Path) -> Result<Dataset> {
        let file = netcdf::open(path).map_err(|e| Error::netcdf(path, e.to_string()))?;
        let mut ds = Dataset::new();
        ds.attrs = read_attrs(file.attributes());

        for var in file.variables() {
            let name = var.name();
            let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
            let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
            let mut attrs = read_attrs(var.attributes());

            let raw = match var.get_values::<f64, _>(..) {
                Ok(raw) => raw,
                Err(numeric_err) => {
                    // String variables, e.g. `expver` in recent CDS downloads
                    if dims.len() != 1 {
                        tracing::debug!(var = %name, error = %numeric_err, "skipping non-numeric variable");
                        continue;
                    }
                    let labels = (0..shape[0])
                        .map(|i| var.get_string([i]))
                        .collect::<std::result::Result<Vec<String>, _>>()
                        .map_err(|e| Error::netcdf(path, format!("{name}: {e}")))?;
                    let mut coord = Coordinate::new(dims[0].clone(), CoordValues::Labels(labels));
                    coord.attrs = attrs;
                    ds.insert_coord(name, coord)?;
                    continue;
                }
            };

            let is_index = dims.len() == 1 && dims[0] == name;
            let time_units = attrs
                .get("units")
                .and_then(AttrValue::as_str)
                .filter(|u| u.contains(" since "))
                .map(TimeUnits::parse)
                .transpose()?;

            if let Some(units) = time_units.filter(|_| dims.len() == 1) {
                let times = raw
                    .iter()
                    .map(|&v| units.decode(v))
                    .collect::<Result<Vec<_>>>()?;
                attrs.remove("units");
                attrs.remove("calendar");
                let mut coord = Coordinate::new(dims[0].clone(), CoordValues::Time(times));
                coord.attrs = attrs;
                ds.insert_coord(name, coord)?;
            } else if is_index {
                let mut coord = Coordinate::new(dims[0].clone(), CoordValues::Numeric(raw));
                coord.attrs = attrs;
                ds.insert_coord(name, coord)?;
            } else {
                let values = cf::unpack(&raw, &packing_of(&attrs));
                for key in PACKING_ATTRS {
                    attrs.remove(key);
                }
                let data = ArrayD::from_shape_vec(IxDyn(&shape), values)
                    .map_err(|e| Error::shape(format!("{name}: {e}")))?;
                let mut variable = Variable::new(dims, data)?;
                variable.attrs = attrs;
                ds.insert_var(name, variable)?;
            }
        }
        Ok(ds)
    }
}

fn to_nc(value: &AttrValue) -> AttributeValue {
    match value {
        AttrValue::Text(s) => AttributeValue::Str(s.clone()),
        AttrValue::Number(n) => AttributeValue::Double(*n),
        AttrValue::Numbers(v) => AttributeValue::Doubles(v.clone()),
    }
}

/// Copies `attrs` onto `var`, leaving out packing attributes.
///
/// Must run before `put_values`: NetCDF-4 rejects `_FillValue` once data
/// has been written.
fn put_attrs(var: &mut netcdf::VariableMut<'_>, attrs: &Attrs, path: &Path) -> Result<()> {
    for (key, value) in attrs {
        if PACKING_ATTRS.contains(&key.as_str()) {
            continue;
        }
        var.put_attribute(key, to_nc(value))
            .map_err(|e| Error::netcdf(path, format!("{key}: {e}")))?;
    }
    Ok(())
}

impl DatasetWriter for NetcdfStore {
    fn write(&self, dataset: &Dataset, path: &Path) -> Result<()> {
        let nc = |e: netcdf::Error| Error::netcdf(path, e.to_string());
        let mut file = netcdf::create(path).map_err(nc)?;

        for (key, value) in &dataset.attrs {
            file.add_attribute(key, to_nc(value)).map_err(nc)?;
        }
        for (dim, len) in dataset.dims() {
            file.add_dimension(&dim, len).map_err(nc)?;
        }

        for (name, coord) in dataset.coords() {
            let dims = [coord.dim.as_str()];
            match &coord.values {
                CoordValues::Time(times) => {
                    let units = TimeUnits::epoch_seconds();
                    let encoded: Vec<f64> = times.iter().map(|&t| units.encode(t)).collect();
                    let mut var = file.add_variable::<f64>(name, &dims).map_err(nc)?;
                    put_attrs(&mut var, &coord.attrs, path)?;
                    var.put_attribute("units", cf::EPOCH_SECONDS).map_err(nc)?;
                    var.put_attribute("calendar", "proleptic_gregorian").map_err(nc)?;
                    var.put_values(&encoded, ..).map_err(nc)?;
                }
                CoordValues::Numeric(values) => {
                    let mut var = file.add_variable::<f64>(name, &dims).map_err(nc)?;
                    put_attrs(&mut var, &coord.attrs, path)?;
                    var.put_values(values, ..).map_err(nc)?;
                }
                CoordValues::Labels(labels) => {
                    let mut var = file.add_string_variable(name, &dims).map_err(nc)?;
                    put_attrs(&mut var, &coord.attrs, path)?;
                    for (i, label) in labels.iter().enumerate() {
                        var.put_string(label, [i]).map_err(nc)?;
                    }
                }
            }
        }

        for (name, variable) in dataset.data_vars() {
            let dims: Vec<&str> = variable.dims().iter().map(String::as_str).collect();
            let values: Vec<f32> = variable.data().iter().copied().collect();
            let mut var = file.add_variable::<f32>(name, &dims).map_err(nc)?;
            put_attrs(&mut var, &variable.attrs, path)?;
            var.put_values(&values, ..).map_err(nc)?;
        }

        tracing::debug!(path = %path.display(), vars = dataset.data_vars().len(), "wrote NetCDF");
        Ok(())
    }
}
