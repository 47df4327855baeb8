//! Variable selection.

use wxprep_core::{Dataset, Error, Result};

/// Keeps the requested variables that `ds` actually has.
///
/// Missing names are logged and skipped; if none are present the month
/// cannot produce output and [`Error::MissingVariables`] is returned.
pub fn select_variables<S: AsRef<str>>(ds: &Dataset, vars: &[S]) -> Result<Dataset> {
    let (present, missing): (Vec<&str>, Vec<&str>) = vars
        .iter()
        .map(AsRef::as_ref)
        .partition(|v| ds.contains(v));

    if !missing.is_empty() {
        tracing::warn!(
            ?missing,
            "requested variables are missing from merged dataset and will be skipped"
        );
    }
    if present.is_empty() {
        return Err(Error::MissingVariables {
            requested: vars.iter().map(|v| v.as_ref().to_string()).collect(),
        });
    }
    ds.select(&present)
}
