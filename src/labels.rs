//! Label parsing: the service marker and the gateway configuration.

use std::collections::HashMap;

use thiserror::Error;

use crate::config::LabelKeys;
use crate::types::GatewayConfiguration;

/// A container whose labels do not describe a usable service.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LabelError {
    #[error("marker label {0} is missing")]
    MissingMarker(String),
    #[error("marker label value {0:?} is not a boolean")]
    InvalidMarker(String),
    #[error("label {0} is missing or empty")]
    MissingLabel(String),
}

/// Read the marker label. Accepts the usual flag spellings
/// (`1`, `t`, `true`, `TRUE`, ... and their negatives).
pub fn is_service(labels: &HashMap<String, String>, keys: &LabelKeys) -> Result<bool, LabelError> {
    let value = labels
        .get(&keys.marker)
        .ok_or_else(|| LabelError::MissingMarker(keys.marker.clone()))?;
    match value.as_str() {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        other => Err(LabelError::InvalidMarker(other.to_string())),
    }
}

/// Build the gateway configuration from a container's labels.
///
/// Fails on the first missing or empty key; partial configurations are
/// never returned.
pub fn extract_configuration(
    labels: &HashMap<String, String>,
    keys: &LabelKeys,
) -> Result<GatewayConfiguration, LabelError> {
    let required = |key: &String| -> Result<String, LabelError> {
        match labels.get(key) {
            Some(v) if !v.trim().is_empty() => Ok(v.clone()),
            _ => Err(LabelError::MissingLabel(key.clone())),
        }
    };

    Ok(GatewayConfiguration {
        service_name: required(&keys.service_name)?,
        upstream_name: required(&keys.upstream_name)?,
        service_path: required(&keys.path)?,
    })
}
