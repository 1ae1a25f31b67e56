//! SARIF input adapter.
//!
//! SARIF (Static Analysis Results Interchange Format) is an OASIS standard
//! for static analysis tools. Only the subset needed to locate findings is
//! decoded; every other field is ignored.

use super::{AdapterContext, WarningAdapter};
use crate::error::{Result, SaveError};
use crate::warning::Warning;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// A decoded SARIF log.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifReport {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub runs: Vec<SarifRun>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifRun {
    pub tool: SarifTool,
    #[serde(default)]
    pub results: Vec<SarifResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifTool {
    pub driver: SarifDriver,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifDriver {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifResult {
    #[serde(default)]
    pub message: SarifMessage,
    #[serde(default)]
    pub locations: Vec<SarifLocation>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SarifMessage {
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifLocation {
    pub physical_location: Option<SarifPhysicalLocation>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifPhysicalLocation {
    pub artifact_location: Option<SarifArtifactLocation>,
    pub region: Option<SarifRegion>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SarifArtifactLocation {
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifRegion {
    pub start_line: Option<u32>,
    pub start_column: Option<u32>,
}

impl SarifReport {
    /// Decode a report from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| SaveError::MalformedReport {
            message: e.to_string(),
        })
    }

    /// Decode a report from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content).map_err(|e| match e {
            SaveError::MalformedReport { message } => SaveError::MalformedReport {
                message: format!("{}: {}", path.display(), message),
            },
            other => other,
        })
    }
}

/// Converts SARIF reports into warnings.
#[derive(Debug, Clone, Copy, Default)]
pub struct SarifWarningAdapter;

impl WarningAdapter for SarifWarningAdapter {
    type Report = SarifReport;

    /// One warning per in-scope location, in report order.
    ///
    /// # Errors
    ///
    /// Returns `Adapter` naming the run and result if a location has no
    /// URI or its URI cannot be resolved to a path.
    fn to_warnings(&self, report: &SarifReport, ctx: &AdapterContext) -> Result<Vec<Warning>> {
        let mut warnings = Vec::new();

        for (run_index, run) in report.runs.iter().enumerate() {
            for (result_index, result) in run.results.iter().enumerate() {
                for location in &result.locations {
                    let physical = location.physical_location.as_ref();
                    let uri = physical
                        .and_then(|p| p.artifact_location.as_ref())
                        .and_then(|a| a.uri.as_deref());
                    let adapter_error = |message: String| SaveError::Adapter {
                        run: run_index,
                        result: result_index,
                        uri: uri.map(str::to_string),
                        message,
                    };

                    let uri = uri.ok_or_else(|| {
                        adapter_error("location has no artifact uri".to_string())
                    })?;
                    let absolute = ctx.resolve(uri).map_err(adapter_error)?;
                    let Some(file_name) = ctx.scoped_file_name(&absolute) else {
                        continue;
                    };

                    let region = physical.and_then(|p| p.region.as_ref());
                    warnings.push(Warning::new(
                        result.message.text.clone().unwrap_or_default(),
                        region.and_then(|r| r.start_line).unwrap_or(1),
                        region.and_then(|r| r.start_column).unwrap_or(1),
                        file_name,
                    ));
                }
            }
        }

        Ok(warnings)
    }
}
