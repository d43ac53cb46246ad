use serde::{Deserialize, Serialize};

/// Optional generator settings, read from a JSON file passed with `--config`.
/// Missing fields fall back to `GeneratorConfig::default()`.
#[derive(Debug, Deserialize, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorConfigDto {
    #[serde(default)]
    pub package: Option<PackageConfigDto>,

    #[serde(default)]
    pub iflow: Option<IflowDefaultsDto>,

    #[serde(default)]
    pub layout: Option<LayoutConfigDto>,
}

#[derive(Debug, Deserialize, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PackageConfigDto {
    pub default_version: Option<String>,
    pub vendor: Option<String>,
    pub runtime_profile: Option<String>,
    pub import_packages: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct IflowDefaultsDto {
    pub transaction_timeout: Option<u32>,
    pub transactional_handling: Option<String>,
    pub log_level: Option<String>,
    pub return_exception_to_sender: Option<bool>,
}

#[derive(Debug, Deserialize, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LayoutConfigDto {
    pub origin_x: Option<f64>,
    pub origin_y: Option<f64>,
    pub column_width: Option<f64>,
    pub row_height: Option<f64>,
    pub pool_padding: Option<f64>,
    pub participant_gap: Option<f64>,
}
