use std::path::Path;

use crate::api::config_dto::GeneratorConfigDto;
use crate::error::Result;
use crate::loader::parser::parse_json_file;

/// Bundle headers imported by every generated iFlow.
const DEFAULT_IMPORT_PACKAGES: &[&str] = &[
    "com.sap.esb.application.services.cxf.interceptor",
    "com.sap.esb.security",
    "com.sap.it.op.agent.api",
    "com.sap.it.op.agent.collector.camel",
    "com.sap.it.op.agent.collector.cxf",
    "com.sap.it.op.agent.mpl",
    "javax.jms",
    "javax.jws",
    "javax.wsdl",
    "javax.xml.bind.annotation",
    "javax.xml.namespace",
    "javax.xml.ws",
    "org.apache.camel;version=\"2.8\"",
    "org.apache.camel.builder;version=\"2.8\"",
    "org.apache.camel.builder.xml;version=\"2.8\"",
    "org.apache.camel.component.cxf",
    "org.apache.camel.model;version=\"2.8\"",
    "org.apache.camel.processor;version=\"2.8\"",
    "org.apache.camel.processor.aggregate;version=\"2.8\"",
    "org.apache.camel.spring.spi;version=\"2.8\"",
    "org.apache.commons.logging",
    "org.apache.cxf.binding",
    "org.apache.cxf.binding.soap",
    "org.apache.cxf.endpoint",
    "org.apache.cxf.message",
    "org.apache.cxf.transport.http",
    "org.osgi.framework;version=\"1.6.0\"",
    "org.slf4j;version=\"1.6\"",
    "org.springframework.beans.factory.config;version=\"3.0\"",
    "org.osgi.service.blueprint;version=\"[1.0.0,2.0.0)\"",
];

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    pub package: PackageConfig,
    pub iflow: IflowDefaults,
    pub layout: LayoutConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackageConfig {
    /// Used when `iflow_info.version` is absent.
    pub default_version: String,
    pub vendor: String,
    pub runtime_profile: String,
    pub import_packages: Vec<String>,
}

/// Collaboration and process level settings written into every iFlow.
#[derive(Debug, Clone, PartialEq)]
pub struct IflowDefaults {
    pub transaction_timeout: u32,
    pub transactional_handling: String,
    pub log_level: String,
    pub return_exception_to_sender: bool,
}

/// Grid used to place shapes in the BPMN diagram.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    pub origin_x: f64,
    pub origin_y: f64,
    pub column_width: f64,
    pub row_height: f64,
    pub pool_padding: f64,
    pub participant_gap: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            package: PackageConfig {
                default_version: "1.0.0".to_string(),
                vendor: "SAP".to_string(),
                runtime_profile: "iflmap".to_string(),
                import_packages: DEFAULT_IMPORT_PACKAGES.iter().map(|p| p.to_string()).collect(),
            },
            iflow: IflowDefaults {
                transaction_timeout: 30,
                transactional_handling: "Not Required".to_string(),
                log_level: "All events".to_string(),
                return_exception_to_sender: false,
            },
            layout: LayoutConfig {
                origin_x: 100.0,
                origin_y: 100.0,
                column_width: 150.0,
                row_height: 120.0,
                pool_padding: 40.0,
                participant_gap: 120.0,
            },
        }
    }
}

impl GeneratorConfig {
    /// Overlays every field present in the DTO onto the defaults.
    pub fn from_dto(dto: GeneratorConfigDto) -> Self {
        let mut config = GeneratorConfig::default();

        if let Some(package) = dto.package {
            if let Some(v) = package.default_version {
                config.package.default_version = v;
            }
            if let Some(v) = package.vendor {
                config.package.vendor = v;
            }
            if let Some(v) = package.runtime_profile {
                config.package.runtime_profile = v;
            }
            if let Some(v) = package.import_packages {
                config.package.import_packages = v;
            }
        }

        if let Some(iflow) = dto.iflow {
            if let Some(v) = iflow.transaction_timeout {
                config.iflow.transaction_timeout = v;
            }
            if let Some(v) = iflow.transactional_handling {
                config.iflow.transactional_handling = v;
            }
            if let Some(v) = iflow.log_level {
                config.iflow.log_level = v;
            }
            if let Some(v) = iflow.return_exception_to_sender {
                config.iflow.return_exception_to_sender = v;
            }
        }

        if let Some(layout) = dto.layout {
            let l = &mut config.layout;
            l.origin_x = layout.origin_x.unwrap_or(l.origin_x);
            l.origin_y = layout.origin_y.unwrap_or(l.origin_y);
            l.column_width = layout.column_width.unwrap_or(l.column_width);
            l.row_height = layout.row_height.unwrap_or(l.row_height);
            l.pool_padding = layout.pool_padding.unwrap_or(l.pool_padding);
            l.participant_gap = layout.participant_gap.unwrap_or(l.participant_gap);
        }

        config
    }

    /// Loads the config file if one is given, otherwise returns the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let dto: GeneratorConfigDto = parse_json_file(path)?;
                log::info!("Generator config loaded from '{}'.", path.display());
                Ok(Self::from_dto(dto))
            }
            None => Ok(Self::default()),
        }
    }
}
