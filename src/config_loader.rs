use crate::config::Config;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{info, warn};
use std::fs::File;
use std::path::Path;

/// Configuration file formats, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Detect the format from the file extension; anything but `.json` is YAML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ConfigFormat::Json,
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                ConfigFormat::Yaml
            }
            other => {
                warn!(
                    "Unrecognized configuration extension {:?}, parsing {:?} as YAML",
                    other, path
                );
                ConfigFormat::Yaml
            }
        }
    }
}

/// Load, parse and validate a fabric configuration file
pub fn load_config(config_path: &Path) -> Result<Config> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open configuration '{}'", config_path.display()))?;

    let config: Config = match ConfigFormat::from_path(config_path) {
        ConfigFormat::Yaml => serde_yaml::from_reader(file).wrap_err_with(|| {
            format!("Failed to parse YAML configuration '{}'", config_path.display())
        })?,
        ConfigFormat::Json => serde_json::from_reader(file).wrap_err_with(|| {
            format!("Failed to parse JSON configuration '{}'", config_path.display())
        })?,
    };

    info!(
        "Configuration defines {} region(s): {}",
        config.region_cidrs.len(),
        config.region_cidrs.keys().cloned().collect::<Vec<_>>().join(", ")
    );

    config
        .validate()
        .wrap_err_with(|| format!("Invalid configuration '{}'", config_path.display()))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    const YAML: &str = r#"
region_cidrs:
  us-east-1:
    dev: 10.0.0.0/24
    prod: 10.0.1.0/24
    onprem: 172.16.0.0/24
    mask: 26
on_prem_public_ip: 203.0.113.10
asns:
  hub: 64512
  customer: 65000
"#;

    fn temp_config(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut temp_file = Builder::new().suffix(suffix).tempfile().unwrap();
        write!(temp_file, "{}", content).unwrap();
        temp_file
    }

    #[test]
    fn test_load_yaml_config() {
        let temp_file = temp_config(".yaml", YAML);

        let config = load_config(temp_file.path()).unwrap();
        assert!(config.region_cidrs.contains_key("us-east-1"));
        assert_eq!(config.asns.hub, Some(64512));
        assert_eq!(config.subnets.onprem, 2);
    }

    #[test]
    fn test_load_json_config() {
        let json = r#"{
  "region_cidrs": {
    "us-east-1": {
      "dev": "10.0.0.0/24",
      "prod": "10.0.1.0/24",
      "onprem": "172.16.0.0/24",
      "mask": 26
    }
  },
  "on_prem_public_ip": "203.0.113.10",
  "asns": {"hub": 64512, "customer": 65000},
  "compute": {"execution_role": "ssm-core"}
}"#;
        let temp_file = temp_config(".json", json);

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(
            config.compute.and_then(|c| c.execution_role).as_deref(),
            Some("ssm-core")
        );
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let temp_file = temp_config(".yaml", &YAML.replace("172.16.0.0/24", "10.0.1.0/24"));

        let err = load_config(temp_file.path()).unwrap_err();
        assert!(format!("{:?}", err).contains("Invalid CIDR configuration"));
    }

    #[test]
    fn test_missing_file() {
        assert!(load_config(Path::new("/nonexistent/fabric.yaml")).is_err());
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(ConfigFormat::from_path(Path::new("a.json")), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_path(Path::new("a.YML")), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("a.conf")), ConfigFormat::Yaml);
    }
}
