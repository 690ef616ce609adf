use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub target: TargetConfig,
    pub directories: DirectoryConfig,
    pub execution: ExecutionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    pub default_port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// All scan artifacts are written here.
    pub scan_dir: PathBuf,
    /// Holds nmap.xsl and xalan.jar for XML-to-HTML conversion.
    pub reports_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    pub default_timeout: u64,  // seconds
    pub extended_timeout: u64, // seconds, full-port and DNS brute force scans
    pub install_timeout: u64,  // seconds, package manager invocations
    pub session_ceiling: u64,  // seconds, background session hard limit
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target: TargetConfig { default_port: 443 },
            directories: DirectoryConfig {
                scan_dir: PathBuf::from("scan_results"),
                reports_dir: PathBuf::from("Nmap-reports-files"),
            },
            execution: ExecutionConfig {
                default_timeout: 300,
                extended_timeout: 600,
                install_timeout: 300,
                session_ceiling: 1800,
            },
        }
    }
}

impl Config {
    pub fn load_from_file(path: &str) -> crate::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn save_to_file(&self, path: &str) -> crate::Result<()> {
        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| crate::ScanError::Unknown(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, toml_string)?;
        Ok(())
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.execution.default_timeout)
    }

    pub fn extended_timeout(&self) -> Duration {
        Duration::from_secs(self.execution.extended_timeout)
    }

    pub fn install_timeout(&self) -> Duration {
        Duration::from_secs(self.execution.install_timeout)
    }

    pub fn session_ceiling(&self) -> Duration {
        Duration::from_secs(self.execution.session_ceiling)
    }
}
