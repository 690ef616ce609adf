use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Operating system family the scanner is running on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OsFamily {
    Linux,
    Macos,
    Windows,
    Unknown,
}

impl OsFamily {
    pub fn name(&self) -> &'static str {
        match self {
            OsFamily::Linux => "linux",
            OsFamily::Macos => "macos",
            OsFamily::Windows => "windows",
            OsFamily::Unknown => "unknown",
        }
    }
}

/// Package manager available on this host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PackageManager {
    Apt,
    Yum,
    Dnf,
    Brew,
    Unknown,
}

impl PackageManager {
    pub fn name(&self) -> &'static str {
        match self {
            PackageManager::Apt => "apt",
            PackageManager::Yum => "yum",
            PackageManager::Dnf => "dnf",
            PackageManager::Brew => "brew",
            PackageManager::Unknown => "unknown",
        }
    }
}

/// Detected host environment. Computed once at startup and read-only afterward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    pub os: OsFamily,
    pub package_manager: PackageManager,
}

pub fn detect_environment() -> EnvironmentInfo {
    let os = detect_os();
    let package_manager = detect_package_manager(os);
    debug!(
        "Detected environment: os={} package_manager={}",
        os.name(),
        package_manager.name()
    );

    EnvironmentInfo { os, package_manager }
}

fn detect_os() -> OsFamily {
    match std::env::consts::OS {
        "linux" => OsFamily::Linux,
        "macos" => OsFamily::Macos,
        "windows" => OsFamily::Windows,
        _ => OsFamily::Unknown,
    }
}

/// Probe order is fixed: apt-get, then yum, then dnf on Linux; brew on macOS.
/// The first binary found on PATH wins.
fn detect_package_manager(os: OsFamily) -> PackageManager {
    match os {
        OsFamily::Linux => {
            if command_exists("apt-get") {
                PackageManager::Apt
            } else if command_exists("yum") {
                PackageManager::Yum
            } else if command_exists("dnf") {
                PackageManager::Dnf
            } else {
                PackageManager::Unknown
            }
        }
        OsFamily::Macos => {
            if command_exists("brew") {
                PackageManager::Brew
            } else {
                PackageManager::Unknown
            }
        }
        _ => PackageManager::Unknown,
    }
}

/// Check whether an executable is resolvable on the search path.
pub fn command_exists(name: &str) -> bool {
    let Some(paths) = std::env::var_os("PATH") else {
        return false;
    };

    std::env::split_paths(&paths).any(|dir| is_executable(&dir.join(name)))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(windows)]
fn is_executable(path: &Path) -> bool {
    // PATHEXT handling kept minimal: .exe covers every tool we wrap.
    let with_ext = std::path::PathBuf::from(format!("{}.exe", path.display()));
    path.is_file() || with_ext.is_file()
}

#[cfg(not(any(unix, windows)))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Check whether a Python module can be imported by the host interpreter.
/// Reports false on any failure, including a missing interpreter.
pub fn python_module_exists(module: &str) -> bool {
    if !module.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return false;
    }

    if !command_exists("python3") {
        return false;
    }

    std::process::Command::new("python3")
        .arg("-c")
        .arg(format!("import {}", module))
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detected_os_matches_platform() {
        let env = detect_environment();

        #[cfg(target_os = "linux")]
        assert_eq!(env.os, OsFamily::Linux);
        #[cfg(target_os = "macos")]
        assert_eq!(env.os, OsFamily::Macos);
        #[cfg(target_os = "windows")]
        assert_eq!(env.os, OsFamily::Windows);
    }

    #[test]
    fn command_exists_finds_common_binary() {
        #[cfg(unix)]
        assert!(command_exists("sh"));

        assert!(!command_exists("definitely-not-a-real-binary-4242"));
    }

    #[test]
    fn python_module_check_rejects_bad_names() {
        assert!(!python_module_exists("os; import sys"));
        assert!(!python_module_exists(""));
    }
}
