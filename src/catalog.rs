use crate::environment::{OsFamily, PackageManager};
use serde::{Deserialize, Serialize};

/// External tools the orchestrator depends on. The catalog is fixed
/// configuration: descriptors are defined once and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tool {
    Nmap,
    Sslscan,
    Nikto,
    Python3,
    Java,
    Dig,
    Sslyze,
}

/// How a tool gets installed on a given OS family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallSpec {
    /// Per-package-manager package names (apt, yum, dnf or brew).
    Package {
        apt: &'static str,
        yum: &'static str,
        dnf: &'static str,
    },
    Brew(&'static str),
    /// Installed through pip; always preferred when declared for an OS.
    Pip(&'static str),
    /// No automated method; the string is a human-readable pointer.
    Manual(&'static str),
}

impl InstallSpec {
    /// Package identifier for a concrete package manager, if this spec
    /// covers it.
    pub fn package_for(&self, pm: PackageManager) -> Option<&'static str> {
        match (self, pm) {
            (InstallSpec::Package { apt, .. }, PackageManager::Apt) => Some(apt),
            (InstallSpec::Package { yum, .. }, PackageManager::Yum) => Some(yum),
            (InstallSpec::Package { dnf, .. }, PackageManager::Dnf) => Some(dnf),
            (InstallSpec::Brew(pkg), PackageManager::Brew) => Some(pkg),
            _ => None,
        }
    }
}

impl Tool {
    /// Catalog order; also the order dependency reports are printed in.
    pub fn all() -> &'static [Tool] {
        &[
            Tool::Nmap,
            Tool::Sslscan,
            Tool::Nikto,
            Tool::Python3,
            Tool::Java,
            Tool::Dig,
            Tool::Sslyze,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Tool::Nmap => "nmap",
            Tool::Sslscan => "sslscan",
            Tool::Nikto => "nikto",
            Tool::Python3 => "python3",
            Tool::Java => "java",
            Tool::Dig => "dig",
            Tool::Sslyze => "sslyze",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Tool::Nmap => "Network mapper for port scanning",
            Tool::Sslscan => "SSL/TLS scanner",
            Tool::Nikto => "Web server scanner",
            Tool::Python3 => "Python 3 interpreter",
            Tool::Java => "Java Runtime Environment",
            Tool::Dig => "DNS lookup utility",
            Tool::Sslyze => "SSL/TLS scanner (Python package)",
        }
    }

    /// Sslyze is a library inside the host interpreter rather than a binary,
    /// so its presence check is a module import.
    pub fn is_python_module(&self) -> bool {
        matches!(self, Tool::Sslyze)
    }

    pub fn from_name(name: &str) -> Option<Tool> {
        Tool::all().iter().copied().find(|t| t.name() == name)
    }

    /// Installation method for an OS family, or None when the catalog
    /// declares nothing for it.
    pub fn install_spec(&self, os: OsFamily) -> Option<InstallSpec> {
        match (self, os) {
            (Tool::Sslyze, OsFamily::Linux | OsFamily::Macos | OsFamily::Windows) => {
                Some(InstallSpec::Pip("sslyze"))
            }

            (Tool::Nmap, OsFamily::Linux) => Some(InstallSpec::Package {
                apt: "nmap",
                yum: "nmap",
                dnf: "nmap",
            }),
            (Tool::Nmap, OsFamily::Macos) => Some(InstallSpec::Brew("nmap")),
            (Tool::Nmap, OsFamily::Windows) => {
                Some(InstallSpec::Manual("Download from https://nmap.org/"))
            }

            (Tool::Sslscan, OsFamily::Linux) => Some(InstallSpec::Package {
                apt: "sslscan",
                yum: "sslscan",
                dnf: "sslscan",
            }),
            (Tool::Sslscan, OsFamily::Macos) => Some(InstallSpec::Brew("sslscan")),
            (Tool::Sslscan, OsFamily::Windows) => Some(InstallSpec::Manual(
                "Download from https://github.com/rbsec/sslscan",
            )),

            (Tool::Nikto, OsFamily::Linux) => Some(InstallSpec::Package {
                apt: "nikto",
                yum: "nikto",
                dnf: "nikto",
            }),
            (Tool::Nikto, OsFamily::Macos) => Some(InstallSpec::Brew("nikto")),
            (Tool::Nikto, OsFamily::Windows) => Some(InstallSpec::Manual(
                "Download from https://github.com/sullo/nikto",
            )),

            (Tool::Python3, OsFamily::Linux) => Some(InstallSpec::Package {
                apt: "python3 python3-pip",
                yum: "python3 python3-pip",
                dnf: "python3 python3-pip",
            }),
            (Tool::Python3, OsFamily::Macos) => Some(InstallSpec::Brew("python3")),
            (Tool::Python3, OsFamily::Windows) => {
                Some(InstallSpec::Manual("Download from https://python.org/"))
            }

            (Tool::Java, OsFamily::Linux) => Some(InstallSpec::Package {
                apt: "openjdk-11-jdk",
                yum: "java-11-openjdk",
                dnf: "java-11-openjdk",
            }),
            (Tool::Java, OsFamily::Macos) => Some(InstallSpec::Brew("openjdk")),
            (Tool::Java, OsFamily::Windows) => {
                Some(InstallSpec::Manual("Download from https://adoptium.net/"))
            }

            (Tool::Dig, OsFamily::Linux) => Some(InstallSpec::Package {
                apt: "dnsutils",
                yum: "bind-utils",
                dnf: "bind-utils",
            }),
            (Tool::Dig, OsFamily::Macos) => Some(InstallSpec::Brew("bind")),
            (Tool::Dig, OsFamily::Windows) => {
                Some(InstallSpec::Manual("Part of BIND or use nslookup"))
            }

            (_, OsFamily::Unknown) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sslyze_uses_pip_on_every_os() {
        for os in [OsFamily::Linux, OsFamily::Macos, OsFamily::Windows] {
            assert_eq!(
                Tool::Sslyze.install_spec(os),
                Some(InstallSpec::Pip("sslyze"))
            );
        }
    }

    #[test]
    fn windows_binaries_are_manual_only() {
        for tool in [Tool::Nmap, Tool::Sslscan, Tool::Nikto, Tool::Java, Tool::Dig] {
            assert!(matches!(
                tool.install_spec(OsFamily::Windows),
                Some(InstallSpec::Manual(_))
            ));
        }
    }

    #[test]
    fn unknown_os_has_no_install_method() {
        for tool in Tool::all() {
            assert_eq!(tool.install_spec(OsFamily::Unknown), None);
        }
    }

    #[test]
    fn names_round_trip() {
        for tool in Tool::all() {
            assert_eq!(Tool::from_name(tool.name()), Some(*tool));
        }
        assert_eq!(Tool::from_name("netcat"), None);
    }

    #[test]
    fn package_lookup_respects_manager() {
        let spec = Tool::Dig.install_spec(OsFamily::Linux).unwrap();
        assert_eq!(spec.package_for(PackageManager::Apt), Some("dnsutils"));
        assert_eq!(spec.package_for(PackageManager::Yum), Some("bind-utils"));
        assert_eq!(spec.package_for(PackageManager::Brew), None);
    }
}
