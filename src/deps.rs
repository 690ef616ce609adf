use crate::catalog::{InstallSpec, Tool};
use crate::environment::{self, EnvironmentInfo, PackageManager};
use crate::executor::{self, CommandStatus};
use log::{info, warn};
use std::time::Duration;

/// Result of one installation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed,
    /// The catalog only offers a manual link for this OS; nothing was run.
    ManualRequired(String),
    /// No automated method exists for this environment.
    Unsupported,
    Failed(String),
}

/// Maps cataloged tools to installed/missing state and drives installs.
///
/// The resolver is a pure function of tool name to outcome; interactive
/// confirmation flows live in the CLI layer above it.
pub struct DependencyResolver {
    env: EnvironmentInfo,
    install_timeout: Duration,
}

impl DependencyResolver {
    pub fn new(env: EnvironmentInfo, install_timeout: Duration) -> Self {
        Self {
            env,
            install_timeout,
        }
    }

    pub fn environment(&self) -> EnvironmentInfo {
        self.env
    }

    /// Installed/missing state for every cataloged tool, in catalog order.
    pub fn check_all(&self) -> Vec<(Tool, bool)> {
        Tool::all()
            .iter()
            .map(|tool| (*tool, self.check_tool(*tool)))
            .collect()
    }

    pub fn check_tool(&self, tool: Tool) -> bool {
        if tool.is_python_module() {
            environment::python_module_exists(tool.name())
        } else {
            environment::command_exists(tool.name())
        }
    }

    pub fn missing(&self) -> Vec<Tool> {
        self.check_all()
            .into_iter()
            .filter(|(_, installed)| !installed)
            .map(|(tool, _)| tool)
            .collect()
    }

    /// Attempt to install a tool using the method the catalog declares for
    /// the current environment. Never prompts; every command is bounded by
    /// the install timeout.
    pub async fn install(&self, tool: Tool) -> InstallOutcome {
        let Some(spec) = tool.install_spec(self.env.os) else {
            return InstallOutcome::Unsupported;
        };

        info!("Installing {} ({})", tool.name(), tool.description());

        match spec {
            InstallSpec::Manual(instructions) => {
                InstallOutcome::ManualRequired(instructions.to_string())
            }
            // A declared pip identifier always wins over a package manager.
            InstallSpec::Pip(package) => {
                let args = vec!["install".to_string(), package.to_string()];
                self.run_install_step("pip3", &args).await
            }
            InstallSpec::Package { .. } | InstallSpec::Brew(_) => {
                let pm = self.env.package_manager;
                if pm == PackageManager::Unknown {
                    return InstallOutcome::Unsupported;
                }
                let Some(package) = spec.package_for(pm) else {
                    return InstallOutcome::Unsupported;
                };

                self.install_via_package_manager(pm, package).await
            }
        }
    }

    async fn install_via_package_manager(
        &self,
        pm: PackageManager,
        package: &str,
    ) -> InstallOutcome {
        // A stale or broken apt index must not silently proceed to the
        // package install, so a failed refresh aborts the whole attempt.
        if pm == PackageManager::Apt {
            let args = vec!["apt-get".to_string(), "update".to_string()];
            match self.run_install_step("sudo", &args).await {
                InstallOutcome::Installed => {}
                InstallOutcome::Failed(reason) => {
                    warn!("Package index refresh failed: {}", reason);
                    return InstallOutcome::Failed(format!(
                        "Failed to update package list: {}",
                        reason
                    ));
                }
                other => return other,
            }
        }

        let mut args: Vec<String> = match pm {
            PackageManager::Apt => vec![
                "apt-get".to_string(),
                "install".to_string(),
                "-y".to_string(),
            ],
            PackageManager::Yum => vec!["yum".to_string(), "install".to_string(), "-y".to_string()],
            PackageManager::Dnf => vec!["dnf".to_string(), "install".to_string(), "-y".to_string()],
            PackageManager::Brew => vec!["install".to_string()],
            PackageManager::Unknown => return InstallOutcome::Unsupported,
        };
        args.extend(package.split_whitespace().map(String::from));

        let program = if pm == PackageManager::Brew { "brew" } else { "sudo" };
        self.run_install_step(program, &args).await
    }

    async fn run_install_step(&self, program: &str, args: &[String]) -> InstallOutcome {
        let result = executor::execute(program, args, self.install_timeout).await;

        match result.status {
            CommandStatus::Success => InstallOutcome::Installed,
            CommandStatus::Timeout(_) => InstallOutcome::Failed("timed out".to_string()),
            CommandStatus::ToolFailure(_) | CommandStatus::ExecutionError(_) => {
                InstallOutcome::Failed(result.diagnostic())
            }
        }
    }

    /// Per-tool, per-OS installation instructions as human-readable text.
    pub fn installation_guide(&self) -> String {
        let mut guide = String::new();

        guide.push_str(&format!(
            "Operating System: {}\nPackage Manager: {}\n\n",
            self.env.os.name().to_uppercase(),
            self.env.package_manager.name().to_uppercase()
        ));

        for tool in Tool::all() {
            guide.push_str(&format!(
                "{}: {}\n",
                tool.name().to_uppercase(),
                tool.description()
            ));

            match tool.install_spec(self.env.os) {
                Some(InstallSpec::Pip(package)) => {
                    guide.push_str(&format!("  pip3 install {}\n", package));
                }
                Some(InstallSpec::Manual(instructions)) => {
                    guide.push_str(&format!("  Manual installation: {}\n", instructions));
                }
                Some(InstallSpec::Brew(package)) => {
                    guide.push_str(&format!("  brew: {}\n", package));
                }
                Some(InstallSpec::Package { apt, yum, dnf }) => {
                    guide.push_str(&format!("  apt: {}\n", apt));
                    guide.push_str(&format!("  yum: {}\n", yum));
                    guide.push_str(&format!("  dnf: {}\n", dnf));
                }
                None => {
                    guide.push_str(&format!(
                        "  No installation method available for {}\n",
                        self.env.os.name()
                    ));
                }
            }
            guide.push('\n');
        }

        guide
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::OsFamily;

    fn resolver(os: OsFamily, pm: PackageManager) -> DependencyResolver {
        DependencyResolver::new(
            EnvironmentInfo {
                os,
                package_manager: pm,
            },
            Duration::from_secs(300),
        )
    }

    #[tokio::test]
    async fn manual_only_entries_never_run_a_command() {
        let r = resolver(OsFamily::Windows, PackageManager::Unknown);
        let outcome = r.install(Tool::Nmap).await;
        assert!(matches!(outcome, InstallOutcome::ManualRequired(_)));
    }

    #[tokio::test]
    async fn unknown_os_is_unsupported() {
        let r = resolver(OsFamily::Unknown, PackageManager::Unknown);
        assert_eq!(r.install(Tool::Nmap).await, InstallOutcome::Unsupported);
    }

    #[tokio::test]
    async fn missing_package_manager_is_unsupported() {
        let r = resolver(OsFamily::Linux, PackageManager::Unknown);
        assert_eq!(r.install(Tool::Sslscan).await, InstallOutcome::Unsupported);
    }

    #[test]
    fn check_all_covers_whole_catalog() {
        let r = resolver(OsFamily::Linux, PackageManager::Apt);
        let statuses = r.check_all();
        assert_eq!(statuses.len(), Tool::all().len());
    }

    #[test]
    fn guide_mentions_every_tool() {
        let r = resolver(OsFamily::Linux, PackageManager::Apt);
        let guide = r.installation_guide();
        for tool in Tool::all() {
            assert!(guide.contains(&tool.name().to_uppercase()));
        }
        assert!(guide.contains("pip3 install sslyze"));
    }
}
