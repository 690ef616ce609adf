use crate::artifacts::ArtifactNamer;
use crate::catalog::Tool;
use crate::config::Config;
use crate::convert::{ConvertOutcome, Converter};
use crate::deps::DependencyResolver;
use crate::environment::EnvironmentInfo;
use crate::executor::{self, CommandStatus};
use crate::{Result, ScanError};
use log::{info, warn};
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Identifies one cataloged scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScanKind {
    WebServer,
    SslCiphers,
    Vulners,
    ExtendedPorts,
    SslScan,
    Sslyze,
    Heartbleed,
    DnsEnumeration,
    Nikto,
}

impl ScanKind {
    /// Selector strings accepted from the CLI and the web front-end.
    pub fn from_selector(selector: &str) -> Option<ScanKind> {
        match selector {
            "web-server" => Some(ScanKind::WebServer),
            "ssl-ciphers" => Some(ScanKind::SslCiphers),
            "vulners" => Some(ScanKind::Vulners),
            "extended-ports" => Some(ScanKind::ExtendedPorts),
            "sslscan" => Some(ScanKind::SslScan),
            "sslyze" => Some(ScanKind::Sslyze),
            "heartbleed" => Some(ScanKind::Heartbleed),
            "dns" => Some(ScanKind::DnsEnumeration),
            "nikto" => Some(ScanKind::Nikto),
            _ => None,
        }
    }

    pub fn selector(&self) -> &'static str {
        match self {
            ScanKind::WebServer => "web-server",
            ScanKind::SslCiphers => "ssl-ciphers",
            ScanKind::Vulners => "vulners",
            ScanKind::ExtendedPorts => "extended-ports",
            ScanKind::SslScan => "sslscan",
            ScanKind::Sslyze => "sslyze",
            ScanKind::Heartbleed => "heartbleed",
            ScanKind::DnsEnumeration => "dns",
            ScanKind::Nikto => "nikto",
        }
    }
}

/// One declared unit of scanning work.
#[derive(Debug, Clone, Copy)]
pub struct ScanTask {
    pub kind: ScanKind,
    /// Artifact label; file names become `{date}-{label}-{n}.{ext}`.
    pub label: &'static str,
    pub title: &'static str,
    pub tool: Tool,
    /// Resource-heavy scans get the extended budget.
    pub extended: bool,
    /// Whether the XML artifact is post-processed into HTML.
    pub convert: bool,
}

/// The scan catalog in execution order. `run_all` walks this exact sequence;
/// full-port and DNS brute force scans carry the extended timeout.
pub const CATALOG: [ScanTask; 9] = [
    ScanTask {
        kind: ScanKind::WebServer,
        label: "nmap-web-server",
        title: "NMap Web Server Scan",
        tool: Tool::Nmap,
        extended: false,
        convert: true,
    },
    ScanTask {
        kind: ScanKind::SslCiphers,
        label: "nmap-ssl",
        title: "NMap SSL Cipher Scan",
        tool: Tool::Nmap,
        extended: false,
        convert: true,
    },
    ScanTask {
        kind: ScanKind::Vulners,
        label: "nmap-vulners",
        title: "NMap Vulners Scan",
        tool: Tool::Nmap,
        extended: false,
        convert: true,
    },
    ScanTask {
        kind: ScanKind::ExtendedPorts,
        label: "nmap-extended-ports",
        title: "Extended Port Scan",
        tool: Tool::Nmap,
        extended: true,
        convert: true,
    },
    ScanTask {
        kind: ScanKind::SslScan,
        label: "sslscan",
        title: "SSLScan",
        tool: Tool::Sslscan,
        extended: false,
        convert: false,
    },
    ScanTask {
        kind: ScanKind::Sslyze,
        label: "sslyze",
        title: "SSLyze",
        tool: Tool::Sslyze,
        extended: false,
        convert: false,
    },
    ScanTask {
        kind: ScanKind::Heartbleed,
        label: "nmap-ssl-heartbleed",
        title: "Heartbleed Test",
        tool: Tool::Nmap,
        extended: false,
        convert: false,
    },
    ScanTask {
        kind: ScanKind::DnsEnumeration,
        label: "dns-enumeration",
        title: "DNS Enumeration",
        tool: Tool::Dig,
        extended: false,
        convert: false,
    },
    ScanTask {
        kind: ScanKind::Nikto,
        label: "nikto",
        title: "Nikto",
        tool: Tool::Nikto,
        extended: false,
        convert: false,
    },
];

pub fn task_for(kind: ScanKind) -> &'static ScanTask {
    CATALOG
        .iter()
        .find(|task| task.kind == kind)
        .expect("every ScanKind is cataloged")
}

/// Terminal state of one task run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Completed,
    /// Prerequisite tool missing; the task never ran.
    Skipped { tool: String },
    Failed(String),
    TimedOut(u64),
}

/// Per-task report returned by `run_one` and aggregated by `run_all`.
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    pub kind: ScanKind,
    pub title: &'static str,
    pub status: TaskStatus,
    /// Files actually written for this task, in creation order.
    pub artifacts: Vec<PathBuf>,
    pub duration: Duration,
}

impl TaskOutcome {
    pub fn summary(&self) -> String {
        match &self.status {
            TaskStatus::Completed => {
                let files: Vec<String> = self
                    .artifacts
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect();
                format!("{} completed: {}", self.title, files.join(", "))
            }
            TaskStatus::Skipped { tool } => {
                format!("{} skipped: {} is not installed", self.title, tool)
            }
            TaskStatus::Failed(reason) => format!("{} failed: {}", self.title, reason),
            TaskStatus::TimedOut(secs) => {
                format!("{} timed out after {} seconds", self.title, secs)
            }
        }
    }
}

/// Runs cataloged scans against a target, allocating artifact names and
/// post-processing output. Tasks run strictly sequentially; the wrapped
/// scanners are resource-hungry and must not contend with each other.
pub struct Orchestrator {
    config: Config,
    resolver: DependencyResolver,
    namer: ArtifactNamer,
    converter: Converter,
}

async fn append(path: &std::path::Path, data: &str) -> Result<()> {
    use tokio::io::AsyncWriteExt;

    let mut file = tokio::fs::OpenOptions::new()
        .append(true)
        .open(path)
        .await?;
    file.write_all(data.as_bytes()).await?;
    Ok(())
}

/// An empty or whitespace-carrying domain never reaches an argv.
pub fn validate_domain(domain: &str) -> Result<()> {
    if domain.trim().is_empty() {
        return Err(ScanError::InvalidTarget("Domain cannot be empty".to_string()));
    }
    if domain.chars().any(char::is_whitespace) {
        return Err(ScanError::InvalidTarget(format!(
            "Domain contains whitespace: {}",
            domain
        )));
    }
    Ok(())
}

impl Orchestrator {
    pub fn new(config: Config, env: EnvironmentInfo) -> Result<Self> {
        std::fs::create_dir_all(&config.directories.scan_dir)?;

        let resolver = DependencyResolver::new(env, config.install_timeout());
        let namer = ArtifactNamer::new(config.directories.scan_dir.clone());
        let converter = Converter::new(config.directories.reports_dir.clone());

        Ok(Self {
            config,
            resolver,
            namer,
            converter,
        })
    }

    pub fn resolver(&self) -> &DependencyResolver {
        &self.resolver
    }

    pub fn namer(&self) -> &ArtifactNamer {
        &self.namer
    }

    fn task_timeout(&self, task: &ScanTask) -> Duration {
        if task.extended {
            self.config.extended_timeout()
        } else {
            self.config.default_timeout()
        }
    }

    /// Run a single cataloged task. Failures are contained here: the returned
    /// outcome records them, and nothing propagates to the caller.
    pub async fn run_one(&self, task: &ScanTask, domain: &str, port: u16) -> TaskOutcome {
        let started = Instant::now();
        info!("Starting {}", task.title);

        if !self.resolver.check_tool(task.tool) {
            warn!("{} skipped: {} not installed", task.title, task.tool.name());
            return TaskOutcome {
                kind: task.kind,
                title: task.title,
                status: TaskStatus::Skipped {
                    tool: task.tool.name().to_string(),
                },
                artifacts: Vec::new(),
                duration: started.elapsed(),
            };
        }

        let (status, artifacts) = match task.kind {
            ScanKind::WebServer => {
                let extra = [
                    "-sC",
                    "-sV",
                    "-Pn",
                    "-v1",
                    "--script=banner,http-headers",
                ];
                self.run_nmap_xml(task, &extra, domain).await
            }
            ScanKind::SslCiphers => {
                let port_arg = port.to_string();
                let extra = ["-v1", "-p", port_arg.as_str(), "--script=ssl-enum-ciphers"];
                self.run_nmap_xml(task, &extra, domain).await
            }
            ScanKind::Vulners => {
                let extra = ["-sV", "-Pn", "-v1", "--script=vulners.nse"];
                self.run_nmap_xml(task, &extra, domain).await
            }
            ScanKind::ExtendedPorts => {
                let extra = ["-Pn", "-p-", "-vv"];
                self.run_nmap_xml(task, &extra, domain).await
            }
            ScanKind::SslScan => {
                let args = vec!["--no-failed".to_string(), domain.to_string()];
                self.run_capture(task, "sslscan", &args, None).await
            }
            ScanKind::Sslyze => {
                let args = vec![
                    "-m".to_string(),
                    "sslyze".to_string(),
                    "--tlsv1_2".to_string(),
                    "--tlsv1_3".to_string(),
                    "--sslv3".to_string(),
                    "--tlsv1".to_string(),
                    "--tlsv1_1".to_string(),
                    "--heartbleed".to_string(),
                    "--certinfo".to_string(),
                    "--http_headers".to_string(),
                    "--reneg".to_string(),
                    "--openssl_ccs".to_string(),
                    "--robot".to_string(),
                    "--compression".to_string(),
                    format!("{}:{}", domain, port),
                ];
                self.run_capture(task, "python3", &args, None).await
            }
            ScanKind::Heartbleed => {
                let args = vec![
                    "-p".to_string(),
                    port.to_string(),
                    "--script".to_string(),
                    "ssl-heartbleed".to_string(),
                    domain.to_string(),
                ];
                let preamble = "If vulnerable, you will see 'State: VULNERABLE' in the scan results\n\
                                ----------------------------------------------------------\n";
                self.run_capture(task, "nmap", &args, Some(preamble)).await
            }
            ScanKind::DnsEnumeration => self.run_dns_enumeration(domain).await,
            ScanKind::Nikto => self.run_nikto(task, domain, port).await,
        };

        let outcome = TaskOutcome {
            kind: task.kind,
            title: task.title,
            status,
            artifacts,
            duration: started.elapsed(),
        };
        info!("{}", outcome.summary());
        outcome
    }

    /// Run every cataloged task in declared order. No task's failure aborts
    /// the remaining tasks; each outcome is recorded independently.
    pub async fn run_all(&self, domain: &str, port: u16) -> Vec<TaskOutcome> {
        let mut outcomes = Vec::with_capacity(CATALOG.len());

        for task in &CATALOG {
            outcomes.push(self.run_one(task, domain, port).await);
        }

        outcomes
    }

    /// nmap invocation writing XML, with HTML post-processing when declared.
    async fn run_nmap_xml(
        &self,
        task: &ScanTask,
        extra_args: &[&str],
        domain: &str,
    ) -> (TaskStatus, Vec<PathBuf>) {
        // Name allocation happens immediately before the tool writes.
        let base = self.namer.next_name(task.label);
        let xml_path = self.namer.path_for(&base, "xml");
        let stylesheet = self.config.directories.reports_dir.join("nmap.xsl");

        let mut args: Vec<String> = extra_args.iter().map(|s| s.to_string()).collect();
        args.push("-oX".to_string());
        args.push(xml_path.to_string_lossy().to_string());
        args.push("--stylesheet".to_string());
        args.push(stylesheet.to_string_lossy().to_string());
        args.push(domain.to_string());

        let result = executor::execute("nmap", &args, self.task_timeout(task)).await;
        match result.status {
            CommandStatus::Success => {
                let mut artifacts = vec![xml_path.clone()];

                if task.convert {
                    match self.converter.convert_to_html(&xml_path, domain).await {
                        ConvertOutcome::Converted(_) => {
                            artifacts.push(xml_path.with_extension("html"));
                        }
                        // Degraded, not fatal: the XML artifact stands alone.
                        ConvertOutcome::Unavailable => {
                            warn!(
                                "No HTML report produced for {}; XML is available",
                                xml_path.display()
                            );
                        }
                    }
                }

                (TaskStatus::Completed, artifacts)
            }
            CommandStatus::Timeout(secs) => (TaskStatus::TimedOut(secs), Vec::new()),
            _ => (TaskStatus::Failed(result.diagnostic()), Vec::new()),
        }
    }

    /// Tool invocation whose stdout becomes a `.txt` artifact. A preamble,
    /// when given, is written before the tool runs so the artifact documents
    /// the attempt even if the tool fails.
    async fn run_capture(
        &self,
        task: &ScanTask,
        program: &str,
        args: &[String],
        preamble: Option<&str>,
    ) -> (TaskStatus, Vec<PathBuf>) {
        let base = self.namer.next_name(task.label);
        let txt_path = self.namer.path_for(&base, "txt");
        let mut artifacts = Vec::new();

        if let Some(header) = preamble {
            if let Err(e) = tokio::fs::write(&txt_path, header).await {
                return (TaskStatus::Failed(e.to_string()), artifacts);
            }
            artifacts.push(txt_path.clone());
        }

        let result = executor::execute(program, args, self.task_timeout(task)).await;
        match result.status {
            CommandStatus::Success => {
                let write = if preamble.is_some() {
                    append(&txt_path, &result.stdout).await
                } else {
                    tokio::fs::write(&txt_path, &result.stdout)
                        .await
                        .map_err(ScanError::Io)
                };

                match write {
                    Ok(()) => {
                        if preamble.is_none() {
                            artifacts.push(txt_path);
                        }
                        (TaskStatus::Completed, artifacts)
                    }
                    Err(e) => (TaskStatus::Failed(e.to_string()), artifacts),
                }
            }
            CommandStatus::Timeout(secs) => (TaskStatus::TimedOut(secs), artifacts),
            _ => (TaskStatus::Failed(result.diagnostic()), artifacts),
        }
    }

    /// Three-part DNS enumeration: full record dump, zone-transfer attempt,
    /// then subdomain brute force. Each part gets its own freshly allocated
    /// artifact; a failing part does not stop the later ones.
    async fn run_dns_enumeration(&self, domain: &str) -> (TaskStatus, Vec<PathBuf>) {
        let mut artifacts = Vec::new();
        let mut failures = Vec::new();

        let record_header = "View all the record types (A, MX, NS, etc.)\n\
                             ------------------------------------------------------\n";
        let dig_any = vec![domain.to_string(), "-t".to_string(), "any".to_string()];
        self.dns_step(
            "dig-record-types",
            record_header,
            "dig",
            &dig_any,
            self.config.default_timeout(),
            &mut artifacts,
            &mut failures,
        )
        .await;

        let zone_header = "Request to get a copy of the zone transfer from the primary server\n\
                           (Transfer failed. means the application PASS the test)\n\
                           -----------------------------------------------------\n";
        let dig_axfr = vec![domain.to_string(), "-t".to_string(), "axfr".to_string()];
        self.dns_step(
            "dig-zone-transfer",
            zone_header,
            "dig",
            &dig_axfr,
            self.config.default_timeout(),
            &mut artifacts,
            &mut failures,
        )
        .await;

        if self.resolver.check_tool(Tool::Nmap) {
            info!("Starting DNS brute force scan (this may take several minutes)");
            let brute_header = "Nmap brute force subdomain enumeration\n\
                                ------------------------------------------------------\n";
            let brute = vec![
                "--script".to_string(),
                "dns-brute".to_string(),
                domain.to_string(),
            ];
            self.dns_step(
                "nmap-DNS-brute",
                brute_header,
                "nmap",
                &brute,
                self.config.extended_timeout(),
                &mut artifacts,
                &mut failures,
            )
            .await;
        } else {
            failures.push("subdomain brute force skipped: nmap is not installed".to_string());
        }

        let status = if failures.is_empty() {
            TaskStatus::Completed
        } else {
            TaskStatus::Failed(failures.join("; "))
        };
        (status, artifacts)
    }

    #[allow(clippy::too_many_arguments)]
    async fn dns_step(
        &self,
        label: &str,
        header: &str,
        program: &str,
        args: &[String],
        deadline: Duration,
        artifacts: &mut Vec<PathBuf>,
        failures: &mut Vec<String>,
    ) {
        let base = self.namer.next_name(label);
        let txt_path = self.namer.path_for(&base, "txt");

        if let Err(e) = tokio::fs::write(&txt_path, header).await {
            failures.push(format!("{}: {}", label, e));
            return;
        }
        artifacts.push(txt_path.clone());

        let result = executor::execute(program, args, deadline).await;
        if result.is_success() {
            if let Err(e) = append(&txt_path, &result.stdout).await {
                failures.push(format!("{}: {}", label, e));
            }
        } else {
            failures.push(format!("{}: {}", label, result.diagnostic()));
        }
    }

    /// Nikto writes its own HTML report through `-output`.
    async fn run_nikto(
        &self,
        task: &ScanTask,
        domain: &str,
        port: u16,
    ) -> (TaskStatus, Vec<PathBuf>) {
        let base = self.namer.next_name(task.label);
        let html_path = self.namer.path_for(&base, "html");

        let args = vec![
            "-C".to_string(),
            "all".to_string(),
            "-ssl".to_string(),
            port.to_string(),
            "-Format".to_string(),
            "HTML".to_string(),
            "-output".to_string(),
            html_path.to_string_lossy().to_string(),
            "-Save".to_string(),
            "niktosave".to_string(),
            "-host".to_string(),
            domain.to_string(),
        ];

        let result = executor::execute("nikto", &args, self.task_timeout(task)).await;
        match result.status {
            CommandStatus::Success => (TaskStatus::Completed, vec![html_path]),
            CommandStatus::Timeout(secs) => (TaskStatus::TimedOut(secs), Vec::new()),
            _ => (TaskStatus::Failed(result.diagnostic()), Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_in_declared_order() {
        let kinds: Vec<ScanKind> = CATALOG.iter().map(|t| t.kind).collect();
        assert_eq!(kinds[0], ScanKind::WebServer);
        assert_eq!(kinds[3], ScanKind::ExtendedPorts);
        assert_eq!(kinds[8], ScanKind::Nikto);
        assert_eq!(kinds.len(), 9);
    }

    #[test]
    fn long_running_tasks_use_extended_budget() {
        assert!(task_for(ScanKind::ExtendedPorts).extended);
        assert!(!task_for(ScanKind::WebServer).extended);
    }

    #[test]
    fn selectors_round_trip() {
        for task in &CATALOG {
            assert_eq!(ScanKind::from_selector(task.kind.selector()), Some(task.kind));
        }
        assert_eq!(ScanKind::from_selector("bogus"), None);
    }

    #[test]
    fn empty_domain_is_rejected() {
        assert!(validate_domain("").is_err());
        assert!(validate_domain("   ").is_err());
        assert!(validate_domain("exa mple.com").is_err());
        assert!(validate_domain("example.com").is_ok());
    }
}
