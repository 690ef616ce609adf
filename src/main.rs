use env_logger::Env;
use std::process;
use webrecon::{
    artifacts,
    cli::{Cli, Commands},
    catalog::Tool,
    config::Config,
    deps::InstallOutcome,
    display::DisplayManager,
    environment,
    session::ScanSelector,
    tasks::{self, Orchestrator},
    utils::format::format_bytes,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    let log_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_timestamp_secs()
        .init();

    let display = DisplayManager::with_quiet(cli.quiet);

    display.print_banner("WEBRECON - Web Server Reconnaissance");
    if !cli.quiet {
        display.print_warning("Ensure you have permission before scanning any target.");
        println!();
    }

    let mut config = if let Some(config_path) = &cli.config {
        match Config::load_from_file(&config_path.to_string_lossy()) {
            Ok(config) => {
                display.print_success(&format!(
                    "Loaded configuration from {}",
                    config_path.display()
                ));
                config
            }
            Err(e) => {
                display.print_warning(&format!(
                    "Failed to load configuration: {}, using defaults",
                    e
                ));
                Config::default()
            }
        }
    } else {
        Config::default()
    };

    if let Some(output) = &cli.output {
        config.directories.scan_dir = output.clone();
    }

    let env = environment::detect_environment();

    let exit_code = match &cli.command {
        Some(Commands::Check) => run_check(&config, env, &display),
        Some(Commands::Install { tool }) => run_install(&config, env, &display, tool).await,
        Some(Commands::Guide) => run_guide(&config, env),
        Some(Commands::Results) => run_results(&config, &display),
        None => run_scan(&config, env, &display, &cli).await,
    };

    process::exit(exit_code);
}

fn run_check(config: &Config, env: environment::EnvironmentInfo, display: &DisplayManager) -> i32 {
    let resolver =
        webrecon::deps::DependencyResolver::new(env, config.install_timeout());

    display.print_status(&format!(
        "Environment: {} / {}",
        env.os.name(),
        env.package_manager.name()
    ));

    let mut missing = 0;
    for (tool, installed) in resolver.check_all() {
        if installed {
            display.print_success(&format!("{} is installed", tool.name()));
        } else {
            display.print_warning(&format!("{} is NOT installed", tool.name()));
            missing += 1;
        }
    }

    if missing > 0 {
        display.print_status(&format!(
            "{} tool(s) missing. Run `webrecon install <tool>` or `webrecon guide`.",
            missing
        ));
        1
    } else {
        0
    }
}

async fn run_install(
    config: &Config,
    env: environment::EnvironmentInfo,
    display: &DisplayManager,
    tool_name: &str,
) -> i32 {
    let Some(tool) = Tool::from_name(tool_name) else {
        display.print_error(&format!("Unknown tool: {}", tool_name));
        return 2;
    };

    let resolver = webrecon::deps::DependencyResolver::new(env, config.install_timeout());

    if resolver.check_tool(tool) {
        display.print_success(&format!("{} is already installed", tool.name()));
        return 0;
    }

    let spinner = display.create_spinner(&format!("Installing {}...", tool.name()));
    let outcome = resolver.install(tool).await;
    spinner.finish_and_clear();

    match outcome {
        InstallOutcome::Installed => {
            display.print_success(&format!("{} installed", tool.name()));
            0
        }
        InstallOutcome::ManualRequired(instructions) => {
            display.print_warning(&format!(
                "{} must be installed manually: {}",
                tool.name(),
                instructions
            ));
            1
        }
        InstallOutcome::Unsupported => {
            display.print_error(&format!(
                "No automated installation method for {} on this system",
                tool.name()
            ));
            1
        }
        InstallOutcome::Failed(reason) => {
            display.print_error(&format!("Installation of {} failed: {}", tool.name(), reason));
            1
        }
    }
}

fn run_guide(config: &Config, env: environment::EnvironmentInfo) -> i32 {
    let resolver = webrecon::deps::DependencyResolver::new(env, config.install_timeout());
    print!("{}", resolver.installation_guide());
    0
}

fn run_results(config: &Config, display: &DisplayManager) -> i32 {
    match artifacts::list_results(&config.directories.scan_dir) {
        Ok(files) if files.is_empty() => {
            display.print_status("No scan results found");
            0
        }
        Ok(files) => {
            for file in files {
                println!(
                    "{:>10}  {}  {}",
                    format_bytes(file.size),
                    file.modified.format("%Y-%m-%d %H:%M:%S"),
                    file.name
                );
            }
            0
        }
        Err(e) => {
            display.print_error(&format!("Failed to list results: {}", e));
            1
        }
    }
}

async fn run_scan(
    config: &Config,
    env: environment::EnvironmentInfo,
    display: &DisplayManager,
    cli: &Cli,
) -> i32 {
    let Some(domain) = cli.domain.as_deref() else {
        display.print_error("A target domain is required. See --help.");
        return 2;
    };

    if let Err(e) = tasks::validate_domain(domain) {
        display.print_error(&e.to_string());
        return 2;
    }

    let Some(selector) = ScanSelector::parse(&cli.task) else {
        display.print_error(&format!(
            "Unknown task: {}. Valid selectors: all, {}",
            cli.task,
            tasks::CATALOG
                .iter()
                .map(|t| t.kind.selector())
                .collect::<Vec<_>>()
                .join(", ")
        ));
        return 2;
    };

    let orchestrator = match Orchestrator::new(config.clone(), env) {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            display.print_error(&format!("Failed to initialize scanner: {}", e));
            return 1;
        }
    };

    let missing = orchestrator.resolver().missing();
    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(|t| t.name()).collect();
        display.print_warning(&format!(
            "Missing tools: {}. Their scans will be skipped.",
            names.join(", ")
        ));
    }

    display.print_status(&format!(
        "Scanning {}:{} ({})",
        domain,
        cli.port,
        selector.name()
    ));

    let spinner = display.create_spinner("Scan in progress...");
    let outcomes = match selector {
        ScanSelector::All => orchestrator.run_all(domain, cli.port).await,
        ScanSelector::One(kind) => {
            vec![
                orchestrator
                    .run_one(tasks::task_for(kind), domain, cli.port)
                    .await,
            ]
        }
    };
    spinner.finish_and_clear();

    for outcome in &outcomes {
        display.print_outcome(outcome);
    }
    display.print_session_summary(&outcomes);

    let any_failed = outcomes.iter().any(|o| {
        matches!(
            o.status,
            tasks::TaskStatus::Failed(_) | tasks::TaskStatus::TimedOut(_)
        )
    });

    if any_failed {
        1
    } else {
        0
    }
}
