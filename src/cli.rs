use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use colored::Colorize;
use dialoguer::{Input, Select};
use is_terminal::IsTerminal;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::config::{Config, CONFIG_FILE};
use crate::credentials;
use crate::error::{ExitCategory, StepError};
use crate::git::GitManager;
use crate::github::{GitHubClient, HostingApi, SimulatedHost};
use crate::pipeline::{BootstrapReport, Bootstrapper, Stage, StepObserver};
use crate::session::{validate_repo_name, IgnoreTemplate, RepoRequest, Session, Visibility};

const TOKEN_HELP_URL: &str =
    "https://docs.github.com/en/authentication/keeping-your-account-and-data-secure/managing-your-personal-access-tokens";

#[derive(Parser)]
#[command(name = "ginit")]
#[command(about = "Create a GitHub repository, seed it locally and push the first commit")]
#[command(version)]
pub struct Args {
    /// Without a subcommand, ginit asks for everything interactively
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress status messages (only show errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Directory the project folder is created in (defaults to the current directory)
    #[arg(long, global = true)]
    pub dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Explain how to create an access token
    #[command(alias = "u")]
    Usage,

    /// List the available ignore templates
    Templates,

    /// Print a shell completion script
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Write a default configuration file
    Config {
        /// Where to write it (defaults to the user config directory)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Create a repository from flags, without prompts
    #[command(alias = "r")]
    Repo {
        /// Repository name, also used as the local directory name
        #[arg(short, long)]
        name: String,

        /// Repository description
        #[arg(short, long)]
        description: Option<String>,

        /// Make the repository private
        #[arg(short, long, conflicts_with = "public")]
        private: bool,

        /// Make the repository public even if the config defaults to private
        #[arg(long)]
        public: bool,

        /// Ignore template to seed .gitignore with
        #[arg(short = 'g', long, value_enum, ignore_case = true)]
        gitignore: Option<IgnoreTemplate>,
    },
}

/// Whether the hosting service is replaced by a local sandbox
pub fn test_mode() -> bool {
    std::env::var("GINIT_TEST_MODE").ok().as_deref() == Some("1")
}

fn sandbox_root() -> PathBuf {
    std::env::var("GINIT_TEST_REMOTE_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| std::env::temp_dir().join("ginit-sandbox"))
}

pub async fn run(args: Args) -> Result<i32> {
    let command = match args.command {
        Some(Commands::Usage) => {
            print_usage();
            return Ok(ExitCategory::Success.code());
        }
        Some(Commands::Templates) => {
            for template in IgnoreTemplate::ALL {
                println!("{template}");
            }
            return Ok(ExitCategory::Success.code());
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Args::command(), "ginit", &mut std::io::stdout());
            return Ok(ExitCategory::Success.code());
        }
        Some(Commands::Config { path, force }) => {
            let path = match path {
                Some(path) => path,
                None => dirs::config_dir()
                    .map(|d| d.join("ginit").join(CONFIG_FILE))
                    .ok_or_else(|| anyhow!("Could not determine the config directory"))?,
            };
            if path.exists() && !force {
                return Err(anyhow!(
                    "Config file '{}' already exists. Use --force to overwrite.",
                    path.display()
                ));
            }
            Config::default().save_to_file(&path)?;
            info!("Created configuration file: {}", path.display());
            if !args.quiet {
                eprintln!("Created configuration file: {}", path.display());
            }
            return Ok(ExitCategory::Success.code());
        }
        other => other,
    };

    let (config, config_path) = Config::load_or_default()?;
    match &config_path {
        Some(path) => info!("Loaded configuration from {}", path.display()),
        None => debug!("No configuration file found, using defaults"),
    }

    let interactive = std::io::stdin().is_terminal();
    let request = match command {
        Some(Commands::Repo {
            name,
            description,
            private,
            public,
            gitignore,
        }) => {
            let visibility = if private {
                Visibility::Private
            } else if public {
                Visibility::Public
            } else {
                config.repository.visibility()
            };
            let template = gitignore.unwrap_or(config.repository.ignore_template);
            RepoRequest::new(&name, description.as_deref(), visibility, template)?
        }
        _ => {
            if !interactive {
                return Err(anyhow!(
                    "Interactive mode needs a terminal. Use 'ginit repo --name <NAME>' instead."
                ));
            }
            prompt_request(&config)?
        }
    };

    let token = credentials::resolve_token(&config, interactive)?;
    let parent_dir = match args.dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };

    info!(
        repo = %request.name,
        visibility = %request.visibility,
        template = %request.ignore_template,
        "Starting bootstrap"
    );
    let session = Session::new(token, request);
    let quiet = args.quiet;

    let report = tokio::task::spawn_blocking(move || -> Result<BootstrapReport> {
        let host: Box<dyn HostingApi> = if test_mode() {
            info!("[TEST MODE] Using sandbox hosting service");
            Box::new(SimulatedHost::new(sandbox_root()))
        } else {
            Box::new(GitHubClient::new(&config.github)?)
        };
        let git = GitManager::new(config.repository.default_branch.clone());
        let observer = ConsoleObserver { quiet };
        Ok(Bootstrapper::new(host.as_ref(), &git, parent_dir)
            .with_remote_name(config.repository.remote_name.clone())
            .with_observer(&observer)
            .run(session))
    })
    .await
    .context("Bootstrap task panicked")??;

    print_summary(&report, quiet);
    Ok(report.exit_code())
}

fn prompt_request(config: &Config) -> Result<RepoRequest> {
    let name: String = Input::new()
        .with_prompt("Enter your repo name")
        .validate_with(|input: &String| validate_repo_name(input.trim()).map_err(|e| e.message))
        .interact_text()
        .context("Failed to read repository name")?;

    let description: String = Input::new()
        .with_prompt("Optionally enter your repository description")
        .allow_empty(true)
        .interact_text()
        .context("Failed to read description")?;

    let visibilities = Visibility::value_variants();
    let default_visibility = visibilities
        .iter()
        .position(|v| *v == config.repository.visibility())
        .unwrap_or(0);
    let visibility = Select::new()
        .with_prompt("Public or Private?")
        .items(visibilities)
        .default(default_visibility)
        .interact()
        .context("Failed to read visibility")?;

    let default_template = IgnoreTemplate::ALL
        .iter()
        .position(|t| *t == config.repository.ignore_template)
        .unwrap_or(IgnoreTemplate::ALL.len() - 1);
    let template = Select::new()
        .with_prompt("Select your type of project")
        .items(&IgnoreTemplate::ALL)
        .default(default_template)
        .interact()
        .context("Failed to read project type")?;

    Ok(RepoRequest::new(
        &name,
        Some(&description),
        visibilities[visibility],
        IgnoreTemplate::ALL[template],
    )?)
}

fn print_usage() {
    println!();
    println!(
        "{}",
        "Please generate your GitHub personal access token with the repo scope."
            .blue()
            .bold()
    );
    println!("{}", TOKEN_HELP_URL.yellow().italic());
    println!();
    println!("Provide it through the GITHUB_PAT environment variable, a .env file,");
    println!("or paste it when ginit asks for it.");
    println!();
}

/// Progress lines on stderr
struct ConsoleObserver {
    quiet: bool,
}

impl StepObserver for ConsoleObserver {
    fn on_start(&self, stage: Stage) {
        if !self.quiet {
            eprintln!("{}", format!("{stage}...").yellow());
        }
    }

    fn on_success(&self, _stage: Stage, detail: &str) {
        if !self.quiet {
            eprintln!("{} {}", "✔".green(), detail.green().bold());
        }
    }

    fn on_warning(&self, stage: Stage, reason: &StepError) {
        eprintln!("{} {}", "!".yellow().bold(), format!("{stage}: {reason}").yellow());
    }

    fn on_failure(&self, stage: Stage, reason: &StepError) {
        eprintln!("{} {}", "✘".red().bold(), format!("{stage}: {reason}").red().bold());
    }
}

fn print_summary(report: &BootstrapReport, quiet: bool) {
    if let Some((stage, reason)) = &report.failure {
        let headline = match stage.exit_category() {
            ExitCategory::RemoteCreation => "Repository not created",
            ExitCategory::Push => "Push failed",
            _ => "Commit failed",
        };
        eprintln!("{} {}", headline.red().bold(), format!("({})", reason.kind).red());
        return;
    }

    if !report.warnings.is_empty() {
        eprintln!(
            "{}",
            format!("Finished with {} warning(s)", report.warnings.len()).yellow()
        );
    }
    if quiet {
        return;
    }
    if let Some(workspace) = report.session.workspace() {
        println!("Project ready at {}", workspace.path().display());
    }
    if let Some(commit) = report.session.commit() {
        println!("Seed commit {}", commit.short());
    }
    if let Some(url) = report.session.remote().and_then(|r| r.html_url.as_ref()) {
        println!("{}", url.cyan());
    }
    println!();
    println!("{}", "You're good to go.. Happy Hacking 🥳".yellow().bold());
    println!();
}
