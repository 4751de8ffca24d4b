//! CLI entry point for kyros

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use dialoguer::{Confirm, Input};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info};

use kyros_core::config::{Config, ConfigLoader};
use kyros_core::logging;
use kyros_counselor::Counselor;
use kyros_providers::{
    CompletionProvider, OpenAiClient, ProviderError, RetryPolicy, RetryingProvider,
};

#[derive(Parser)]
#[command(name = "kyros")]
#[command(about = "A 24/7 college counselor in your terminal")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration directory
    #[arg(short, long, global = true)]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize kyros configuration
    Onboard,
    /// Start an interactive counseling conversation
    Chat {
        /// Model to use
        #[arg(short, long)]
        model: Option<String>,
    },
    /// Show configuration status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_loader = if let Some(dir) = cli.config_dir {
        ConfigLoader::with_dir(dir)
    } else {
        ConfigLoader::new()
    };

    match cli.command {
        Commands::Onboard => run_onboard(&config_loader)?,
        Commands::Chat { model } => run_chat(&config_loader, model).await?,
        Commands::Status => run_status(&config_loader)?,
    }

    Ok(())
}

fn load_config_or_exit(loader: &ConfigLoader) -> Config {
    match loader.load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", style("Configuration error:").bold().red(), e);
            eprintln!("Run {} to set up kyros.", style("kyros onboard").bold());
            std::process::exit(1);
        }
    }
}

fn build_provider(
    config: &Config,
    model_override: Option<String>,
) -> Result<Arc<dyn CompletionProvider>> {
    let model = model_override.unwrap_or_else(|| config.counselor.model.clone());
    let client = OpenAiClient::new(
        config.provider.api_key.clone(),
        config.provider.api_base.clone(),
        model,
        config.provider.timeout_secs,
        Some(config.provider.extra_headers.clone()),
    )?;
    let policy = RetryPolicy::from(&config.provider.retry);
    Ok(Arc::new(RetryingProvider::new(client, policy)))
}

/// Run the onboard wizard
fn run_onboard(loader: &ConfigLoader) -> Result<()> {
    println!("{}", style("Welcome to KYROS!").bold().cyan());
    println!("Let's set up your configuration.\n");

    let config_path = loader.config_dir().join("config.json");
    if config_path.exists() {
        let overwrite = Confirm::new()
            .with_prompt("Configuration already exists. Overwrite?")
            .default(false)
            .interact()?;
        if !overwrite {
            println!("Onboard cancelled.");
            return Ok(());
        }
    }

    let api_key: String = Input::new()
        .with_prompt("API key for your OpenAI-compatible provider")
        .interact_text()?;

    let mut config = Config::default();
    let model: String = Input::new()
        .with_prompt("Model")
        .default(config.counselor.model.clone())
        .interact_text()?;

    config.provider.api_key = api_key;
    config.counselor.model = model;
    loader.save(&config)?;

    println!(
        "\n{} Configuration written to {}",
        style("Done.").bold().green(),
        config_path.display()
    );
    println!("Start a conversation with {}.", style("kyros chat").bold());
    Ok(())
}

/// Run the interactive chat loop
async fn run_chat(loader: &ConfigLoader, model: Option<String>) -> Result<()> {
    let config = load_config_or_exit(loader);
    let _guard = logging::init_logging(&config.logging);

    let selected_model = model
        .clone()
        .unwrap_or_else(|| config.counselor.model.clone());
    let provider = build_provider(&config, model)?;
    let mut counselor = Counselor::new(provider, &config);

    info!("Chat started with model {}", selected_model);
    println!("{}", style("KYROS — 24/7 College Counselor").bold().cyan());
    println!(
        "Ask anything about admissions, applications, or planning.\n\
         {} lists questions to fill in your profile, {} starts over, \
         {} or {} leaves.\n",
        style("/probe").bold(),
        style("/new").bold(),
        style("/quit").bold(),
        style("exit").bold()
    );

    loop {
        let line: String = match Input::new()
            .with_prompt("you")
            .allow_empty(true)
            .interact_text()
        {
            Ok(line) => line,
            // EOF or closed terminal ends the conversation
            Err(_) => break,
        };
        let line = line.trim().to_string();

        match line.as_str() {
            "" => continue,
            "/quit" | "exit" => break,
            "/new" => {
                counselor.reset();
                println!("{}", style("Started a new conversation.").dim());
                continue;
            }
            "/probe" => {
                let spinner = ProgressBar::new_spinner();
                spinner.set_style(ProgressStyle::default_spinner());
                spinner.set_message("Thinking of questions...");
                spinner.enable_steady_tick(Duration::from_millis(100));

                tokio::select! {
                    result = counselor.probing_questions() => {
                        spinner.finish_and_clear();
                        match result {
                            Ok(questions) => {
                                println!(
                                    "{}",
                                    style("To tailor my advice, could you tell me:").bold().cyan()
                                );
                                for (i, question) in questions.iter().enumerate() {
                                    println!("  {}. {}", i + 1, question);
                                }
                                println!();
                            }
                            Err(e) => report_provider_error(&e),
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        spinner.finish_and_clear();
                        println!("{}", style("Request cancelled.").dim());
                    }
                }
                continue;
            }
            _ => {}
        }

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(ProgressStyle::default_spinner());
        spinner.set_message("Thinking...");
        spinner.enable_steady_tick(Duration::from_millis(100));

        tokio::select! {
            result = counselor.submit_user_message(&line) => {
                spinner.finish_and_clear();
                match result {
                    Ok(reply) => {
                        println!("{} {}\n", style("kyros:").bold().cyan(), reply);
                    }
                    Err(e) => report_provider_error(&e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                // Drops the in-flight request; the transcript keeps the
                // user turn and stays usable.
                spinner.finish_and_clear();
                println!("{}", style("Request cancelled.").dim());
            }
        }
    }

    println!("{}", style("Good luck with your applications!").cyan());
    Ok(())
}

fn report_provider_error(e: &ProviderError) {
    error!("Provider request failed: {}", e);
    match e {
        ProviderError::Transport(_) => {
            println!(
                "{} {}\n{}",
                style("Connection problem:").bold().yellow(),
                e,
                style("Your message is kept — just try sending again.").dim()
            );
        }
        ProviderError::RateLimit { retry_after } => {
            let hint = match retry_after {
                Some(seconds) => format!("Wait about {} seconds, then resend.", seconds),
                None => "Wait a moment, then resend.".to_string(),
            };
            println!(
                "{} {}\n{}",
                style("Rate limited:").bold().yellow(),
                e,
                style(hint).dim()
            );
        }
        ProviderError::Auth(_) => {
            println!(
                "{} {}\n{}",
                style("Authentication failed:").bold().red(),
                e,
                style("Further requests will fail the same way. Check your API key and run kyros onboard.")
                    .dim()
            );
        }
        ProviderError::MalformedResponse(_) => {
            println!(
                "{} {}\n{}",
                style("No answer received:").bold().yellow(),
                e,
                style("Try rephrasing your question.").dim()
            );
        }
        ProviderError::Api(_) | ProviderError::Config(_) => {
            println!("{} {}", style("Provider error:").bold().red(), e);
        }
    }
}

/// Show configuration status
fn run_status(loader: &ConfigLoader) -> Result<()> {
    println!("{}", style("KYROS status").bold().cyan());
    println!("Config dir: {}", loader.config_dir().display());

    match loader.load() {
        Ok(config) => {
            println!("Model: {}", config.counselor.model);
            println!("API base: {}", config.provider.api_base);
            println!("Credential: {}", style("configured").green());
            println!(
                "Routing: {}",
                if config.routing.enabled {
                    "enabled"
                } else {
                    "disabled"
                }
            );
        }
        Err(e) => {
            println!("Credential: {}", style("not configured").red());
            println!("{} {}", style("Problem:").yellow(), e);
        }
    }

    Ok(())
}
