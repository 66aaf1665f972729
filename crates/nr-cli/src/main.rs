//! Nitter Redirect CLI
//!
//! CLI tool for checking instances, rewriting URLs, emitting declarative
//! rules and managing the local settings file.

mod logging;
mod replay;
mod settings_file;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use nr_core::form::{FormOutcome, SettingsForm, INVALID_INSTANCE_MESSAGE};
use nr_core::instance::{TargetBase, DEFAULT_INSTANCE, KNOWN_INSTANCES};
use nr_core::policy::{RedirectState, Redirector, SharedRedirector};
use nr_core::settings::{Settings, SettingsChange, SettingsStore};
use nr_core::types::RedirectDecision;
use nr_rules::{sync_rules, MemoryRegistrar};

use crate::replay::ReplayOptions;
use crate::settings_file::{default_settings_path, FileSettingsStore};

#[derive(Parser)]
#[command(name = "nr-cli")]
#[command(about = "Nitter Redirect instance checker and URL rewriter")]
struct Cli {
    /// Settings file (defaults to $XDG_CONFIG_HOME/nitter-redirect/settings.json)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether a URL is a trusted instance
    Check {
        /// Candidate instance URL
        url: String,
    },

    /// Rewrite Twitter/X URLs onto an instance
    Rewrite {
        /// Source URLs
        #[arg(required = true)]
        urls: Vec<String>,

        /// Instance to use instead of the configured one
        #[arg(short, long)]
        instance: Option<String>,
    },

    /// Emit declarative redirect rules as JSON
    Rules {
        /// Instance to use instead of the configured one
        #[arg(short, long)]
        instance: Option<String>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// List trusted instances
    Instances,

    /// Show or change the stored settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Replay a navigation log through the redirect policy
    Replay {
        /// Input file: one URL per line, or JSONL with a `url` field
        #[arg(short, long)]
        input: String,

        /// Maximum navigations to read
        #[arg(long, default_value_t = usize::MAX)]
        limit: usize,

        /// Instance to use instead of the configured one
        #[arg(long)]
        instance: Option<String>,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the stored settings
    Show,
    /// Store a new instance
    SetInstance { url: String },
    /// Clear the instance (the default applies)
    ClearInstance,
    /// Turn redirection on
    Enable,
    /// Turn redirection off
    Disable,
}

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Check { url } => cmd_check(&url),
        Commands::Rewrite { urls, instance } => load_redirector(cli.settings, instance.as_deref())
            .and_then(|r| cmd_rewrite(&r, &urls)),
        Commands::Rules { instance, output } => load_redirector(cli.settings, instance.as_deref())
            .and_then(|r| cmd_rules(r.state(), output.as_deref())),
        Commands::Instances => cmd_instances(),
        Commands::Settings { action } => {
            open_store(cli.settings).and_then(|store| cmd_settings(store, action))
        }
        Commands::Replay {
            input,
            limit,
            instance,
        } => load_redirector(cli.settings, instance.as_deref()).and_then(|r| {
            replay::run_replay(
                &r,
                ReplayOptions {
                    input,
                    limit,
                    verbose: cli.verbose,
                },
            )
        }),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn open_store(path: Option<PathBuf>) -> Result<FileSettingsStore, String> {
    let path = match path {
        Some(path) => path,
        None => default_settings_path()?,
    };
    Ok(FileSettingsStore::new(path))
}

/// Redirector from an explicit instance, or from the settings file.
fn load_redirector(
    settings_path: Option<PathBuf>,
    instance: Option<&str>,
) -> Result<Redirector, String> {
    if let Some(instance) = instance {
        let target = TargetBase::parse(instance).map_err(|e| e.to_string())?;
        return Ok(Redirector::new(Settings {
            instance: Some(target.as_origin_string()),
            disabled: false,
        }));
    }

    let store = open_store(settings_path)?;
    Ok(load_or_inert(&store))
}

fn load_or_inert(store: &FileSettingsStore) -> Redirector {
    Redirector::load(store).unwrap_or_else(|e| {
        tracing::warn!("{}; redirection disabled", e);
        Redirector::inert()
    })
}

fn cmd_check(url: &str) -> Result<(), String> {
    let target = TargetBase::parse(url).map_err(|e| e.to_string())?;
    println!("'{}' is a trusted instance ({})", url, target.host());
    Ok(())
}

fn cmd_rewrite(redirector: &Redirector, urls: &[String]) -> Result<(), String> {
    for url in urls {
        match redirector.evaluate(url) {
            RedirectDecision::Redirect(target) => println!("{}", target),
            RedirectDecision::Skip(reason) => {
                println!("{} (unchanged: {})", url, reason.as_str())
            }
        }
    }
    Ok(())
}

fn cmd_rules(state: &RedirectState, output: Option<&str>) -> Result<(), String> {
    let mut registrar = MemoryRegistrar::new();
    let count = sync_rules(&mut registrar, state).map_err(|e| e.to_string())?;
    if count == 0 {
        tracing::warn!("redirection is disabled; emitting an empty rule set");
    }

    let rules: Vec<_> = registrar.rules().cloned().collect();
    let json = serde_json::to_string_pretty(&rules)
        .map_err(|e| format!("Failed to encode rules: {}", e))?;

    match output {
        Some(path) => {
            fs::write(path, json + "\n")
                .map_err(|e| format!("Failed to write '{}': {}", path, e))?;
            println!("Wrote {} rules to '{}'", rules.len(), path);
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn cmd_instances() -> Result<(), String> {
    for host in KNOWN_INSTANCES {
        let url = format!("https://{}", host);
        if url == DEFAULT_INSTANCE {
            println!("{} (default)", url);
        } else {
            println!("{}", url);
        }
    }
    Ok(())
}

fn cmd_settings(mut store: FileSettingsStore, action: SettingsAction) -> Result<(), String> {
    let path = store.path().display().to_string();
    let active = Arc::new(SharedRedirector::new(load_or_inert(&store)));
    let listener = Arc::clone(&active);
    store.subscribe(Box::new(move |change: &SettingsChange| {
        tracing::info!(?change, "settings changed");
        if listener.apply_change(change) {
            tracing::debug!(state = ?listener.snapshot().state(), "redirect state updated");
        }
    }));

    let changes_settings = !matches!(action, SettingsAction::Show);
    match action {
        SettingsAction::Show => show_settings(&store, &path)?,
        SettingsAction::SetInstance { url } => {
            let mut form = open_form(store, &path)?;
            form.on_input(&url, 0);
            submit(&mut form)?
        }
        SettingsAction::ClearInstance => {
            let mut form = open_form(store, &path)?;
            form.on_input("", 0);
            submit(&mut form)?
        }
        SettingsAction::Enable => toggle(store, &path, true)?,
        SettingsAction::Disable => toggle(store, &path, false)?,
    }

    if changes_settings {
        print_active(&active.snapshot());
    }
    Ok(())
}

fn print_active(redirector: &Redirector) {
    match redirector.state().target() {
        Some(target) => println!("  Active:      {}", target),
        None => println!("  Active:      (none)"),
    }
}

fn show_settings(store: &FileSettingsStore, path: &str) -> Result<(), String> {
    let settings = store.get().map_err(|e| e.to_string())?;
    let redirector = Redirector::new(settings.clone());
    let instance = settings
        .instance
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or("(default)");

    println!("Settings: {}", path);
    println!("  Instance:    {}", instance);
    println!("  Disabled:    {}", settings.disabled);
    print_active(&redirector);
    Ok(())
}

fn open_form(
    store: FileSettingsStore,
    path: &str,
) -> Result<SettingsForm<FileSettingsStore>, String> {
    let form = SettingsForm::load(store);
    if form.is_read_only() {
        return Err(format!("Settings at '{}' cannot be read", path));
    }
    Ok(form)
}

fn toggle(store: FileSettingsStore, path: &str, enable: bool) -> Result<(), String> {
    let mut form = open_form(store, path)?;
    if !form.on_toggle(enable) {
        return Err(format!("Failed to save '{}'", path));
    }
    println!("Redirection {}", if enable { "enabled" } else { "disabled" });
    Ok(())
}

fn submit(form: &mut SettingsForm<FileSettingsStore>) -> Result<(), String> {
    match form.submit_instance() {
        FormOutcome::Saved(origin) => {
            println!("Instance set to {}", origin);
            Ok(())
        }
        FormOutcome::Cleared => {
            println!("Instance cleared; using {}", DEFAULT_INSTANCE);
            Ok(())
        }
        FormOutcome::Rejected => Err(INVALID_INSTANCE_MESSAGE.to_string()),
        FormOutcome::SaveFailed | FormOutcome::ReadOnly => Err(form
            .validity_message()
            .unwrap_or("Failed to save settings")
            .to_string()),
    }
}
