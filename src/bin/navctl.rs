use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;

use erp_nav::app::build_composer;
use erp_nav::authz::User;
use erp_nav::composer::NavigationComposer;
use erp_nav::config::NavConfig;
use erp_nav::events::init_event_bus;
use erp_nav::models::navigation::NavigationItem;
use erp_nav::models::remote::{RemoteModuleRecord, RemoteModulesResponse};
use erp_nav::navigator::{NavigationSnapshot, Navigator};
use erp_nav::provider::{HttpModuleProvider, ModuleProvider, StaticModuleProvider};
use erp_nav::route::best_match;

#[derive(Parser, Debug)]
#[command(author, version, about = "ERP navigation registry tool", long_about = None)]
struct Cli {
    /// Registry JSON to use instead of NAV_REGISTRY_PATH / the built-in registry
    #[arg(long, global = true)]
    registry: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a registry file
    Validate { file: PathBuf },
    /// Show which module a route belongs to
    Detect { path: String },
    /// Resolve the navigation a user would see
    Resolve {
        /// User snapshot as JSON
        #[arg(long)]
        user: PathBuf,
        #[arg(long, default_value = "/dashboard")]
        path: String,
        /// Remote module list as JSON (bare array or `{success, data}` body)
        #[arg(long, conflicts_with = "modules_url")]
        remote: Option<PathBuf>,
        /// Fetch the remote module list from this endpoint
        #[arg(long)]
        modules_url: Option<String>,
        /// Print the full snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Explain visibility decisions for a user
    Explain {
        #[arg(long)]
        user: PathBuf,
        /// Only explain the items that govern this route
        #[arg(long)]
        path: Option<String>,
    },
    /// List registered modules
    Modules,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Fall back to the crate-local `.env` when the CWD has none.
    if dotenv().is_err() {
        let crate_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(crate_env);
    }
    init_tracing();

    let cli = Cli::parse();
    let mut config = NavConfig::from_env()?;
    if let Some(registry) = cli.registry {
        config.registry_path = Some(registry);
    }

    match cli.command {
        Commands::Validate { file } => {
            config.registry_path = Some(file.clone());
            let composer = build_composer(&config).with_context(|| format!("invalid registry {}", file.display()))?;
            let registry = composer.registry();
            println!(
                "{}: ok ({} modules, {} global items)",
                file.display(),
                registry.modules().len(),
                registry.global_items().len()
            );
        }
        Commands::Detect { path } => {
            let composer = build_composer(&config)?;
            let registry = composer.registry();
            match registry.detect_module(&path) {
                Some(module) => println!("module view: {} ({})", module.key, module.label),
                None => match registry.detector().module_segment(&path) {
                    Some(segment) => println!("global dashboard (unknown module '{segment}')"),
                    None => println!("global dashboard"),
                },
            }
        }
        Commands::Resolve {
            user,
            path,
            remote,
            modules_url,
            json,
        } => {
            let user = read_user(&user)?;
            let composer = Arc::new(build_composer(&config)?);
            let (bus, _rx) = init_event_bus();

            let provider: Option<Arc<dyn ModuleProvider>> = match (remote, modules_url) {
                (Some(file), _) => Some(Arc::new(StaticModuleProvider::new(read_remote(&file)?))),
                (None, Some(url)) => {
                    let mut provider = HttpModuleProvider::new(url, config.fetch_timeout);
                    if let Some(token) = &config.api_token {
                        provider = provider.with_token(token.clone());
                    }
                    Some(Arc::new(provider))
                }
                (None, None) => None,
            };

            let navigator = match provider {
                Some(provider) => Navigator::new(composer, user, bus).with_provider(provider),
                None => Navigator::new(composer, user, bus),
            };
            navigator.refresh_modules().await;
            let snapshot = navigator.navigate(&path).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                print_snapshot(&snapshot);
            }
        }
        Commands::Explain { user, path } => {
            let user = read_user(&user)?;
            let composer = build_composer(&config)?;
            explain(&composer, &user, path.as_deref())?;
        }
        Commands::Modules => {
            let composer = build_composer(&config)?;
            println!("{:<14} {:<20} {:<10} {}", "Key", "Label", "Min level", "Base path");
            for module in composer.registry().modules() {
                println!(
                    "{:<14} {:<20} {:<10} {}",
                    module.key, module.label, module.required.min_level, module.base_path
                );
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn read_user(path: &Path) -> anyhow::Result<User> {
    let raw = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid user snapshot in {}", path.display()))
}

fn read_remote(path: &Path) -> anyhow::Result<Vec<RemoteModuleRecord>> {
    let raw = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    if let Ok(records) = serde_json::from_str::<Vec<RemoteModuleRecord>>(&raw) {
        return Ok(records);
    }
    let response: RemoteModulesResponse =
        serde_json::from_str(&raw).with_context(|| format!("invalid module list in {}", path.display()))?;
    if !response.success {
        anyhow::bail!("module list in {} reports success: false", path.display());
    }
    Ok(response.data)
}

fn print_snapshot(snapshot: &NavigationSnapshot) {
    let navigation = &snapshot.navigation;
    println!("route: {} ({:?})", snapshot.route, snapshot.access);
    println!("source: {:?}  fingerprint: {}", navigation.source, navigation.fingerprint());

    for section in &navigation.sections {
        println!("\n{}", section.title);
        for item in &section.items {
            println!("  {:<22} {:<40} {}", item.label, item.path, item.icon.asset_name());
        }
    }

    if let Some(module) = &snapshot.active_module {
        println!("\n[{}]", module.label);
        for section in &module.sections {
            println!("  {}", section.title);
            for item in &section.items {
                println!("    {:<20} {:<38} {}", item.label, item.path, item.icon.asset_name());
            }
        }
    }

    for diagnostic in &navigation.diagnostics {
        eprintln!("{}: {:?}", diagnostic.severity().as_str(), diagnostic);
    }
}

fn explain(composer: &NavigationComposer, user: &User, path: Option<&str>) -> anyhow::Result<()> {
    let registry = composer.registry();
    let mut items = vec![NavigationItem::dashboard()];
    items.extend(registry.all_items());

    let selected: Vec<&NavigationItem> = match path {
        Some(path) => {
            let mut selected = Vec::new();
            if let Some(module) = registry.detect_module(path) {
                if let Some(entry) = items.iter().find(|item| item.path == module.base_path) {
                    selected.push(entry);
                }
            }
            if let Some(owner) = best_match(items.iter().map(|item| (item.path.as_str(), item)), path) {
                if !selected.iter().any(|item| item.path == owner.path && item.label == owner.label) {
                    selected.push(owner);
                }
            }
            println!("access: {:?}", composer.check_access(user, path, None));
            selected
        }
        None => items.iter().collect(),
    };

    for item in selected {
        let decision = composer.evaluator().evaluate(item, user);
        println!(
            "{:<7} {:<22} {:<40} {}",
            if decision.visible { "shown" } else { "hidden" },
            item.label,
            item.path,
            serde_json::to_string(&decision.reason)?
        );
    }
    Ok(())
}
