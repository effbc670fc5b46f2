use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use serde::Serialize;
use std::path::PathBuf;

use folio::api::hooks;
use folio::api::{NewProject, PortfolioClient, ProfileUpdate, Stage};
use folio::config::Config;
use folio::context::{NavigationContext, ThemeContext, ThemeMode};
use folio::fallback::{self, Outcome};
use folio::query::Query;
use folio::storage::LocalCache;
use folio::{logging, Environment};

#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(about = "Portfolio site client: profile, projects, biography and preferences")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./folio.yaml or $XDG_CONFIG_HOME/folio/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Debug logging (overridden by FOLIO_LOG)
  #[arg(short, long)]
  verbose: bool,

  /// Treat the system colour scheme as dark
  #[arg(long)]
  prefers_dark: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Show the profile
  Profile,
  /// List projects
  Projects {
    /// Featured projects only
    #[arg(long)]
    featured: bool,
  },
  /// Show biography entries for a stage (infancy, adolescence, youth, maturity, present)
  Biography { stage: String },
  /// Update profile fields
  UpdateProfile {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    bio: Option<String>,
    #[arg(long)]
    avatar_url: Option<String>,
  },
  /// Create a project
  CreateProject {
    #[arg(long)]
    title: String,
    #[arg(long)]
    description: String,
    #[arg(long)]
    image_url: Option<String>,
    #[arg(long)]
    project_url: Option<String>,
    /// Technology tag, repeatable
    #[arg(long = "tech")]
    technologies: Vec<String>,
    #[arg(long)]
    featured: bool,
    #[arg(long)]
    order: Option<i64>,
  },
  /// Show or change the theme
  Theme {
    #[command(subcommand)]
    action: Option<ThemeAction>,
  },
  /// Show or change the navigation menu state
  Nav {
    #[command(subcommand)]
    action: Option<NavAction>,
  },
}

#[derive(Subcommand, Debug)]
enum ThemeAction {
  Show,
  /// light, dark or system
  Set { mode: String },
  Toggle,
}

#[derive(Subcommand, Debug)]
enum NavAction {
  Show,
  Toggle,
  Expand,
  Collapse,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = Config::load(args.config.as_deref())?;
  let _log_guard = logging::init(config.logging.directory.as_deref(), args.verbose)?;

  let env = Environment {
    storage: config.storage.enabled,
    ..Environment::interactive()
  }
  .with_prefers_dark(args.prefers_dark);

  let cache = LocalCache::open(&env, config.storage.path.as_deref());

  match args.command {
    Command::Profile => {
      let client = PortfolioClient::from_config(&config)?;
      let key = fallback::profile_key();
      show(hooks::profile_query(&client, &env), &cache, &key).await
    }
    Command::Projects { featured } => {
      let client = PortfolioClient::from_config(&config)?;
      let key = fallback::projects_key(featured);
      show(hooks::projects_query(&client, &env, featured), &cache, &key).await
    }
    Command::Biography { stage } => {
      let stage: Stage = stage.parse()?;
      let client = PortfolioClient::from_config(&config)?;
      let key = fallback::biography_key(stage);
      show(hooks::biography_query(&client, &env, stage), &cache, &key).await
    }
    Command::UpdateProfile {
      name,
      title,
      bio,
      avatar_url,
    } => {
      let update = ProfileUpdate {
        name,
        title,
        bio,
        avatar_url,
      };
      if update.is_empty() {
        return Err(eyre!("Nothing to update"));
      }

      let client = PortfolioClient::from_config(&config)?;
      let mut mutation = hooks::update_profile_mutation(&client, &env);
      match mutation.mutate(update).await {
        Some(profile) => {
          cache.set(&fallback::profile_key(), &profile);
          print_json(&profile)
        }
        None => Err(eyre!(mutation.error().unwrap_or("update skipped").to_string())),
      }
    }
    Command::CreateProject {
      title,
      description,
      image_url,
      project_url,
      technologies,
      featured,
      order,
    } => {
      let project = NewProject {
        title,
        description,
        image_url,
        project_url,
        technologies,
        is_featured: featured,
        order_index: order,
      };

      let client = PortfolioClient::from_config(&config)?;
      let mut mutation = hooks::create_project_mutation(&client, &env);
      match mutation.mutate(project).await {
        Some(created) => print_json(&created),
        None => Err(eyre!(mutation.error().unwrap_or("create skipped").to_string())),
      }
    }
    Command::Theme { action } => {
      let theme = ThemeContext::new(cache, &env);
      match action.unwrap_or(ThemeAction::Show) {
        ThemeAction::Show => {}
        ThemeAction::Set { mode } => {
          let mode: ThemeMode = mode.parse().map_err(|e: String| eyre!(e))?;
          theme.set(mode);
        }
        ThemeAction::Toggle => {
          theme.toggle();
        }
      }
      let stored = theme
        .stored()
        .map(|m| m.to_string())
        .unwrap_or_else(|| "unset".to_string());
      println!("{} ({})", if theme.is_dark() { "dark" } else { "light" }, stored);
      Ok(())
    }
    Command::Nav { action } => {
      let nav = NavigationContext::new(cache);
      match action.unwrap_or(NavAction::Show) {
        NavAction::Show => {}
        NavAction::Toggle => {
          nav.toggle();
        }
        NavAction::Expand => nav.set_expanded(true),
        NavAction::Collapse => nav.set_expanded(false),
      }
      println!("{}", if nav.is_expanded() { "expanded" } else { "collapsed" });
      Ok(())
    }
  }
}

/// Wait for `query` and print its data. On failure, print the error and
/// fall back to the last successful response stored under `key`.
async fn show<T>(mut query: Query<T>, cache: &LocalCache, key: &str) -> Result<()>
where
  T: Serialize + Send + 'static,
{
  match fallback::resolve(query.settle().await, cache, key).map_err(|e| eyre!(e))? {
    Outcome::Fresh(data) => print_json(data),
    Outcome::Stale { data, error } => {
      eprintln!("error: {error} (showing last successful response)");
      print_json(&data)
    }
    Outcome::Pending => Ok(()),
  }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}
