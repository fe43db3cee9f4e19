use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use cli::{args, cook, render};
use gobble_core::config::{self, AppConfig};
use gobble_core::cooking::CookingSession;
use gobble_core::inventory::InventoryScreen;
use gobble_core::pipeline::{self, ReceiptIngest};
use gobble_core::queue::WorkQueue;
use gobble_core::recipes::{self, Bookmark, CaptureOutcome, RecipeCapture};
use gobble_core::review::ReceiptReview;
use gobble_core::session::{Session, SessionContext};
use providers::gem::{GemClient, GemConfig};
use providers::proxy::{AnalyzedImage, ProxyClient};
use std::path::PathBuf;
use std::sync::Arc;
use storage::models::{Profile, RecipeQuery, StorageLocation};
use storage::{BackendStore, ProfileStore};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref())?;
    let session = SessionContext::new(cli.user.clone().map(|user_id| Session {
        user_id,
        email: None,
        access_token: None,
    }));

    match cli.command {
        Commands::Inventory {
            view,
            expiring,
            json,
        } => run_inventory(&cfg, &session, view, expiring, json).await,
        Commands::Scan {
            images,
            assign,
            all,
            dry_run,
        } => run_scan(&cfg, &session, images, assign, all, dry_run).await,
        Commands::Photo {
            image,
            storage,
            dry_run,
        } => run_photo(&cfg, &session, image, storage, dry_run).await,
        Commands::Analyze { images, prompt, json } => {
            run_analyze(&cfg, images, prompt.as_deref(), json).await
        }
        Commands::Health => {
            let health = ProxyClient::new(&cfg.proxy.base_url).check_health().await?;
            println!("{} at {}", health.status, health.timestamp);
            Ok(())
        }
        Commands::Recipe { command } => run_recipe(&cfg, &session, command).await,
        Commands::Profile {
            command: ProfileCommands::Create { username, avatar },
        } => {
            let id = session.require_user()?;
            let store = BackendStore::new(cfg.backend.clone());
            let created = store
                .create_profile(&Profile {
                    id,
                    username,
                    avatar,
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(&created)?);
            Ok(())
        }
    }
}

#[derive(Parser)]
#[command(name = "gobble")]
#[command(about = "Food inventory, receipt scanning and recipes", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    /// Signed-in user id
    #[arg(short, long, env = "GOBBLE_USER")]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show stored items for one storage location
    Inventory {
        /// S, R or F (defaults to inventory.default_view)
        #[arg(long, value_parser = args::parse_location)]
        view: Option<StorageLocation>,
        /// List items from every location expiring within DAYS (default 7)
        #[arg(long, value_name = "DAYS", num_args = 0..=1, default_missing_value = "7")]
        expiring: Option<i64>,
        #[arg(long)]
        json: bool,
    },
    /// Parse receipt images and add the items to the inventory
    Scan {
        #[arg(required = true)]
        images: Vec<PathBuf>,
        /// Storage per item, e.g. `--assign 0=R`
        #[arg(long, value_parser = args::parse_assignment)]
        assign: Vec<(usize, StorageLocation)>,
        /// Storage for every item not covered by --assign
        #[arg(long, value_parser = args::parse_location)]
        all: Option<StorageLocation>,
        /// Print the parsed items without saving them
        #[arg(long)]
        dry_run: bool,
    },
    /// Recognise food in a photo and add it to the inventory
    Photo {
        image: PathBuf,
        #[arg(long, value_parser = args::parse_location)]
        storage: Option<StorageLocation>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Describe images through the upload proxy
    Analyze {
        #[arg(required = true)]
        images: Vec<PathBuf>,
        #[arg(long)]
        prompt: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Check that the upload proxy is up
    Health,
    Recipe {
        #[command(subcommand)]
        command: RecipeCommands,
    },
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
}

#[derive(Subcommand)]
enum RecipeCommands {
    /// Turn a YouTube, Instagram or TikTok video into a recipe
    Generate {
        url: String,
        /// Bookmark the generated recipe
        #[arg(long)]
        save: bool,
    },
    /// Search saved recipes
    Search {
        #[arg(default_value = "")]
        query: String,
        /// All, Easy, Medium or Hard
        #[arg(long, default_value = "All")]
        difficulty: String,
        #[arg(long, default_value_t = 1)]
        min_servings: u32,
        #[arg(long)]
        json: bool,
    },
    /// Type in a recipe by hand and save it
    Add {
        #[arg(long)]
        title: String,
        /// One per ingredient line
        #[arg(long = "ingredient")]
        ingredients: Vec<String>,
        /// One per step, in order
        #[arg(long = "step")]
        steps: Vec<String>,
        #[arg(long, default_value = "")]
        cook_time: String,
        #[arg(long, default_value = "1")]
        servings: String,
        /// Easy, Medium or Hard
        #[arg(long)]
        difficulty: Option<String>,
    },
    /// Walk through a saved recipe step by step
    Cook { title: String },
    /// Remove a saved recipe by title
    Unsave { title: String },
}

#[derive(Subcommand)]
enum ProfileCommands {
    Create {
        #[arg(long)]
        username: String,
        #[arg(long)]
        avatar: Option<String>,
    },
}

fn gem_client(cfg: &AppConfig) -> GemClient {
    GemClient::new(GemConfig {
        base_url: cfg.backend.base_url.clone(),
    })
}

async fn run_inventory(
    cfg: &AppConfig,
    session: &SessionContext,
    view: Option<StorageLocation>,
    expiring: Option<i64>,
    json: bool,
) -> Result<()> {
    let user = session.require_user()?;
    let store = BackendStore::new(cfg.backend.clone());
    let mut screen = InventoryScreen::new(
        view.unwrap_or(cfg.inventory.default_view),
        cfg.inventory.columns(),
    );
    screen.refresh(&store, &user).await?;
    let now = chrono::Utc::now();
    if let Some(days) = expiring {
        let soon = screen.expiring(now, days);
        if json {
            println!("{}", serde_json::to_string_pretty(&soon)?);
        } else {
            print!("{}", render::expiring(&soon, days));
        }
        return Ok(());
    }
    let grid = screen.view(now);
    if json {
        println!("{}", serde_json::to_string_pretty(&grid)?);
    } else {
        print!("{}", render::inventory_grid(&grid));
    }
    Ok(())
}

async fn run_scan(
    cfg: &AppConfig,
    session: &SessionContext,
    images: Vec<PathBuf>,
    assign: Vec<(usize, StorageLocation)>,
    all: Option<StorageLocation>,
    dry_run: bool,
) -> Result<()> {
    let user = session.require_user()?;
    let ingest = ReceiptIngest::new(
        Arc::new(gem_client(cfg)),
        WorkQueue::new(cfg.pipeline.concurrency),
    );
    let mut review = ReceiptReview::new();
    let total = images.len();
    for image in images {
        review.add_receipt(image)?;
    }

    let report = review.process(&ingest, &user).await?;
    for failure in &report.failures {
        eprintln!(
            "skipped receipt {} ({}): {}",
            failure.index,
            failure.path.display(),
            failure.error
        );
    }
    info!(
        parsed = report.parsed_receipts(total),
        total, "receipts processed"
    );

    assign_storage(&mut review, &assign, all)?;
    print!("{}", render::candidates(review.candidates()));
    if dry_run {
        return Ok(());
    }
    let ack = review.submit(&BackendStore::new(cfg.backend.clone()), &user).await?;
    println!(
        "saved {} items ({})",
        ack.items.len(),
        ack.status.as_deref().unwrap_or("ok")
    );
    Ok(())
}

fn assign_storage(
    review: &mut ReceiptReview,
    assign: &[(usize, StorageLocation)],
    all: Option<StorageLocation>,
) -> Result<()> {
    if let Some(location) = all {
        for index in 0..review.candidates().len() {
            review.set_storage(index, location)?;
        }
    }
    for (index, location) in assign {
        review
            .set_storage(*index, *location)
            .with_context(|| format!("--assign {index}"))?;
    }
    Ok(())
}

async fn run_photo(
    cfg: &AppConfig,
    session: &SessionContext,
    image: PathBuf,
    storage: Option<StorageLocation>,
    dry_run: bool,
) -> Result<()> {
    let user = session.require_user()?;
    let items = pipeline::analyze_photo(&gem_client(cfg), &image).await?;
    let mut review = ReceiptReview::new();
    review.load_candidates(items)?;
    assign_storage(&mut review, &[], storage)?;
    print!("{}", render::candidates(review.candidates()));
    if dry_run {
        return Ok(());
    }
    let ack = review.submit(&BackendStore::new(cfg.backend.clone()), &user).await?;
    println!("saved {} items", ack.items.len());
    Ok(())
}

async fn run_analyze(cfg: &AppConfig, images: Vec<PathBuf>, prompt: Option<&str>, json: bool) -> Result<()> {
    let client = ProxyClient::new(&cfg.proxy.base_url);
    let results: Vec<AnalyzedImage> = if let [single] = images.as_slice() {
        vec![client.analyze_image(single, prompt).await?.into()]
    } else {
        client.analyze_images(&images, prompt).await?.results
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }
    for r in results {
        println!("== {} ({} bytes)\n{}\n", r.filename, r.size, r.analysis);
    }
    Ok(())
}

async fn run_recipe(cfg: &AppConfig, session: &SessionContext, command: RecipeCommands) -> Result<()> {
    let store = BackendStore::new(cfg.backend.clone());
    match command {
        RecipeCommands::Generate { url, save } => {
            let capture = RecipeCapture::new(Arc::new(gem_client(cfg)));
            let outcome = capture.generate(&url).await?;
            eprintln!("{}", outcome.status_message());
            if matches!(outcome, CaptureOutcome::Failed { .. }) {
                bail!("no recipe generated");
            }
            print!("{}", render::recipe(outcome.recipe()));
            if save {
                let user = session.require_user()?;
                let message = Bookmark::default()
                    .set(&store, &user, outcome.recipe(), true)
                    .await?;
                println!("{message}");
            }
            Ok(())
        }
        RecipeCommands::Search {
            query,
            difficulty,
            min_servings,
            json,
        } => {
            let mut q = RecipeQuery::new(session.require_user()?).with_min_servings(min_servings);
            q.search = query;
            q.difficulty = args::parse_difficulty_filter(&difficulty)?;
            let found = recipes::search_saved(&store, &q).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&found)?);
            } else if found.is_empty() {
                println!("no saved recipes match");
            } else {
                for r in &found {
                    println!("{}\n", render::recipe(r));
                }
            }
            Ok(())
        }
        RecipeCommands::Add {
            title,
            ingredients,
            steps,
            cook_time,
            servings,
            difficulty,
        } => {
            let user = session.require_user()?;
            let draft = args::manual_draft(
                &title,
                &ingredients,
                &steps,
                &cook_time,
                &servings,
                difficulty.as_deref(),
            )?;
            let recipe = draft.submit()?;
            let message = Bookmark::default().set(&store, &user, &recipe, true).await?;
            print!("{}", render::recipe(&recipe));
            println!("{message}");
            Ok(())
        }
        RecipeCommands::Cook { title } => {
            let user = session.require_user()?;
            let saved = recipes::search_saved(&store, &RecipeQuery::new(user)).await?;
            let Some(recipe) = saved.into_iter().find(|r| r.title == title) else {
                bail!("no saved recipe titled {title:?}");
            };
            let mut cooking = CookingSession::new(recipe);
            cook::run(&mut cooking, std::io::stdin().lock(), std::io::stdout().lock())?;
            Ok(())
        }
        RecipeCommands::Unsave { title } => {
            let user = session.require_user()?;
            let saved = recipes::search_saved(&store, &RecipeQuery::new(user.clone())).await?;
            let Some(recipe) = saved.iter().find(|r| r.title == title) else {
                bail!("no saved recipe titled {title:?}");
            };
            let message = Bookmark::new(true).set(&store, &user, recipe, false).await?;
            println!("{message}");
            Ok(())
        }
    }
}
