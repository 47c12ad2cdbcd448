use chrono::Utc;
use clap::{Parser, Subcommand};
use exposures::app::{EditRequest, Portfolio};
use exposures::auth::{self, Realm};
use exposures::content::ImageSlot;
use exposures::session::GateState;
use exposures::tags::TagFilter;
use exposures::{config, output};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "exposures")]
#[command(about = "Photography portfolio: tagged gallery, content editor and uploads")]
#[command(long_about = "\
Photography portfolio: tagged gallery, content editor and uploads

Your asset folder is the gallery. Every image in it gets a title, tags and a
category derived from its filename; the admin area can override any of them.

Site structure:

  site/
  ├── portfolio.toml               # Config (optional, see `gen-config`)
  ├── img/                         # Asset folder: the gallery
  │   ├── ocean-waves.jpg          # Tags: seascape, ocean
  │   ├── IMG_20210305.jpg         # Title: March 5, 2021
  │   └── misty-forest.jpg         # Tags: nature, forest
  └── .exposures/state.json        # Sessions, overlays and upload ledger

Metadata resolution (first available wins):
  Title:     edited title → capture date in filename → filename words
  Tags:      edited tags  → keyword table → photography
  Category:  edited category → first tag → [gallery] default_category

Admin commands (edit, content ...) need `exposures login admin`.
Upload commands (upload, uploads ...) need `exposures login uploader`.

Logging goes to stderr. Set RUST_LOG to change the filter and LOG_FORMAT=json
for JSON lines.

Run 'exposures gen-config' to generate a documented portfolio.toml.")]
#[command(version)]
struct Cli {
    /// Site root containing portfolio.toml and the asset folder
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Output directory for `build`
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve the gallery and print the inventory
    Scan,
    /// Print the tag index
    Tags,
    /// Print the images carrying a tag ("all" for every image)
    Filter { tag: String },
    /// Unlock a realm
    Login {
        realm: Realm,
        #[arg(long)]
        password: String,
    },
    /// Lock a realm
    Logout { realm: Realm },
    /// Show a realm's session, extending it on activity
    Status { realm: Realm },
    /// Edit one image's metadata (admin)
    Edit {
        filename: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Comma-separated tags, e.g. "ocean, long exposure"
        #[arg(long)]
        tags: Option<String>,
    },
    /// Show or edit the site content
    #[command(subcommand)]
    Content(ContentCommand),
    /// Copy images into the asset folder (uploader)
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Manage uploaded images
    #[command(subcommand)]
    Uploads(UploadsCommand),
    /// Render the static site into --output
    Build,
    /// Print a stock portfolio.toml with all options documented
    GenConfig,
    /// Print the [auth] digest for a password
    HashPassword {
        #[arg(long)]
        password: String,
    },
}

#[derive(Subcommand)]
enum ContentCommand {
    /// Print the current content document
    Show,
    /// Set the hero section (admin)
    Hero {
        #[arg(long)]
        title: String,
        #[arg(long)]
        subtitle: String,
    },
    /// Set the about section; paragraphs accept markdown (admin)
    About {
        #[arg(long)]
        paragraph1: String,
        #[arg(long)]
        paragraph2: String,
    },
    /// Set the contact section (admin)
    Contact {
        #[arg(long)]
        instagram: String,
        #[arg(long)]
        status: String,
    },
    /// Store the header logo (admin)
    Logo { file: PathBuf },
    /// Store the about portrait (admin)
    Portrait { file: PathBuf },
}

#[derive(Subcommand)]
enum UploadsCommand {
    /// List uploaded images (uploader)
    List,
    /// Delete one upload by id or unique id prefix (uploader)
    Delete { id: String },
    /// Delete every upload (uploader)
    Clear,
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let now = Utc::now();

    match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::HashPassword { password } => {
            let config = config::load_config(&cli.root)?;
            if password.trim().is_empty() {
                return Err(auth::AuthError::Empty.into());
            }
            println!("{}", auth::digest(&config.auth.salt, password.trim()));
        }
        Command::Scan => {
            let portfolio = Portfolio::open(&cli.root, now)?;
            let images: Vec<_> = portfolio.images().iter().collect();
            output::print_gallery(&images);
        }
        Command::Tags => {
            let portfolio = Portfolio::open(&cli.root, now)?;
            output::print_tags(portfolio.tags(), portfolio.images());
        }
        Command::Filter { tag } => {
            let portfolio = Portfolio::open(&cli.root, now)?;
            output::print_gallery(&portfolio.filter(&TagFilter::parse(&tag)));
        }
        Command::Login { realm, password } => {
            let mut portfolio = Portfolio::open(&cli.root, now)?;
            let record = portfolio.login(realm, &password, now)?;
            output::print_session_status(realm, &GateState::Unlocked(record), now);
        }
        Command::Logout { realm } => {
            let mut portfolio = Portfolio::open(&cli.root, now)?;
            portfolio.logout(realm)?;
            output::print_session_status(realm, &GateState::Locked, now);
        }
        Command::Status { realm } => {
            let mut portfolio = Portfolio::open(&cli.root, now)?;
            let state = portfolio.status(realm, now)?;
            output::print_session_status(realm, &state, now);
        }
        Command::Edit {
            filename,
            title,
            category,
            tags,
        } => {
            let mut portfolio = Portfolio::open(&cli.root, now)?;
            let request = EditRequest {
                title,
                category,
                tags,
            };
            let updated = portfolio.edit_image(&filename, request, now)?;
            output::print_gallery(&[&updated]);
        }
        Command::Content(command) => {
            let mut portfolio = Portfolio::open(&cli.root, now)?;
            let content = match command {
                ContentCommand::Show => portfolio.content(),
                ContentCommand::Hero { title, subtitle } => {
                    portfolio.update_hero(&title, &subtitle, now)?
                }
                ContentCommand::About {
                    paragraph1,
                    paragraph2,
                } => portfolio.update_about(&paragraph1, &paragraph2, now)?,
                ContentCommand::Contact { instagram, status } => {
                    portfolio.update_contact(&instagram, &status, now)?
                }
                ContentCommand::Logo { file } => {
                    portfolio.set_content_image(ImageSlot::Logo, &file, now)?
                }
                ContentCommand::Portrait { file } => {
                    portfolio.set_content_image(ImageSlot::Portrait, &file, now)?
                }
            };
            output::print_content(&content);
        }
        Command::Upload { files } => {
            let mut portfolio = Portfolio::open(&cli.root, now)?;
            let outcome = portfolio.upload(&files, now)?;
            output::print_upload_outcome(&outcome);
        }
        Command::Uploads(command) => {
            let mut portfolio = Portfolio::open(&cli.root, now)?;
            match command {
                UploadsCommand::List => {
                    output::print_uploads(&portfolio.uploads(now)?);
                }
                UploadsCommand::Delete { id } => {
                    let removed = portfolio.delete_upload(&id, now)?;
                    println!("Deleted {} ({})", removed.name, removed.id);
                }
                UploadsCommand::Clear => {
                    let removed = portfolio.clear_uploads(now)?;
                    println!("Cleared {removed} uploads");
                }
            }
        }
        Command::Build => {
            let portfolio = Portfolio::open(&cli.root, now)?;
            println!("==> Building {} → {}", cli.root.display(), cli.output.display());
            let summary = portfolio.build(&cli.output)?;
            output::print_generate_output(&summary);
        }
    }

    Ok(())
}

/// Install the stderr subscriber.
///
///   RUST_LOG    standard env filter (default: "exposures=warn")
///   LOG_FORMAT  "json" or "text" (default: "text")
fn init_logging() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("exposures=warn"));
    let registry = tracing_subscriber::registry().with(env_filter);
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f == "json");
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
