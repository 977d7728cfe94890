use clap::{Parser, Subcommand};
use cv_page::app::App;
use cv_page::config::{self, PageConfig};
use cv_page::dom::MemoryDom;
use cv_page::scenario::{self, Scenario};
use cv_page::{logging, output};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "cv-page")]
#[command(about = "Interactive behavior for a single-page CV, run headless")]
#[command(long_about = "\
Interactive behavior for a single-page CV, run headless

The page controllers (scroll chrome, reveal-on-scroll, typing effect, skill
bars, project filter, certificate carousel, contact form) run against an
in-memory copy of the page. Time is virtual: a scenario file scripts user
events at given milliseconds and the clock is stepped between them.

Hooks the page is expected to carry:

  nav.modern-nav  a.nav-link[href=\"#id\"]   navigation + current section
  section[id]                               sections (SKILLS / PROJECT trigger effects)
  .typing-effect                            rotating role text
  .Tech-skills-list li, .soft-skills-list li  skill progress bars
  .project-veiw-card.<category>             filterable project cards
  .categroy, select#PRO-LANG                filter buttons host, filter select
  .main-cert .carousel-item                 carousel slides
  form#contact-form                         validated contact form
  #scroll-top                               scroll-to-top button

Run 'cv-page gen-config' to generate a documented cv-page.toml.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./cv-page.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug-level logging (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Attach to a page and list which features found their markup
    Check {
        /// Page HTML file
        page: PathBuf,
    },
    /// Replay a scenario against a page and print the final state
    Simulate {
        /// Page HTML file
        page: PathBuf,
        /// Scenario TOML file
        scenario: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a stock cv-page.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_cli_logger(cli.verbose);

    match &cli.command {
        Command::Check { page } => {
            let config = resolve_config(cli.config.as_deref())?;
            let html = std::fs::read_to_string(page)?;
            let mut rng = StdRng::seed_from_u64(0);
            let app = App::start(MemoryDom::parse_html(&html), &config, &mut rng)?;
            println!("==> Checking {}", page.display());
            output::print_inventory(&app.inventory());
        }
        Command::Simulate {
            page,
            scenario: scenario_path,
            json,
        } => {
            let config = resolve_config(cli.config.as_deref())?;
            let html = std::fs::read_to_string(page)?;
            let script = Scenario::load(scenario_path)?;
            let report = scenario::run(&html, &script, &config)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                output::print_report(&report);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// An explicit `--config` must exist; otherwise `./cv-page.toml` is optional.
fn resolve_config(explicit: Option<&Path>) -> Result<PageConfig, config::ConfigError> {
    match explicit {
        Some(path) => config::load_config(path),
        None => config::load_config_in(Path::new(".")),
    }
}
