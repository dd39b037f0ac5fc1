mod api;
mod filter;
mod gate;
mod models;
mod query;
mod tui;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use api::ApiClient;
use filter::{FilterState, SortKey, TriState, ViewedFilter};
use gate::{CreditGate, RevealDecision};
use models::{CandidateDetail, ViewCredits, VisaStatus};

#[derive(Parser)]
#[command(name = "scout")]
#[command(about = "Talent search - find, filter, and reveal candidate profiles")]
struct Cli {
    /// API base URL of the job-board platform (or SCOUT_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Acting recruiter email (or SCOUT_USER)
    #[arg(long, global = true)]
    user: Option<String>,

    /// Path to the bearer token file
    #[arg(long, global = true)]
    token_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FilterArgs {
    /// Free-text query over name, email, job title, and skills
    #[arg(short, long, default_value = "")]
    query: String,

    /// Treat the query as a boolean expression (AND/OR/NOT, quotes, parens)
    #[arg(short, long)]
    boolean: bool,

    /// Location substring
    #[arg(short, long, default_value = "")]
    location: String,

    /// Visa status (citizen, permanent_resident, work_visa, requires_sponsorship)
    #[arg(long)]
    visa: Option<VisaStatus>,

    /// Relocation willingness (all, yes, no)
    #[arg(long, default_value = "all")]
    relocation: TriState,

    /// Job title substring
    #[arg(short, long, default_value = "")]
    title: String,

    /// Viewed status (all, viewed, not-viewed)
    #[arg(long, default_value = "all")]
    viewed: ViewedFilter,

    /// Sort key (listed, name, title, location)
    #[arg(long, default_value = "listed")]
    sort: SortKey,
}

impl FilterArgs {
    fn into_state(self) -> FilterState {
        FilterState {
            query: self.query,
            boolean_search: self.boolean,
            location: self.location,
            visa: self.visa,
            relocation: self.relocation,
            title: self.title,
            viewed: self.viewed,
            sort: self.sort,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Search candidates with filters and pagination
    Search {
        #[command(flatten)]
        filters: FilterArgs,

        /// Page number (1-based)
        #[arg(long, default_value = "1")]
        page: usize,

        /// Results per page
        #[arg(long, default_value = "20")]
        per_page: usize,
    },

    /// Reveal a candidate's full profile (spends one view credit)
    Show {
        /// Candidate ID
        id: String,
    },

    /// Show the company's view-credit usage
    Credits,

    /// Browse candidates interactively
    Browse {
        #[command(flatten)]
        filters: FilterArgs,
    },
}

fn main() -> Result<()> {
    init_tracing();

    let Cli {
        api_url,
        user,
        token_file,
        command,
    } = Cli::parse();

    let base_url = api_url
        .or_else(|| std::env::var("SCOUT_API_URL").ok())
        .unwrap_or_else(|| api::DEFAULT_API_URL.to_string());
    let user = user
        .or_else(|| std::env::var("SCOUT_USER").ok())
        .unwrap_or_default();
    let token_path = token_file
        .map(|p| expand_home(&p))
        .unwrap_or_else(api::default_token_path);
    let token = api::token_from_file(&token_path)?;

    // Refused here, before any network call, when no recruiter identity is
    // available.
    let api = ApiClient::new(&base_url, &user, token)?;

    match command {
        Commands::Search {
            filters,
            page,
            per_page,
        } => {
            let candidates = api.list_candidates()?;
            let state = filters.into_state();
            let mut matches = filter::filter(&candidates, &state);
            filter::sort_candidates(&mut matches, state.sort);

            if matches.is_empty() {
                println!("No candidates match.");
            } else {
                let shown = filter::paginate(&matches, page, per_page);
                println!(
                    "{:<8} {:<22} {:<26} {:<20} {:<22} {:>7}",
                    "ID", "NAME", "TITLE", "LOCATION", "VISA", "VIEWED"
                );
                println!("{}", "-".repeat(110));
                for c in shown {
                    println!(
                        "{:<8} {:<22} {:<26} {:<20} {:<22} {:>7}",
                        truncate(&c.id, 8),
                        truncate(&c.full_name, 20),
                        truncate(&c.job_title, 24),
                        truncate(&c.location, 18),
                        c.visa_status.to_string(),
                        if c.viewed_by_me { "yes" } else { "" }
                    );
                }
                println!(
                    "\nPage {} - showing {} of {} match(es)",
                    page.max(1),
                    shown.len(),
                    matches.len()
                );
            }
        }

        Commands::Show { id } => {
            let stats = api.credit_stats()?;
            let mut gate = CreditGate::new(ViewCredits {
                company_remaining: stats.remaining_views,
                personal_used: 0,
            });

            match gate.begin_reveal(&id) {
                RevealDecision::Denied => {
                    println!(
                        "No company view credits remaining (0 of {} left).",
                        stats.initial_view_count
                    );
                    println!("Views replenish when your company tops up its plan.");
                }
                RevealDecision::Fetch => match api.reveal_candidate(&id) {
                    Ok(response) => {
                        let viewed_before = response.viewed_before;
                        match gate.complete_reveal(&id, response) {
                            Ok(detail) => {
                                print_detail(detail);
                                if viewed_before {
                                    println!("\n(previously viewed - no credit spent)");
                                }
                            }
                            Err(message) => println!("Reveal failed: {}", message),
                        }
                        let credits = gate.credits();
                        println!(
                            "\nCompany credits remaining: {} | your views: {}",
                            credits.company_remaining, credits.personal_used
                        );
                    }
                    Err(e) => println!("Reveal failed (safe to retry): {}", e),
                },
                // a fresh gate has no cache and no pending request
                RevealDecision::CachedToggle | RevealDecision::AlreadyRequesting => {}
            }
        }

        Commands::Credits => {
            let stats = api.credit_stats()?;
            let used = stats.initial_view_count.saturating_sub(stats.remaining_views);
            println!(
                "View credits: {} remaining of {} ({} used)",
                stats.remaining_views, stats.initial_view_count, used
            );

            if !stats.recruiters.is_empty() {
                println!();
                println!("{:<30} {:>8} {:>8}", "RECRUITER", "VIEWS", "UNIQUE");
                println!("{}", "-".repeat(48));
                for r in &stats.recruiters {
                    println!(
                        "{:<30} {:>8} {:>8}",
                        truncate(&r.fullname, 28),
                        r.view_count,
                        r.unique_candidates_viewed
                    );
                }
            }
        }

        Commands::Browse { filters } => {
            tui::run_browse(&api, filters.into_state())?;
        }
    }

    Ok(())
}

fn print_detail(detail: &CandidateDetail) {
    println!("Candidate {}", detail.id);
    println!("Name: {}", detail.full_name);
    println!("Email: {}", detail.email);
    if let Some(phone) = &detail.phone {
        println!("Phone: {}", phone);
    }
    println!("Skills: {}", detail.skills.join(", "));
    if let Some(resume) = &detail.resume_url {
        println!("Resume: {}", resume);
    }
}

fn init_tracing() {
    use std::fs::OpenOptions;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{EnvFilter, fmt};

    // Log to a file so browse mode's terminal stays clean; RUST_LOG opts in.
    let Ok(file) = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open("/tmp/scout.log")
    else {
        return;
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(file).with_ansi(false))
        .with(EnvFilter::from_default_env())
        .init();
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_default();
        PathBuf::from(home).join(rest)
    } else {
        PathBuf::from(path)
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
