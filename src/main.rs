use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use trendradar::config::RadarConfig;
use trendradar::domain::filter::FilterState;
use trendradar::domain::layout::RadarGeometry;
use trendradar::domain::selection::ViewMode;
use trendradar::domain::session::RadarSession;
use trendradar::domain::trend::{Impact, Quadrant, Ring};
use trendradar::repository::MemorySearchStore;
use trendradar::services::{
    ExportFormat, ExportService, LogHelper, PerplexityGenerator, RadarError, TrendService, UserErrorFormatter,
};
use tracing::info;
use uuid::Uuid;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "trendradar")]
#[command(about = "Trend radar - emerging trends for a domain, placed by quadrant and horizon", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate trends for a domain and show them
    Search {
        /// Domain to scan, e.g. "urban mobility"
        domain: String,

        /// Only show these quadrants (repeatable)
        #[arg(short, long, value_enum)]
        quadrant: Vec<QuadrantArg>,

        /// Only show these time horizons (repeatable)
        #[arg(short, long, value_enum)]
        ring: Vec<RingArg>,

        /// Only show these impact levels (repeatable)
        #[arg(short, long, value_enum)]
        impact: Vec<ImpactArg>,

        /// Case-insensitive text filter on label and summary
        #[arg(long)]
        query: Option<String>,

        /// List trends as a grid instead of radar coordinates
        #[arg(long)]
        grid: bool,

        /// Print the detail sheet of the n-th visible trend (1-based)
        #[arg(long)]
        detail: Option<usize>,

        /// Export the visible trends (json, csv, md)
        #[arg(long)]
        export: Option<String>,

        /// Where to write the export; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check that the configured API key works
    TestKey {
        /// Key to test instead of the configured one
        #[arg(long, env = "PERPLEXITY_API_KEY")]
        key: Option<String>,
    },

    /// Inspect or change stored settings
    #[command(subcommand)]
    Config(ConfigCommands),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Search { .. } => "search",
            Commands::TestKey { .. } => "test-key",
            Commands::Config(ConfigCommands::Show) => "config show",
            Commands::Config(ConfigCommands::SetKey { .. }) => "config set-key",
            Commands::Config(ConfigCommands::ClearKey) => "config clear-key",
            Commands::Config(ConfigCommands::ResetPrompts) => "config reset-prompts",
        }
    }
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the config file location and current values
    Show,

    /// Store an API key
    SetKey {
        key: String,
    },

    /// Remove the stored API key
    ClearKey,

    /// Go back to the built-in prompts
    ResetPrompts,
}

#[derive(Clone, Copy, ValueEnum)]
enum QuadrantArg {
    Technology,
    Society,
    Economy,
    Environment,
}

impl From<QuadrantArg> for Quadrant {
    fn from(arg: QuadrantArg) -> Self {
        match arg {
            QuadrantArg::Technology => Quadrant::Technology,
            QuadrantArg::Society => Quadrant::Society,
            QuadrantArg::Economy => Quadrant::Economy,
            QuadrantArg::Environment => Quadrant::Environment,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum RingArg {
    Near,
    Mid,
    Long,
}

impl From<RingArg> for Ring {
    fn from(arg: RingArg) -> Self {
        match arg {
            RingArg::Near => Ring::NearTerm,
            RingArg::Mid => Ring::MidTerm,
            RingArg::Long => Ring::LongTerm,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ImpactArg {
    Low,
    Medium,
    High,
}

impl From<ImpactArg> for Impact {
    fn from(arg: ImpactArg) -> Self {
        match arg {
            ImpactArg::Low => Impact::Low,
            ImpactArg::Medium => Impact::Medium,
            ImpactArg::High => Impact::High,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = RadarConfig::load().context("Failed to load configuration")?;

    let command_name = cli.command.name();
    match execute_command(cli.command, config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            match e.downcast_ref::<RadarError>() {
                Some(radar_error) => eprintln!("Error: {}", UserErrorFormatter::format_for_ui(radar_error)),
                None => {
                    LogHelper::log_command_failure(command_name, &e);
                    eprintln!("Error: {:#}", e);
                }
            }
            std::process::exit(1);
        }
    }
}

async fn execute_command(command: Commands, mut config: RadarConfig) -> Result<()> {
    match command {
        Commands::Search {
            domain,
            quadrant,
            ring,
            impact,
            query,
            grid,
            detail,
            export,
            output,
        } => {
            let mut filters = FilterState::default();
            if !quadrant.is_empty() {
                filters.quadrants = quadrant.into_iter().map(Quadrant::from).collect();
            }
            if !ring.is_empty() {
                filters.rings = ring.into_iter().map(Ring::from).collect();
            }
            if !impact.is_empty() {
                filters.impacts = impact.into_iter().map(Impact::from).collect();
            }
            if let Some(query) = query {
                filters.set_search_query(query);
            }
            let export = match export {
                Some(format) => Some(
                    ExportFormat::parse(&format)
                        .with_context(|| format!("Unknown export format '{}'", format))?,
                ),
                None => None,
            };

            let settings = config.generator_settings().map_err(RadarError::from)?;
            let service = TrendService::new(
                Arc::new(PerplexityGenerator::new(&config)),
                Arc::new(MemorySearchStore::new()),
            )
            .with_history_limit(config.history_limit);
            let (search, collection) = service.run_search(&domain, &settings).await?;
            let history = service.history().await?;
            info!(search_id = %search.id, history = history.len(), "Search saved");

            let mut session = RadarSession::new(RadarGeometry::default());
            session.replace_collection(collection);
            session.set_filters(filters);
            if grid {
                session.set_view_mode(ViewMode::Grid);
            }

            if let Some(format) = export {
                let visible = session.visible_trends();
                match &output {
                    Some(path) => {
                        ExportService::export_to_file(&domain, &visible, format, path)?;
                        println!("Exported {} trends to {}", visible.len(), path.display());
                    }
                    None => println!("{}", ExportService::export(&domain, &visible, format)?),
                }
                return Ok(());
            }

            print_session(&session);

            if let Some(n) = detail {
                let id = visible_trend_at(&session, n)
                    .with_context(|| format!("No visible trend number {}", n))?;
                session.select(id);
                if let Some(trend) = session.selected_trend() {
                    println!();
                    print!("{}", ExportService::trend_detail_sheet(trend));
                }
            }
            Ok(())
        }

        Commands::TestKey { key } => {
            let key = key
                .or_else(|| config.api_key.clone())
                .ok_or(RadarError::from(trendradar::services::GenerationError::MissingCredential))?;
            PerplexityGenerator::new(&config)
                .verify_credential(&key)
                .await
                .map_err(RadarError::from)?;
            println!("API key works.");
            Ok(())
        }

        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show => {
                println!("Config file: {}", RadarConfig::config_path()?.display());
                println!("API key:     {}", if config.has_api_key() { "configured" } else { "not set" });
                println!("Model:       {}", config.model);
                println!("Endpoint:    {}", config.endpoint);
                println!(
                    "Prompts:     {}",
                    if config.system_prompt.is_some() || config.user_prompt.is_some() {
                        "custom"
                    } else {
                        "built-in"
                    }
                );
                Ok(())
            }
            ConfigCommands::SetKey { key } => {
                config.set_api_key(&key);
                config.save()?;
                println!("API key saved.");
                Ok(())
            }
            ConfigCommands::ClearKey => {
                config.clear_api_key();
                config.save()?;
                println!("API key removed.");
                Ok(())
            }
            ConfigCommands::ResetPrompts => {
                config.reset_prompts();
                config.save()?;
                println!("Prompts reset to defaults.");
                Ok(())
            }
        },
    }
}

/// The n-th visible trend, counting from 1 as the listing does.
fn visible_trend_at(session: &RadarSession, n: usize) -> Option<Uuid> {
    let index = n.checked_sub(1)?;
    session.visible_trends().get(index).map(|t| t.id())
}

fn print_session(session: &RadarSession) {
    let total = session.collection().map_or(0, |c| c.len());
    println!("{} of {} trends shown", session.visible_count(), total);
    println!();

    match session.view_mode() {
        ViewMode::Grid => {
            for (i, trend) in session.visible_trends().iter().enumerate() {
                println!(
                    "{:>3}. {:<40} {:<12} {:<11} {:<6} {}",
                    i + 1,
                    trend.label(),
                    trend.quadrant(),
                    trend.ring(),
                    trend.impact(),
                    trend.summary()
                );
            }
        }
        ViewMode::Radar => {
            for (i, point) in session.visible_points().iter().enumerate() {
                println!(
                    "{:>3}. ({:>6.1}, {:>6.1}) {:<40} {} / {}",
                    i + 1,
                    point.x,
                    point.y,
                    point.trend.label(),
                    point.trend.quadrant(),
                    point.trend.ring()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trendradar::domain::trend::{Trend, TrendCollection};

    #[test]
    fn test_detail_numbers_start_at_one() {
        let mut session = RadarSession::default();
        session.replace_collection(TrendCollection::new(
            "logistics",
            vec![
                Trend::new("Drone Delivery", "Last mile by air", Quadrant::Technology, Ring::MidTerm, Impact::Medium),
                Trend::new("Nearshoring", "Factories move closer", Quadrant::Economy, Ring::NearTerm, Impact::High),
            ],
        ));
        let ids: Vec<Uuid> = session.visible_trends().iter().map(|t| t.id()).collect();

        assert_eq!(visible_trend_at(&session, 1), Some(ids[0]));
        assert_eq!(visible_trend_at(&session, 2), Some(ids[1]));
        assert_eq!(visible_trend_at(&session, 0), None);
        assert_eq!(visible_trend_at(&session, 3), None);
    }
}
