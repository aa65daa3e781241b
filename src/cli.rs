//! Command-line surface of the binary.

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;

use crate::app::FoodBuddy;
use crate::database::Coordinates;
use crate::resolvers::ResolveOptions;

#[derive(Debug, Parser)]
#[command(name = "food-buddy", version, about = "Cache-first recipe and food recommendation lookup")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Full recipe for a dish.
    Recipe {
        dish: String,
        /// Skip every cache tier.
        #[arg(long)]
        force: bool,
    },
    /// Whether a recipe was cached locally within the last hour.
    Cached { dish: String },
    /// Recipe cards for a free-text query.
    Search {
        query: String,
        #[arg(long)]
        force: bool,
    },
    /// Places and dishes for a mood.
    Recommend {
        #[arg(long)]
        location: String,
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// Scenario tag, repeatable.
        #[arg(long = "tag", required = true)]
        tags: Vec<String>,
        #[arg(long)]
        force: bool,
    },
    /// Remove cached data.
    Clear {
        #[arg(value_enum)]
        target: ClearTarget,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ClearTarget {
    Recipes,
    Search,
    Recommendations,
    ExpiredSearch,
}

#[derive(Serialize)]
struct Output<'a, V, S> {
    source: S,
    value: &'a V,
}

fn print<V: Serialize, S: Serialize>(source: S, value: &V) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&Output { source, value })?);
    Ok(())
}

/// Run one command against the app.
pub async fn run(app: &FoodBuddy, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Recipe { dish, force } => {
            let resolved = app
                .recipes
                .resolve_recipe(&dish, &ResolveOptions::refresh(force))
                .await?;
            print(resolved.source, &resolved.value)?;
        }
        Command::Cached { dish } => {
            println!("{}", app.recipes.is_recently_cached(&dish).await);
        }
        Command::Search { query, force } => {
            let resolved = app
                .search
                .resolve_search_results(&query, &ResolveOptions::refresh(force))
                .await?;
            print(resolved.source, &resolved.value)?;
        }
        Command::Recommend {
            location,
            lat,
            lng,
            tags,
            force,
        } => {
            let resolved = app
                .recommendations
                .resolve_recommendations(
                    &location,
                    &tags,
                    Coordinates::new(lat, lng),
                    &ResolveOptions::refresh(force),
                )
                .await?;
            print(resolved.source, &resolved.value)?;
        }
        Command::Clear { target } => {
            let removed = match target {
                ClearTarget::Recipes => app.recipes.clear_local().await?,
                ClearTarget::Search => app.search.clear_all().await?,
                ClearTarget::Recommendations => app.recommendations.cache().clear().await?,
                ClearTarget::ExpiredSearch => app.search.clear_expired().await?,
            };
            info!("Removed {} cached rows ({:?})", removed, target);
            println!("{}", removed);
        }
    }
    Ok(())
}
