//! Directory Data Seeder
//!
//! Loads users, restaurants, services and reviews from JSON files into the
//! configured store, or wipes every record. Records go through the regular
//! services, so passwords are hashed, addresses geocoded, slugs derived and
//! average ratings recomputed exactly as for API traffic.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use restaurant_directory::{
    api::AppState,
    config::AppConfig,
    models::{
        CreateOfferingRequest, CreateRestaurantRequest, CreateReviewRequest, CreateUserRequest,
        CurrentUser, Restaurant, User,
    },
    service::{DisabledMailer, LocalPhotoStore, MapQuestGeocoder},
};

/// Restaurant directory data seeder
#[derive(Parser)]
#[command(name = "seeder", about = "Import or destroy directory seed data", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import seed data from a directory of JSON files
    Import(ImportArgs),
    /// Delete every user, restaurant, service and review
    Destroy,
}

#[derive(Args)]
struct ImportArgs {
    /// Directory holding users.json, restaurants.json, services.json and reviews.json
    #[arg(default_value = "_data")]
    dir: PathBuf,
}

/// Restaurant seed record; `owner` is the publishing user's email
#[derive(Deserialize)]
struct SeedRestaurant {
    owner: String,
    #[serde(flatten)]
    restaurant: CreateRestaurantRequest,
}

/// Service seed record attached to a restaurant by name
#[derive(Deserialize)]
struct SeedOffering {
    restaurant: String,
    #[serde(flatten)]
    offering: CreateOfferingRequest,
}

/// Review seed record; `user` is the author's email
#[derive(Deserialize)]
struct SeedReview {
    restaurant: String,
    user: String,
    #[serde(flatten)]
    review: CreateReviewRequest,
}

fn find_restaurant<'a>(
    restaurants: &'a HashMap<String, Restaurant>,
    name: &str,
) -> anyhow::Result<&'a Restaurant> {
    restaurants
        .get(name.trim())
        .ok_or_else(|| anyhow!("unknown restaurant '{}'", name))
}

fn read_records<T: DeserializeOwned>(dir: &Path, file: &str) -> anyhow::Result<Vec<T>> {
    let path = dir.join(file);
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();

    let config = AppConfig::from_env().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;

    let store = config
        .database
        .open_store()
        .await
        .context("failed to open the store")?;
    let geocoder = MapQuestGeocoder::new(&config.geocoder, config.upstream_timeout)?;
    let state = AppState::new(
        &config,
        store,
        Arc::new(geocoder),
        Arc::new(DisabledMailer),
        Arc::new(LocalPhotoStore::new(config.upload.path.clone())),
    )?;

    match cli.command {
        Commands::Import(args) => import(&state, &args.dir).await,
        Commands::Destroy => destroy(&state).await,
    }
}

async fn import(state: &AppState, dir: &Path) -> anyhow::Result<()> {
    let users: Vec<CreateUserRequest> = read_records(dir, "users.json")?;
    let restaurants: Vec<SeedRestaurant> = read_records(dir, "restaurants.json")?;
    let offerings: Vec<SeedOffering> = read_records(dir, "services.json")?;
    let reviews: Vec<SeedReview> = read_records(dir, "reviews.json")?;

    let mut users_by_email: HashMap<String, User> = HashMap::new();
    for request in users {
        let user = state
            .user_service
            .create_user(request)
            .await
            .context("failed to import user")?;
        users_by_email.insert(user.email.clone(), user);
    }
    println!("✅ Imported {} users", users_by_email.len());

    let caller = |email: &str| -> anyhow::Result<CurrentUser> {
        users_by_email
            .get(&email.trim().to_lowercase())
            .cloned()
            .map(CurrentUser::from)
            .ok_or_else(|| anyhow!("unknown user '{}'", email))
    };

    let mut restaurants_by_name: HashMap<String, Restaurant> = HashMap::new();
    for seed in restaurants {
        let owner = caller(&seed.owner)?;
        let restaurant = state
            .restaurant_service
            .create(&owner, seed.restaurant)
            .await
            .with_context(|| format!("failed to import restaurant of {}", seed.owner))?;
        restaurants_by_name.insert(restaurant.name.clone(), restaurant);
    }
    println!("✅ Imported {} restaurants", restaurants_by_name.len());

    let offering_count = offerings.len();
    for seed in offerings {
        let target = find_restaurant(&restaurants_by_name, &seed.restaurant)?;
        let publisher = state.user_service.get_user(target.user).await?;
        state
            .offering_service
            .create(&publisher.into(), target.id, seed.offering)
            .await
            .with_context(|| format!("failed to import service of '{}'", seed.restaurant))?;
    }
    println!("✅ Imported {} services", offering_count);

    let review_count = reviews.len();
    for seed in reviews {
        let target = find_restaurant(&restaurants_by_name, &seed.restaurant)?;
        let author = caller(&seed.user)?;
        state
            .review_service
            .create(&author, target.id, seed.review)
            .await
            .with_context(|| {
                format!("failed to import review of '{}' by {}", seed.restaurant, seed.user)
            })?;
    }
    println!("✅ Imported {} reviews", review_count);

    println!("Data Imported");
    Ok(())
}

async fn destroy(state: &AppState) -> anyhow::Result<()> {
    state.store.clear().await.context("failed to delete data")?;
    println!("Data Deleted");
    Ok(())
}
