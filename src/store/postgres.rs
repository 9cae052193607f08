//! PostgreSQL Store
//!
//! SQLx implementation of the store traits. Uniqueness rules map onto named
//! unique constraints created by the embedded migrations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{
    Constraint, NewOffering, NewRestaurant, NewReview, NewUser, OfferingChanges, OfferingStore,
    RestaurantChanges, RestaurantStore, ReviewChanges, ReviewStore, Store, StoreError,
    StoreResult, UserChanges, UserStore,
};
use crate::models::{
    Cuisine, GeometryType, Location, Restaurant, Review, Role, ServiceOffering, User,
    UserCredentials,
};

const USER_COLUMNS: &str = "id, name, email, role, password_hash, reset_password_token, \
                            reset_password_expire, created_at";

const RESTAURANT_COLUMNS: &str = "id, name, slug, description, website, phone, email, \
                                  longitude, latitude, formatted_address, street, zipcode, \
                                  country, city, cuisines, delivery, average_rating, \
                                  average_bill, photo, user_id, created_at";

const OFFERING_COLUMNS: &str = "id, description, service_type, events_booking, vegan_menu, \
                                booking_required, kids_friendly, seat_capacity, restaurant_id, \
                                user_id, created_at";

const REVIEW_COLUMNS: &str = "id, title, text, rating, restaurant_id, user_id, created_at";

/// Store backed by a PostgreSQL connection pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded schema migrations
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

/// Translate unique-constraint violations into their domain constraint
fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        let constraint = match db_err.constraint() {
            Some("users_email_key") => Some(Constraint::UserEmail),
            Some("restaurants_name_key") => Some(Constraint::RestaurantName),
            Some("restaurants_exclusive_owner_key") => Some(Constraint::RestaurantOwner),
            Some("reviews_restaurant_user_key") => Some(Constraint::ReviewAuthor),
            _ => None,
        };
        if let Some(constraint) = constraint {
            return StoreError::Duplicate(constraint);
        }
    }
    StoreError::Database(err)
}

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    role: String,
    password_hash: String,
    reset_password_token: Option<String>,
    reset_password_expire: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserCredentials {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: Role = row.role.parse().map_err(StoreError::Corrupt)?;
        Ok(Self {
            id: row.id,
            name: row.name,
            email: row.email,
            role,
            password_hash: row.password_hash,
            reset_password_token: row.reset_password_token,
            reset_password_expire: row.reset_password_expire,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct RestaurantRow {
    id: Uuid,
    name: String,
    slug: String,
    description: String,
    website: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    longitude: f64,
    latitude: f64,
    formatted_address: String,
    street: Option<String>,
    zipcode: Option<String>,
    country: Option<String>,
    city: Option<String>,
    cuisines: Vec<String>,
    delivery: bool,
    average_rating: Option<f64>,
    average_bill: Option<f64>,
    photo: String,
    user_id: Uuid,
    created_at: DateTime<Utc>,
}

impl TryFrom<RestaurantRow> for Restaurant {
    type Error = StoreError;

    fn try_from(row: RestaurantRow) -> Result<Self, Self::Error> {
        let cuisines = row
            .cuisines
            .iter()
            .map(|c| c.parse::<Cuisine>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::Corrupt)?;

        Ok(Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            website: row.website,
            phone: row.phone,
            email: row.email,
            location: Location {
                geometry: GeometryType::Point,
                coordinates: [row.longitude, row.latitude],
                formatted_address: row.formatted_address,
                street: row.street,
                zipcode: row.zipcode,
                country: row.country,
                city: row.city,
            },
            cuisines,
            delivery: row.delivery,
            average_rating: row.average_rating,
            average_bill: row.average_bill,
            photo: row.photo,
            user: row.user_id,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct OfferingRow {
    id: Uuid,
    description: String,
    service_type: String,
    events_booking: bool,
    vegan_menu: bool,
    booking_required: bool,
    kids_friendly: bool,
    seat_capacity: Option<i32>,
    restaurant_id: Uuid,
    user_id: Uuid,
    created_at: DateTime<Utc>,
}

impl From<OfferingRow> for ServiceOffering {
    fn from(row: OfferingRow) -> Self {
        Self {
            id: row.id,
            description: row.description,
            service_type: row.service_type,
            events_booking: row.events_booking,
            vegan_menu: row.vegan_menu,
            booking_required: row.booking_required,
            kids_friendly: row.kids_friendly,
            seat_capacity: row.seat_capacity,
            restaurant: row.restaurant_id,
            user: row.user_id,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct ReviewRow {
    id: Uuid,
    title: String,
    text: String,
    rating: i32,
    restaurant_id: Uuid,
    user_id: Uuid,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            text: row.text,
            rating: row.rating,
            restaurant: row.restaurant_id,
            user: row.user_id,
            created_at: row.created_at,
        }
    }
}

fn cuisine_names(cuisines: &[Cuisine]) -> Vec<String> {
    cuisines.iter().map(|c| c.as_str().to_string()).collect()
}

fn restaurants_from_rows(rows: Vec<RestaurantRow>) -> StoreResult<Vec<Restaurant>> {
    rows.into_iter().map(Restaurant::try_from).collect()
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (id, name, email, role, password_hash) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)?;

        Ok(UserCredentials::try_from(row)?.into())
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.find_credentials(id).await?.map(User::from))
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| UserCredentials::try_from(row).map(User::from))
            .collect()
    }

    async fn find_credentials(&self, id: Uuid) -> StoreResult<Option<UserCredentials>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserCredentials::try_from).transpose()
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> StoreResult<Option<UserCredentials>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserCredentials::try_from).transpose()
    }

    async fn find_credentials_by_reset_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<UserCredentials>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE reset_password_token = $1 AND reset_password_expire > $2"
        ))
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserCredentials::try_from).transpose()
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> StoreResult<Option<User>> {
        let mut tx = self.pool.begin().await?;

        let previous =
            sqlx::query_scalar::<_, String>("SELECT role FROM users WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(previous) = previous else {
            return Ok(None);
        };
        let was_admin = previous.parse::<Role>().map_err(StoreError::Corrupt)?.is_admin();

        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET \
                name = COALESCE($2, name), \
                email = COALESCE($3, email), \
                role = COALESCE($4, role) \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.email)
        .bind(changes.role.map(|r| r.as_str()))
        .fetch_one(&mut *tx)
        .await
        .map_err(classify)?;
        let user = User::from(UserCredentials::try_from(row)?);

        if user.role.is_admin() && !was_admin {
            sqlx::query("UPDATE restaurants SET exclusive_owner = NULL WHERE exclusive_owner = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        } else if was_admin && !user.role.is_admin() {
            sqlx::query(
                "UPDATE restaurants SET exclusive_owner = $1 \
                 WHERE id = (SELECT id FROM restaurants WHERE user_id = $1 \
                             ORDER BY created_at LIMIT 1) \
                   AND NOT EXISTS (SELECT 1 FROM restaurants WHERE exclusive_owner = $1)",
            )
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(Some(user))
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        token: Option<(String, DateTime<Utc>)>,
    ) -> StoreResult<bool> {
        let (hash, expires_at) = match token {
            Some((hash, expires_at)) => (Some(hash), Some(expires_at)),
            None => (None, None),
        };

        let result = sqlx::query(
            "UPDATE users SET reset_password_token = $2, reset_password_expire = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn consume_reset_token(
        &self,
        id: Uuid,
        token_hash: &str,
        password_hash: &str,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $3, \
                reset_password_token = NULL, reset_password_expire = NULL \
             WHERE id = $1 AND reset_password_token = $2",
        )
        .bind(id)
        .bind(token_hash)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<Option<Vec<Uuid>>> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Ok(None);
        }

        // The row lock above blocks concurrent inserts referencing the user
        let owns_restaurant = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM restaurants WHERE user_id = $1 OR exclusive_owner = $1)",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if owns_restaurant {
            return Err(StoreError::UserOwnsRestaurant);
        }

        let affected = sqlx::query_scalar::<_, Uuid>(
            "SELECT DISTINCT restaurant_id FROM reviews WHERE user_id = $1",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM reviews WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM services WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(affected))
    }
}

#[async_trait]
impl RestaurantStore for PgStore {
    async fn insert_restaurant(&self, restaurant: NewRestaurant) -> StoreResult<Restaurant> {
        let exclusive_owner = restaurant.exclusive_owner.then_some(restaurant.user);
        let location = &restaurant.location;

        let row = sqlx::query_as::<_, RestaurantRow>(&format!(
            "INSERT INTO restaurants (id, name, slug, description, website, phone, email, \
                longitude, latitude, formatted_address, street, zipcode, country, city, \
                cuisines, delivery, average_bill, user_id, exclusive_owner) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
                $17, $18, $19) \
             RETURNING {RESTAURANT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&restaurant.name)
        .bind(&restaurant.slug)
        .bind(&restaurant.description)
        .bind(&restaurant.website)
        .bind(&restaurant.phone)
        .bind(&restaurant.email)
        .bind(location.longitude())
        .bind(location.latitude())
        .bind(&location.formatted_address)
        .bind(&location.street)
        .bind(&location.zipcode)
        .bind(&location.country)
        .bind(&location.city)
        .bind(cuisine_names(&restaurant.cuisines))
        .bind(restaurant.delivery)
        .bind(restaurant.average_bill)
        .bind(restaurant.user)
        .bind(exclusive_owner)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)?;

        row.try_into()
    }

    async fn find_restaurant(&self, id: Uuid) -> StoreResult<Option<Restaurant>> {
        let row = sqlx::query_as::<_, RestaurantRow>(&format!(
            "SELECT {RESTAURANT_COLUMNS} FROM restaurants WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Restaurant::try_from).transpose()
    }

    async fn list_restaurants(&self) -> StoreResult<Vec<Restaurant>> {
        let rows = sqlx::query_as::<_, RestaurantRow>(&format!(
            "SELECT {RESTAURANT_COLUMNS} FROM restaurants ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await?;

        restaurants_from_rows(rows)
    }

    async fn restaurants_within(
        &self,
        center: (f64, f64),
        radius_km: f64,
        earth_radius_km: f64,
    ) -> StoreResult<Vec<Restaurant>> {
        // haversine; LEAST guards ASIN against rounding above 1
        let rows = sqlx::query_as::<_, RestaurantRow>(&format!(
            "SELECT {RESTAURANT_COLUMNS} FROM restaurants \
             WHERE 2 * $3 * ASIN(LEAST(1.0, SQRT( \
                POWER(SIN(RADIANS(latitude - $2) / 2), 2) \
                + COS(RADIANS($2)) * COS(RADIANS(latitude)) \
                  * POWER(SIN(RADIANS(longitude - $1) / 2), 2)))) <= $4 \
             ORDER BY created_at"
        ))
        .bind(center.0)
        .bind(center.1)
        .bind(earth_radius_km)
        .bind(radius_km)
        .fetch_all(&self.pool)
        .await?;

        restaurants_from_rows(rows)
    }

    async fn update_restaurant(
        &self,
        id: Uuid,
        changes: RestaurantChanges,
    ) -> StoreResult<Option<Restaurant>> {
        let location = changes.location.as_ref();

        let row = sqlx::query_as::<_, RestaurantRow>(&format!(
            "UPDATE restaurants SET \
                name = COALESCE($2, name), \
                slug = COALESCE($3, slug), \
                description = COALESCE($4, description), \
                website = COALESCE($5, website), \
                phone = COALESCE($6, phone), \
                email = COALESCE($7, email), \
                longitude = CASE WHEN $8 THEN $9 ELSE longitude END, \
                latitude = CASE WHEN $8 THEN $10 ELSE latitude END, \
                formatted_address = CASE WHEN $8 THEN $11 ELSE formatted_address END, \
                street = CASE WHEN $8 THEN $12 ELSE street END, \
                zipcode = CASE WHEN $8 THEN $13 ELSE zipcode END, \
                country = CASE WHEN $8 THEN $14 ELSE country END, \
                city = CASE WHEN $8 THEN $15 ELSE city END, \
                cuisines = COALESCE($16, cuisines), \
                delivery = COALESCE($17, delivery), \
                average_bill = COALESCE($18, average_bill) \
             WHERE id = $1 RETURNING {RESTAURANT_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.slug)
        .bind(changes.description)
        .bind(changes.website)
        .bind(changes.phone)
        .bind(changes.email)
        .bind(location.is_some())
        .bind(location.map(Location::longitude))
        .bind(location.map(Location::latitude))
        .bind(location.map(|l| l.formatted_address.clone()))
        .bind(location.and_then(|l| l.street.clone()))
        .bind(location.and_then(|l| l.zipcode.clone()))
        .bind(location.and_then(|l| l.country.clone()))
        .bind(location.and_then(|l| l.city.clone()))
        .bind(changes.cuisines.as_deref().map(cuisine_names))
        .bind(changes.delivery)
        .bind(changes.average_bill)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;

        row.map(Restaurant::try_from).transpose()
    }

    async fn set_restaurant_photo(&self, id: Uuid, photo: &str) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE restaurants SET photo = $2 WHERE id = $1")
            .bind(id)
            .bind(photo)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn recompute_average_rating(&self, id: Uuid) -> StoreResult<Option<f64>> {
        let average = sqlx::query_scalar::<_, Option<f64>>(
            "UPDATE restaurants SET average_rating = \
                (SELECT AVG(rating)::float8 FROM reviews WHERE restaurant_id = $1) \
             WHERE id = $1 RETURNING average_rating",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(average.flatten())
    }

    async fn delete_restaurant_cascade(&self, id: Uuid) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM services WHERE restaurant_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM reviews WHERE restaurant_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM restaurants WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }
}

#[async_trait]
impl OfferingStore for PgStore {
    async fn insert_offering(&self, offering: NewOffering) -> StoreResult<ServiceOffering> {
        let row = sqlx::query_as::<_, OfferingRow>(&format!(
            "INSERT INTO services (id, description, service_type, events_booking, vegan_menu, \
                booking_required, kids_friendly, seat_capacity, restaurant_id, user_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {OFFERING_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&offering.description)
        .bind(&offering.service_type)
        .bind(offering.events_booking)
        .bind(offering.vegan_menu)
        .bind(offering.booking_required)
        .bind(offering.kids_friendly)
        .bind(offering.seat_capacity)
        .bind(offering.restaurant)
        .bind(offering.user)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_offering(&self, id: Uuid) -> StoreResult<Option<ServiceOffering>> {
        let row = sqlx::query_as::<_, OfferingRow>(&format!(
            "SELECT {OFFERING_COLUMNS} FROM services WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ServiceOffering::from))
    }

    async fn list_offerings(&self, restaurant: Option<Uuid>) -> StoreResult<Vec<ServiceOffering>> {
        let rows = sqlx::query_as::<_, OfferingRow>(&format!(
            "SELECT {OFFERING_COLUMNS} FROM services \
             WHERE $1::uuid IS NULL OR restaurant_id = $1 ORDER BY created_at"
        ))
        .bind(restaurant)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ServiceOffering::from).collect())
    }

    async fn update_offering(
        &self,
        id: Uuid,
        changes: OfferingChanges,
    ) -> StoreResult<Option<ServiceOffering>> {
        let row = sqlx::query_as::<_, OfferingRow>(&format!(
            "UPDATE services SET \
                description = COALESCE($2, description), \
                service_type = COALESCE($3, service_type), \
                events_booking = COALESCE($4, events_booking), \
                vegan_menu = COALESCE($5, vegan_menu), \
                booking_required = COALESCE($6, booking_required), \
                kids_friendly = COALESCE($7, kids_friendly), \
                seat_capacity = COALESCE($8, seat_capacity) \
             WHERE id = $1 RETURNING {OFFERING_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.description)
        .bind(changes.service_type)
        .bind(changes.events_booking)
        .bind(changes.vegan_menu)
        .bind(changes.booking_required)
        .bind(changes.kids_friendly)
        .bind(changes.seat_capacity)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ServiceOffering::from))
    }

    async fn delete_offering(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM services WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ReviewStore for PgStore {
    async fn insert_review(&self, review: NewReview) -> StoreResult<Review> {
        let row = sqlx::query_as::<_, ReviewRow>(&format!(
            "INSERT INTO reviews (id, title, text, rating, restaurant_id, user_id) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&review.title)
        .bind(&review.text)
        .bind(review.rating)
        .bind(review.restaurant)
        .bind(review.user)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)?;

        Ok(row.into())
    }

    async fn find_review(&self, id: Uuid) -> StoreResult<Option<Review>> {
        let row = sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Review::from))
    }

    async fn list_reviews(&self, restaurant: Option<Uuid>) -> StoreResult<Vec<Review>> {
        let rows = sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews \
             WHERE $1::uuid IS NULL OR restaurant_id = $1 ORDER BY created_at"
        ))
        .bind(restaurant)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Review::from).collect())
    }

    async fn update_review(
        &self,
        id: Uuid,
        changes: ReviewChanges,
    ) -> StoreResult<Option<Review>> {
        let row = sqlx::query_as::<_, ReviewRow>(&format!(
            "UPDATE reviews SET \
                title = COALESCE($2, title), \
                text = COALESCE($3, text), \
                rating = COALESCE($4, rating) \
             WHERE id = $1 RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.title)
        .bind(changes.text)
        .bind(changes.rating)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Review::from))
    }

    async fn delete_review(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn clear(&self) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        for table in ["reviews", "services", "restaurants", "users"] {
            sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
