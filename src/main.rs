pub mod bookings;
pub mod chatbot;
pub mod complaints;
pub mod db;
pub mod error;
pub mod models;
pub mod payments;
pub mod query;
pub mod validation;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, patch, post, put},
    Router,
};
use sqlx::PgPool;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use bookings::{AvailabilityChecker, BookingWriter, BookingsRepository, ServicesRepository, VenueRepository};
use chatbot::{CompletionClient, CompletionConfig, ContextBuilder, Responder};
use complaints::ComplaintsRepository;
use error::ApiError;
use models::{CreateVenue, PriceTier, PriceTierRequest, UpdateVenue, Venue, VenueDetail, VenueImage, VenueStatus};
use payments::{PaymentService, PaymentsRepository};
use query::{QueryParams, QueryValidator};
use validator::Validate;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        create_venue,
        get_venue_by_id,
        update_venue,
        delete_venue,
    ),
    components(
        schemas(Venue, CreateVenue, UpdateVenue, PriceTier, PriceTierRequest, VenueImage, VenueDetail, VenueStatus)
    ),
    tags(
        (name = "venues", description = "Venue management endpoints")
    ),
    info(
        title = "EventAura API",
        version = "1.0.0",
        description = "Venue booking and customer support backend for the Jaffna Thiruvalluvar Cultural Centre",
        contact(
            name = "API Support",
            email = "support@eventaura.lk"
        )
    )
)]
struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub booking_writer: BookingWriter,
    pub payment_service: PaymentService,
    pub complaints_repo: ComplaintsRepository,
    pub responder: Responder,
}

impl AppState {
    /// Wire repositories and services around one connection pool
    pub fn new(db: PgPool, completion: Option<CompletionConfig>) -> Self {
        let venue_repo = VenueRepository::new(db.clone());
        let services_repo = ServicesRepository::new(db.clone());
        let bookings_repo = BookingsRepository::new(db.clone());
        let availability = AvailabilityChecker::new(db.clone());

        let booking_writer = BookingWriter::new(
            venue_repo,
            services_repo,
            bookings_repo.clone(),
            availability,
        );

        let payment_service =
            PaymentService::new(PaymentsRepository::new(db.clone()), bookings_repo);

        let complaints_repo = ComplaintsRepository::new(db.clone());

        let completion_client = completion.and_then(|config| {
            match CompletionClient::new(config) {
                Ok(client) => Some(client),
                Err(e) => {
                    tracing::warn!("Completion client unavailable, using templated replies: {}", e);
                    None
                }
            }
        });
        let responder = Responder::new(ContextBuilder::new(db.clone()), completion_client);

        Self {
            db,
            booking_writer,
            payment_service,
            complaints_repo,
            responder,
        }
    }
}

/// Handler for POST /api/venues
/// Creates a new venue with its price tiers
#[utoipa::path(
    post,
    path = "/api/venues",
    request_body = CreateVenue,
    responses(
        (status = 201, description = "Venue created successfully", body = VenueDetail),
        (status = 400, description = "Invalid input data"),
        (status = 409, description = "Duplicate venue name or tier duration"),
        (status = 500, description = "Internal server error")
    ),
    tag = "venues"
)]
async fn create_venue(
    State(state): State<AppState>,
    Json(payload): Json<CreateVenue>,
) -> Result<(StatusCode, Json<VenueDetail>), ApiError> {
    tracing::debug!("Creating new venue: {}", payload.venue_name);

    payload.validate()?;

    // Tier durations must be distinct before they hit the DB constraint
    let mut durations: Vec<i32> = payload.price_tiers.iter().map(|t| t.duration_hours).collect();
    durations.sort_unstable();
    durations.dedup();
    if durations.len() != payload.price_tiers.len() {
        return Err(ApiError::Conflict {
            message: "Price tier durations must be unique per venue".to_string(),
        });
    }

    if db::check_duplicate_venue(&state.db, &payload.venue_name).await? {
        tracing::warn!("Attempt to create duplicate venue: {}", payload.venue_name);
        return Err(ApiError::Conflict {
            message: format!("Venue with name '{}' already exists", payload.venue_name),
        });
    }

    let mut tx = state.db.begin().await?;

    let venue = sqlx::query_as::<_, Venue>(
        r#"
        INSERT INTO venues (venue_name, capacity, status, image, description)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, venue_name, capacity, status, image, description, created_at, updated_at
        "#,
    )
    .bind(&payload.venue_name)
    .bind(payload.capacity)
    .bind(payload.status)
    .bind(&payload.image)
    .bind(&payload.description)
    .fetch_one(&mut *tx)
    .await?;

    let mut price_tiers = Vec::with_capacity(payload.price_tiers.len());
    for tier in &payload.price_tiers {
        let inserted = sqlx::query_as::<_, PriceTier>(
            r#"
            INSERT INTO price_tiers (venue_id, duration_hours, price)
            VALUES ($1, $2, $3)
            RETURNING id, venue_id, duration_hours, price
            "#,
        )
        .bind(venue.id)
        .bind(tier.duration_hours)
        .bind(tier.price)
        .fetch_one(&mut *tx)
        .await?;

        price_tiers.push(inserted);
    }

    tx.commit().await?;

    tracing::info!("Successfully created venue with id: {}", venue.id);
    Ok((
        StatusCode::CREATED,
        Json(VenueDetail {
            venue,
            price_tiers,
            images: Vec::new(),
        }),
    ))
}

/// Handler for GET /api/venues with query parameters
/// Supports search, status/capacity/rate filters, sorting, and pagination
async fn get_venues_with_query(
    Query(params): Query<QueryParams>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Venue>>, ApiError> {
    tracing::debug!("Fetching venues with query parameters: {:?}", params);

    let validated = QueryValidator::validate(params)
        .map_err(|_e| ApiError::ValidationError(validator::ValidationErrors::new()))?;

    let mut builder = query::SQLQueryBuilder::new();

    if let Some(search) = validated.search {
        builder.add_search_filter(&search);
    }
    if let Some(status) = validated.status {
        builder.add_status_filter(&status);
    }
    if let Some(min_capacity) = validated.min_capacity {
        builder.add_min_capacity(min_capacity);
    }
    if let Some(max_rate) = validated.max_rate {
        builder.add_max_rate(&max_rate.to_string());
    }

    if let Some(sort_field) = validated.sort_field {
        builder.set_sort(sort_field, validated.sort_order);
    }

    builder.set_pagination(validated.page, validated.limit);

    let (query_str, params) = builder.build();

    let mut query = sqlx::query_as::<_, Venue>(&query_str);
    for param in params {
        query = query.bind(param);
    }

    let venues = query.fetch_all(&state.db).await?;

    tracing::debug!("Query returned {} venues", venues.len());
    Ok(Json(venues))
}

/// Handler for GET /api/venues/:id
/// Retrieves a specific venue with its price tiers and images
#[utoipa::path(
    get,
    path = "/api/venues/{id}",
    params(
        ("id" = i32, Path, description = "Venue ID")
    ),
    responses(
        (status = 200, description = "Venue found", body = VenueDetail),
        (status = 404, description = "Venue not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "venues"
)]
async fn get_venue_by_id(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<VenueDetail>, ApiError> {
    tracing::debug!("Fetching venue with id: {}", id);

    let venue = sqlx::query_as::<_, Venue>(
        "SELECT id, venue_name, capacity, status, image, description, created_at, updated_at \
         FROM venues WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| {
        tracing::debug!("Venue with id {} not found", id);
        ApiError::NotFound {
            resource: "Venue".to_string(),
            id: id.to_string(),
        }
    })?;

    let price_tiers = sqlx::query_as::<_, PriceTier>(
        "SELECT id, venue_id, duration_hours, price FROM price_tiers \
         WHERE venue_id = $1 ORDER BY duration_hours",
    )
    .bind(id)
    .fetch_all(&state.db)
    .await?;

    let images = sqlx::query_as::<_, VenueImage>(
        "SELECT id, venue_id, image_url, display_order, uploaded_at FROM venue_images \
         WHERE venue_id = $1 ORDER BY display_order, uploaded_at",
    )
    .bind(id)
    .fetch_all(&state.db)
    .await?;

    tracing::debug!("Successfully retrieved venue: {}", venue.venue_name);
    Ok(Json(VenueDetail {
        venue,
        price_tiers,
        images,
    }))
}

/// Handler for PUT /api/venues/:id
/// Updates an existing venue
#[utoipa::path(
    put,
    path = "/api/venues/{id}",
    params(
        ("id" = i32, Path, description = "Venue ID")
    ),
    request_body = UpdateVenue,
    responses(
        (status = 200, description = "Venue updated successfully", body = Venue),
        (status = 400, description = "Invalid input data"),
        (status = 404, description = "Venue not found"),
        (status = 409, description = "Duplicate venue name"),
        (status = 500, description = "Internal server error")
    ),
    tag = "venues"
)]
async fn update_venue(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateVenue>,
) -> Result<Json<Venue>, ApiError> {
    tracing::debug!("Updating venue with id: {}", id);

    payload.validate()?;

    // Transaction keeps the duplicate check and the update atomic
    let mut tx = state.db.begin().await?;

    let existing = sqlx::query_as::<_, Venue>(
        "SELECT id, venue_name, capacity, status, image, description, created_at, updated_at \
         FROM venues WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| {
        tracing::debug!("Venue with id {} not found for update", id);
        ApiError::NotFound {
            resource: "Venue".to_string(),
            id: id.to_string(),
        }
    })?;

    if let Some(ref new_name) = payload.venue_name {
        if new_name != &existing.venue_name {
            let duplicate_exists: Option<bool> = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM venues WHERE venue_name = $1 AND id != $2)",
            )
            .bind(new_name)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

            if duplicate_exists.unwrap_or(false) {
                tracing::warn!("Attempt to update venue {} to duplicate name: {}", id, new_name);
                return Err(ApiError::Conflict {
                    message: format!("Venue with name '{}' already exists", new_name),
                });
            }
        }
    }

    let updated_venue = sqlx::query_as::<_, Venue>(
        r#"
        UPDATE venues
        SET venue_name = $1,
            capacity = $2,
            status = $3,
            image = $4,
            description = $5,
            updated_at = NOW()
        WHERE id = $6
        RETURNING id, venue_name, capacity, status, image, description, created_at, updated_at
        "#,
    )
    .bind(payload.venue_name.unwrap_or(existing.venue_name))
    .bind(payload.capacity.unwrap_or(existing.capacity))
    .bind(payload.status.unwrap_or(existing.status))
    .bind(payload.image.or(existing.image))
    .bind(payload.description.unwrap_or(existing.description))
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!("Successfully updated venue with id: {}", id);
    Ok(Json(updated_venue))
}

/// Handler for DELETE /api/venues/:id
/// Deletes a venue; venues with booking history cannot be removed
#[utoipa::path(
    delete,
    path = "/api/venues/{id}",
    params(
        ("id" = i32, Path, description = "Venue ID")
    ),
    responses(
        (status = 204, description = "Venue deleted successfully"),
        (status = 404, description = "Venue not found"),
        (status = 409, description = "Venue has booking history"),
        (status = 500, description = "Internal server error")
    ),
    tag = "venues"
)]
async fn delete_venue(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    tracing::debug!("Deleting venue with id: {}", id);

    let result = sqlx::query("DELETE FROM venues WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await;

    match result {
        Ok(result) if result.rows_affected() == 0 => {
            tracing::debug!("Venue with id {} not found for deletion", id);
            Err(ApiError::NotFound {
                resource: "Venue".to_string(),
                id: id.to_string(),
            })
        }
        Ok(_) => {
            tracing::info!("Successfully deleted venue with id: {}", id);
            Ok(StatusCode::NO_CONTENT)
        }
        // Foreign-key violation: slots or pre-arrangements reference it
        Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23503") => {
            Err(ApiError::Conflict {
                message: "Venue has booking history and cannot be deleted; mark it inactive instead"
                    .to_string(),
            })
        }
        Err(e) => Err(e.into()),
    }
}

/// Handler for GET /api/health
/// Reports service and database health
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let venue_count: Result<i64, sqlx::Error> =
        sqlx::query_scalar("SELECT COUNT(*) FROM venues")
            .fetch_one(&state.db)
            .await;

    match venue_count {
        Ok(count) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "healthy",
                "database": "connected",
                "venues_count": count,
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "status": "unhealthy",
                    "database": "unreachable",
                })),
            )
        }
    }
}

/// Creates and configures the application router
/// Maps all API endpoints to their handlers and adds CORS middleware
fn create_router(state: AppState, allowed_origins: Vec<String>) -> Router {
    use axum::http::HeaderValue;
    use tower_http::cors::{Any, CorsLayer};

    // Explicit origins when configured; permissive otherwise
    let cors = if allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Venue routes
        .route("/api/venues", post(create_venue))
        .route("/api/venues", get(get_venues_with_query))
        .route("/api/venues/:id", get(get_venue_by_id))
        .route("/api/venues/:id", put(update_venue))
        .route("/api/venues/:id", delete(delete_venue))
        .route(
            "/api/venues/:id/availability",
            get(bookings::venue_availability_handler),
        )
        // Booking routes
        .route("/api/bookings", post(bookings::create_booking_handler))
        .route("/api/bookings", get(bookings::list_bookings_handler))
        .route("/api/bookings/:id", get(bookings::get_booking_handler))
        .route(
            "/api/bookings/:id/status",
            put(bookings::update_booking_status_handler),
        )
        .route(
            "/api/bookings/:id/payment",
            patch(bookings::update_booking_payment_handler),
        )
        // Payment routes
        .route("/api/payments", post(payments::create_payment_handler))
        .route("/api/payments", get(payments::list_payments_handler))
        .route("/api/payments/:id", get(payments::get_payment_handler))
        .route(
            "/api/payments/:id/status",
            patch(payments::update_payment_state_handler),
        )
        .route(
            "/api/payments/:id/refunds",
            post(payments::create_refund_handler),
        )
        // Complaint routes
        .route("/api/complaints", post(complaints::create_complaint_handler))
        .route("/api/complaints", get(complaints::list_complaints_handler))
        .route("/api/complaints/:id", get(complaints::get_complaint_handler))
        .route(
            "/api/complaints/:id/replies",
            post(complaints::create_reply_handler),
        )
        .route(
            "/api/complaints/:id/status",
            patch(complaints::update_complaint_status_handler),
        )
        // Chatbot
        .route("/api/chat", post(chatbot::chat_handler))
        // Health
        .route("/api/health", get(health_check))
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("EventAura API - Starting...");

    // Get configuration from environment variables
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set in environment");
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let allowed_origins: Vec<String> = std::env::var("ALLOWED_ORIGINS")
        .map(|raw| {
            raw.split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect()
        })
        .unwrap_or_default();

    // Completion API is optional; absence degrades the chatbot to
    // templated replies rather than failing startup
    let completion_config = CompletionConfig::from_env();
    if completion_config.is_none() {
        tracing::warn!("COMPLETION_API_KEY not set; chatbot will use templated replies");
    }

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&database_url)
        .await
        .expect("Failed to create database pool");

    // Run SQLx migrations on startup
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations completed successfully");

    // Create the application router
    let state = AppState::new(db_pool, completion_config);
    let app = create_router(state, allowed_origins);

    // Start the Axum server
    let addr = format!("{}:{}", host, port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("EventAura API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}

#[cfg(test)]
mod tests;
