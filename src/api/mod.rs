use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, patch, post},
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{
    EcoRideError, Result,
    config::CalculatorConfig,
    emissions::{EmissionsResult, TripInput, VehicleType},
    location_matcher::{self, MatchOutcome, default_gazetteer},
    models::{NamedLocation, ProfileUpdate, Ride, User},
    rides::{MyRides, RideBoard, RideFilter, RideOffer},
    session::{MemoryStorage, MockSessionStore, SessionStore},
};

/// Everything the handlers share. One request touches it at a time.
pub struct AppState {
    pub session: Box<dyn SessionStore + Send>,
    pub board: RideBoard,
    pub calculator: CalculatorConfig,
}

pub type SharedState = Arc<Mutex<AppState>>;

impl AppState {
    #[must_use]
    pub fn new(
        session: Box<dyn SessionStore + Send>,
        board: RideBoard,
        calculator: CalculatorConfig,
    ) -> Self {
        Self {
            session,
            board,
            calculator,
        }
    }

    /// Mock sessions kept in memory and the sample ride board
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(
            Box::new(MockSessionStore::new(MemoryStorage::new())),
            RideBoard::with_mock_rides(),
            CalculatorConfig::default(),
        )
    }

    #[must_use]
    pub fn shared(self) -> SharedState {
        Arc::new(Mutex::new(self))
    }
}

#[derive(Serialize, Deserialize)]
pub struct ApiHealth {
    pub healthy: bool,
    pub version: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiVehicle {
    pub vehicle_type: VehicleType,
    pub grams_per_km: f64,
}

#[derive(Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRequest {
    pub distance_km: Option<f64>,
    pub vehicle_type: Option<String>,
    pub passenger_count: Option<u32>,
}

#[derive(Serialize)]
pub struct EstimateResponse {
    pub input: TripInput,
    #[serde(flatten)]
    pub result: EmissionsResult,
}

#[derive(Deserialize)]
pub struct LocationQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub authenticated: bool,
    pub user: Option<User>,
}

impl IntoResponse for EcoRideError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }
        let body = ApiError {
            error: self.code().to_string(),
            message: self.user_message(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/vehicles", get(get_vehicles))
        .route("/emissions", post(estimate_emissions))
        .route("/locations", get(suggest_locations))
        .route("/locations/match", get(match_location))
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(current_session))
        .route("/profile", patch(update_profile))
        .route("/rides", get(search_rides).post(offer_ride))
        .route("/my-rides", get(my_rides))
        .with_state(state)
}

fn lock(state: &SharedState) -> Result<MutexGuard<'_, AppState>> {
    state
        .lock()
        .map_err(|_| EcoRideError::storage("Application state lock poisoned"))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

async fn health() -> Json<ApiHealth> {
    Json(ApiHealth {
        healthy: true,
        version: crate::VERSION.to_string(),
    })
}

async fn get_vehicles() -> Json<Vec<ApiVehicle>> {
    Json(
        VehicleType::all()
            .iter()
            .map(|&vehicle_type| ApiVehicle {
                vehicle_type,
                grams_per_km: vehicle_type.emission_factor(),
            })
            .collect(),
    )
}

async fn estimate_emissions(
    State(state): State<SharedState>,
    Json(request): Json<EstimateRequest>,
) -> Result<Json<EstimateResponse>> {
    let defaults = lock(&state)?.calculator.clone();

    let vehicle = VehicleType::parse(
        request
            .vehicle_type
            .as_deref()
            .unwrap_or(&defaults.default_vehicle),
    )?;
    let input = TripInput::clamped(
        request.distance_km.unwrap_or(defaults.default_distance_km),
        vehicle,
        request
            .passenger_count
            .unwrap_or(defaults.default_passengers),
    );

    Ok(Json(EstimateResponse {
        input,
        result: input.estimate(),
    }))
}

async fn suggest_locations(Query(query): Query<LocationQuery>) -> Json<Vec<NamedLocation>> {
    Json(
        location_matcher::suggest(&query.q, default_gazetteer())
            .into_iter()
            .cloned()
            .collect(),
    )
}

async fn match_location(Query(query): Query<LocationQuery>) -> Json<MatchOutcome<'static>> {
    Json(location_matcher::match_location(&query.q, default_gazetteer()))
}

async fn login(
    State(state): State<SharedState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<User>> {
    let user = lock(&state)?
        .session
        .login(&request.email, &request.password)?;
    Ok(Json(user))
}

async fn register(
    State(state): State<SharedState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>)> {
    if request.password != request.confirm_password {
        return Err(EcoRideError::validation("Passwords don't match"));
    }
    let user = lock(&state)?
        .session
        .register(&request.name, &request.email, &request.password)?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn logout(State(state): State<SharedState>) -> Result<StatusCode> {
    lock(&state)?.session.logout()?;
    Ok(StatusCode::NO_CONTENT)
}

async fn current_session(State(state): State<SharedState>) -> Result<Json<SessionResponse>> {
    let user = lock(&state)?.session.current_user();
    Ok(Json(SessionResponse {
        authenticated: user.is_some(),
        user,
    }))
}

async fn update_profile(
    State(state): State<SharedState>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<User>> {
    let user = lock(&state)?.session.update_profile(update)?;
    Ok(Json(user))
}

async fn search_rides(
    State(state): State<SharedState>,
    Query(filter): Query<RideFilter>,
) -> Result<Json<Vec<Ride>>> {
    let state = lock(&state)?;
    let rides = state.board.search(&filter).into_iter().cloned().collect();
    Ok(Json(rides))
}

async fn offer_ride(
    State(state): State<SharedState>,
    Json(offer): Json<RideOffer>,
) -> Result<(StatusCode, Json<Ride>)> {
    let mut state = lock(&state)?;
    let driver = state
        .session
        .current_user()
        .ok_or(EcoRideError::NotAuthenticated)?;
    let ride = state.board.offer_ride(&driver, offer, today())?.clone();
    Ok((StatusCode::CREATED, Json(ride)))
}

async fn my_rides(State(state): State<SharedState>) -> Result<Json<MyRides>> {
    let state = lock(&state)?;
    let user = state
        .session
        .current_user()
        .ok_or(EcoRideError::NotAuthenticated)?;
    Ok(Json(state.board.my_rides(&user, today())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app() -> Router {
        router(AppState::in_memory().shared())
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn login_demo(app: &Router) {
        let (status, _) = send(
            app,
            Method::POST,
            "/auth/login",
            Some(json!({"email": "user@example.com", "password": "password123"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["healthy"], true);
    }

    #[tokio::test]
    async fn test_vehicles_list_factors() {
        let (_, body) = send(&app(), Method::GET, "/vehicles", None).await;
        assert_eq!(body[0], json!({"vehicleType": "sedan", "gramsPerKm": 120.0}));
        assert_eq!(body.as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_estimate_emissions() {
        let (status, body) = send(
            &app(),
            Method::POST,
            "/emissions",
            Some(json!({"distanceKm": 10.0, "vehicleType": "sedan", "passengerCount": 2})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!((body["savedEmissionsKg"].as_f64().unwrap() - 0.6).abs() < 1e-9);
        assert!((body["treeEquivalent"].as_f64().unwrap() - 0.024).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_estimate_clamps_and_defaults() {
        let (status, body) = send(
            &app(),
            Method::POST,
            "/emissions",
            Some(json!({"distanceKm": 5000.0, "passengerCount": 40})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["input"]["distanceKm"], 1000.0);
        assert_eq!(body["input"]["passengerCount"], 6);
        assert_eq!(body["input"]["vehicle"], "sedan");
    }

    #[tokio::test]
    async fn test_estimate_rejects_unknown_vehicle() {
        let (status, body) = send(
            &app(),
            Method::POST,
            "/emissions",
            Some(json!({"distanceKm": 10.0, "vehicleType": "rocket", "passengerCount": 2})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_vehicle_type");
    }

    #[tokio::test]
    async fn test_location_endpoints() {
        let app = app();
        let (_, body) = send(&app, Method::GET, "/locations?q=york", None).await;
        assert_eq!(body.as_array().unwrap().len(), 4);

        let (_, body) = send(&app, Method::GET, "/locations/match?q=Mumbai", None).await;
        assert_eq!(body["outcome"], "unique");
        assert_eq!(body["locations"]["address"], "Mumbai, Maharashtra, India");

        let (_, body) = send(&app, Method::GET, "/locations/match?q=India", None).await;
        assert_eq!(body["outcome"], "ambiguous");
        assert_eq!(body["locations"].as_array().unwrap().len(), 8);

        let (_, body) = send(&app, Method::GET, "/locations/match?q=", None).await;
        assert_eq!(body["outcome"], "not_found");
    }

    #[tokio::test]
    async fn test_session_flow() {
        let app = app();
        let (_, body) = send(&app, Method::GET, "/auth/me", None).await;
        assert_eq!(body["authenticated"], false);

        let (status, body) = send(
            &app,
            Method::POST,
            "/auth/login",
            Some(json!({"email": "user@example.com", "password": "wrong"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid email or password");

        login_demo(&app).await;
        let (_, body) = send(&app, Method::GET, "/auth/me", None).await;
        assert_eq!(body["user"]["name"], "Demo User");

        let (status, body) = send(
            &app,
            Method::PATCH,
            "/profile",
            Some(json!({"name": "Eco Driver"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Eco Driver");

        let (status, _) = send(&app, Method::POST, "/auth/logout", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, body) = send(&app, Method::GET, "/auth/me", None).await;
        assert_eq!(body["authenticated"], false);
    }

    #[tokio::test]
    async fn test_register_checks_password_confirmation() {
        let app = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/auth/register",
            Some(json!({
                "name": "Asha",
                "email": "asha@example.com",
                "password": "one",
                "confirmPassword": "two"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Passwords don't match");

        let (status, body) = send(
            &app,
            Method::POST,
            "/auth/register",
            Some(json!({
                "name": "Asha",
                "email": "asha@example.com",
                "password": "one",
                "confirmPassword": "one"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], "2");
    }

    #[tokio::test]
    async fn test_rides_require_login_to_offer() {
        let app = app();
        let (status, body) = send(&app, Method::GET, "/rides?source=Central%20Park,%20New%20York", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);

        let offer = json!({
            "source": {"address": "Pune, Maharashtra, India", "lat": 18.5204, "lng": 73.8567},
            "destination": {"address": "Mumbai, Maharashtra, India", "lat": 19.076, "lng": 72.8777},
            "date": "2999-01-01",
            "time": "08:00",
            "seats": 3
        });

        let (status, _) = send(&app, Method::POST, "/rides", Some(offer.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = send(&app, Method::GET, "/my-rides", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        login_demo(&app).await;
        let (status, body) = send(&app, Method::POST, "/rides", Some(offer)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], "4");
        assert_eq!(body["driver"]["name"], "Demo User");

        let (_, body) = send(&app, Method::GET, "/my-rides", None).await;
        assert_eq!(body["upcoming"].as_array().unwrap().len(), 1);
        assert_eq!(body["past"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_offer_validation_message() {
        let app = app();
        login_demo(&app).await;
        let (status, body) = send(&app, Method::POST, "/rides", Some(json!({"date": "2999-01-01"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["message"],
            "Please select both pickup and drop-off locations"
        );
    }
}
