use axum::{Extension, Json};
use serde_json::{json, Value as JsonValue};
use trainer_core::{RatingBand, Speed};

use crate::state::AppState;

/// GET /api/options
/// Choices for the session form, with their defaults.
pub async fn get_options(Extension(state): Extension<AppState>) -> Json<JsonValue> {
    let speeds: Vec<JsonValue> = Speed::ALL
        .iter()
        .map(|s| json!({ "value": s.api_name(), "label": s.label() }))
        .collect();
    let ratings: Vec<u16> = RatingBand::ALL.iter().map(|r| r.rating()).collect();

    Json(json!({
        "colors": ["white", "black"],
        "speeds": speeds,
        "ratings": ratings,
        "defaults": {
            "user_color": "white",
            "starting_color": "white",
            "speeds": Speed::ALL.iter().map(|s| s.api_name()).collect::<Vec<_>>(),
            "ratings": ratings,
            "total_games_threshold": state.default_games_threshold,
        },
    }))
}
