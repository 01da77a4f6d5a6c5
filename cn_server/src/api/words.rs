//! Word pool administration handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use super::{AppState, errors::ApiError};

#[derive(Debug, Serialize, Deserialize)]
pub struct WordListResponse {
    pub count: usize,
    pub words: Vec<String>,
}

/// Either a single `word` or a batch of `words`
#[derive(Debug, Deserialize)]
pub struct AddWordsRequest {
    pub word: Option<String>,
    pub words: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddWordsResponse {
    pub added: usize,
}

#[derive(Debug, Deserialize)]
pub struct DeactivateWordRequest {
    #[serde(default)]
    pub word: String,
}

/// `GET /api/words`: active words used for new boards
pub async fn list_words(State(state): State<AppState>) -> Result<Json<WordListResponse>, ApiError> {
    let words = state.words.list_words().await?;
    Ok(Json(WordListResponse {
        count: words.len(),
        words,
    }))
}

/// `POST /api/words` with `{"word": "..."}` or `{"words": [...]}`
pub async fn add_words(
    State(state): State<AppState>,
    request: Result<Json<AddWordsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AddWordsResponse>), ApiError> {
    let Json(request) = request?;
    let added = match (request.word, request.words) {
        (Some(word), None) => {
            state.words.add_word(&word).await?;
            1
        }
        (None, Some(words)) => state.words.add_words(&words).await?,
        (Some(word), Some(mut words)) => {
            words.push(word);
            state.words.add_words(&words).await?
        }
        (None, None) => return Err(ApiError::bad_request("word or words is required")),
    };

    tracing::info!(added, "Words added to pool");
    Ok((StatusCode::CREATED, Json(AddWordsResponse { added })))
}

/// `DELETE /api/words` with `{"word": "..."}`
pub async fn deactivate_word(
    State(state): State<AppState>,
    request: Result<Json<DeactivateWordRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(request) = request?;
    state.words.deactivate_word(&request.word).await?;
    tracing::info!(word = %request.word, "Word deactivated");
    Ok(StatusCode::NO_CONTENT)
}
