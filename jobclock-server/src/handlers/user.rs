use crate::authentication::{hash_password, issue_session, validate_credentials, AuthedUser};
use crate::error::{AuthError, ServerError};
use crate::handlers::db_error;
use crate::models::NewUser;
use crate::router::AppState;
use axum::extract::{Path, State};
use axum::response::Json;
use jobclock_common::api::{
    AddFavoriteRequest, ApiSuccess, FavoritesResponse, LoginRequest, LoginResponse,
    RemoveFavoriteRequest, SignupRequest, UserInfo,
};
use jobclock_common::domain::Favorite;
use tracing::error;

fn user_info(user: &crate::models::User) -> UserInfo {
    UserInfo {
        id: user.id,
        emp_code: user.emp_code.clone(),
        emp_name: user.emp_name.clone(),
        verified: user.verified,
    }
}

pub async fn signup(
    state: State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<Json<ApiSuccess<UserInfo>>, ServerError> {
    if req.emp_code.is_empty()
        || !req
            .emp_code
            .chars()
            .all(|x| x.is_ascii_alphanumeric() || x == '-' || x == '_')
    {
        return Err(ServerError::Validation(
            "Only alphanumeric, hyphens and underscores are allowed in the employee code",
        ));
    }
    if req.password.is_empty() {
        return Err(ServerError::Validation("Password is required"));
    }

    let hashed_password = hash_password(&req.password).map_err(|err| {
        error!("Failed to hash password {err}");
        ServerError::UnexpectedError("Failed to register user")
    })?;

    let new_user = NewUser {
        emp_code: req.emp_code,
        emp_name: req.emp_name,
        password: hashed_password,
    };

    // accounts start unverified; an admin flips them before first login
    let user = state
        .database
        .add_user(new_user)
        .await
        .map_err(|e| db_error(e, "User not found"))?;

    Ok(Json(ApiSuccess::new(user_info(&user))))
}

pub async fn login(
    state: State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiSuccess<LoginResponse>>, ServerError> {
    let user = validate_credentials(&state, &req.emp_code, &req.password).await?;
    let session = issue_session(&state, &user, req.remember).await?;

    Ok(Json(ApiSuccess::new(LoginResponse {
        session,
        user: user_info(&user),
    })))
}

pub async fn logout(
    user: AuthedUser,
    state: State<AppState>,
) -> Result<Json<ApiSuccess<bool>>, ServerError> {
    state
        .database
        .remove_session(user.token())
        .await
        .map_err(|e| db_error(e, "Session not found"))?;

    Ok(Json(ApiSuccess::new(true)))
}

/// Token check for the client: resolves the live user row so a stale
/// session for a deleted account fails here rather than later.
pub async fn validate(
    user: AuthedUser,
    state: State<AppState>,
) -> Result<Json<ApiSuccess<UserInfo>>, ServerError> {
    let user = state.database.user(&user.emp_code).await.map_err(|e| match e {
        crate::database::DbError::NotFound => AuthError::UserDeleted.into(),
        other => db_error(other, "User not found"),
    })?;

    Ok(Json(ApiSuccess::new(user_info(&user))))
}

pub async fn favorites_list(
    user: AuthedUser,
    state: State<AppState>,
    Path(emp_code): Path<String>,
) -> Result<Json<FavoritesResponse>, ServerError> {
    // favorites are private to their owner
    if emp_code != user.emp_code {
        return Err(ServerError::NotFound("Favorites not found"));
    }

    let favorites: Vec<Favorite> = state
        .database
        .favorites(&user.emp_code)
        .await
        .map_err(|e| db_error(e, "Favorites not found"))?;

    Ok(Json(ApiSuccess::new(favorites)))
}

pub async fn favorites_add(
    user: AuthedUser,
    state: State<AppState>,
    Json(req): Json<AddFavoriteRequest>,
) -> Result<Json<FavoritesResponse>, ServerError> {
    if req.job_no.trim().is_empty() {
        return Err(ServerError::Validation("job_no is required"));
    }

    let favorites = state
        .database
        .add_favorite(
            &user.emp_code,
            crate::database::users::NewFavorite {
                job_no: req.job_no,
                job_name: req.job_name,
                acc_no: req.acc_no,
                acc_name: req.acc_name,
            },
        )
        .await
        .map_err(|e| db_error(e, "Favorites not found"))?;

    Ok(Json(ApiSuccess::new(favorites)))
}

pub async fn favorites_remove(
    user: AuthedUser,
    state: State<AppState>,
    Json(req): Json<RemoveFavoriteRequest>,
) -> Result<Json<FavoritesResponse>, ServerError> {
    let favorites = state
        .database
        .remove_favorite(&user.emp_code, &req.job_no)
        .await
        .map_err(|e| db_error(e, "Favorites not found"))?;

    Ok(Json(ApiSuccess::new(favorites)))
}
