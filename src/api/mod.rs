mod auth;
mod error;
mod personality;
mod pets;
mod posts;
mod shelter;
mod user;

use axum::Router;
use std::sync::Arc;

use crate::auth::AuthService;
use crate::db::Database;
use crate::jwt::JwtConfig;
use crate::media::MediaStore;
use crate::shelter::ShelterClient;

/// Create the API router.
pub fn create_api_router(
    db: Database,
    jwt: Arc<JwtConfig>,
    auth_service: Arc<AuthService>,
    shelter_client: Arc<ShelterClient>,
    media: Arc<dyn MediaStore>,
) -> Router {
    let auth_state = auth::AuthApiState { auth: auth_service };

    let user_state = user::UserState {
        db: db.clone(),
        jwt: jwt.clone(),
        media,
    };

    let pets_state = pets::PetsState {
        db: db.clone(),
        jwt: jwt.clone(),
    };

    let posts_state = posts::PostsState {
        db: db.clone(),
        jwt: jwt.clone(),
    };

    let personality_state = personality::PersonalityState { db, jwt };

    let shelter_state = shelter::ShelterState {
        shelter: shelter_client,
    };

    Router::new()
        .nest("/auth", auth::router(auth_state))
        .nest("/user", user::router(user_state))
        .nest("/pets", pets::router(pets_state))
        .nest("/posts", posts::router(posts_state))
        .nest("/personality", personality::router(personality_state))
        .nest("/shelter", shelter::router(shelter_state))
}
