//! Favorite toggle handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use tower_sessions::Session;
use tracing::instrument;

use fantasia_core::ProductId;

use crate::error::AppError;
use crate::middleware::{OptionalAuth, catalog_token};
use crate::routes::home::FavoriteView;
use crate::services::favorites::{FavoriteError, toggle_favorite};
use crate::state::AppState;

/// Favorite button fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/favorite_button.html")]
pub struct FavoriteButtonTemplate {
    pub favorite: FavoriteView,
    /// Shown instead of toggling when nobody is signed in.
    pub message: Option<String>,
}

/// Toggle a product in the signed-in user's favorites (HTMX).
///
/// Returns the button in its new state. The visitor's catalog session is
/// updated too, so "load more" pages mark the product correctly.
#[instrument(skip(state, session, user))]
pub async fn toggle(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Path(id): Path<String>,
) -> Result<FavoriteButtonTemplate, AppError> {
    let product = ProductId::new(id);

    match toggle_favorite(&state.profiles(), user.as_ref().map(|u| &u.id), &product).await {
        Ok(favorited) => {
            if let Some(user) = &user {
                let token = catalog_token(&session).await?;
                state
                    .catalog_sessions()
                    .get_or_create(&token)
                    .await
                    .set_favorite(&user.id, &product, favorited)
                    .await;
            }

            Ok(FavoriteButtonTemplate {
                favorite: FavoriteView {
                    product_id: product.to_string(),
                    favorited,
                },
                message: None,
            })
        }
        Err(e @ FavoriteError::Unauthenticated) => Ok(FavoriteButtonTemplate {
            favorite: FavoriteView {
                product_id: product.to_string(),
                favorited: false,
            },
            message: Some(e.to_string()),
        }),
        Err(e) => Err(e.into()),
    }
}
