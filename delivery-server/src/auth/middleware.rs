//! Authentication middleware

use axum::{extract::Request, middleware::Next, response::Response};

use crate::auth::CurrentActor;
use crate::security_log;
use crate::utils::AppError;
use shared::models::Role;

/// Require an identity on every `/api/` request
///
/// Injects [`CurrentActor`] into the request extensions.
///
/// # Skipped
///
/// - `OPTIONS *` (CORS preflight)
/// - anything outside `/api/` (health checks, 404s)
pub async fn require_auth(mut req: Request, next: Next) -> Result<Response, AppError> {
    if req.method() == http::Method::OPTIONS || !req.uri().path().starts_with("/api/") {
        return Ok(next.run(req).await);
    }

    let actor = match CurrentActor::from_headers(req.headers()) {
        Ok(actor) => actor,
        Err(err) => {
            security_log!("WARN", "auth_missing", uri = req.uri().to_string());
            return Err(err);
        }
    };
    req.extensions_mut().insert(actor);
    Ok(next.run(req).await)
}

/// Role routing guard, layered once per role router
///
/// ```ignore
/// Router::new()
///     .route("/api/driver/orders", get(handler::orders))
///     .layer(middleware::from_fn(require_role(Role::Driver)));
/// ```
///
/// Wrong role returns 403 Forbidden.
pub fn require_role(
    role: Role,
) -> impl Fn(
    Request,
    Next,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AppError>> + Send>>
+ Clone {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let actor = req
                .extensions()
                .get::<CurrentActor>()
                .ok_or(AppError::Unauthorized)?;

            if actor.role != role {
                security_log!(
                    "WARN",
                    "role_denied",
                    actor_id = actor.id.clone(),
                    actor_role = actor.role.to_string(),
                    required_role = role.to_string()
                );
                return Err(AppError::forbidden(format!(
                    "{} routes are not available to {}",
                    role, actor.role
                )));
            }

            Ok(next.run(req).await)
        })
    }
}
