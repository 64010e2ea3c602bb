// 🔑 Consent redirect catcher
// One-shot loopback server: waits for Google's redirect after the user approves
// access, hands back `code`/`state`, then shuts down.

use std::collections::HashMap;

/// Query parameters Google appends to the redirect URI
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthorizationResponse {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

impl AuthorizationResponse {
    pub fn from_query(params: &HashMap<String, String>) -> Self {
        AuthorizationResponse {
            code: params.get("code").cloned(),
            state: params.get("state").cloned(),
            error: params.get("error").cloned(),
        }
    }

    /// Requests without `code` or `error` (favicon, probes) are not the redirect
    pub fn is_redirect(&self) -> bool {
        self.code.is_some() || self.error.is_some()
    }
}

#[cfg(feature = "consent")]
pub use server::wait_for_redirect;

#[cfg(feature = "consent")]
mod server {
    use super::AuthorizationResponse;
    use anyhow::{anyhow, Context, Result};
    use axum::{extract::Query, http::StatusCode, response::Html, Router};
    use std::collections::HashMap;
    use std::net::SocketAddr;
    use std::time::Duration;
    use tokio::sync::{mpsc, oneshot};

    const SUCCESS_PAGE: &str =
        "<html><body><h3>Authorization complete.</h3><p>You can close this window.</p></body></html>";
    const FAILURE_PAGE: &str =
        "<html><body><h3>Authorization failed.</h3><p>Check the terminal for details.</p></body></html>";
    const NOT_FOUND_PAGE: &str = "<html><body>Not found</body></html>";

    /// Block until the browser hits `http://localhost:{port}/` with the authorization result
    pub fn wait_for_redirect(port: u16) -> Result<AuthorizationResponse> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to start redirect listener runtime")?;

        runtime.block_on(serve_once(port))
    }

    async fn serve_once(port: u16) -> Result<AuthorizationResponse> {
        let (redirect_tx, mut redirect_rx) = mpsc::channel::<AuthorizationResponse>(1);

        let app = Router::new().fallback(move |Query(params): Query<HashMap<String, String>>| {
            let redirect_tx = redirect_tx.clone();
            async move {
                let response = AuthorizationResponse::from_query(&params);
                if !response.is_redirect() {
                    return (StatusCode::NOT_FOUND, Html(NOT_FOUND_PAGE));
                }

                let page = if response.code.is_some() { SUCCESS_PAGE } else { FAILURE_PAGE };
                let _ = redirect_tx.try_send(response);
                (StatusCode::OK, Html(page))
            }
        });

        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind redirect listener on {}", addr))?;

        log::info!("[Auth] Waiting for authorization redirect on http://localhost:{}/", port);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        let response = redirect_rx
            .recv()
            .await
            .ok_or_else(|| anyhow!("Redirect listener stopped before authorization completed"))?;

        let _ = shutdown_tx.send(());
        // Browsers may keep the connection open; don't wait on them forever
        if tokio::time::timeout(Duration::from_secs(5), server).await.is_err() {
            log::debug!("[Auth] Redirect listener did not drain in time, dropping it");
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_redirect_with_code() {
        let response = AuthorizationResponse::from_query(&params(&[("code", "4/abc"), ("state", "s1")]));
        assert!(response.is_redirect());
        assert_eq!(response.code.as_deref(), Some("4/abc"));
        assert_eq!(response.state.as_deref(), Some("s1"));
    }

    #[test]
    fn test_redirect_with_error() {
        let response = AuthorizationResponse::from_query(&params(&[("error", "access_denied")]));
        assert!(response.is_redirect());
        assert_eq!(response.code, None);
    }

    #[test]
    fn test_unrelated_request_is_not_redirect() {
        assert!(!AuthorizationResponse::from_query(&params(&[])).is_redirect());
    }
}
