//! A one-shot loopback HTTP server that receives the OAuth redirect.
//!
//! Providers redirect the browser to `REDIRECT_URI` with the result of the authorization either in
//! the query string (GET) or, for `response_mode=form_post`, in a form body (POST). The first
//! request to the redirect path ends the wait.

use crate::auth::{AuthGrant, AuthResponse};
use crate::Result;
use anyhow::{bail, Context};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::collections::BTreeMap;
use std::convert::Infallible;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, info};
use url::Url;

type Params = BTreeMap<String, String>;

/// Error codes with which providers report that the user declined.
const CANCEL_ERRORS: &[&str] = &["access_denied", "user_cancelled_authorize"];

const DONE_PAGE: &str = "<!DOCTYPE html><html><body>\
    <p>You can close this window and return to finboard.</p>\
    </body></html>";

/// Listens on the port of `redirect` until the provider redirects back, then interprets the
/// parameters it sent. Ctrl-C while waiting counts as a cancellation.
pub(crate) async fn wait_for_callback(redirect: &Url, expected_state: &str) -> Result<AuthResponse> {
    let port = redirect
        .port_or_known_default()
        .with_context(|| format!("The redirect URI '{redirect}' has no port"))?;
    let listener = TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("Unable to listen for the sign-in redirect on port {port}"))?;
    info!("Waiting for the sign-in redirect on {redirect}");

    tokio::select! {
        params = serve_once(listener, redirect.path()) => interpret(params?, expected_state),
        _ = tokio::signal::ctrl_c() => {
            info!("Sign-in interrupted");
            Ok(AuthResponse::Cancel)
        }
    }
}

/// Serves connections on `listener` until a request for `path` arrives and returns its parameters.
pub(crate) async fn serve_once(listener: TcpListener, path: &str) -> Result<Params> {
    let (tx, mut rx) = mpsc::channel::<Params>(1);
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = accepted.context("Failed to accept a connection")?;
                debug!("Connection from {peer}");
                let io = TokioIo::new(stream);
                let tx = tx.clone();
                let path = path.to_string();
                tokio::spawn(async move {
                    let service = service_fn(move |req| handle(req, path.clone(), tx.clone()));
                    if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                        debug!("Callback connection closed with error: {e}");
                    }
                });
            }
            Some(params) = rx.recv() => return Ok(params),
        }
    }
}

async fn handle(
    req: Request<Incoming>,
    path: String,
    tx: mpsc::Sender<Params>,
) -> std::result::Result<Response<Full<Bytes>>, Infallible> {
    if req.uri().path() != path {
        return Ok(status(StatusCode::NOT_FOUND));
    }
    let params = match *req.method() {
        Method::GET => parse(req.uri().query().unwrap_or_default().as_bytes()),
        Method::POST => match req.into_body().collect().await {
            Ok(body) => parse(&body.to_bytes()),
            Err(e) => {
                debug!("Unable to read the callback body: {e}");
                return Ok(status(StatusCode::BAD_REQUEST));
            }
        },
        _ => return Ok(status(StatusCode::METHOD_NOT_ALLOWED)),
    };
    let _ = tx.send(params).await;
    Ok(Response::new(Full::new(Bytes::from_static(DONE_PAGE.as_bytes()))))
}

fn status(code: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = code;
    response
}

fn parse(input: &[u8]) -> Params {
    url::form_urlencoded::parse(input).into_owned().collect()
}

/// Turns the redirect parameters into an `AuthResponse`.
pub(crate) fn interpret(params: Params, expected_state: &str) -> Result<AuthResponse> {
    if let Some(error) = params.get("error") {
        if CANCEL_ERRORS.contains(&error.as_str()) {
            info!("Sign-in was cancelled");
            return Ok(AuthResponse::Cancel);
        }
        bail!("The identity provider returned an error: {error}");
    }
    match params.get("state") {
        Some(state) if state == expected_state => {}
        _ => bail!("The sign-in redirect did not carry the expected state"),
    }
    Ok(AuthResponse::Success(AuthGrant::new(params)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_interpret_success() {
        let response = interpret(params(&[("code", "abc"), ("state", "s1")]), "s1").unwrap();
        match response {
            AuthResponse::Success(grant) => assert_eq!(grant.get("code"), Some("abc")),
            AuthResponse::Cancel => panic!("expected success"),
        }
    }

    #[test]
    fn test_interpret_cancel() {
        let google = interpret(params(&[("error", "access_denied")]), "s1").unwrap();
        assert_eq!(google, AuthResponse::Cancel);
        let apple = interpret(params(&[("error", "user_cancelled_authorize")]), "s1").unwrap();
        assert_eq!(apple, AuthResponse::Cancel);
    }

    #[test]
    fn test_interpret_failure() {
        assert!(interpret(params(&[("error", "invalid_client")]), "s1").is_err());
        assert!(interpret(params(&[("code", "abc"), ("state", "other")]), "s1").is_err());
        assert!(interpret(params(&[("code", "abc")]), "s1").is_err());
    }

    #[tokio::test]
    async fn test_serve_once_get() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move { serve_once(listener, "/callback").await });

        let client = reqwest::Client::new();
        let miss = client
            .get(format!("http://{addr}/favicon.ico"))
            .send()
            .await
            .unwrap();
        assert_eq!(miss.status().as_u16(), 404);

        let hit = client
            .get(format!("http://{addr}/callback?code=abc&state=xyz"))
            .send()
            .await
            .unwrap();
        assert!(hit.status().is_success());

        let found = server.await.unwrap().unwrap();
        assert_eq!(found, params(&[("code", "abc"), ("state", "xyz")]));
    }

    #[tokio::test]
    async fn test_serve_once_form_post() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move { serve_once(listener, "/").await });

        let response = reqwest::Client::new()
            .post(format!("http://{addr}/"))
            .header("content-type", "application/x-www-form-urlencoded")
            .body("id_token=a.b.c&state=xyz&user=%7B%7D")
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success());

        let found = server.await.unwrap().unwrap();
        assert_eq!(found.get("id_token").map(String::as_str), Some("a.b.c"));
        assert_eq!(found.get("user").map(String::as_str), Some("{}"));
    }
}
