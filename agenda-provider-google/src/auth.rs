//! OAuth for Google Calendar: consent in the browser, a loopback callback,
//! the code exchange and token refresh.

use agenda_core::credentials::{CALENDAR_SCOPE, Credentials, GOOGLE_TOKEN_URI};
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use google_calendar::{AccessToken, Client};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

const REDIRECT_PORT: u16 = 8085;

pub fn redirect_uri() -> String {
    format!("http://localhost:{}/callback", REDIRECT_PORT)
}

fn redirect_address() -> String {
    format!("127.0.0.1:{}", REDIRECT_PORT)
}

/// API client for a credential bundle.
pub(crate) fn client(credentials: &Credentials) -> Client {
    Client::new(
        credentials.client_id.clone(),
        credentials.client_secret.clone(),
        redirect_uri(),
        credentials.token.clone(),
        credentials.refresh_token.clone(),
    )
}

/// Run the consent flow and return fresh credentials.
pub async fn login(client_id: &str, client_secret: &str) -> Result<Credentials> {
    let scopes = vec![CALENDAR_SCOPE.to_string()];

    let mut client = Client::new(
        client_id.to_string(),
        client_secret.to_string(),
        redirect_uri(),
        String::new(),
        String::new(),
    );

    let auth_url = client.user_consent_url(&scopes);

    eprintln!("\nOpen this URL in your browser to sign in with Google:\n");
    eprintln!("{}\n", auth_url);

    if open::that(&auth_url).is_err() {
        eprintln!("(Could not open browser automatically, please copy the URL above)");
    }

    let (code, state) = wait_for_callback().await?;

    eprintln!("\nReceived authorization code, exchanging for tokens...");

    let access_token = client
        .get_access_token(&code, &state)
        .await
        .context("Failed to exchange authorization code")?;

    tracing::info!("Google sign-in completed");

    Ok(credentials_from(access_token, client_id, client_secret, "", scopes))
}

/// Exchange the refresh token for a new access token.
///
/// The partition key derives from the access token, so the refreshed
/// credentials may address a different event file than the old ones.
pub async fn refresh(credentials: &Credentials) -> Result<Credentials> {
    let access_token = client(credentials)
        .refresh_access_token()
        .await
        .context("Failed to refresh Google access token")?;

    tracing::warn!("Google access token refreshed, the user partition key may change");

    Ok(credentials_from(
        access_token,
        &credentials.client_id,
        &credentials.client_secret,
        &credentials.refresh_token,
        credentials.scopes.clone(),
    ))
}

fn credentials_from(
    token: AccessToken,
    client_id: &str,
    client_secret: &str,
    previous_refresh_token: &str,
    scopes: Vec<String>,
) -> Credentials {
    let expires_at = if token.expires_in > 0 {
        Some(Utc::now() + Duration::seconds(token.expires_in))
    } else {
        None
    };

    // Google typically doesn't return a new refresh_token on refresh
    let refresh_token = if token.refresh_token.is_empty() {
        previous_refresh_token.to_string()
    } else {
        token.refresh_token
    };

    Credentials {
        token: token.access_token,
        refresh_token,
        token_uri: GOOGLE_TOKEN_URI.to_string(),
        client_id: client_id.to_string(),
        client_secret: client_secret.to_string(),
        scopes,
        expires_at,
    }
}

async fn wait_for_callback() -> Result<(String, String)> {
    let listener = TcpListener::bind(redirect_address())
        .await
        .context("Failed to bind OAuth callback listener")?;

    let (stream, _) = listener
        .accept()
        .await
        .context("Failed to accept OAuth callback")?;

    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader
        .read_line(&mut request_line)
        .await
        .context("Failed to read OAuth callback request line")?;

    let result = parse_callback(&request_line);

    let (status, message) = match &result {
        Ok(_) => ("200 OK", "Signed in. You can close this window and return to the terminal."),
        Err(_) => ("400 Bad Request", "Sign-in failed. Check the terminal for details."),
    };
    let response = format!(
        "HTTP/1.1 {status}\r\n\
        Content-Type: text/html\r\n\
        Connection: close\r\n\
        \r\n\
        <html><body><h1>agenda</h1><p>{message}</p></body></html>"
    );

    let mut stream = reader.into_inner();
    stream
        .write_all(response.as_bytes())
        .await
        .context("Failed to write OAuth callback response")?;
    stream.flush().await?;

    result
}

/// Pull `code` and `state` out of the callback's HTTP request line.
fn parse_callback(request_line: &str) -> Result<(String, String)> {
    let url_part = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("Invalid HTTP request"))?;

    let url = url::Url::parse(&format!("http://localhost{}", url_part))?;
    let param = |name: &str| {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.to_string())
    };

    if let Some(error) = param("error") {
        anyhow::bail!("Google sign-in was not completed: {}", error);
    }

    let code = param("code").ok_or_else(|| anyhow::anyhow!("No code in callback"))?;
    let state = param("state").ok_or_else(|| anyhow::anyhow!("No state in callback"))?;

    Ok((code, state))
}
