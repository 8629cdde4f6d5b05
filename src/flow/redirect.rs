//! Single-shot loopback listener for the authorization redirect.
//!
//! The authorization code flow for installed apps redirects the user's
//! browser to a local address after consent. This listener binds an
//! OS-assigned port on the loopback interface, waits for exactly one
//! request, and extracts the `code`/`state` query parameters. It is not a
//! reusable server: `recv` consumes it.

use crate::error::{Error, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use url::Url;

/// Page shown in the browser once the callback has been captured.
const RESPONSE_BODY: &str =
    "<html><body><p>Authorization complete. You may close this window.</p></body></html>";

/// The captured authorization callback.
#[derive(Debug, Clone)]
pub struct Callback {
    /// Authorization code to exchange at the token endpoint.
    pub code: String,
    /// Opaque state echoed back by the authorization server.
    pub state: Option<String>,
}

/// One-shot listener bound to `127.0.0.1` on an OS-assigned port.
#[derive(Debug)]
pub struct RedirectListener {
    listener: TcpListener,
    redirect_uri: String,
}

impl RedirectListener {
    /// Binds the listener on an ephemeral loopback port.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound.
    pub async fn bind() -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
        let port = listener.local_addr()?.port();
        Ok(Self {
            listener,
            redirect_uri: format!("http://127.0.0.1:{port}"),
        })
    }

    /// The redirect URI to register with the authorization request.
    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Waits for the single redirect request and parses its query.
    ///
    /// Blocks indefinitely until the browser hits the listener; there is no
    /// timeout by design, matching the interactive nature of the flow.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AccessDenied`] when the user declined consent, an
    /// `OAuth` error for other server-reported failures, or
    /// [`Error::InvalidCallback`] when the request carries no code.
    pub async fn recv(self) -> Result<Callback> {
        let (stream, _) = self.listener.accept().await?;
        Self::handle_connection(stream).await
    }

    async fn handle_connection(stream: TcpStream) -> Result<Callback> {
        let mut reader = BufReader::new(stream);
        let mut request_line = String::new();
        reader.read_line(&mut request_line).await?;

        let result = Self::parse_request_line(&request_line);

        // Respond regardless of outcome so the browser tab doesn't hang.
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            RESPONSE_BODY.len(),
            RESPONSE_BODY
        );
        let mut stream = reader.into_inner();
        stream.write_all(response.as_bytes()).await?;
        stream.shutdown().await?;

        result
    }

    /// Parses `GET /?code=...&state=... HTTP/1.1` into a [`Callback`].
    fn parse_request_line(line: &str) -> Result<Callback> {
        let target = line
            .split_whitespace()
            .nth(1)
            .ok_or_else(|| Error::InvalidCallback("malformed request line".to_string()))?;

        let url = Url::parse(&format!("http://localhost{target}"))
            .map_err(|e| Error::InvalidCallback(format!("unparseable request target: {e}")))?;

        let mut code = None;
        let mut state = None;
        let mut error = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => code = Some(value.into_owned()),
                "state" => state = Some(value.into_owned()),
                "error" => error = Some(value.into_owned()),
                _ => {}
            }
        }

        if let Some(error) = error {
            if error == "access_denied" {
                return Err(Error::AccessDenied);
            }
            return Err(Error::oauth_error(error, "authorization redirect error"));
        }

        let code =
            code.ok_or_else(|| Error::InvalidCallback("redirect carried no code".to_string()))?;
        Ok(Callback { code, state })
    }
}
