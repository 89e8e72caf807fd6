//! Connection lifecycle: login, socket session, reconnect with backoff.

use crate::bot::Bot;
use crate::config::Config;
use crate::error::Result;
use crate::protocol::OutboundFrame;
use crate::session::{self, Session};
use crate::upload::{UploadClient, Uploader};

use anyhow::Context as _;
use futures::{Sink, SinkExt as _, StreamExt as _};
use reqwest::header::{self, HeaderValue};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest as _;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};

/// Outbound frames buffered while a render is in flight.
const OUTBOX_CAPACITY: usize = 64;

/// Exponential reconnect delay, doubling from `base` up to `max`.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    attempt: u32,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max: max.max(base),
            attempt: 0,
        }
    }

    pub fn next_delay(&mut self) -> Duration {
        let factor = 2u32.saturating_pow(self.attempt);
        self.attempt = self.attempt.saturating_add(1);
        self.base.saturating_mul(factor).min(self.max)
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}

/// Run the bot until a fatal error. Recoverable failures reconnect forever.
pub async fn run(config: Arc<Config>) -> Result<()> {
    let http = reqwest::Client::builder()
        .user_agent(session::USER_AGENT)
        .timeout(config.request_timeout)
        .build()?;
    let uploader = UploadClient::new(http.clone(), config.base_url.clone());
    let mut bot = Bot::new(config.clone(), http, uploader);
    let mut backoff = Backoff::new(config.reconnect_delay, config.max_reconnect_delay);

    loop {
        let mut frames = 0usize;
        match run_session(&config, &mut bot, &mut frames).await {
            Ok(()) => tracing::info!(frames, "socket closed"),
            Err(error) if error.is_fatal() => {
                tracing::error!(%error, "giving up");
                return Err(error);
            }
            Err(error) => tracing::warn!(%error, frames, "session failed"),
        }

        if frames > 0 {
            backoff.reset();
        }
        bot.reset_roster();

        let delay = backoff.next_delay();
        tracing::info!(delay_secs = delay.as_secs_f64(), "reconnecting");
        tokio::time::sleep(delay).await;
    }
}

/// One login plus one socket connection. `frames` counts data frames received.
async fn run_session<U: Uploader>(
    config: &Config,
    bot: &mut Bot<U>,
    frames: &mut usize,
) -> Result<()> {
    let session = Session::login(config).await?;
    tracing::info!(user = %config.username, "logged in");

    let request = socket_request(config, &session)?;
    bot.set_session(session);

    let (stream, _response) = connect_async(request).await?;
    tracing::info!(url = %config.ws_url, "socket connected");

    let (sink, mut source) = stream.split();
    let (outbox, outbound) = mpsc::channel(OUTBOX_CAPACITY);
    let writer = tokio::spawn(write_frames(sink, outbound));

    let result = loop {
        let message = match source.next().await {
            None => break Ok(()),
            Some(Ok(message)) => message,
            Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) => break Ok(()),
            Some(Err(error)) => break Err(error.into()),
        };

        match message {
            WsMessage::Text(text) => {
                *frames += 1;
                bot.handle_text(text.as_str(), &outbox).await;
            }
            WsMessage::Binary(bytes) => {
                *frames += 1;
                match std::str::from_utf8(&bytes) {
                    Ok(text) => bot.handle_text(text, &outbox).await,
                    Err(error) => tracing::debug!(%error, "dropping non-utf8 binary frame"),
                }
            }
            WsMessage::Close(frame) => {
                tracing::info!(?frame, "server closed the socket");
                break Ok(());
            }
            WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => {}
        }
    };

    drop(outbox);
    match writer.await {
        Ok(Ok(())) => {}
        Ok(Err(error)) => tracing::debug!(%error, "socket writer stopped"),
        Err(error) => tracing::warn!(%error, "socket writer panicked"),
    }

    result
}

/// Handshake request carrying the session cookies and browser-like headers.
fn socket_request(config: &Config, session: &Session) -> Result<Request> {
    let mut request = config.ws_url.as_str().into_client_request()?;
    let headers = request.headers_mut();
    headers.extend(session::default_headers(&config.base_url));
    headers.insert(
        header::COOKIE,
        HeaderValue::from_str(&session.cookie_header())
            .context("session cookies are not a valid header value")?,
    );
    Ok(request)
}

/// Drain the outbox into the socket until every sender is gone.
async fn write_frames<S>(mut sink: S, mut outbound: mpsc::Receiver<OutboundFrame>) -> Result<()>
where
    S: Sink<WsMessage, Error = WsError> + Unpin,
{
    while let Some(frame) = outbound.recv().await {
        let json = frame.to_json()?;
        sink.send(WsMessage::text(json)).await?;
    }
    sink.close().await?;
    Ok(())
}
