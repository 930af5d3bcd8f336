//! Shared test helpers: an in-process engine and per-user test clients
//! that speak the wire protocol as raw JSON frames.

use std::sync::Arc;

use tokio::sync::mpsc;

use cinesync_core::config::realtime::RealtimeConfig;
use cinesync_core::traits::archive::NoopArchive;
use cinesync_core::traits::catalog::InMemoryCatalog;
use cinesync_core::types::id::{MovieId, RoomId, UserId};
use cinesync_core::types::movie::MovieInfo;
use cinesync_proto::{ClientMessage, ServerMessage};
use cinesync_realtime::connection::authenticator::AuthenticatedUser;
use cinesync_realtime::connection::handle::ConnectionHandle;
use cinesync_realtime::server::RealtimeEngine;

/// In-process engine with an in-memory catalog. Background tasks are not
/// started; tests drive ticks and sweeps directly where needed.
pub struct TestEngine {
    pub engine: RealtimeEngine,
    pub catalog: Arc<InMemoryCatalog>,
}

impl TestEngine {
    pub fn new() -> Self {
        Self::with_config(RealtimeConfig::default())
    }

    pub fn with_config(config: RealtimeConfig) -> Self {
        let catalog = Arc::new(InMemoryCatalog::new());
        let engine = RealtimeEngine::new(config, catalog.clone(), Arc::new(NoopArchive));
        Self { engine, catalog }
    }

    /// Registers a 90-minute movie and returns its id.
    pub fn add_movie(&self) -> MovieId {
        self.add_movie_with_duration(5400.0)
    }

    pub fn add_movie_with_duration(&self, duration_seconds: f64) -> MovieId {
        let movie = MovieInfo {
            id: MovieId::new(),
            title: "Night Train".to_string(),
            duration_seconds,
            stream_url: "https://streams.example/night-train.m3u8".to_string(),
        };
        let id = movie.id;
        self.catalog.insert(movie);
        id
    }

    /// Connects a new user, as the transport layer would after a
    /// successful token check.
    pub async fn connect(&self, username: &str) -> TestClient {
        self.connect_as(UserId::new(), username).await
    }

    pub async fn connect_as(&self, user_id: UserId, username: &str) -> TestClient {
        let (handle, rx) = self
            .engine
            .register_connection(AuthenticatedUser {
                user_id,
                username: username.to_string(),
            })
            .await;
        TestClient {
            user_id,
            handle,
            rx,
        }
    }

    /// Creates a room and has the owner client join it.
    pub async fn create_and_join(
        &self,
        owner: &mut TestClient,
        movie_id: MovieId,
        max_members: usize,
    ) -> RoomId {
        let snapshot = self
            .engine
            .create_room(owner.user_id, &owner.handle.username, movie_id, max_members)
            .await
            .expect("room creation failed");
        owner.send(&self.engine, ClientMessage::RoomJoin { room_id: snapshot.id }).await;
        owner.drain();
        snapshot.id
    }
}

/// Sends a request to the router over a real hyper connection, so upgrade
/// requests carry the `OnUpgrade` extension that `tower::ServiceExt::oneshot`
/// cannot provide.
#[allow(dead_code)]
pub async fn serve_request(
    router: axum::Router,
    mut request: http::Request<axum::body::Body>,
) -> http::Response<hyper::body::Incoming> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve test router");
    });

    let stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect to test server");
    let io = hyper_util::rt::TokioIo::new(stream);
    let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
        .await
        .expect("http handshake");
    tokio::spawn(conn.with_upgrades());

    request
        .headers_mut()
        .entry(http::header::HOST)
        .or_insert_with(|| http::HeaderValue::from_static("localhost"));
    sender.send_request(request).await.expect("send request")
}

/// One connected user: their handle plus the outbound event stream.
pub struct TestClient {
    pub user_id: UserId,
    pub handle: Arc<ConnectionHandle>,
    pub rx: mpsc::Receiver<ServerMessage>,
}

impl TestClient {
    /// Sends a client event through the engine's raw-frame entry point,
    /// exactly as the WebSocket pump does.
    pub async fn send(&self, engine: &RealtimeEngine, msg: ClientMessage) {
        let raw = serde_json::to_string(&msg).expect("encode client event");
        engine.handle_inbound(&self.handle.id, &raw).await;
    }

    pub async fn send_raw(&self, engine: &RealtimeEngine, raw: &str) {
        engine.handle_inbound(&self.handle.id, raw).await;
    }

    /// Next event already delivered to this client. Panics if none is
    /// queued; engine operations complete their fan-out before returning.
    pub fn recv(&mut self) -> ServerMessage {
        self.rx.try_recv().expect("expected a queued event")
    }

    /// Asserts no further events are queued.
    pub fn expect_silence(&mut self) {
        if let Ok(msg) = self.rx.try_recv() {
            panic!("expected no event, got {msg:?}");
        }
    }

    /// Discards all queued events.
    pub fn drain(&mut self) {
        while self.rx.try_recv().is_ok() {}
    }

    /// Drains until an event matching `pred` is found.
    pub fn recv_until<F>(&mut self, mut pred: F) -> ServerMessage
    where
        F: FnMut(&ServerMessage) -> bool,
    {
        while let Ok(msg) = self.rx.try_recv() {
            if pred(&msg) {
                return msg;
            }
        }
        panic!("expected event not found in queue");
    }
}
