use std::pin::Pin;

use futures::{
    Sink, SinkExt, Stream, StreamExt,
    future::{self, BoxFuture},
};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::error::ConnectionError;

/// Outbound half of an open connection, accepting text frames.
pub type FrameSink = Pin<Box<dyn Sink<String, Error = ConnectionError> + Send>>;
/// Inbound half of an open connection, yielding text frames until the peer closes.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, ConnectionError>> + Send>>;

/// An open duplex text connection.
pub struct Link {
    /// Frames written here go to the server.
    pub sink: FrameSink,
    /// Frames received from the server; ends when the connection closes.
    pub stream: FrameStream,
}

/// Abstraction over how a connection is opened.
pub trait Connector: Send + Sync + 'static {
    /// Open a connection to `endpoint`.
    fn connect(&self, endpoint: &str) -> BoxFuture<'static, Result<Link, ConnectionError>>;
}

/// [`Connector`] backed by a real WebSocket.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl Connector for WsConnector {
    fn connect(&self, endpoint: &str) -> BoxFuture<'static, Result<Link, ConnectionError>> {
        let endpoint = endpoint.to_string();
        Box::pin(async move {
            let (socket, _response) = connect_async(endpoint.as_str())
                .await
                .map_err(|err| ConnectionError::Connect(err.to_string()))?;
            let (write, read) = socket.split();

            let sink = write
                .sink_map_err(|err| ConnectionError::Transport(err.to_string()))
                .with(|text: String| future::ok::<_, ConnectionError>(Message::Text(text)));

            // Control frames are answered by tungstenite itself; only text reaches the reducer.
            let stream = read
                .take_while(|message| future::ready(!matches!(message, Ok(Message::Close(_)))))
                .filter_map(|message| {
                    future::ready(match message {
                        Ok(Message::Text(text)) => Some(Ok(text)),
                        Ok(_) => None,
                        Err(err) => Some(Err(ConnectionError::Transport(err.to_string()))),
                    })
                });

            Ok(Link {
                sink: Box::pin(sink),
                stream: Box::pin(stream),
            })
        })
    }
}
