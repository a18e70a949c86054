//! TCP accept loop. One request per connection: the client writes the whole
//! request in a single burst with no terminator, so reading stops once the
//! buffer parses as a complete request, the peer half-closes, or the size
//! cap is reached. The JSON response is written back and the socket closed.

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, warn};

use crate::dispatcher::Dispatcher;
use crate::protocol::{self, error_body, ParseError};

pub async fn serve(
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    max_request_bytes: usize,
) -> std::io::Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        let dispatcher = Arc::clone(&dispatcher);
        tokio::spawn(async move {
            debug!(event_name = "listener.accepted", peer = %peer, "connection accepted");
            if let Err(err) = handle_connection(stream, dispatcher, max_request_bytes).await {
                warn!(
                    event_name = "listener.connection_error",
                    peer = %peer,
                    error = %err,
                    "connection handling failed"
                );
            }
        });
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    dispatcher: Arc<Dispatcher>,
    max_request_bytes: usize,
) -> std::io::Result<()> {
    let mut buffer = Vec::with_capacity(1024);
    let mut chunk = [0u8; 4096];

    let response = loop {
        if buffer.len() >= max_request_bytes {
            break error_body("request_too_large");
        }

        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            // Peer half-closed; dispatch whatever arrived.
            break dispatcher.dispatch(&String::from_utf8_lossy(&buffer)).await;
        }
        buffer.extend_from_slice(&chunk[..read]);

        let text = String::from_utf8_lossy(&buffer);
        match protocol::parse_request(&text) {
            Ok(request) => break dispatcher.handle(request).await,
            Err(ParseError::Incomplete | ParseError::Empty) => continue,
            Err(ParseError::BadPayload) => break error_body("bad_payload"),
        }
    };

    stream.write_all(response.to_string().as_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}
