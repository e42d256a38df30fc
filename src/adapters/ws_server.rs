//! WebSocket control endpoint.
//!
//! [`ControlEndpoint`] is the per-server state shared by every WebSocket
//! connection: the [`NetworkBridge`] mapping and a handle to the outbound
//! UART queue.  Its methods are plain functions of the frame text so the
//! whole request path is host-testable; [`start`] registers them with the
//! ESP-IDF HTTP server on the board.
//!
//! ```text
//!  client ──text──▶ on_text ──line──▶ OutboundQueue ──▶ initiator ──▶ UART
//!         ◀─reply──         (status recorded once the line is queued)
//! ```

use crate::app::events::LinkEvent;
use crate::app::ports::EventSink;
use crate::link::bridge::{BridgeAction, NetworkBridge};
use crate::link::queue::{self, EnqueueError, OutboundQueue};

/// Largest text frame accepted.
pub const WS_FRAME_CAP: usize = 128;

/// State shared by every connection of the control endpoint.
pub struct ControlEndpoint<'q> {
    bridge: NetworkBridge,
    queue: &'q OutboundQueue,
}

impl<'q> ControlEndpoint<'q> {
    pub fn new(bridge: NetworkBridge, queue: &'q OutboundQueue) -> Self {
        Self { bridge, queue }
    }

    pub fn bridge(&self) -> &NetworkBridge {
        &self.bridge
    }

    /// A client connected.  Returns the messages to send it, in order.
    pub fn on_open<S: EventSink>(&self, sink: &mut S) -> heapless::Vec<&str, 2> {
        sink.emit(&LinkEvent::ClientConnected);
        self.bridge.on_connect()
    }

    /// A client disconnected.
    pub fn on_close<S: EventSink>(&self, sink: &mut S) {
        sink.emit(&LinkEvent::ClientDisconnected);
    }

    /// Handle one text frame.  Returns the reply to send, if any.
    pub fn on_text<S: EventSink>(&self, text: &str, sink: &mut S) -> Option<&str> {
        let frame = text.trim_end_matches('\0').trim();

        match self.bridge.handle_text(frame) {
            Some(BridgeAction::Forward {
                line,
                status,
                reply,
            }) => match queue::enqueue(self.queue, line) {
                Ok(()) => {
                    self.bridge.record_status(status);
                    sink.emit(&LinkEvent::FrameForwarded { frame, line });
                    Some(reply)
                }
                Err(EnqueueError::Full | EnqueueError::TooLong) => {
                    sink.emit(&LinkEvent::QueueFull(line));
                    None
                }
            },
            Some(BridgeAction::Reply(reply)) => {
                sink.emit(&LinkEvent::FrameAnswered { frame, reply });
                Some(reply)
            }
            None => {
                sink.emit(&LinkEvent::FrameIgnored(frame));
                None
            }
        }
    }
}

/// Register the control endpoint at `/` on a new HTTP server.
///
/// The returned server must be kept alive; dropping it stops the endpoint.
#[cfg(target_os = "espidf")]
pub fn start(
    endpoint: std::sync::Arc<ControlEndpoint<'static>>,
    port: u16,
) -> Result<esp_idf_svc::http::server::EspHttpServer<'static>, crate::error::NetworkError> {
    use esp_idf_svc::http::server::ws::EspHttpWsConnection;
    use esp_idf_svc::http::server::{Configuration, EspHttpServer};
    use esp_idf_svc::sys::{ESP_ERR_INVALID_SIZE, EspError};
    use esp_idf_svc::ws::FrameType;
    use log::{info, warn};

    use crate::adapters::log_sink::LogEventSink;
    use crate::error::NetworkError;

    let config = Configuration {
        http_port: port,
        ..Default::default()
    };
    let mut server = EspHttpServer::new(&config).map_err(|e| {
        warn!("WS: server start failed: {:?}", e);
        NetworkError::ServerStartFailed
    })?;

    server
        .ws_handler("/", move |ws: &mut EspHttpWsConnection| -> Result<(), EspError> {
            let mut sink = LogEventSink::new();

            if ws.is_new() {
                for message in endpoint.on_open(&mut sink) {
                    ws.send(FrameType::Text(false), message.as_bytes())?;
                }
                return Ok(());
            }
            if ws.is_closed() {
                endpoint.on_close(&mut sink);
                return Ok(());
            }

            let (frame_type, len) = ws.recv(&mut [])?;
            if len > WS_FRAME_CAP {
                warn!("WS: frame of {} bytes rejected", len);
                ws.send(FrameType::Close, &[])?;
                return Err(EspError::from_infallible::<ESP_ERR_INVALID_SIZE>());
            }

            let mut buf = [0u8; WS_FRAME_CAP];
            ws.recv(&mut buf)?;

            if !matches!(frame_type, FrameType::Text(_)) {
                info!("WS: ignoring {:?} frame", frame_type);
                return Ok(());
            }
            let Ok(text) = core::str::from_utf8(&buf[..len]) else {
                warn!("WS: non-UTF-8 text frame dropped");
                return Ok(());
            };

            if let Some(reply) = endpoint.on_text(text, &mut sink) {
                ws.send(FrameType::Text(false), reply.as_bytes())?;
            }
            Ok(())
        })
        .map_err(|e| {
            warn!("WS: handler registration failed: {:?}", e);
            NetworkError::ServerStartFailed
        })?;

    info!("WS: control endpoint listening on port {}", port);
    Ok(server)
}
