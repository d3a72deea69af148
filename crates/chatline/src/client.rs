//! The session orchestrator: two cooperating loops over one channel.
//!
//! The flow is:
//!   1. Inbound loop: receive → state machine → show / acknowledge / fault
//!   2. Outbound loop: next intent → state machine → send, and after an
//!      `AUTH` or `JOIN` hold input until the reply arrives
//!   3. Whichever loop finishes first cancels the other
//!   4. Shutdown: `BYE` unless the session already ended, then close

use std::pin::Pin;
use std::time::Duration;

use chatline_protocol::ProtocolMessage;
use chatline_session::{
    ClientEvent, ClientSession, Fault, Intent, Reaction, SessionError,
    Transition,
};
use chatline_transport::{TcpConnection, TransportError, TransportKind, UdpConnection};
use tokio::sync::futures::Notified;
use tokio::sync::{Mutex, Notify, mpsc};
use tokio_util::sync::CancellationToken;

use crate::{
    ChatError, ClientConfig, ClientOutcome, DatagramBinding, MessageChannel, StreamBinding,
    TimeoutPolicy,
};

const NO_REPLY_CONTENT: &str = "No REPLY received in time";

/// One client run against one server.
///
/// The session sits behind an async mutex shared by both loops; it is only
/// ever locked for a synchronous state-machine step, never across I/O.
pub struct ChatClient<C: MessageChannel> {
    channel: C,
    session: Mutex<ClientSession>,
    reply_arrived: Notify,
    cancel: CancellationToken,
    events: mpsc::UnboundedSender<ClientEvent>,
    reply_timeout: Duration,
    timeout_policy: TimeoutPolicy,
}

impl<C: MessageChannel> ChatClient<C> {
    /// Wraps an established channel. `cancel` is the shutdown trigger; the
    /// caller may fire it (e.g. on Ctrl-C) and the loops fire it when they
    /// finish.
    pub fn new(
        channel: C,
        config: &ClientConfig,
        events: mpsc::UnboundedSender<ClientEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            channel,
            session: Mutex::new(ClientSession::new(config.discord)),
            reply_arrived: Notify::new(),
            cancel,
            events,
            reply_timeout: config.reply_timeout,
            timeout_policy: config.timeout_policy,
        }
    }

    /// Runs the session until either side ends it, then shuts down.
    ///
    /// Never fails: every way a run can end is a [`ClientOutcome`]. Fatal
    /// errors are also reported as [`ClientEvent::LocalError`].
    pub async fn run(self, mut intents: mpsc::Receiver<Intent>) -> ClientOutcome {
        tracing::info!("session started");

        let (inbound, outbound) = tokio::join!(
            async {
                let result = self.inbound_loop().await;
                self.cancel.cancel();
                result
            },
            async {
                let result = self.outbound_loop(&mut intents).await;
                self.cancel.cancel();
                result
            },
        );
        let shutdown = self.shutdown().await;

        let outcome = match inbound.and(outbound).and(shutdown) {
            Ok(()) => ClientOutcome::Clean,
            Err(e) => {
                tracing::debug!(error = %e, "session ended with error");
                self.emit(ClientEvent::LocalError(e.to_string()));
                e.outcome()
            }
        };
        tracing::info!(%outcome, "session finished");
        outcome
    }

    fn emit(&self, event: ClientEvent) {
        // The console may already be gone during shutdown.
        let _ = self.events.send(event);
    }

    async fn inbound_loop(&self) -> Result<(), ChatError> {
        loop {
            let received = tokio::select! {
                _ = self.cancel.cancelled() => return Ok(()),
                received = self.channel.receive() => received?,
            };

            let Some(inbound) = received else {
                let mut session = self.session.lock().await;
                if !session.is_ended() {
                    tracing::info!("server closed the connection");
                    session.mark_ended();
                    self.emit(ClientEvent::ServerClosed);
                }
                return Ok(());
            };

            let reaction = self.session.lock().await.handle_message(&inbound.message);
            match reaction {
                Reaction::Show(event) => {
                    self.emit(event);
                    self.channel.acknowledge(&inbound).await?;
                }
                Reaction::Replied(event) => {
                    self.emit(event);
                    self.channel.acknowledge(&inbound).await?;
                    // Wakes only a request that is currently waiting; a late
                    // duplicate must not release the next one early.
                    self.reply_arrived.notify_waiters();
                }
                Reaction::Ended(event) => {
                    tracing::info!(kind = %inbound.message.kind(), "server ended the session");
                    self.emit(event);
                    self.channel.acknowledge(&inbound).await?;
                    return Ok(());
                }
                Reaction::Nothing => self.channel.acknowledge(&inbound).await?,
                Reaction::Fault { fault, error } => {
                    tracing::warn!(?fault, kind = %inbound.message.kind(), "protocol fault");
                    self.channel.acknowledge(&inbound).await?;
                    // The fault decides the outcome even if the report is lost.
                    if let Err(e) = self.send_draining(&error).await {
                        tracing::warn!(error = %e, "could not report fault to server");
                    }
                    return Err(match fault {
                        Fault::Malformed => ChatError::MalformedMessage,
                        Fault::UnexpectedReply => ChatError::UnexpectedReply,
                    });
                }
            }
        }
    }

    async fn outbound_loop(
        &self,
        intents: &mut mpsc::Receiver<Intent>,
    ) -> Result<(), ChatError> {
        loop {
            let next = tokio::select! {
                _ = self.cancel.cancelled() => return Ok(()),
                next = intents.recv() => next,
            };
            let Some(intent) = next else {
                tracing::info!("local input closed");
                return Ok(());
            };

            let transition = self.session.lock().await.handle_intent(intent);
            match transition {
                Ok(Transition::Local(event)) => self.emit(event),
                Ok(Transition::Send(message)) => {
                    self.deliver(&message).await?;
                }
                Ok(Transition::Request(message)) => {
                    // Armed before sending: the reply may beat the send's
                    // own completion.
                    let reply = self.reply_arrived.notified();
                    tokio::pin!(reply);
                    reply.as_mut().enable();
                    if self.deliver(&message).await? {
                        self.await_reply(reply).await?;
                    }
                }
                Ok(Transition::Farewell(message)) => {
                    self.deliver(&message).await?;
                    return Ok(());
                }
                Err(SessionError::AlreadyEnded) => return Ok(()),
                Err(e) => {
                    tracing::debug!(error = %e, "intent refused");
                    self.emit(ClientEvent::LocalError(e.to_string()));
                }
            }
        }
    }

    /// Sends one message from the outbound loop. Returns `false` if it was
    /// abandoned, either on cancellation or because the timeout policy
    /// dropped it.
    async fn deliver(&self, message: &ProtocolMessage) -> Result<bool, ChatError> {
        let result = tokio::select! {
            _ = self.cancel.cancelled() => return Ok(false),
            result = self.channel.send(message) => result,
        };
        match result {
            Ok(()) => Ok(true),
            Err(ChatError::DeliveryTimeout { kind, .. })
                if self.timeout_policy == TimeoutPolicy::DropMessage
                    && !kind.is_terminal() =>
            {
                tracing::warn!(%kind, "undelivered message dropped");
                self.session.lock().await.abandon_request();
                self.emit(ClientEvent::LocalError(format!(
                    "{kind} message was not delivered"
                )));
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn await_reply(&self, reply: Pin<&mut Notified<'_>>) -> Result<(), ChatError> {
        let waited = tokio::select! {
            _ = self.cancel.cancelled() => return Ok(()),
            waited = tokio::time::timeout(self.reply_timeout, reply) => waited,
        };
        if waited.is_ok() {
            return Ok(());
        }

        tracing::warn!(timeout = ?self.reply_timeout, "request got no reply");
        let error = {
            let mut session = self.session.lock().await;
            session.mark_ended();
            ProtocolMessage::Error {
                sender: session.display_name().to_owned(),
                content: NO_REPLY_CONTENT.to_owned(),
            }
        };
        // The inbound loop is still running and resolves the confirmation.
        if let Err(e) = self.channel.send(&error).await {
            tracing::warn!(error = %e, "could not report missing reply");
        }
        Err(ChatError::NoReply(self.reply_timeout))
    }

    /// Sends while also draining inbound traffic, for when the inbound loop
    /// is not there to resolve confirmations.
    async fn send_draining(&self, message: &ProtocolMessage) -> Result<(), ChatError> {
        tokio::select! {
            result = self.channel.send(message) => result,
            () = self.drain() => Ok(()),
        }
    }

    /// Acknowledges whatever arrives; never completes.
    async fn drain(&self) {
        while let Ok(Some(inbound)) = self.channel.receive().await {
            tracing::debug!(kind = %inbound.message.kind(), "ignored during shutdown");
            if self.channel.acknowledge(&inbound).await.is_err() {
                break;
            }
        }
        std::future::pending::<()>().await;
    }

    async fn shutdown(&self) -> Result<(), ChatError> {
        let bye = self.session.lock().await.begin_shutdown();
        let result = match bye {
            Some(bye) => {
                tracing::info!("sending goodbye");
                self.send_draining(&bye).await
            }
            None => Ok(()),
        };
        if let Err(e) = self.channel.close().await {
            tracing::debug!(error = %e, "close failed");
        }
        result
    }
}

/// Connects with the transport named in `config` and runs a session.
///
/// A connection failure is reported as a [`ClientEvent::LocalError`] and
/// yields [`ClientOutcome::ConnectionFailed`] without any protocol traffic.
pub async fn connect_and_run(
    config: &ClientConfig,
    intents: mpsc::Receiver<Intent>,
    events: mpsc::UnboundedSender<ClientEvent>,
    cancel: CancellationToken,
) -> ClientOutcome {
    tracing::info!(
        transport = %config.transport,
        host = %config.host,
        port = config.port,
        "connecting"
    );
    match config.transport {
        TransportKind::Stream => {
            match TcpConnection::connect(&config.host, config.port).await {
                Ok(conn) => {
                    ChatClient::new(StreamBinding::new(conn), config, events, cancel)
                        .run(intents)
                        .await
                }
                Err(e) => connect_failed(e, &events),
            }
        }
        TransportKind::Datagram => {
            match UdpConnection::connect(&config.host, config.port).await {
                Ok(conn) => {
                    let channel = DatagramBinding::from_config(conn, config);
                    ChatClient::new(channel, config, events, cancel)
                        .run(intents)
                        .await
                }
                Err(e) => connect_failed(e, &events),
            }
        }
    }
}

fn connect_failed(
    err: TransportError,
    events: &mpsc::UnboundedSender<ClientEvent>,
) -> ClientOutcome {
    tracing::debug!(error = %err, "cannot reach server");
    let _ = events.send(ClientEvent::LocalError(err.to_string()));
    ChatError::from(err).outcome()
}
