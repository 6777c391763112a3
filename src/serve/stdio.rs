//! JSON-lines command shell.
//!
//! # Responsibilities
//! - Read one command per line, tagged by `op`
//! - Execute it on a channel (so empty queue arguments resolve per session)
//! - Write exactly one JSON reply line per command
//! - Apply topology reloads between commands
//!
//! ```text
//! {"op":"declare_queue","name":"foo"}
//! {"op":"bind","exchange":"amq.topic","queue":"","routing_key":"x.#"}
//! {"op":"publish","exchange":"amq.topic","routing_key":"x.y","headers":{"h1":12345}}
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::broker::service::Broker;
use crate::broker::topology::apply_topology;
use crate::config::schema::BrokerConfig;
use crate::lifecycle::shutdown::ShutdownSignal;
use crate::routing::types::{Destinations, Envelope, ExchangeKind, HeaderTable, RoutingResult};
use crate::session::channel::Channel;

/// One shell command.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    DeclareExchange {
        name: String,
        kind: ExchangeKind,
    },
    DeleteExchange {
        name: String,
    },
    DeclareQueue {
        #[serde(default)]
        name: String,
    },
    DeleteQueue {
        name: String,
    },
    Bind {
        exchange: String,
        #[serde(default)]
        queue: String,
        #[serde(default)]
        routing_key: String,
        #[serde(default)]
        arguments: Option<HeaderTable>,
    },
    Unbind {
        exchange: String,
        #[serde(default)]
        queue: String,
        #[serde(default)]
        routing_key: String,
        #[serde(default)]
        arguments: Option<HeaderTable>,
    },
    Publish {
        exchange: String,
        #[serde(default)]
        routing_key: String,
        #[serde(default)]
        headers: Option<HeaderTable>,
        #[serde(default)]
        body: String,
    },
}

/// Reply to one command.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Reply {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destinations: Option<Destinations>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Reply {
    fn ok() -> Self {
        Self {
            ok: true,
            ..Self::default()
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(message.into()),
            ..Self::default()
        }
    }

    fn from_result<T>(result: RoutingResult<T>, fill: impl FnOnce(&mut Reply, T)) -> Self {
        match result {
            Ok(value) => {
                let mut reply = Reply::ok();
                fill(&mut reply, value);
                reply
            }
            Err(e) => Reply::error(e.to_string()),
        }
    }
}

/// Counters reported when the shell stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServeSummary {
    pub commands: usize,
    pub failures: usize,
    pub reloads: usize,
}

/// A command shell bound to one channel of a broker.
pub struct StdioServer {
    channel: Channel,
    applied: Option<BrokerConfig>,
    summary: ServeSummary,
}

impl StdioServer {
    /// `applied` is the topology already loaded into the broker, if any.
    pub fn new(broker: &Arc<Broker>, applied: Option<BrokerConfig>) -> Self {
        Self {
            channel: broker.channel(),
            applied,
            summary: ServeSummary::default(),
        }
    }

    /// Run until input ends or shutdown is signalled.
    pub async fn run<R, W>(
        mut self,
        input: R,
        mut output: W,
        mut topology_updates: mpsc::UnboundedReceiver<BrokerConfig>,
        mut shutdown: ShutdownSignal,
    ) -> std::io::Result<ServeSummary>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        tracing::info!(session = %self.channel.session(), "Command shell ready");

        loop {
            tokio::select! {
                _ = shutdown.wait() => {
                    tracing::info!("Shutdown signal received, stopping command shell");
                    break;
                }
                Some(next) = topology_updates.recv() => self.reload(next),
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    if line.trim().is_empty() {
                        continue;
                    }
                    let reply = self.handle_line(&line);
                    let mut encoded = serde_json::to_vec(&reply)?;
                    encoded.push(b'\n');
                    output.write_all(&encoded).await?;
                    output.flush().await?;
                }
            }
        }

        tracing::info!(
            commands = self.summary.commands,
            failures = self.summary.failures,
            reloads = self.summary.reloads,
            "Command shell stopped"
        );
        Ok(self.summary)
    }

    /// Parse and execute one line.
    pub fn handle_line(&mut self, line: &str) -> Reply {
        self.summary.commands += 1;
        let reply = match serde_json::from_str::<Command>(line) {
            Ok(command) => self.execute(command),
            Err(e) => Reply::error(format!("invalid command: {e}")),
        };
        if !reply.ok {
            self.summary.failures += 1;
            tracing::debug!(error = ?reply.error, "Command failed");
        }
        reply
    }

    fn execute(&self, command: Command) -> Reply {
        let channel = &self.channel;
        match command {
            Command::DeclareExchange { name, kind } => {
                Reply::from_result(channel.exchange_declare(&name, kind), |_, ()| {})
            }
            Command::DeleteExchange { name } => {
                Reply::from_result(channel.exchange_delete(&name), |_, ()| {})
            }
            Command::DeclareQueue { name } => {
                Reply::from_result(channel.queue_declare(&name), |reply, queue| {
                    reply.queue = Some(queue)
                })
            }
            Command::DeleteQueue { name } => Reply {
                removed: Some(channel.queue_delete(&name)),
                ..Reply::ok()
            },
            Command::Bind {
                exchange,
                queue,
                routing_key,
                arguments,
            } => Reply::from_result(
                channel.queue_bind(&queue, &exchange, &routing_key, arguments.as_ref()),
                |_, ()| {},
            ),
            Command::Unbind {
                exchange,
                queue,
                routing_key,
                arguments,
            } => Reply::from_result(
                channel.queue_unbind(&queue, &exchange, &routing_key, arguments.as_ref()),
                |_, ()| {},
            ),
            Command::Publish {
                exchange,
                routing_key,
                headers,
                body,
            } => {
                let envelope = Envelope {
                    routing_key,
                    headers,
                    body: body.into_bytes(),
                };
                Reply::from_result(channel.basic_publish(&exchange, &envelope), |reply, dests| {
                    reply.destinations = Some(dests)
                })
            }
        }
    }

    fn reload(&mut self, next: BrokerConfig) {
        match apply_topology(self.channel.broker(), &next, self.applied.as_ref()) {
            Ok(_) => {
                self.applied = Some(next);
                self.summary.reloads += 1;
            }
            // Rejected before any change; the broker still holds `applied`
            Err(e) => {
                tracing::warn!(error = %e, "Rejected topology reload, keeping current bindings");
            }
        }
    }
}
