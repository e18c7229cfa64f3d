//! Serve command implementation.
//!
//! Hosts one kernel session over JSON lines on stdin/stdout (see
//! [`protocol`](crate::protocol)). Requests are handled one at a time,
//! except `interrupt_request` and `input_reply`, which are acted on as soon
//! as they are read so they can reach a cell that is still running.
//!
//! A fatal kernel error (see [`Error::is_fatal`]) is answered like any other
//! failed request, then ends the session with a non-zero exit.

use std::io::BufRead;

use dkernel_core::{
    Error, ExecuteReply, Frontend, InterruptHandle, Kernel, KernelConfig, StreamName,
};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::protocol::{ClientMessage, ServerMessage};

/// Run the JSON-lines host until shutdown or end of input.
pub async fn execute(config: KernelConfig) -> anyhow::Result<()> {
    let mut kernel = Kernel::new(config)?;

    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let (request_tx, mut request_rx) = mpsc::unbounded_channel();
    let (input_tx, input_rx) = mpsc::unbounded_channel();

    let writer = tokio::spawn(write_messages(out_rx));

    // A plain thread: a blocked read on stdin must not hold up runtime
    // shutdown.
    let interrupt = kernel.interrupt_handle();
    std::thread::spawn(move || read_messages(interrupt, request_tx, input_tx));

    let mut frontend = ChannelFrontend {
        out: out_tx.clone(),
        input: input_rx,
    };

    let mut fatal = None;
    while let Some(message) = request_rx.recv().await {
        let message = match message {
            Ok(message) => message,
            Err(message) => {
                send(&out_tx, ServerMessage::Error { message });
                continue;
            }
        };
        match message {
            ClientMessage::ExecuteRequest(request) => {
                match kernel.execute(&request, &mut frontend).await {
                    Ok(reply) => send(&out_tx, ServerMessage::ExecuteReply(reply)),
                    Err(err) => {
                        tracing::error!("execution failed: {err}");
                        send(&out_tx, ServerMessage::Error {
                            message: err.with_hint(),
                        });
                        send(
                            &out_tx,
                            ServerMessage::ExecuteReply(ExecuteReply::error(
                                kernel.execution_count(),
                                error_name(&err),
                                err.to_string(),
                            )),
                        );
                        if err.is_fatal() {
                            fatal = Some(err);
                            break;
                        }
                    }
                }
            }
            ClientMessage::KernelInfoRequest => {
                send(&out_tx, ServerMessage::KernelInfoReply(kernel.info()));
            }
            ClientMessage::CompleteRequest { code, cursor_pos } => {
                send(
                    &out_tx,
                    ServerMessage::CompleteReply(kernel.complete(&code, cursor_pos)),
                );
            }
            ClientMessage::InspectRequest {
                code,
                cursor_pos,
                detail_level,
            } => {
                send(
                    &out_tx,
                    ServerMessage::InspectReply(kernel.inspect(&code, cursor_pos, detail_level)),
                );
            }
            ClientMessage::ShutdownRequest { restart } => {
                if restart {
                    tracing::info!("restarting kernel session");
                    kernel.reset();
                }
                send(&out_tx, ServerMessage::ShutdownReply { restart });
                if !restart {
                    break;
                }
            }
            // Routed by the reader thread; never queued.
            ClientMessage::InterruptRequest | ClientMessage::InputReply { .. } => {}
        }
    }

    drop(frontend);
    drop(out_tx);
    writer.await??;

    match fatal {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

/// Front-end that forwards output and input requests over the protocol.
struct ChannelFrontend {
    out: UnboundedSender<ServerMessage>,
    input: UnboundedReceiver<String>,
}

impl Frontend for ChannelFrontend {
    fn stream(&mut self, name: StreamName, text: &str) {
        send(&self.out, ServerMessage::Stream {
            name,
            text: text.to_string(),
        });
    }

    async fn raw_input(&mut self, prompt: &str) -> Option<String> {
        // A reply sent ahead of the request is queued and answers it.
        send(&self.out, ServerMessage::InputRequest {
            prompt: prompt.to_string(),
            password: false,
        });
        let mut value = self.input.recv().await?;
        if !value.ends_with('\n') {
            value.push('\n');
        }
        Some(value)
    }
}

fn send(out: &UnboundedSender<ServerMessage>, message: ServerMessage) {
    if out.send(message).is_err() {
        tracing::debug!("output closed, dropping message");
    }
}

fn error_name(err: &Error) -> &'static str {
    match err {
        Error::Configuration(_) | Error::Launch { .. } => "ConfigurationError",
        Error::Cleanup { .. } => "CleanupError",
        Error::Io(_) => "IOError",
        Error::Compilation { .. } => "CompilationError",
        Error::Timeout { .. } => "TimeoutError",
        Error::Interrupted => "KeyboardInterrupt",
    }
}

/// Parse stdin lines. Malformed lines are queued as `Err` so the reply
/// order matches the input order.
fn read_messages(
    interrupt: InterruptHandle,
    requests: UnboundedSender<Result<ClientMessage, String>>,
    input: UnboundedSender<String>,
) {
    for line in std::io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("failed to read stdin: {e}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<ClientMessage>(&line) {
            Ok(ClientMessage::InterruptRequest) => {
                tracing::debug!("interrupt requested");
                interrupt.interrupt();
            }
            Ok(ClientMessage::InputReply { value }) => {
                let _ = input.send(value);
            }
            Ok(message) => {
                if requests.send(Ok(message)).is_err() {
                    break;
                }
            }
            Err(e) => {
                if requests.send(Err(format!("invalid message: {e}"))).is_err() {
                    break;
                }
            }
        }
    }
    tracing::debug!("stdin closed");
}

async fn write_messages(mut messages: UnboundedReceiver<ServerMessage>) -> anyhow::Result<()> {
    let mut stdout = tokio::io::stdout();
    while let Some(message) = messages.recv().await {
        let mut line = serde_json::to_string(&message)?;
        line.push('\n');
        stdout.write_all(line.as_bytes()).await?;
        stdout.flush().await?;
    }
    Ok(())
}
