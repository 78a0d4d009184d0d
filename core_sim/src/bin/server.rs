use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use serde_json::json;
use tracing::{debug, info, warn};

use core_sim::{
    execute_command, load_simulation_config_from_env, SimulationSession, WorldNotification,
};
use sim_runtime::{parse_command_line, CommandPayload};

struct CommandEnvelope {
    payload: CommandPayload,
    reply: Sender<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let (config, metadata) = load_simulation_config_from_env();
    let command_bind = config.server.command_bind;
    let mut session = SimulationSession::init(config);

    let command_rx = match spawn_command_listener(command_bind) {
        Ok(receiver) => receiver,
        Err(err) => {
            warn!(
                target: "concord::server",
                %command_bind,
                error = %err,
                "command listener bind failed"
            );
            return;
        }
    };
    spawn_notification_logger(session.subscribe());

    let state = session.current_state();
    info!(
        target: "concord::server",
        %command_bind,
        config = ?metadata.path(),
        seed = state.seed,
        "Concord simulation server ready"
    );

    while let Ok(CommandEnvelope { payload, reply }) = command_rx.recv() {
        if payload.is_mutation() {
            info!(target: "concord::server", command = payload.verb(), "command.received");
        } else {
            debug!(target: "concord::server", command = payload.verb(), "command.received");
        }
        let response = match execute_command(&mut session, payload) {
            Ok(value) => json!({ "ok": true, "result": value }),
            Err(err) => {
                warn!(target: "concord::server", error = %err, "command.failed");
                json!({ "ok": false, "error": err.to_string() })
            }
        };
        // Client may have gone away; the command has still been applied.
        let _ = reply.send(response.to_string());
    }

    session.shutdown();
}

fn spawn_notification_logger(receiver: Receiver<WorldNotification>) {
    thread::spawn(move || {
        for notification in receiver.iter() {
            match notification {
                WorldNotification::TurnAdvanced { turn, day } => info!(
                    target: "concord::server",
                    turn,
                    day,
                    "notify.turn_advanced"
                ),
                WorldNotification::GameLoaded { turn } => {
                    info!(target: "concord::server", turn, "notify.game_loaded")
                }
                other => debug!(
                    target: "concord::server",
                    notification = other.label(),
                    "notify.received"
                ),
            }
        }
    });
}

fn spawn_command_listener(bind_addr: SocketAddr) -> std::io::Result<Receiver<CommandEnvelope>> {
    let listener = TcpListener::bind(bind_addr)?;
    listener.set_nonblocking(true)?;

    let (sender, receiver) = unbounded::<CommandEnvelope>();
    thread::spawn(move || loop {
        match listener.accept() {
            Ok((stream, addr)) => {
                info!(target: "concord::server", %addr, "command client connected");
                let sender = sender.clone();
                thread::spawn(move || handle_client(stream, sender));
            }
            Err(ref err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(50));
            }
            Err(err) => {
                warn!(target: "concord::server", error = %err, "command accept failed");
                thread::sleep(Duration::from_millis(200));
            }
        }
    });

    Ok(receiver)
}

fn handle_client(stream: TcpStream, sender: Sender<CommandEnvelope>) {
    if let Err(err) = stream.set_nonblocking(false) {
        warn!(target: "concord::server", error = %err, "command stream setup failed");
        return;
    }
    let mut writer = match stream.try_clone() {
        Ok(writer) => writer,
        Err(err) => {
            warn!(target: "concord::server", error = %err, "command stream setup failed");
            return;
        }
    };
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let response = match parse_command_line(trimmed) {
                    Ok(payload) => {
                        let (reply, reply_rx) = bounded(1);
                        if sender.send(CommandEnvelope { payload, reply }).is_err() {
                            break;
                        }
                        match reply_rx.recv() {
                            Ok(response) => response,
                            Err(_) => break,
                        }
                    }
                    Err(err) => {
                        warn!(
                            target: "concord::server",
                            command = trimmed,
                            error = %err,
                            "command.invalid"
                        );
                        json!({ "ok": false, "error": err.to_string() }).to_string()
                    }
                };
                if writeln!(writer, "{response}").is_err() {
                    break;
                }
            }
            Err(err) => {
                warn!(target: "concord::server", error = %err, "command read error");
                break;
            }
        }
    }
}
