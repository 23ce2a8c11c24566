//! Minimal in-process SMTP server for integration tests.
//!
//! Speaks just enough ESMTP for a lettre client: greeting, EHLO with AUTH
//! and 8BITMIME, PLAIN/LOGIN authentication (any credentials accepted),
//! MAIL/RCPT/DATA/RSET/NOOP/QUIT. Received messages and raw AUTH commands
//! are recorded for assertions.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Clone)]
pub struct ReceivedMessage {
	pub mail_from: String,
	pub rcpt_to: Vec<String>,
	pub data: String,
}

#[derive(Debug, Default)]
struct ServerState {
	messages: Vec<ReceivedMessage>,
	auth_commands: Vec<String>,
	connections: usize,
}

pub struct MockSmtpServer {
	addr: SocketAddr,
	state: Arc<Mutex<ServerState>>,
	handle: tokio::task::JoinHandle<()>,
}

impl MockSmtpServer {
	pub async fn start() -> Self {
		Self::start_with(false).await
	}

	/// A server that answers every MAIL FROM with a permanent 550.
	pub async fn start_rejecting() -> Self {
		Self::start_with(true).await
	}

	async fn start_with(reject_mail: bool) -> Self {
		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();
		let state = Arc::new(Mutex::new(ServerState::default()));

		let accept_state = state.clone();
		let handle = tokio::spawn(async move {
			loop {
				let Ok((socket, _)) = listener.accept().await else {
					break;
				};
				accept_state.lock().unwrap().connections += 1;
				let session_state = accept_state.clone();
				tokio::spawn(async move {
					let _ = handle_session(socket, session_state, reject_mail).await;
				});
			}
		});

		Self {
			addr,
			state,
			handle,
		}
	}

	pub fn host(&self) -> String {
		self.addr.ip().to_string()
	}

	pub fn port(&self) -> u16 {
		self.addr.port()
	}

	pub fn messages(&self) -> Vec<ReceivedMessage> {
		self.state.lock().unwrap().messages.clone()
	}

	pub fn auth_commands(&self) -> Vec<String> {
		self.state.lock().unwrap().auth_commands.clone()
	}

	pub fn connections(&self) -> usize {
		self.state.lock().unwrap().connections
	}
}

impl Drop for MockSmtpServer {
	fn drop(&mut self) {
		self.handle.abort();
	}
}

async fn handle_session(
	socket: TcpStream,
	state: Arc<Mutex<ServerState>>,
	reject_mail: bool,
) -> std::io::Result<()> {
	let (read_half, mut write_half) = socket.into_split();
	let mut reader = BufReader::new(read_half);
	write_half.write_all(b"220 mock.test ESMTP ready\r\n").await?;

	let mut line = String::new();
	let mut mail_from: Option<String> = None;
	let mut rcpt_to: Vec<String> = Vec::new();

	loop {
		line.clear();
		if reader.read_line(&mut line).await? == 0 {
			break;
		}
		let command = line.trim_end().to_string();
		let upper = command.to_ascii_uppercase();

		if upper.starts_with("EHLO") {
			write_half
				.write_all(b"250-mock.test\r\n250-AUTH PLAIN LOGIN\r\n250 8BITMIME\r\n")
				.await?;
		} else if upper.starts_with("HELO") {
			write_half.write_all(b"250 mock.test\r\n").await?;
		} else if upper.starts_with("AUTH PLAIN") {
			state.lock().unwrap().auth_commands.push(command);
			write_half
				.write_all(b"235 2.7.0 authentication successful\r\n")
				.await?;
		} else if upper.starts_with("AUTH LOGIN") {
			state.lock().unwrap().auth_commands.push(command);
			// Prompts are base64 for "Username:" and "Password:".
			write_half.write_all(b"334 VXNlcm5hbWU6\r\n").await?;
			line.clear();
			reader.read_line(&mut line).await?;
			write_half.write_all(b"334 UGFzc3dvcmQ6\r\n").await?;
			line.clear();
			reader.read_line(&mut line).await?;
			write_half
				.write_all(b"235 2.7.0 authentication successful\r\n")
				.await?;
		} else if upper.starts_with("MAIL FROM:") {
			if reject_mail {
				write_half.write_all(b"550 5.7.1 rejected\r\n").await?;
			} else {
				mail_from = Some(extract_address(&command));
				write_half.write_all(b"250 2.1.0 OK\r\n").await?;
			}
		} else if upper.starts_with("RCPT TO:") {
			rcpt_to.push(extract_address(&command));
			write_half.write_all(b"250 2.1.5 OK\r\n").await?;
		} else if upper == "DATA" {
			write_half
				.write_all(b"354 End data with <CR><LF>.<CR><LF>\r\n")
				.await?;
			let mut data = String::new();
			loop {
				line.clear();
				if reader.read_line(&mut line).await? == 0 {
					return Ok(());
				}
				if line == ".\r\n" || line == ".\n" {
					break;
				}
				data.push_str(&line);
			}
			state.lock().unwrap().messages.push(ReceivedMessage {
				mail_from: mail_from.take().unwrap_or_default(),
				rcpt_to: std::mem::take(&mut rcpt_to),
				data,
			});
			write_half.write_all(b"250 2.0.0 OK: queued\r\n").await?;
		} else if upper == "RSET" {
			mail_from = None;
			rcpt_to.clear();
			write_half.write_all(b"250 2.0.0 OK\r\n").await?;
		} else if upper == "NOOP" {
			write_half.write_all(b"250 2.0.0 OK\r\n").await?;
		} else if upper == "QUIT" {
			write_half.write_all(b"221 2.0.0 bye\r\n").await?;
			break;
		} else {
			write_half
				.write_all(b"502 5.5.2 command not implemented\r\n")
				.await?;
		}
	}
	Ok(())
}

fn extract_address(command: &str) -> String {
	match (command.find('<'), command.find('>')) {
		(Some(open), Some(close)) if close > open => command[open + 1..close].to_string(),
		_ => command.to_string(),
	}
}
