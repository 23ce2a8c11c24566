//! Console backend for development.

use std::io::Write;

use async_trait::async_trait;

use crate::EmailResult;
use crate::backends::EmailBackend;
use crate::message::EmailMessage;

/// Writes each message to stdout, separated by a dashed line.
///
/// Nothing is delivered anywhere; this is the default development backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleBackend;

#[async_trait]
impl EmailBackend for ConsoleBackend {
	async fn send_messages(&self, messages: &[EmailMessage]) -> EmailResult<usize> {
		let mut out = std::io::stdout().lock();
		let mut num_sent = 0;
		for message in messages {
			writeln!(out, "{}", message.render())?;
			writeln!(out, "{}", "-".repeat(79))?;
			num_sent += 1;
		}
		out.flush()?;
		Ok(num_sent)
	}
}
