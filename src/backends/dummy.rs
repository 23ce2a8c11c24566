//! Dummy backend: accepts everything, delivers nothing.

use async_trait::async_trait;

use crate::EmailResult;
use crate::backends::EmailBackend;
use crate::message::EmailMessage;

/// Reports every message as sent without doing anything.
///
/// Useful to switch mail off entirely while keeping calling code unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct DummyBackend;

#[async_trait]
impl EmailBackend for DummyBackend {
	async fn send_messages(&self, messages: &[EmailMessage]) -> EmailResult<usize> {
		Ok(messages.len())
	}
}
