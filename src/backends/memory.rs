//! In-memory backend for tests.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::EmailResult;
use crate::backends::EmailBackend;
use crate::message::EmailMessage;

/// Stores sent messages in memory instead of delivering them.
///
/// Clones share the same store, so a test can hand one clone to the code
/// under test and inspect the other.
#[derive(Clone, Default)]
pub struct MemoryBackend {
	messages: Arc<RwLock<Vec<EmailMessage>>>,
}

impl MemoryBackend {
	pub fn new() -> Self {
		Self::default()
	}

	/// All messages sent so far.
	pub fn sent_messages(&self) -> Vec<EmailMessage> {
		self.messages.read().clone()
	}

	pub fn count(&self) -> usize {
		self.messages.read().len()
	}

	pub fn clear(&self) {
		self.messages.write().clear();
	}

	pub fn find_by_subject(&self, subject: &str) -> Vec<EmailMessage> {
		self.messages
			.read()
			.iter()
			.filter(|m| m.subject() == subject)
			.cloned()
			.collect()
	}

	pub fn find_by_recipient(&self, recipient: &str) -> Vec<EmailMessage> {
		self.messages
			.read()
			.iter()
			.filter(|m| m.recipients().contains(&recipient))
			.cloned()
			.collect()
	}
}

#[async_trait]
impl EmailBackend for MemoryBackend {
	async fn send_messages(&self, messages: &[EmailMessage]) -> EmailResult<usize> {
		let mut store = self.messages.write();
		store.extend_from_slice(messages);
		Ok(messages.len())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn message(subject: &str, to: &str) -> EmailMessage {
		EmailMessage::builder()
			.from("sender@example.com")
			.to(vec![to.to_string()])
			.subject(subject)
			.body("Body")
			.build()
			.unwrap()
	}

	#[tokio::test]
	async fn test_stores_messages() {
		let backend = MemoryBackend::new();

		let sent = backend
			.send_messages(&[message("One", "a@example.com"), message("Two", "b@example.com")])
			.await
			.unwrap();

		assert_eq!(sent, 2);
		assert_eq!(backend.count(), 2);
		assert_eq!(backend.sent_messages()[0].subject(), "One");
	}

	#[tokio::test]
	async fn test_find_helpers() {
		let backend = MemoryBackend::new();
		backend
			.send_messages(&[message("Important", "a@example.com")])
			.await
			.unwrap();

		assert_eq!(backend.find_by_subject("Important").len(), 1);
		assert_eq!(backend.find_by_subject("Other").len(), 0);
		assert_eq!(backend.find_by_recipient("a@example.com").len(), 1);
		assert_eq!(backend.find_by_recipient("z@example.com").len(), 0);
	}

	#[tokio::test]
	async fn test_clear_and_clone_share_store() {
		let backend = MemoryBackend::new();
		let observer = backend.clone();

		backend
			.send_messages(&[message("Shared", "a@example.com")])
			.await
			.unwrap();
		assert_eq!(observer.count(), 1);

		observer.clear();
		assert_eq!(backend.count(), 0);
	}
}
