//! File backend: one file per message.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;

use crate::EmailResult;
use crate::backends::EmailBackend;
use crate::message::EmailMessage;

/// Saves each message to its own file under a directory, creating the
/// directory when missing.
///
/// Filenames combine a UTC timestamp, the process id and a per-backend
/// counter, so rapid or concurrent sends never collide.
#[derive(Debug)]
pub struct FileBackend {
	directory: PathBuf,
	counter: AtomicUsize,
}

impl FileBackend {
	pub fn new(directory: impl Into<PathBuf>) -> Self {
		Self {
			directory: directory.into(),
			counter: AtomicUsize::new(0),
		}
	}

	pub fn directory(&self) -> &std::path::Path {
		&self.directory
	}

	fn next_filename(&self) -> String {
		format!(
			"{}-{}-{}.log",
			Utc::now().format("%Y%m%d-%H%M%S%6f"),
			std::process::id(),
			self.counter.fetch_add(1, Ordering::Relaxed)
		)
	}
}

#[async_trait]
impl EmailBackend for FileBackend {
	async fn send_messages(&self, messages: &[EmailMessage]) -> EmailResult<usize> {
		if messages.is_empty() {
			return Ok(0);
		}
		tokio::fs::create_dir_all(&self.directory).await?;

		let mut num_sent = 0;
		for message in messages {
			let path = self.directory.join(self.next_filename());
			tokio::fs::write(&path, message.render()).await?;
			tracing::debug!(path = %path.display(), "message written");
			num_sent += 1;
		}
		Ok(num_sent)
	}
}
