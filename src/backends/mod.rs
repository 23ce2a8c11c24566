//! Email delivery backends.
//!
//! All backends implement [`EmailBackend`]: hand over a batch of messages,
//! get back the number actually sent. The SMTP backend is the production
//! path; console, file, memory and dummy exist for development and tests.

use async_trait::async_trait;

use crate::message::EmailMessage;
use crate::settings::MailSettings;
use crate::{EmailError, EmailResult};

pub mod console;
pub mod dummy;
pub mod file;
pub mod memory;
pub mod smtp;

pub use console::ConsoleBackend;
pub use dummy::DummyBackend;
pub use file::FileBackend;
pub use memory::MemoryBackend;
pub use smtp::{SmtpAuthMechanism, SmtpBackend, SmtpConfig, SmtpSecurity};

/// A mail delivery backend.
#[async_trait]
pub trait EmailBackend: Send + Sync {
	/// Send the given messages and return how many were sent.
	///
	/// Messages without recipients do not count. Backends with a
	/// `fail_silently` flag trade errors for a lower count.
	async fn send_messages(&self, messages: &[EmailMessage]) -> EmailResult<usize>;
}

/// Instantiate the backend selected by `settings.backend`.
///
/// Valid selectors are `smtp`, `console`, `file`, `memory` and `dummy`.
/// The `file` backend requires `settings.file_path`.
pub fn backend_from_settings(
	settings: &MailSettings,
	fail_silently: bool,
) -> EmailResult<Box<dyn EmailBackend>> {
	settings.validate()?;
	match settings.backend.as_str() {
		"smtp" => Ok(Box::new(SmtpBackend::from_settings(settings, fail_silently)?)),
		"console" => Ok(Box::new(ConsoleBackend)),
		"file" => {
			let path = settings.file_path.clone().ok_or_else(|| {
				EmailError::Configuration("the file backend requires file_path".to_string())
			})?;
			Ok(Box::new(FileBackend::new(path)))
		}
		"memory" => Ok(Box::new(MemoryBackend::new())),
		"dummy" => Ok(Box::new(DummyBackend)),
		other => Err(EmailError::Configuration(format!(
			"unknown email backend: {other}. Valid options are: smtp, console, file, memory, dummy"
		))),
	}
}
