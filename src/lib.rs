//! # Nuages Mail
//!
//! Django-style email sending with pluggable delivery backends.
//!
//! ## Features
//!
//! ### Message Building
//! - **EmailMessage**: Flexible email message builder with fluent API
//! - **Alternative Content**: Multiple representations of the same content (HTML, plain text)
//! - **Attachments**: Regular and inline attachments with automatic MIME type detection
//! - **CC/BCC/Reply-To**: Full recipient header support; BCC stays out of the message headers
//! - **Custom Headers**: Typed support for common X-* and list headers
//!
//! ### Backends
//! - **SMTP Backend**: Production delivery over a single lock-guarded connection
//!   - STARTTLS and implicit TLS/SSL connections
//!   - PLAIN/LOGIN authentication (or automatic negotiation)
//!   - Configurable connection timeout
//!   - `fail_silently` flag to trade errors for a lower sent count
//! - **Console Backend**: Development backend that prints to stdout
//! - **File Backend**: One file per message, for local inspection
//! - **Memory Backend**: In-memory storage for unit tests
//! - **Dummy Backend**: Accepts everything, delivers nothing
//!
//! ### Validation
//! - RFC 5321/5322 address checks and header injection protection
//! - IDNA encoding for international domains
//!
//! ## Examples
//!
//! ### Simple email through the settings-selected backend
//!
//! ```rust,no_run
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use nuages_mail::{MailSettings, send_mail};
//!
//! let mut settings = MailSettings::default();
//! settings.backend = "console".to_string();
//! settings.from_email = "noreply@example.com".to_string();
//!
//! send_mail(
//!     &settings,
//!     "Welcome!",
//!     "Welcome to our service",
//!     vec!["user@example.com"],
//!     None,
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ### SMTP with STARTTLS
//!
//! ```rust,no_run
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use nuages_mail::{EmailBackend, EmailMessage, SmtpBackend, SmtpConfig, SmtpSecurity};
//! use std::time::Duration;
//!
//! let config = SmtpConfig::new("smtp.example.com", 587)
//!     .with_credentials("user@example.com", "password")
//!     .with_security(SmtpSecurity::StartTls)
//!     .with_timeout(Duration::from_secs(30));
//!
//! let backend = SmtpBackend::new(config)?;
//!
//! let email = EmailMessage::builder()
//!     .from("sender@example.com")
//!     .to(vec!["recipient@example.com".to_string()])
//!     .subject("Test")
//!     .body("Test message")
//!     .build()?;
//!
//! let sent = backend.send_messages(&[email]).await?;
//! assert_eq!(sent, 1);
//! # Ok(())
//! # }
//! ```
//!
//! ### Capturing mail in tests
//!
//! ```rust
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use nuages_mail::{EmailBackend, EmailMessage, MemoryBackend};
//!
//! let backend = MemoryBackend::new();
//!
//! let email = EmailMessage::builder()
//!     .from("sender@example.com")
//!     .to(vec!["recipient@example.com".to_string()])
//!     .subject("Test")
//!     .body("Hello!")
//!     .build()?;
//!
//! backend.send_messages(&[email]).await?;
//! assert_eq!(backend.count(), 1);
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod headers;
pub mod message;
pub mod settings;
pub mod utils;
pub mod validation;

use thiserror::Error;

pub use backends::{
	ConsoleBackend, DummyBackend, EmailBackend, FileBackend, MemoryBackend, SmtpAuthMechanism,
	SmtpBackend, SmtpConfig, SmtpSecurity, backend_from_settings,
};
pub use message::{Alternative, Attachment, EmailMessage, EmailMessageBuilder};
pub use settings::MailSettings;
pub use utils::{mail_admins, mail_managers, send_mail, send_mail_with_backend, send_mass_mail};
pub use validation::MAX_EMAIL_LENGTH;

#[derive(Debug, Error)]
pub enum EmailError {
	#[error("Invalid email address: {0}")]
	InvalidAddress(String),

	#[error("Missing required field: {0}")]
	MissingField(String),

	#[error("Configuration error: {0}")]
	Configuration(String),

	#[error("Backend error: {0}")]
	BackendError(String),

	#[error("SMTP transport error: {0}")]
	Smtp(#[from] lettre::transport::smtp::Error),

	#[error("Message assembly error: {0}")]
	Mime(#[from] lettre::error::Error),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Attachment error: {0}")]
	AttachmentError(String),

	#[error("Invalid header: {0}")]
	InvalidHeader(String),

	#[error("Header injection attempt detected: {0}")]
	HeaderInjection(String),
}

pub type EmailResult<T> = std::result::Result<T, EmailError>;
