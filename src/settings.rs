//! Mail settings in the framework settings style.
//!
//! `MailSettings` is the single source of configuration for
//! [`backend_from_settings`](crate::backends::backend_from_settings) and the
//! [`send_mail`](crate::utils::send_mail) family of helpers. It can be built
//! in code, deserialized from a JSON settings file, or overridden from
//! `NUAGES_*` environment variables.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{EmailError, EmailResult};

/// Email delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailSettings {
	/// Backend selector: `smtp`, `console`, `file`, `memory` or `dummy`.
	pub backend: String,
	pub host: String,
	pub port: u16,
	pub username: Option<String>,
	pub password: Option<String>,
	pub use_tls: bool,
	pub use_ssl: bool,
	/// Default From address for messages that do not set one.
	pub from_email: String,

	/// List of (name, email) tuples for site administrators.
	/// Used by the mail_admins() helper.
	#[serde(default)]
	pub admins: Vec<(String, String)>,

	/// List of (name, email) tuples for site managers.
	/// Used by the mail_managers() helper.
	#[serde(default)]
	pub managers: Vec<(String, String)>,

	/// Sender address for admin/manager notifications.
	#[serde(default = "default_server_email")]
	pub server_email: String,

	/// Prefix for admin/manager notification subjects (e.g. `"[Nuages]"`).
	#[serde(default)]
	pub subject_prefix: String,

	/// Connection timeout in seconds.
	pub timeout: Option<u64>,

	/// Extra CA certificate (PEM) trusted for TLS connections.
	pub ssl_certfile: Option<PathBuf>,

	/// Directory path for the file-based backend.
	/// Required when backend is "file".
	#[serde(default)]
	pub file_path: Option<PathBuf>,
}

fn default_server_email() -> String {
	"root@localhost".to_string()
}

impl Default for MailSettings {
	fn default() -> Self {
		Self {
			backend: "console".to_string(),
			host: "localhost".to_string(),
			port: 25,
			username: None,
			password: None,
			use_tls: false,
			use_ssl: false,
			from_email: "noreply@example.com".to_string(),
			admins: Vec::new(),
			managers: Vec::new(),
			server_email: default_server_email(),
			subject_prefix: String::new(),
			timeout: None,
			ssl_certfile: None,
			file_path: None,
		}
	}
}

impl MailSettings {
	pub fn new() -> Self {
		Self::default()
	}

	/// Load settings from environment variables, starting from defaults.
	///
	/// Recognized variables: `NUAGES_EMAIL_BACKEND`, `NUAGES_EMAIL_HOST`,
	/// `NUAGES_EMAIL_PORT`, `NUAGES_EMAIL_HOST_USER`,
	/// `NUAGES_EMAIL_HOST_PASSWORD`, `NUAGES_EMAIL_USE_TLS`,
	/// `NUAGES_EMAIL_USE_SSL`, `NUAGES_DEFAULT_FROM_EMAIL`,
	/// `NUAGES_SERVER_EMAIL`, `NUAGES_EMAIL_SUBJECT_PREFIX`,
	/// `NUAGES_EMAIL_TIMEOUT` and `NUAGES_EMAIL_FILE_PATH`.
	pub fn from_env() -> Self {
		let mut settings = Self::default();

		if let Ok(backend) = std::env::var("NUAGES_EMAIL_BACKEND") {
			settings.backend = backend;
		}
		if let Ok(host) = std::env::var("NUAGES_EMAIL_HOST") {
			settings.host = host;
		}
		if let Ok(port) = std::env::var("NUAGES_EMAIL_PORT")
			&& let Ok(port) = port.parse()
		{
			settings.port = port;
		}
		if let Ok(user) = std::env::var("NUAGES_EMAIL_HOST_USER") {
			settings.username = Some(user);
		}
		if let Ok(password) = std::env::var("NUAGES_EMAIL_HOST_PASSWORD") {
			settings.password = Some(password);
		}
		if let Ok(use_tls) = std::env::var("NUAGES_EMAIL_USE_TLS") {
			settings.use_tls = parse_bool(&use_tls);
		}
		if let Ok(use_ssl) = std::env::var("NUAGES_EMAIL_USE_SSL") {
			settings.use_ssl = parse_bool(&use_ssl);
		}
		if let Ok(from_email) = std::env::var("NUAGES_DEFAULT_FROM_EMAIL") {
			settings.from_email = from_email;
		}
		if let Ok(server_email) = std::env::var("NUAGES_SERVER_EMAIL") {
			settings.server_email = server_email;
		}
		if let Ok(prefix) = std::env::var("NUAGES_EMAIL_SUBJECT_PREFIX") {
			settings.subject_prefix = prefix;
		}
		if let Ok(timeout) = std::env::var("NUAGES_EMAIL_TIMEOUT")
			&& let Ok(timeout) = timeout.parse()
		{
			settings.timeout = Some(timeout);
		}
		if let Ok(path) = std::env::var("NUAGES_EMAIL_FILE_PATH") {
			settings.file_path = Some(PathBuf::from(path));
		}

		settings
	}

	/// Load settings from a JSON file.
	pub fn from_json_file(path: impl AsRef<std::path::Path>) -> EmailResult<Self> {
		let content = std::fs::read_to_string(path)?;
		let settings: Self = serde_json::from_str(&content)
			.map_err(|e| EmailError::Configuration(format!("invalid settings file: {e}")))?;
		settings.validate()?;
		Ok(settings)
	}

	/// Validate settings consistency.
	///
	/// `use_tls` and `use_ssl` select STARTTLS and implicit TLS respectively
	/// and are mutually exclusive, so only one of them may be set.
	pub fn validate(&self) -> EmailResult<()> {
		if self.use_tls && self.use_ssl {
			return Err(EmailError::Configuration(
				"use_tls/use_ssl are mutually exclusive, so only set one of those settings to true"
					.to_string(),
			));
		}

		match self.backend.as_str() {
			"smtp" if self.host.is_empty() => Err(EmailError::Configuration(
				"the smtp backend requires a host".to_string(),
			)),
			"file" if self.file_path.is_none() => Err(EmailError::Configuration(
				"the file backend requires file_path".to_string(),
			)),
			_ => Ok(()),
		}
	}
}

fn parse_bool(value: &str) -> bool {
	value.eq_ignore_ascii_case("true") || value == "1"
}
