//! SMTP delivery backend.
//!
//! A thin adapter around a single outbound SMTP connection: build the
//! transport from configuration, open it lazily, relay a batch of pre-built
//! messages, count successes, and close the connection again if this batch
//! opened it. Protocol, TLS and authentication are delegated to lettre.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use lettre::address::Envelope;
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::transport::smtp::client::{Certificate, Tls, TlsParameters};
use lettre::transport::smtp::extension::ClientId;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use tokio::sync::Mutex;
use zeroize::Zeroize;

use crate::backends::EmailBackend;
use crate::message::EmailMessage;
use crate::settings::MailSettings;
use crate::validation::sanitize_address;
use crate::{EmailError, EmailResult};

type Transport = AsyncSmtpTransport<Tokio1Executor>;

/// Connection security for the SMTP session.
///
/// `StartTls` and `Ssl` are mutually exclusive by construction; the
/// settings layer maps `use_tls`/`use_ssl` onto this enum and rejects the
/// combination of both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SmtpSecurity {
	/// Plaintext connection.
	#[default]
	None,
	/// Plaintext connection upgraded with STARTTLS.
	StartTls,
	/// Implicit TLS from the first byte (SMTPS).
	Ssl,
}

/// SMTP authentication mechanism selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SmtpAuthMechanism {
	/// Let the transport negotiate from what the server advertises.
	#[default]
	Auto,
	Plain,
	Login,
}

/// SMTP connection configuration.
#[derive(Clone)]
pub struct SmtpConfig {
	host: String,
	port: u16,
	username: Option<String>,
	password: Option<String>,
	security: SmtpSecurity,
	auth: SmtpAuthMechanism,
	timeout: Option<Duration>,
	/// EHLO hostname; the machine hostname is used when unset.
	local_hostname: Option<String>,
	/// Extra CA certificate (PEM) trusted for this connection.
	extra_root_certificate: Option<PathBuf>,
	accept_invalid_certs: bool,
}

impl SmtpConfig {
	pub fn new(host: impl Into<String>, port: u16) -> Self {
		Self {
			host: host.into(),
			port,
			username: None,
			password: None,
			security: SmtpSecurity::default(),
			auth: SmtpAuthMechanism::default(),
			timeout: None,
			local_hostname: None,
			extra_root_certificate: None,
			accept_invalid_certs: false,
		}
	}

	pub fn with_credentials(
		mut self,
		username: impl Into<String>,
		password: impl Into<String>,
	) -> Self {
		self.username = Some(username.into());
		self.password = Some(password.into());
		self
	}

	pub fn with_security(mut self, security: SmtpSecurity) -> Self {
		self.security = security;
		self
	}

	pub fn with_auth_mechanism(mut self, auth: SmtpAuthMechanism) -> Self {
		self.auth = auth;
		self
	}

	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);
		self
	}

	pub fn with_local_hostname(mut self, hostname: impl Into<String>) -> Self {
		self.local_hostname = Some(hostname.into());
		self
	}

	pub fn with_extra_root_certificate(mut self, path: impl Into<PathBuf>) -> Self {
		self.extra_root_certificate = Some(path.into());
		self
	}

	/// Disable certificate verification. Test environments only.
	pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
		self.accept_invalid_certs = accept;
		self
	}

	pub fn host(&self) -> &str {
		&self.host
	}

	pub fn port(&self) -> u16 {
		self.port
	}

	pub fn security(&self) -> SmtpSecurity {
		self.security
	}

	fn tls_parameters(&self) -> EmailResult<TlsParameters> {
		let mut builder = TlsParameters::builder(self.host.clone());
		if let Some(path) = &self.extra_root_certificate {
			let pem = std::fs::read(path)?;
			let cert = Certificate::from_pem(&pem)?;
			builder = builder.add_root_certificate(cert);
		}
		if self.accept_invalid_certs {
			builder = builder
				.dangerous_accept_invalid_certs(true)
				.dangerous_accept_invalid_hostnames(true);
		}
		Ok(builder.build()?)
	}
}

// Keep credentials out of logs and drop them from memory deliberately.
impl fmt::Debug for SmtpConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SmtpConfig")
			.field("host", &self.host)
			.field("port", &self.port)
			.field("username", &self.username)
			.field("password", &self.password.as_ref().map(|_| "********"))
			.field("security", &self.security)
			.field("auth", &self.auth)
			.field("timeout", &self.timeout)
			.field("local_hostname", &self.local_hostname)
			.finish()
	}
}

impl Drop for SmtpConfig {
	fn drop(&mut self) {
		if let Some(password) = self.password.as_mut() {
			password.zeroize();
		}
	}
}

/// SMTP email backend managing a single outbound connection.
///
/// `send_messages` takes one lock for the whole batch: it opens the
/// connection when none exists, relays every message, and closes the
/// connection again only if this call opened it. With `fail_silently` set,
/// connection and send failures lower the sent count instead of erroring.
pub struct SmtpBackend {
	config: SmtpConfig,
	fail_silently: bool,
	connection: Mutex<Option<Transport>>,
}

impl SmtpBackend {
	pub fn new(config: SmtpConfig) -> EmailResult<Self> {
		if config.host.is_empty() {
			return Err(EmailError::Configuration(
				"the smtp backend requires a host".to_string(),
			));
		}
		Ok(Self {
			config,
			fail_silently: false,
			connection: Mutex::new(None),
		})
	}

	pub fn with_fail_silently(mut self, fail_silently: bool) -> Self {
		self.fail_silently = fail_silently;
		self
	}

	/// Build the backend from mail settings, mapping `use_tls`/`use_ssl`
	/// onto [`SmtpSecurity`] and wiring credentials, timeout and the extra
	/// CA certificate through.
	pub fn from_settings(settings: &MailSettings, fail_silently: bool) -> EmailResult<Self> {
		if settings.use_tls && settings.use_ssl {
			return Err(EmailError::Configuration(
				"use_tls/use_ssl are mutually exclusive, so only set one of those settings to true"
					.to_string(),
			));
		}

		let security = if settings.use_ssl {
			SmtpSecurity::Ssl
		} else if settings.use_tls {
			SmtpSecurity::StartTls
		} else {
			SmtpSecurity::None
		};

		let mut config = SmtpConfig::new(settings.host.clone(), settings.port)
			.with_security(security);
		if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
			config = config.with_credentials(username.clone(), password.clone());
		}
		if let Some(timeout) = settings.timeout {
			config = config.with_timeout(Duration::from_secs(timeout));
		}
		if let Some(certfile) = &settings.ssl_certfile {
			config = config.with_extra_root_certificate(certfile.clone());
		}

		Ok(Self::new(config)?.with_fail_silently(fail_silently))
	}

	fn build_transport(&self) -> EmailResult<Transport> {
		let mut builder =
			AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(self.config.host.as_str())
				.port(self.config.port)
				.timeout(self.config.timeout);

		builder = match self.config.security {
			SmtpSecurity::None => builder.tls(Tls::None),
			SmtpSecurity::StartTls => builder.tls(Tls::Required(self.config.tls_parameters()?)),
			SmtpSecurity::Ssl => builder.tls(Tls::Wrapper(self.config.tls_parameters()?)),
		};

		if let (Some(username), Some(password)) = (&self.config.username, &self.config.password) {
			builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
			builder = match self.config.auth {
				SmtpAuthMechanism::Auto => builder,
				SmtpAuthMechanism::Plain => builder.authentication(vec![Mechanism::Plain]),
				SmtpAuthMechanism::Login => builder.authentication(vec![Mechanism::Login]),
			};
		}

		if let Some(hostname) = &self.config.local_hostname {
			builder = builder.hello_name(ClientId::Domain(hostname.clone()));
		}

		Ok(builder.build())
	}

	/// Ensure a connection exists in the slot. Returns whether a new one
	/// was created; `false` means one was already open.
	async fn open_locked(&self, slot: &mut Option<Transport>) -> EmailResult<bool> {
		if slot.is_some() {
			return Ok(false);
		}

		let transport = self.build_transport()?;
		// The transport connects lazily; probe it now so connection and
		// authentication errors surface on open, not mid-batch.
		match transport.test_connection().await {
			Ok(true) => {}
			Ok(false) => {
				return Err(EmailError::BackendError(format!(
					"SMTP server {}:{} rejected the connection probe",
					self.config.host, self.config.port
				)));
			}
			Err(err) => return Err(err.into()),
		}

		tracing::debug!(
			host = %self.config.host,
			port = self.config.port,
			security = ?self.config.security,
			"smtp connection opened"
		);
		*slot = Some(transport);
		Ok(true)
	}

	fn close_locked(config: &SmtpConfig, slot: &mut Option<Transport>) {
		if slot.take().is_some() {
			// Dropping the transport tears down its pooled connection;
			// lettre sends QUIT on a best-effort basis.
			tracing::debug!(host = %config.host, "smtp connection closed");
		}
	}

	/// Ensure the connection is open. Returns whether a new connection was
	/// required. With `fail_silently`, failures report `false` and leave
	/// the slot empty.
	pub async fn open(&self) -> EmailResult<bool> {
		let mut slot = self.connection.lock().await;
		match self.open_locked(&mut slot).await {
			Ok(created) => Ok(created),
			Err(err) if self.fail_silently => {
				tracing::warn!(error = %err, "smtp open failed; silenced");
				Ok(false)
			}
			Err(err) => Err(err),
		}
	}

	/// Close the connection, if any.
	pub async fn close(&self) {
		let mut slot = self.connection.lock().await;
		Self::close_locked(&self.config, &mut slot);
	}

	/// Relay one message. Sanitization errors are reported through the same
	/// channel as transport errors, so `fail_silently` covers both kinds.
	async fn send_one(&self, transport: &Transport, message: &EmailMessage) -> EmailResult<bool> {
		let recipients = message.recipients();
		if recipients.is_empty() {
			return Ok(false);
		}

		let from: Address = sanitize_address(message.from_email())?
			.parse()
			.map_err(|_| EmailError::InvalidAddress(message.from_email().to_string()))?;
		let mut rcpts = Vec::with_capacity(recipients.len());
		for addr in recipients {
			let rcpt = sanitize_address(addr)?
				.parse()
				.map_err(|_| EmailError::InvalidAddress(addr.to_string()))?;
			rcpts.push(rcpt);
		}
		let envelope = Envelope::new(Some(from), rcpts)?;

		// MIME encoding belongs to the message object; the backend only
		// relays envelope and bytes, like smtplib's sendmail.
		let mime = message.mime_message()?;
		transport.send_raw(&envelope, &mime.formatted()).await?;
		Ok(true)
	}
}

#[async_trait]
impl EmailBackend for SmtpBackend {
	async fn send_messages(&self, messages: &[EmailMessage]) -> EmailResult<usize> {
		if messages.is_empty() {
			return Ok(0);
		}

		let mut slot = self.connection.lock().await;
		let new_connection = match self.open_locked(&mut slot).await {
			Ok(created) => created,
			Err(err) => {
				if self.fail_silently {
					tracing::warn!(error = %err, "smtp open failed; silenced");
					return Ok(0);
				}
				return Err(err);
			}
		};
		let Some(transport) = slot.as_ref() else {
			return Ok(0);
		};

		let mut num_sent = 0;
		for message in messages {
			match self.send_one(transport, message).await {
				Ok(true) => num_sent += 1,
				Ok(false) => {}
				Err(err) => {
					if !self.fail_silently {
						return Err(err);
					}
					tracing::warn!(error = %err, "smtp send failed; silenced");
				}
			}
		}

		if new_connection {
			Self::close_locked(&self.config, &mut slot);
		}
		Ok(num_sent)
	}
}
