//! Module-level sending helpers.
//!
//! These mirror the classic framework shortcuts: build a message from a few
//! arguments, pick the backend from settings, send, return the count.

use crate::backends::{EmailBackend, backend_from_settings};
use crate::message::EmailMessage;
use crate::settings::MailSettings;
use crate::{EmailError, EmailResult};

/// Send a single email through the settings-selected backend.
///
/// Returns the number of messages sent (0 or 1).
pub async fn send_mail<S: Into<String>>(
	settings: &MailSettings,
	subject: &str,
	message: &str,
	recipient_list: Vec<S>,
	html_message: Option<&str>,
) -> EmailResult<usize> {
	let backend = backend_from_settings(settings, false)?;
	send_mail_with_backend(
		subject,
		message,
		&settings.from_email,
		recipient_list,
		html_message,
		backend.as_ref(),
	)
	.await
}

/// Send a single email through an explicit backend.
pub async fn send_mail_with_backend<S: Into<String>>(
	subject: &str,
	message: &str,
	from_email: &str,
	recipient_list: Vec<S>,
	html_message: Option<&str>,
	backend: &dyn EmailBackend,
) -> EmailResult<usize> {
	let mut builder = EmailMessage::builder()
		.from(from_email)
		.to(recipient_list.into_iter().map(Into::into).collect())
		.subject(subject)
		.body(message);
	if let Some(html) = html_message {
		builder = builder.html(html);
	}
	let email = builder.build()?;
	backend.send_messages(&[email]).await
}

/// Send many emails over one backend (and thus one SMTP connection).
///
/// Each tuple is `(subject, message, recipient_list)`; the From address
/// comes from settings. Returns the number of messages sent.
pub async fn send_mass_mail(
	settings: &MailSettings,
	datatuple: Vec<(String, String, Vec<String>)>,
) -> EmailResult<usize> {
	if datatuple.is_empty() {
		return Ok(0);
	}
	let backend = backend_from_settings(settings, false)?;
	let messages = datatuple
		.into_iter()
		.map(|(subject, message, recipients)| {
			EmailMessage::builder()
				.from(settings.from_email.clone())
				.to(recipients)
				.subject(subject)
				.body(message)
				.build()
		})
		.collect::<EmailResult<Vec<_>>>()?;
	backend.send_messages(&messages).await
}

/// Email the site admins from `settings.admins`.
///
/// The subject is prefixed with `settings.subject_prefix` and the sender is
/// `settings.server_email`. A no-op when no admins are configured.
pub async fn mail_admins(
	settings: &MailSettings,
	subject: &str,
	message: &str,
	html_message: Option<&str>,
) -> EmailResult<usize> {
	notify(settings, &settings.admins, subject, message, html_message).await
}

/// Email the site managers from `settings.managers`; otherwise identical to
/// [`mail_admins`].
pub async fn mail_managers(
	settings: &MailSettings,
	subject: &str,
	message: &str,
	html_message: Option<&str>,
) -> EmailResult<usize> {
	notify(settings, &settings.managers, subject, message, html_message).await
}

async fn notify(
	settings: &MailSettings,
	recipients: &[(String, String)],
	subject: &str,
	message: &str,
	html_message: Option<&str>,
) -> EmailResult<usize> {
	if recipients.is_empty() {
		return Ok(0);
	}
	if settings.server_email.is_empty() {
		return Err(EmailError::MissingField("server_email".to_string()));
	}

	let backend = backend_from_settings(settings, false)?;
	let to: Vec<String> = recipients.iter().map(|(_, email)| email.clone()).collect();
	let mut builder = EmailMessage::builder()
		.from(settings.server_email.clone())
		.to(to)
		.subject(format!("{}{}", settings.subject_prefix, subject))
		.body(message);
	if let Some(html) = html_message {
		builder = builder.html(html);
	}
	let email = builder.build()?;
	backend.send_messages(&[email]).await
}
