//! Email message objects.
//!
//! An [`EmailMessage`] is built and validated up front, then handed to a
//! backend. The message owns its own encodings: [`EmailMessage::render`]
//! produces the plain-text rendition used by the console and file backends,
//! and [`EmailMessage::mime_message`] produces the lettre MIME document the
//! SMTP backend puts on the wire.

use lettre::message::header::ContentType;
use lettre::message::{Attachment as MimeAttachment, Body, Mailbox, MultiPart, SinglePart};

use crate::validation::{
	check_header_injection, sanitize_address, split_display_name, validate_email,
	validate_email_list, validate_header_name,
};
use crate::{EmailError, EmailResult, headers};

/// An alternative representation of the message content, typically the HTML
/// version of a plain-text body.
#[derive(Debug, Clone)]
pub struct Alternative {
	content_type: String,
	content: Vec<u8>,
}

impl Alternative {
	pub fn new(content_type: impl Into<String>, content: Vec<u8>) -> Self {
		Self {
			content_type: content_type.into(),
			content,
		}
	}

	/// Shortcut for a `text/html` alternative.
	pub fn html(content: impl Into<String>) -> Self {
		Self::new("text/html", content.into().into_bytes())
	}

	/// Shortcut for a `text/plain` alternative.
	pub fn plain(content: impl Into<String>) -> Self {
		Self::new("text/plain", content.into().into_bytes())
	}

	pub fn content_type(&self) -> &str {
		&self.content_type
	}

	pub fn content(&self) -> &[u8] {
		&self.content
	}
}

/// A file attachment, regular or inline (Content-ID referenced).
///
/// The MIME type is detected from the filename extension and can be
/// overridden.
#[derive(Debug, Clone)]
pub struct Attachment {
	filename: String,
	content: Vec<u8>,
	mime_type: String,
	content_id: Option<String>,
	inline: bool,
}

impl Attachment {
	pub fn new(filename: impl Into<String>, content: Vec<u8>) -> Self {
		let filename = filename.into();
		let mime_type = detect_mime_type(&filename);
		Self {
			filename,
			content,
			mime_type,
			content_id: None,
			inline: false,
		}
	}

	/// Read an attachment from disk, storing it under `filename`.
	pub fn from_path(
		path: impl AsRef<std::path::Path>,
		filename: impl Into<String>,
	) -> std::io::Result<Self> {
		let content = std::fs::read(path)?;
		Ok(Self::new(filename, content))
	}

	/// Create an inline attachment referenced from HTML via `cid:`.
	pub fn inline(
		filename: impl Into<String>,
		content: Vec<u8>,
		content_id: impl Into<String>,
	) -> Self {
		let mut attachment = Self::new(filename, content);
		attachment.content_id = Some(content_id.into());
		attachment.inline = true;
		attachment
	}

	pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
		self.mime_type = mime_type.into();
		self
	}

	pub fn filename(&self) -> &str {
		&self.filename
	}

	pub fn content(&self) -> &[u8] {
		&self.content
	}

	pub fn mime_type(&self) -> &str {
		&self.mime_type
	}

	pub fn content_id(&self) -> Option<&str> {
		self.content_id.as_deref()
	}

	pub fn is_inline(&self) -> bool {
		self.inline
	}
}

fn detect_mime_type(filename: &str) -> String {
	mime_guess::from_path(filename)
		.first()
		.map(|mime| mime.to_string())
		.unwrap_or_else(|| "application/octet-stream".to_string())
}

/// An email message with validated addresses and headers.
///
/// Fields are private; construction goes through [`EmailMessage::builder`],
/// which validates addresses and screens subject and header values for
/// injection before the message exists at all.
#[derive(Debug, Clone)]
pub struct EmailMessage {
	subject: String,
	body: String,
	from_email: String,
	to: Vec<String>,
	cc: Vec<String>,
	bcc: Vec<String>,
	reply_to: Vec<String>,
	html_body: Option<String>,
	alternatives: Vec<Alternative>,
	attachments: Vec<Attachment>,
	headers: Vec<(String, String)>,
}

impl EmailMessage {
	pub fn builder() -> EmailMessageBuilder {
		EmailMessageBuilder::default()
	}

	pub fn subject(&self) -> &str {
		&self.subject
	}

	pub fn body(&self) -> &str {
		&self.body
	}

	pub fn from_email(&self) -> &str {
		&self.from_email
	}

	pub fn to(&self) -> &[String] {
		&self.to
	}

	pub fn cc(&self) -> &[String] {
		&self.cc
	}

	pub fn bcc(&self) -> &[String] {
		&self.bcc
	}

	pub fn reply_to(&self) -> &[String] {
		&self.reply_to
	}

	pub fn html_body(&self) -> Option<&str> {
		self.html_body.as_deref()
	}

	pub fn alternatives(&self) -> &[Alternative] {
		&self.alternatives
	}

	pub fn attachments(&self) -> &[Attachment] {
		&self.attachments
	}

	pub fn headers(&self) -> &[(String, String)] {
		&self.headers
	}

	/// Every envelope recipient: to, then cc, then bcc.
	///
	/// A message with no recipients is not sendable and is skipped (not
	/// counted) by backends.
	pub fn recipients(&self) -> Vec<&str> {
		self.to
			.iter()
			.chain(&self.cc)
			.chain(&self.bcc)
			.map(String::as_str)
			.collect()
	}

	/// Send this message through the given backend.
	pub async fn send(&self, backend: &dyn crate::backends::EmailBackend) -> EmailResult<usize> {
		backend.send_messages(std::slice::from_ref(self)).await
	}

	/// Plain-text rendition used by the console and file backends.
	///
	/// This is a human-readable dump, not a wire format; bcc recipients are
	/// shown here because the output never leaves the machine.
	pub fn render(&self) -> String {
		let mut out = String::new();
		out.push_str(&format!("From: {}\n", self.from_email));
		if !self.to.is_empty() {
			out.push_str(&format!("To: {}\n", self.to.join(", ")));
		}
		if !self.cc.is_empty() {
			out.push_str(&format!("Cc: {}\n", self.cc.join(", ")));
		}
		if !self.bcc.is_empty() {
			out.push_str(&format!("Bcc: {}\n", self.bcc.join(", ")));
		}
		if !self.reply_to.is_empty() {
			out.push_str(&format!("Reply-To: {}\n", self.reply_to.join(", ")));
		}
		out.push_str(&format!("Subject: {}\n", self.subject));
		for (name, value) in &self.headers {
			out.push_str(&format!("{name}: {value}\n"));
		}
		out.push('\n');
		out.push_str(&self.body);
		out.push('\n');
		if let Some(html) = &self.html_body {
			out.push_str("\n--- text/html ---\n");
			out.push_str(html);
			out.push('\n');
		}
		for attachment in &self.attachments {
			out.push_str(&format!(
				"\n--- attachment: {} ({}, {} bytes) ---\n",
				attachment.filename(),
				attachment.mime_type(),
				attachment.content().len()
			));
		}
		out
	}

	/// Build the lettre MIME document for this message.
	///
	/// Bcc recipients are deliberately absent from the headers; they only
	/// travel in the SMTP envelope.
	pub fn mime_message(&self) -> EmailResult<lettre::Message> {
		if self.from_email.is_empty() {
			return Err(EmailError::MissingField("from_email".to_string()));
		}

		let mut builder = lettre::Message::builder()
			.from(mailbox(&self.from_email)?)
			.subject(&self.subject);
		for addr in &self.to {
			builder = builder.to(mailbox(addr)?);
		}
		for addr in &self.cc {
			builder = builder.cc(mailbox(addr)?);
		}
		for addr in &self.reply_to {
			builder = builder.reply_to(mailbox(addr)?);
		}
		for (name, value) in &self.headers {
			builder = headers::apply_custom(builder, name, value);
		}

		let text_part = SinglePart::builder()
			.header(ContentType::TEXT_PLAIN)
			.body(self.body.clone());

		let content = if self.html_body.is_none() && self.alternatives.is_empty() {
			MessagePart::Single(text_part)
		} else {
			let mut alternative = MultiPart::alternative().singlepart(text_part);
			if let Some(html) = &self.html_body {
				alternative = alternative.singlepart(
					SinglePart::builder()
						.header(ContentType::TEXT_HTML)
						.body(html.clone()),
				);
			}
			for alt in &self.alternatives {
				alternative = alternative.singlepart(
					SinglePart::builder()
						.header(parse_content_type(alt.content_type())?)
						.body(Body::new(alt.content().to_vec())),
				);
			}
			MessagePart::Multi(alternative)
		};

		let message = if self.attachments.is_empty() {
			match content {
				MessagePart::Single(part) => builder.singlepart(part)?,
				MessagePart::Multi(part) => builder.multipart(part)?,
			}
		} else {
			let mut mixed = match content {
				MessagePart::Single(part) => MultiPart::mixed().singlepart(part),
				MessagePart::Multi(part) => MultiPart::mixed().multipart(part),
			};
			for attachment in &self.attachments {
				let content_type = parse_content_type(attachment.mime_type())?;
				let body = Body::new(attachment.content().to_vec());
				let part = match attachment.content_id() {
					Some(cid) if attachment.is_inline() => {
						MimeAttachment::new_inline(cid.to_string()).body(body, content_type)
					}
					_ => MimeAttachment::new(attachment.filename().to_string())
						.body(body, content_type),
				};
				mixed = mixed.singlepart(part);
			}
			builder.multipart(mixed)?
		};

		Ok(message)
	}
}

enum MessagePart {
	Single(SinglePart),
	Multi(MultiPart),
}

fn parse_content_type(value: &str) -> EmailResult<ContentType> {
	ContentType::parse(value)
		.map_err(|_| EmailError::AttachmentError(format!("invalid content type: {value}")))
}

/// Build a lettre mailbox from `addr`, keeping any display name and
/// sanitizing the addr-spec.
fn mailbox(addr: &str) -> EmailResult<Mailbox> {
	let (name, _) = split_display_name(addr);
	let spec = sanitize_address(addr)?;
	let address = spec
		.parse()
		.map_err(|_| EmailError::InvalidAddress(addr.to_string()))?;
	Ok(Mailbox::new(name.map(String::from), address))
}

#[derive(Default)]
pub struct EmailMessageBuilder {
	subject: String,
	body: String,
	from_email: String,
	to: Vec<String>,
	cc: Vec<String>,
	bcc: Vec<String>,
	reply_to: Vec<String>,
	html_body: Option<String>,
	alternatives: Vec<Alternative>,
	attachments: Vec<Attachment>,
	headers: Vec<(String, String)>,
}

impl EmailMessageBuilder {
	pub fn subject(mut self, subject: impl Into<String>) -> Self {
		self.subject = subject.into();
		self
	}

	pub fn body(mut self, body: impl Into<String>) -> Self {
		self.body = body.into();
		self
	}

	pub fn from(mut self, from: impl Into<String>) -> Self {
		self.from_email = from.into();
		self
	}

	pub fn to(mut self, to: Vec<String>) -> Self {
		self.to = to;
		self
	}

	pub fn cc(mut self, cc: Vec<String>) -> Self {
		self.cc = cc;
		self
	}

	pub fn bcc(mut self, bcc: Vec<String>) -> Self {
		self.bcc = bcc;
		self
	}

	pub fn reply_to(mut self, reply_to: Vec<String>) -> Self {
		self.reply_to = reply_to;
		self
	}

	pub fn html(mut self, html: impl Into<String>) -> Self {
		self.html_body = Some(html.into());
		self
	}

	pub fn alternative(mut self, alternative: Alternative) -> Self {
		self.alternatives.push(alternative);
		self
	}

	pub fn attachment(mut self, attachment: Attachment) -> Self {
		self.attachments.push(attachment);
		self
	}

	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));
		self
	}

	/// Validate and build the message.
	pub fn build(self) -> EmailResult<EmailMessage> {
		if !self.from_email.is_empty() {
			validate_email(&self.from_email)?;
		}
		validate_email_list(&self.to)?;
		validate_email_list(&self.cc)?;
		validate_email_list(&self.bcc)?;
		validate_email_list(&self.reply_to)?;

		check_header_injection(&self.subject)?;
		for (name, value) in &self.headers {
			validate_header_name(name)?;
			check_header_injection(value)?;
		}

		Ok(EmailMessage {
			subject: self.subject,
			body: self.body,
			from_email: self.from_email,
			to: self.to,
			cc: self.cc,
			bcc: self.bcc,
			reply_to: self.reply_to,
			html_body: self.html_body,
			alternatives: self.alternatives,
			attachments: self.attachments,
			headers: self.headers,
		})
	}
}
