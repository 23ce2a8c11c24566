//! Typed custom headers for outgoing messages.
//!
//! lettre's `Header::name()` is static, so every custom header name the SMTP
//! backend can emit needs its own type. The set below covers the headers the
//! framework actually writes; anything else stored on an
//! [`EmailMessage`](crate::EmailMessage) is skipped during MIME conversion
//! with a debug event.

use std::error::Error as StdError;

use lettre::message::MessageBuilder;
use lettre::message::header::{Header, HeaderName, HeaderValue};

macro_rules! text_header {
	($(#[$meta:meta])* $name:ident, $header:literal) => {
		$(#[$meta])*
		#[derive(Debug, Clone, PartialEq, Eq)]
		pub struct $name(String);

		impl $name {
			pub fn new(value: impl Into<String>) -> Self {
				Self(value.into())
			}
		}

		impl Header for $name {
			fn name() -> HeaderName {
				HeaderName::new_from_ascii_str($header)
			}

			fn parse(s: &str) -> Result<Self, Box<dyn StdError + Send + Sync>> {
				Ok(Self(s.to_string()))
			}

			fn display(&self) -> HeaderValue {
				HeaderValue::new(Self::name(), self.0.clone())
			}
		}
	};
}

text_header!(
	/// Identifies the software that produced the message.
	XMailer,
	"X-Mailer"
);
text_header!(
	/// Numeric message priority (1 = highest).
	XPriority,
	"X-Priority"
);
text_header!(
	/// Unsubscribe target for list mail (RFC 2369).
	ListUnsubscribe,
	"List-Unsubscribe"
);
text_header!(
	/// One-click unsubscribe marker (RFC 8058).
	ListUnsubscribePost,
	"List-Unsubscribe-Post"
);
text_header!(
	/// Deduplication reference used by some providers.
	XEntityRefId,
	"X-Entity-Ref-ID"
);
text_header!(
	/// Bulk/list precedence marker.
	Precedence,
	"Precedence"
);

/// Attach a custom header to the builder when its name is supported.
///
/// Returns the builder unchanged (after a debug event) for unsupported
/// names; the caller has already validated name and value.
pub(crate) fn apply_custom(builder: MessageBuilder, name: &str, value: &str) -> MessageBuilder {
	if name.eq_ignore_ascii_case("X-Mailer") {
		builder.header(XMailer::new(value))
	} else if name.eq_ignore_ascii_case("X-Priority") {
		builder.header(XPriority::new(value))
	} else if name.eq_ignore_ascii_case("List-Unsubscribe") {
		builder.header(ListUnsubscribe::new(value))
	} else if name.eq_ignore_ascii_case("List-Unsubscribe-Post") {
		builder.header(ListUnsubscribePost::new(value))
	} else if name.eq_ignore_ascii_case("X-Entity-Ref-ID") {
		builder.header(XEntityRefId::new(value))
	} else if name.eq_ignore_ascii_case("Precedence") {
		builder.header(Precedence::new(value))
	} else {
		tracing::debug!(header = name, "unsupported custom header skipped");
		builder
	}
}
