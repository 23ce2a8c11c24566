//! Email address and header validation.
//!
//! Addresses are checked against the RFC 5321/5322 limits that matter in
//! practice (length caps, single `@`, sane label sizes) and sanitized before
//! they reach the SMTP envelope: a display name is split off and a non-ASCII
//! domain is IDNA-encoded. Header values are screened for CR/LF injection.

use crate::{EmailError, EmailResult};

/// Maximum total length of an email address (RFC 5321 path limit).
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum length of the local part (RFC 5321).
const MAX_LOCAL_PART_LENGTH: usize = 64;

/// Maximum length of a single domain label (RFC 1035).
const MAX_LABEL_LENGTH: usize = 63;

/// Split an address of the form `Display Name <local@domain>` into the
/// optional display name and the addr-spec. Bare addresses pass through.
pub fn split_display_name(addr: &str) -> (Option<&str>, &str) {
	let addr = addr.trim();
	if let Some(open) = addr.rfind('<')
		&& addr.ends_with('>')
	{
		let name = addr[..open].trim();
		let spec = addr[open + 1..addr.len() - 1].trim();
		let name = (!name.is_empty()).then_some(name.trim_matches('"'));
		return (name, spec);
	}
	(None, addr)
}

/// Validate a single email address (bare or with display name).
pub fn validate_email(addr: &str) -> EmailResult<()> {
	let (_, spec) = split_display_name(addr);

	if spec.is_empty() {
		return Err(EmailError::InvalidAddress("empty address".to_string()));
	}
	if spec.len() > MAX_EMAIL_LENGTH {
		return Err(EmailError::InvalidAddress(format!(
			"{spec}: longer than {MAX_EMAIL_LENGTH} characters"
		)));
	}
	if spec.chars().any(|c| c.is_control() || c.is_whitespace()) {
		return Err(EmailError::InvalidAddress(format!(
			"{spec}: contains whitespace or control characters"
		)));
	}

	let Some((local, domain)) = spec.rsplit_once('@') else {
		return Err(EmailError::InvalidAddress(format!("{spec}: missing @")));
	};
	if local.is_empty() || local.len() > MAX_LOCAL_PART_LENGTH {
		return Err(EmailError::InvalidAddress(format!(
			"{spec}: invalid local part"
		)));
	}
	if local.contains('@') {
		return Err(EmailError::InvalidAddress(format!(
			"{spec}: multiple @ characters"
		)));
	}

	validate_domain(spec, domain)
}

fn validate_domain(spec: &str, domain: &str) -> EmailResult<()> {
	if domain.is_empty() {
		return Err(EmailError::InvalidAddress(format!("{spec}: empty domain")));
	}
	// Non-ASCII domains are valid if IDNA can encode them; sanitize_address
	// performs the actual encoding.
	if !domain.is_ascii() {
		return match idna::domain_to_ascii(domain) {
			Ok(_) => Ok(()),
			Err(_) => Err(EmailError::InvalidAddress(format!(
				"{spec}: invalid international domain"
			))),
		};
	}
	for label in domain.split('.') {
		if label.is_empty() || label.len() > MAX_LABEL_LENGTH {
			return Err(EmailError::InvalidAddress(format!(
				"{spec}: invalid domain label"
			)));
		}
		if label.starts_with('-') || label.ends_with('-') {
			return Err(EmailError::InvalidAddress(format!(
				"{spec}: domain label starts or ends with a hyphen"
			)));
		}
		if !label
			.chars()
			.all(|c| c.is_ascii_alphanumeric() || c == '-')
		{
			return Err(EmailError::InvalidAddress(format!(
				"{spec}: invalid character in domain"
			)));
		}
	}
	Ok(())
}

/// Validate every address in a list.
pub fn validate_email_list(addrs: &[String]) -> EmailResult<()> {
	for addr in addrs {
		validate_email(addr)?;
	}
	Ok(())
}

/// Return the addr-spec with an ASCII-safe domain, stripping any display
/// name. This is the form handed to the SMTP envelope.
pub fn sanitize_address(addr: &str) -> EmailResult<String> {
	validate_email(addr)?;
	let (_, spec) = split_display_name(addr);
	// validate_email guarantees the @ is present
	let (local, domain) = spec
		.rsplit_once('@')
		.ok_or_else(|| EmailError::InvalidAddress(spec.to_string()))?;

	if domain.is_ascii() {
		return Ok(spec.to_string());
	}
	let ascii_domain = idna::domain_to_ascii(domain)
		.map_err(|_| EmailError::InvalidAddress(format!("{spec}: invalid international domain")))?;
	Ok(format!("{local}@{ascii_domain}"))
}

/// Reject values that would allow injecting extra headers.
pub fn check_header_injection(value: &str) -> EmailResult<()> {
	if value.contains('\r') || value.contains('\n') {
		return Err(EmailError::HeaderInjection(
			value.replace(['\r', '\n'], " "),
		));
	}
	Ok(())
}

/// Validate a header field name (RFC 5322 ftext: printable ASCII, no colon).
pub fn validate_header_name(name: &str) -> EmailResult<()> {
	if name.is_empty() {
		return Err(EmailError::InvalidHeader("empty header name".to_string()));
	}
	if !name
		.bytes()
		.all(|b| (33..=126).contains(&b) && b != b':')
	{
		return Err(EmailError::InvalidHeader(name.to_string()));
	}
	Ok(())
}
