//! Development backend tests: console, file, memory, and dummy.

use nuages_mail::{
	ConsoleBackend, DummyBackend, EmailBackend, EmailMessage, FileBackend, MailSettings,
	MemoryBackend, backend_from_settings,
};
use rstest::rstest;
use tempfile::TempDir;

fn sample_message(subject: &str) -> EmailMessage {
	EmailMessage::builder()
		.from("sender@example.com")
		.to(vec!["recipient@example.com".to_string()])
		.subject(subject)
		.body("Test body content.")
		.build()
		.unwrap()
}

#[rstest]
#[tokio::test]
async fn test_console_backend_counts_messages() {
	let backend = ConsoleBackend;
	let messages = vec![sample_message("First"), sample_message("Second")];

	let sent = backend.send_messages(&messages).await.unwrap();
	assert_eq!(sent, 2);
}

#[rstest]
#[tokio::test]
async fn test_console_backend_empty_list() {
	let backend = ConsoleBackend;
	let sent = backend.send_messages(&[]).await.unwrap();
	assert_eq!(sent, 0);
}

#[rstest]
#[tokio::test]
async fn test_file_backend_writes_message() {
	// Arrange
	let dir = TempDir::new().unwrap();
	let backend = FileBackend::new(dir.path());

	// Act
	let sent = backend.send_messages(&[sample_message("On Disk")]).await.unwrap();

	// Assert
	assert_eq!(sent, 1);
	let entries: Vec<_> = std::fs::read_dir(dir.path())
		.unwrap()
		.map(|entry| entry.unwrap().path())
		.collect();
	assert_eq!(entries.len(), 1);
	assert_eq!(entries[0].extension().unwrap(), "log");

	let content = std::fs::read_to_string(&entries[0]).unwrap();
	assert!(content.contains("Subject: On Disk"));
	assert!(content.contains("Test body content."));
}

#[rstest]
#[tokio::test]
async fn test_file_backend_creates_nested_directory() {
	let dir = TempDir::new().unwrap();
	let nested = dir.path().join("mail").join("outbox");
	let backend = FileBackend::new(&nested);

	let sent = backend.send_messages(&[sample_message("Nested")]).await.unwrap();

	assert_eq!(sent, 1);
	assert!(nested.is_dir());
	assert_eq!(std::fs::read_dir(&nested).unwrap().count(), 1);
}

#[rstest]
#[tokio::test]
async fn test_file_backend_one_file_per_message() {
	let dir = TempDir::new().unwrap();
	let backend = FileBackend::new(dir.path());

	let messages: Vec<_> = (1..=4)
		.map(|i| sample_message(&format!("Message {i}")))
		.collect();
	let sent = backend.send_messages(&messages).await.unwrap();

	assert_eq!(sent, 4);
	assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 4);
}

#[rstest]
#[tokio::test]
async fn test_file_backend_concurrent_writes_do_not_collide() {
	let dir = TempDir::new().unwrap();
	let backend = std::sync::Arc::new(FileBackend::new(dir.path()));

	let tasks: Vec<_> = (1..=8)
		.map(|i| {
			let backend = backend.clone();
			tokio::spawn(async move {
				backend
					.send_messages(&[sample_message(&format!("Concurrent {i}"))])
					.await
			})
		})
		.collect();

	for result in futures::future::join_all(tasks).await {
		assert_eq!(result.unwrap().unwrap(), 1);
	}
	assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 8);
}

#[rstest]
#[tokio::test]
async fn test_file_backend_preserves_utf8() {
	let dir = TempDir::new().unwrap();
	let backend = FileBackend::new(dir.path());

	let message = EmailMessage::builder()
		.from("sender@example.com")
		.to(vec!["recipient@example.com".to_string()])
		.subject("Überraschung")
		.body("Grüße aus München")
		.build()
		.unwrap();
	backend.send_messages(&[message]).await.unwrap();

	let entry = std::fs::read_dir(dir.path()).unwrap().next().unwrap().unwrap();
	let content = std::fs::read_to_string(entry.path()).unwrap();
	assert!(content.contains("Überraschung"));
	assert!(content.contains("Grüße aus München"));
}

#[rstest]
#[tokio::test]
async fn test_memory_backend_captures_and_queries() {
	let backend = MemoryBackend::new();

	backend
		.send_messages(&[sample_message("Welcome"), sample_message("Reminder")])
		.await
		.unwrap();

	assert_eq!(backend.count(), 2);
	assert_eq!(backend.find_by_subject("Welcome").len(), 1);
	assert_eq!(backend.find_by_recipient("recipient@example.com").len(), 2);
	assert!(backend.find_by_recipient("nobody@example.com").is_empty());

	backend.clear();
	assert_eq!(backend.count(), 0);
}

#[rstest]
#[tokio::test]
async fn test_memory_backend_clones_share_store() {
	let backend = MemoryBackend::new();
	let clone = backend.clone();

	clone.send_messages(&[sample_message("Shared")]).await.unwrap();

	assert_eq!(backend.count(), 1);
	assert_eq!(backend.sent_messages()[0].subject(), "Shared");
}

#[rstest]
#[tokio::test]
async fn test_dummy_backend_discards_everything() {
	let backend = DummyBackend;

	let sent = backend
		.send_messages(&[sample_message("Gone"), sample_message("Also gone")])
		.await
		.unwrap();
	assert_eq!(sent, 2);
}

#[rstest]
#[case("console")]
#[case("file")]
#[case("memory")]
#[case("dummy")]
#[tokio::test]
async fn test_backend_from_settings_dispatch(#[case] name: &str) {
	let dir = TempDir::new().unwrap();
	let settings = MailSettings {
		backend: name.to_string(),
		file_path: Some(dir.path().to_path_buf()),
		..MailSettings::default()
	};

	let backend = backend_from_settings(&settings, false).unwrap();
	let sent = backend.send_messages(&[sample_message("Dispatched")]).await.unwrap();
	assert_eq!(sent, 1);
}

#[rstest]
fn test_backend_from_settings_unknown_name() {
	let settings = MailSettings {
		backend: "carrier-pigeon".to_string(),
		..MailSettings::default()
	};

	let error = match backend_from_settings(&settings, false) {
		Ok(_) => panic!("unknown backend name should be rejected"),
		Err(error) => error,
	};
	assert!(error.to_string().contains("unknown email backend"));
}
