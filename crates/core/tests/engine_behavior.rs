//! End-to-end behavior of the capture/store/restore pipeline against the
//! in-memory shell fake.

use std::sync::Arc;

use winshelf_core::{
	CaptureService, RestoreConfig, RestoreService, RestoreStatus, SessionStore,
};
use winshelf_shell::fake::FakeShell;
use winshelf_shell::{Rect, WindowPlacement, WindowState};

fn quick_config() -> RestoreConfig {
	RestoreConfig { max_poll_attempts: 5, poll_interval_ms: 1 }
}

#[tokio::test]
async fn capture_persist_reload_restore_round_trip() {
	let desktop = FakeShell::new();
	desktop.push_window(
		r"C:\Users\demo\Documents",
		WindowPlacement::new(Rect::new(0, 0, 1200, 900), WindowState::Normal),
	);
	desktop.push_window(
		r"C:\Users\demo\Music",
		WindowPlacement::new(Rect::new(300, 200, 800, 600), WindowState::Maximized),
	);
	desktop.push_inaccessible_window();

	let captured = CaptureService::new(Arc::new(desktop))
		.capture("tuesday layout")
		.await
		.unwrap();
	assert_eq!(captured.windows.len(), 3);
	assert_eq!(captured.degraded_count(), 1);

	let dir = tempfile::tempdir().unwrap();
	let store = SessionStore::new(dir.path());
	store.save(&captured).unwrap();

	let loaded = store.load(captured.id).unwrap();
	assert_eq!(loaded, captured);

	// Restore onto a fresh, empty desktop.
	let fresh = FakeShell::new();
	let report = RestoreService::with_config(Arc::new(fresh.clone()), quick_config())
		.restore(&loaded)
		.await;

	assert_eq!(report.outcomes.len(), 3);
	assert_eq!(report.opened(), 2);
	assert_eq!(report.skipped(), 1);
	assert_eq!(report.failed(), 0);
	assert_eq!(report.summary_line(), "2 of 3 windows restored, 1 skipped, 0 failed");

	// Both reopened windows carry their captured geometry.
	let windows = fresh.open_windows();
	assert_eq!(windows.len(), 2);
	let placement = fresh.placement_of(windows[1].0).unwrap();
	assert_eq!(placement.rect, Rect::new(300, 200, 800, 600));
	assert_eq!(placement.state, WindowState::Maximized);
}

#[tokio::test]
async fn mixed_outcomes_stay_independent_across_the_pipeline() {
	let desktop = FakeShell::new();
	desktop.push_window(
		r"C:\gone-by-restore-time",
		WindowPlacement::new(Rect::new(0, 0, 500, 500), WindowState::Normal),
	);
	desktop.push_window(
		r"C:\still-here",
		WindowPlacement::new(Rect::new(10, 10, 700, 500), WindowState::Normal),
	);

	let session = CaptureService::new(Arc::new(desktop)).capture("mixed").await.unwrap();

	let dir = tempfile::tempdir().unwrap();
	let store = SessionStore::new(dir.path());
	store.save(&session).unwrap();
	let session = store.load(session.id).unwrap();

	let target = FakeShell::new();
	target.fail_open(r"C:\gone-by-restore-time");
	let report = RestoreService::with_config(Arc::new(target), quick_config())
		.restore(&session)
		.await;

	assert_eq!(report.outcomes.len(), 2);
	assert!(matches!(report.outcomes[0].status, RestoreStatus::Failed(_)));
	assert_eq!(report.outcomes[1].status, RestoreStatus::Opened { geometry_applied: true });
}

#[tokio::test]
async fn restoring_twice_from_the_store_never_reuses_handles() {
	let desktop = FakeShell::new();
	desktop.push_window(
		r"C:\repeat",
		WindowPlacement::new(Rect::new(0, 0, 640, 480), WindowState::Normal),
	);
	let session = CaptureService::new(Arc::new(desktop)).capture("repeat").await.unwrap();

	let dir = tempfile::tempdir().unwrap();
	let store = SessionStore::new(dir.path());
	store.save(&session).unwrap();

	let target = FakeShell::new();
	let service = RestoreService::with_config(Arc::new(target.clone()), quick_config());

	let first = service.restore(&store.load(session.id).unwrap()).await;
	let second = service.restore(&store.load(session.id).unwrap()).await;

	assert_eq!(first.opened(), 1);
	assert_eq!(second.opened(), 1);
	// Duplicate windows, not recycled ones: capture has no content dedup,
	// so neither does a repeated restore.
	assert_eq!(target.window_count(), 2);
	let handles: Vec<_> = target.open_windows().into_iter().map(|(h, _)| h).collect();
	assert_ne!(handles[0], handles[1]);
}
