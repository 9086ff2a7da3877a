//! Integration tests for export.
//!
//! Runs the montage-session export path against montage-media's scripted
//! engine and checks the engine calls, the artifact and the cleanup.

use montage_core::{DecodeError, MediaFile, MontageConfig, SourceHandle};
use montage_media::export::{MANIFEST_NAME, OUTPUT_NAME};
use montage_media::testing::{EngineCall, EngineScript, FailPoint, RecordingLoader};
use montage_media::{DurationProber, EngineOp, ExportError, ExportStage};
use montage_preview::testing::RecordingSurface;
use montage_session::{Session, StatusMessage};
use montage_timeline::{ClipId, MoveDirection, TrimUpdate};
use std::sync::Arc;
use tokio::sync::Notify;

// ── Helpers ────────────────────────────────────────────────────

/// Every source is 4 seconds long.
struct FourSeconds;

impl DurationProber for FourSeconds {
    async fn probe(&self, _source: &SourceHandle) -> Result<f64, DecodeError> {
        Ok(4.0)
    }
}

async fn session_with(
    script: EngineScript,
    names: &[&str],
) -> (Session<RecordingSurface, RecordingLoader>, RecordingLoader, Vec<ClipId>) {
    let loader = RecordingLoader::new(script);
    let mut session = Session::new(
        MontageConfig::default(),
        RecordingSurface::immediate(),
        loader.clone(),
    );
    let files = names
        .iter()
        .map(|name| MediaFile::from_bytes(*name, "video/mp4", name.as_bytes().to_vec()))
        .collect();
    let ids = session.add_files(&FourSeconds, files).await;
    (session, loader, ids)
}

fn intermediates() -> Vec<String> {
    vec![
        "clip_0.mp4".into(),
        "clip_0_trimmed.mp4".into(),
        "clip_1.mp4".into(),
        MANIFEST_NAME.into(),
        OUTPUT_NAME.into(),
    ]
}

// ── Pipeline ───────────────────────────────────────────────────

#[tokio::test]
async fn only_trimmed_clip_is_cut_before_concat() {
    let (mut session, loader, ids) = session_with(EngineScript::default(), &["a.mp4", "b.mp4"]).await;
    session.set_trim(ids[0], TrimUpdate::both(0.5, 2.0));

    session.export().await.unwrap();

    let state = loader.state();
    let state = state.lock();
    let ops = state.ops();
    assert_eq!(ops.len(), 2);
    match &ops[0] {
        EngineOp::Trim { input, range, output } => {
            assert_eq!(input, "clip_0.mp4");
            assert_eq!(output, "clip_0_trimmed.mp4");
            assert_eq!((range.start, range.end), (0.5, 2.0));
        }
        other => panic!("expected a trim first, got {other}"),
    }
    assert!(matches!(&ops[1], EngineOp::Concat { output, .. } if output == OUTPUT_NAME));

    let mut deleted = state.deleted();
    deleted.sort();
    let mut expected = intermediates();
    expected.sort();
    assert_eq!(deleted, expected);
    assert!(state.files.is_empty());
}

#[tokio::test]
async fn trim_arguments_use_timecodes() {
    let (mut session, loader, ids) = session_with(EngineScript::default(), &["a.mp4"]).await;
    session.set_trim(ids[0], TrimUpdate::both(1.25, 3.5));
    session.export().await.unwrap();

    let ops = loader.state().lock().ops();
    let args = ops[0].ffmpeg_args();
    let window: Vec<&str> = args.iter().map(String::as_str).skip_while(|a| *a != "-ss").take(4).collect();
    assert_eq!(window, ["-ss", "00:00:01.25", "-to", "00:00:03.50"]);
}

#[tokio::test]
async fn artifact_joins_parts_in_timeline_order() {
    let (mut session, _, ids) = session_with(EngineScript::default(), &["a.mp4", "b.mp4", "c.mp4"]).await;
    session.move_clip(ids[2], MoveDirection::Earlier);

    session.export().await.unwrap();
    let artifact = session.result().unwrap();
    assert_eq!(artifact.bytes, b"a.mp4c.mp4b.mp4");
    assert_eq!(artifact.file_name, "montage.mp4");
}

// ── Failures ───────────────────────────────────────────────────

#[tokio::test]
async fn concat_failure_yields_no_artifact_and_cleans_up() {
    let script = EngineScript {
        fail_on: Some(FailPoint::Concat),
        ..EngineScript::default()
    };
    let (mut session, loader, ids) = session_with(script, &["a.mp4", "b.mp4"]).await;
    session.set_trim(ids[0], TrimUpdate::end(2.0));

    let err = session.export().await.unwrap_err();
    assert!(matches!(err, ExportError::Engine(_)));
    assert!(session.result().is_none());
    assert_eq!(session.status(), StatusMessage::ExportFailed);
    assert_eq!(session.progress(), 0.0);

    let state = loader.state();
    let state = state.lock();
    let mut deleted = state.deleted();
    deleted.sort();
    let mut expected = intermediates();
    expected.sort();
    assert_eq!(deleted, expected);
    assert!(!state.calls.contains(&EngineCall::Read(OUTPUT_NAME.into())));
}

#[tokio::test]
async fn trim_failure_stops_before_later_clips_and_concat() {
    let script = EngineScript {
        fail_on: Some(FailPoint::Trim),
        ..EngineScript::default()
    };
    let (mut session, loader, ids) = session_with(script, &["a.mp4", "b.mp4"]).await;
    session.set_trim(ids[0], TrimUpdate::start(1.0));
    session.set_trim(ids[1], TrimUpdate::start(1.0));

    let err = session.export().await.unwrap_err();
    assert!(matches!(err, ExportError::Engine(_)));
    assert!(session.result().is_none());
    assert_eq!(session.status(), StatusMessage::ExportFailed);

    let state = loader.state();
    let state = state.lock();
    let ops = state.ops();
    assert_eq!(ops.len(), 1);
    assert!(matches!(&ops[0], EngineOp::Trim { input, .. } if input == "clip_0.mp4"));
    assert!(!state.calls.contains(&EngineCall::Ingest("clip_1.mp4".into())));
    assert!(!state.calls.contains(&EngineCall::Ingest(MANIFEST_NAME.into())));
    assert_eq!(state.deleted(), ["clip_0.mp4", "clip_0_trimmed.mp4"]);
    assert!(state.files.is_empty());
}

#[tokio::test]
async fn read_failure_after_concat_cleans_up_output() {
    let script = EngineScript {
        fail_on: Some(FailPoint::Read),
        ..EngineScript::default()
    };
    let (mut session, loader, _) = session_with(script, &["a.mp4", "b.mp4"]).await;

    let err = session.export().await.unwrap_err();
    assert!(matches!(err, ExportError::Engine(_)));
    assert!(session.result().is_none());
    assert_eq!(session.status(), StatusMessage::ExportFailed);

    let state = loader.state();
    let state = state.lock();
    let ops = state.ops();
    assert_eq!(ops.len(), 1);
    assert!(matches!(&ops[0], EngineOp::Concat { .. }));
    assert!(state.calls.contains(&EngineCall::Read(OUTPUT_NAME.into())));
    assert_eq!(
        state.deleted(),
        ["clip_0.mp4", "clip_1.mp4", MANIFEST_NAME, OUTPUT_NAME]
    );
    assert!(state.files.is_empty());
}

#[tokio::test]
async fn cleanup_failures_do_not_fail_the_export() {
    let script = EngineScript {
        fail_deletes: true,
        ..EngineScript::default()
    };
    let (mut session, _, _) = session_with(script, &["a.mp4"]).await;

    session.export().await.unwrap();
    assert!(session.result().is_some());
    assert_eq!(session.status(), StatusMessage::ExportDone);

    let failures = session.exporter().last_cleanup_failures();
    let artifacts: Vec<_> = failures.iter().map(|f| f.artifact.as_str()).collect();
    assert_eq!(artifacts, ["clip_0.mp4", MANIFEST_NAME, OUTPUT_NAME]);
}

#[tokio::test]
async fn engine_is_reused_across_exports() {
    let (mut session, loader, _) = session_with(EngineScript::default(), &["a.mp4"]).await;
    for _ in 0..3 {
        session.export().await.unwrap();
    }
    assert_eq!(loader.load_count(), 1);
}

#[tokio::test]
async fn progress_is_clamped_and_reset() {
    let hold = Arc::new(Notify::new());
    let script = EngineScript {
        progress_values: vec![-0.5, 0.4, 7.0],
        hold_before_concat: Some(Arc::clone(&hold)),
        ..EngineScript::default()
    };
    let (mut session, _, ids) = session_with(script, &["a.mp4"]).await;
    session.set_trim(ids[0], TrimUpdate::start(1.0));

    let progress = session.exporter().progress().clone();
    let running = tokio::spawn(session.prepare_export().unwrap());
    while progress.stage() != ExportStage::Concatenating {
        tokio::task::yield_now().await;
    }
    assert!(session.is_processing());
    assert_eq!(session.status(), StatusMessage::Exporting(ExportStage::Concatenating));
    // The trim reported 7.0 last.
    assert_eq!(progress.fraction(), 1.0);

    hold.notify_one();
    let outcome = running.await.unwrap();
    assert_eq!(progress.fraction(), 0.0);
    assert_eq!(progress.stage(), ExportStage::Idle);
    session.finish_export(outcome).unwrap();
    assert!(!session.is_processing());
}
