//! End-to-end restore flows through `ArchiveAccessor`.

mod support;

use std::sync::Arc;
use std::time::Duration;

use restorekit_core::{ArchiveAccessor, ArchiveAccessorFactory};
use restorekit_domain::{
    DecryptionCredentials, NodeType, PushRestoreTarget, RestoreConfig, RestoreKitError,
};
use support::{collect, session, size_status, status, Call, FakeArchive, RESTORED_BYTES};

fn config() -> RestoreConfig {
    RestoreConfig {
        job_polling_interval: Duration::from_millis(1),
        file_size_poll_interval: Duration::from_millis(1),
        ..RestoreConfig::default()
    }
}

fn accessor(archive: &Arc<FakeArchive>) -> ArchiveAccessor {
    ArchiveAccessor::new(session(), archive.clone(), archive.clone(), &config())
}

#[tokio::test]
async fn report_pdf_is_resolved_submitted_polled_and_streamed() {
    let archive = FakeArchive::sample()
        .with_restore_statuses(vec![status(false, Some("NOT_DONE")), status(true, Some("DONE"))])
        .into_arc();

    let stream = accessor(&archive)
        .stream_from_backup(&["/Users/qa/Downloads/report.pdf"], None, None)
        .await
        .unwrap();

    assert_eq!(collect(stream).await, RESTORED_BYTES);
    assert_eq!(
        archive.calls(),
        vec![
            Call::ListChildren(None),
            Call::ListChildren(Some("root".into())),
            Call::ListChildren(Some("users".into())),
            Call::ListChildren(Some("qa".into())),
            Call::ListChildren(Some("downloads".into())),
            Call::SubmitRestore,
            Call::GetRestoreStatus("restore-1".into()),
            Call::GetRestoreStatus("restore-1".into()),
            Call::StreamResult("restore-1".into()),
        ]
    );

    let request = &archive.submitted()[0];
    assert_eq!((request.num_files, request.num_dirs, request.num_bytes), (1, 1, 1));
    assert_eq!(request.zip_result, None);
    assert_eq!(request.restore_groups[0].node_type, NodeType::File);
    assert_eq!(request.restore_groups[0].path, "/Users/qa/Downloads/report.pdf");
}

#[tokio::test]
async fn first_unresolvable_path_aborts_before_submission() {
    let archive = FakeArchive::sample().into_arc();

    let err = accessor(&archive)
        .stream_from_backup(
            &["/Users/qa/Downloads/report.pdf", "/Users/qa/Downloads/missing.txt", "/nope"],
            None,
            None,
        )
        .await
        .err()
        .expect("resolution should fail");

    match err {
        RestoreKitError::ArchiveFileNotFound { path, .. } => {
            assert_eq!(path, "/Users/qa/Downloads/missing.txt");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(archive.count(|c| *c == Call::SubmitRestore), 0);
    assert_eq!(archive.count(|c| *c == Call::ListChildren(None)), 2, "third path never walked");
}

#[tokio::test]
async fn sizes_are_realigned_to_input_order() {
    let archive = FakeArchive::sample()
        .with_size_statuses(
            "report",
            vec![size_status("running", 0, 0, 0), size_status("done", 1, 0, 2048)],
        )
        .with_size_statuses("c-downloads", vec![size_status("done", 12, 3, 90_000)])
        .into_arc();

    accessor(&archive)
        .stream_from_backup(
            &["/Users/qa/Downloads/report.pdf", r"C:\Users\qa\Downloads"],
            Some(Duration::from_secs(30)),
            None,
        )
        .await
        .unwrap();

    let request = &archive.submitted()[0];
    assert_eq!(request.restore_groups[0].path, "/Users/qa/Downloads/report.pdf");
    assert_eq!(request.restore_groups[1].path, "C:/Users/qa/Downloads");
    assert_eq!((request.num_files, request.num_dirs, request.num_bytes), (13, 3, 92_048));
    assert_eq!(request.zip_result, Some(true));
}

#[tokio::test]
async fn size_failures_fall_back_to_placeholders() {
    let archive = FakeArchive::sample()
        .fail_size_jobs(RestoreKitError::Network("size service down".into()))
        .into_arc();

    accessor(&archive)
        .stream_from_backup(&["/Users/qa/Downloads/notes.txt"], Some(Duration::from_secs(5)), None)
        .await
        .unwrap();

    let request = &archive.submitted()[0];
    assert_eq!((request.num_files, request.num_dirs, request.num_bytes), (1, 1, 1));
}

#[tokio::test]
async fn stream_to_device_resolves_then_pushes() {
    let archive = FakeArchive::sample()
        .with_connected_device("laptop-2", "https://storage-2.example.com")
        .into_arc();

    let ack = accessor(&archive)
        .stream_to_device(
            &["/Users/qa/Downloads/"],
            &PushRestoreTarget::new("laptop-2", "/restored"),
            None,
            None,
        )
        .await
        .unwrap();

    assert_eq!(ack.job_id, "push-1");
    let request = &archive.pushed()[0];
    assert_eq!(request.restore_groups[0].node_type, NodeType::Directory);
    assert_eq!(request.session_id, support::SESSION_ID);
}

#[tokio::test]
async fn get_file_sizes_passes_through_in_completion_order() {
    let archive = FakeArchive::sample()
        .with_size_statuses("a", vec![size_status("running", 0, 0, 0), size_status("done", 1, 0, 5)])
        .into_arc();
    let ids = vec!["a".to_string(), "b".to_string()];

    let reports =
        accessor(&archive).get_file_sizes(&ids, Some(Duration::from_secs(10))).await.unwrap().unwrap();

    let order: Vec<_> = reports.iter().map(|r| r.file_id.clone()).collect();
    assert_eq!(order, ["b", "a"]);
}

#[tokio::test]
async fn factory_fetches_data_key_token_for_server_managed_archives() {
    let archive = FakeArchive::sample().into_arc();
    let factory = ArchiveAccessorFactory::new(archive.clone(), archive.clone(), archive.clone(), config());

    let accessor =
        factory.create("4200", "node-7", DecryptionCredentials::ServerManaged).await.unwrap();

    assert_eq!(accessor.session().session_id, support::SESSION_ID);
    assert_eq!(accessor.session().node_guid, "node-7");
    assert_eq!(
        archive.calls(),
        vec![Call::DataKeyToken("4200".into()), Call::CreateSession("dataKeyToken")]
    );
}

#[tokio::test]
async fn factory_presents_private_password_directly() {
    let archive = FakeArchive::sample().into_arc();
    let factory = ArchiveAccessorFactory::new(archive.clone(), archive.clone(), archive.clone(), config());

    factory
        .create("4200", "node-7", DecryptionCredentials::PrivatePassword("s3cret".into()))
        .await
        .unwrap();
    factory
        .create("4200", "node-7", DecryptionCredentials::EncryptionKey("a1b2".into()))
        .await
        .unwrap();

    assert_eq!(
        archive.calls(),
        vec![Call::CreateSession("privatePassword"), Call::CreateSession("encryptionKey")]
    );
}
