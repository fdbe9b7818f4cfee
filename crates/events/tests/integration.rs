//! Integration tests for events

#[cfg(test)]
mod tests {
    use hangar_errors::InstallError;
    use hangar_events::*;
    use hangar_types::{InstallStatus, Revision};

    #[tokio::test]
    async fn test_event_sender_emit() {
        let (tx, mut rx) = channel();

        tx.emit_error("test error");
        tx.emit_debug("test debug");

        let event1 = rx.recv().await.unwrap();
        assert!(matches!(event1, AppEvent::General(GeneralEvent::Error { .. })));

        let event2 = rx.recv().await.unwrap();
        assert!(matches!(
            event2,
            AppEvent::General(GeneralEvent::DebugLog { .. })
        ));
    }

    #[tokio::test]
    async fn test_dropped_receiver() {
        let (tx, rx) = channel();
        drop(rx);

        // Should not panic when receiver is dropped
        tx.emit_warning("ignored");
    }

    #[test]
    fn test_install_failed_carries_context() {
        let (tx, mut rx) = channel();
        let failure = FailureContext::from_error(&InstallError::Cancelled);
        tx.emit_install_failed("acme.glider", InstallStatus::UserCancelled, failure);

        let event = rx.try_recv().unwrap();
        assert_eq!(event.log_level(), tracing::Level::ERROR);
        assert_eq!(event.package(), Some("acme.glider"));
        match event {
            AppEvent::Install(InstallEvent::Failed {
                status, failure, ..
            }) => {
                assert_eq!(status, InstallStatus::UserCancelled);
                assert_eq!(failure.code.as_deref(), Some("install.cancelled"));
                assert!(failure.retryable);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_json_shape() {
        let event = AppEvent::Install(InstallEvent::Started {
            package: "acme.glider".into(),
            revision: Revision::new(3),
            session_id: "s1".into(),
        });
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["domain"], "install");
        assert_eq!(value["event"]["type"], "Started");
        assert_eq!(value["event"]["revision"], 3);
    }

    #[test]
    fn test_meta_for_event() {
        let event = AppEvent::Download(DownloadEvent::Progress {
            url: "http://x".into(),
            package: "acme.glider".into(),
            bytes_downloaded: 10,
            total_bytes: Some(20),
            percent: 50,
        });
        let meta = EventMeta::for_event(&event);
        assert_eq!(meta.correlation_id.as_deref(), Some("acme.glider"));
        assert_eq!(meta.level, EventLevel::Debug);
        assert_eq!(meta.source, EventSource::DOWNLOAD);
        assert_eq!(event.log_target(), "hangar::events::download");
    }
}
