use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::notifier::Notifier;
use crate::store::MarkerStore;
use crate::twitch::ClipSource;

/// What a single poll cycle observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    NoClip,
    NewClip(String),
    SeenClip(String),
}

pub struct Poller<S, N, M> {
    source: S,
    notifier: N,
    store: M,
    interval: Duration,
}

impl<S, N, M> Poller<S, N, M>
where
    S: ClipSource,
    N: Notifier,
    M: MarkerStore,
{
    pub fn new(source: S, notifier: N, store: M, interval: Duration) -> Self {
        Self {
            source,
            notifier,
            store,
            interval,
        }
    }

    /// Polls forever. Only returns if the surrounding task is dropped.
    pub async fn run(&self) {
        info!(interval_secs = self.interval.as_secs(), "Starting Twitch clip monitor");
        loop {
            self.poll_once().await;
            tokio::time::sleep(self.interval).await;
        }
    }

    pub async fn poll_once(&self) -> CycleOutcome {
        let Some(clip) = self.source.fetch_latest_clip().await else {
            debug!("No new clips found in the last interval");
            return CycleOutcome::NoClip;
        };

        let Some(id) = clip.id.clone() else {
            warn!("Clip without an identifier, skipping");
            return CycleOutcome::NoClip;
        };

        let last_seen = match self.store.read().await {
            Ok(marker) => marker,
            Err(e) => {
                error!(error = %e, "Could not read last clip marker");
                None
            }
        };

        if last_seen.as_deref() == Some(id.as_str()) {
            debug!(clip_id = %id, "Clip already seen");
            return CycleOutcome::SeenClip(id);
        }

        info!(
            clip_id = %id,
            created_at = clip.created_at.as_deref().unwrap_or("unknown"),
            "New clip found"
        );
        if let Err(e) = self.notifier.notify(&clip).await {
            error!(clip_id = %id, error = %e, "Failed to send clip notification");
        }

        // Recorded even when delivery failed; failed sends are not retried.
        if let Err(e) = self.store.write(&id).await {
            error!(clip_id = %id, error = %e, "Could not save last clip marker");
        }

        CycleOutcome::NewClip(id)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use super::*;
    use crate::error::Error;
    use crate::store::memory::MemoryMarkerStore;
    use crate::store::FileMarkerStore;
    use crate::twitch::ClipRecord;

    #[derive(Default)]
    struct ScriptedSource {
        results: Mutex<VecDeque<Option<ClipRecord>>>,
    }

    impl ScriptedSource {
        fn new(ids: &[Option<&str>]) -> Self {
            let results = ids.iter().map(|id| (*id).map(clip)).collect();
            Self {
                results: Mutex::new(results),
            }
        }
    }

    #[async_trait]
    impl ClipSource for ScriptedSource {
        async fn fetch_latest_clip(&self) -> Option<ClipRecord> {
            self.results.lock().pop_front().flatten()
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, clip: &ClipRecord) -> Result<(), Error> {
            self.sent.lock().push(clip.id.clone().unwrap_or_default());
            if self.fail {
                return Err(Error::Status {
                    status: reqwest::StatusCode::BAD_GATEWAY,
                    body: String::new(),
                });
            }
            Ok(())
        }
    }

    fn clip(id: &str) -> ClipRecord {
        ClipRecord {
            id: Some(id.to_string()),
            ..ClipRecord::default()
        }
    }

    fn poller<M: MarkerStore>(
        ids: &[Option<&str>],
        notifier: RecordingNotifier,
        store: M,
    ) -> Poller<ScriptedSource, RecordingNotifier, M> {
        Poller::new(
            ScriptedSource::new(ids),
            notifier,
            store,
            Duration::from_secs(60),
        )
    }

    #[tokio::test]
    async fn new_clip_without_marker_is_sent_and_recorded() {
        let poller = poller(
            &[Some("abc123")],
            RecordingNotifier::default(),
            MemoryMarkerStore::default(),
        );

        assert_eq!(
            poller.poll_once().await,
            CycleOutcome::NewClip("abc123".to_string())
        );
        assert_eq!(*poller.notifier.sent.lock(), vec!["abc123"]);
        assert_eq!(poller.store.marker().as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn clip_matching_marker_is_not_sent() {
        let poller = poller(
            &[Some("abc123")],
            RecordingNotifier::default(),
            MemoryMarkerStore::with_marker("abc123"),
        );

        assert_eq!(
            poller.poll_once().await,
            CycleOutcome::SeenClip("abc123".to_string())
        );
        assert!(poller.notifier.sent.lock().is_empty());
        assert_eq!(*poller.store.writes.lock(), 0);
        assert_eq!(poller.store.marker().as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn failed_send_still_advances_marker() {
        let notifier = RecordingNotifier {
            fail: true,
            ..RecordingNotifier::default()
        };
        let poller = poller(
            &[Some("xyz"), Some("xyz")],
            notifier,
            MemoryMarkerStore::with_marker("abc123"),
        );

        assert_eq!(poller.poll_once().await, CycleOutcome::NewClip("xyz".to_string()));
        assert_eq!(poller.store.marker().as_deref(), Some("xyz"));

        assert_eq!(poller.poll_once().await, CycleOutcome::SeenClip("xyz".to_string()));
        assert_eq!(poller.notifier.sent.lock().len(), 1);
    }

    #[tokio::test]
    async fn no_clip_leaves_marker_untouched() {
        let poller = poller(
            &[None],
            RecordingNotifier::default(),
            MemoryMarkerStore::with_marker("abc123"),
        );

        assert_eq!(poller.poll_once().await, CycleOutcome::NoClip);
        assert!(poller.notifier.sent.lock().is_empty());
        assert_eq!(*poller.store.writes.lock(), 0);
    }

    #[tokio::test]
    async fn clip_without_id_is_skipped() {
        let poller = Poller::new(
            ScriptedSource {
                results: Mutex::new(VecDeque::from([Some(ClipRecord::default())])),
            },
            RecordingNotifier::default(),
            MemoryMarkerStore::default(),
            Duration::from_secs(60),
        );

        assert_eq!(poller.poll_once().await, CycleOutcome::NoClip);
        assert!(poller.notifier.sent.lock().is_empty());
        assert_eq!(poller.store.marker(), None);
    }

    #[tokio::test]
    async fn each_distinct_clip_is_sent_once_across_cycles() {
        let poller = poller(
            &[
                Some("a"),
                Some("a"),
                None,
                Some("b"),
                Some("b"),
                Some("c"),
                None,
            ],
            RecordingNotifier::default(),
            MemoryMarkerStore::default(),
        );

        for _ in 0..7 {
            poller.poll_once().await;
        }

        assert_eq!(*poller.notifier.sent.lock(), vec!["a", "b", "c"]);
        assert_eq!(poller.store.marker().as_deref(), Some("c"));
    }

    #[tokio::test]
    async fn file_marker_survives_across_pollers() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("lastclip.txt");

        let first = poller(
            &[Some("abc123")],
            RecordingNotifier::default(),
            FileMarkerStore::new(&path),
        );
        first.poll_once().await;
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "abc123");

        let restarted = poller(
            &[Some("abc123")],
            RecordingNotifier::default(),
            FileMarkerStore::new(&path),
        );
        assert_eq!(
            restarted.poll_once().await,
            CycleOutcome::SeenClip("abc123".to_string())
        );
        assert!(restarted.notifier.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_and_clip_announced() {
        use wiremock::matchers::{header, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        use crate::notifier::DiscordWebhook;
        use crate::twitch::test_support::client;

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/helix/clips"))
            .and(header("Authorization", "Bearer old-token"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "access_token": "new-token" })),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/helix/clips"))
            .and(header("Authorization", "Bearer new-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "id": "xyz", "creator_name": "Viewer", "url": "https://clips.twitch.tv/xyz" }]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("lastclip.txt");
        let poller = Poller::new(
            client(
                &format!("{}/helix", server.uri()),
                &format!("{}/oauth2/token", server.uri()),
            ),
            DiscordWebhook::new(
                format!("{}/hook", server.uri()),
                "{creator_name} {url}".to_string(),
                reqwest::Client::new(),
            ),
            FileMarkerStore::new(&path),
            Duration::from_secs(60),
        );

        assert_eq!(poller.poll_once().await, CycleOutcome::NewClip("xyz".to_string()));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "xyz");
    }
}
