//! Mock prober for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::location::MediaLocation;
use crate::probe::{MediaInfo, MediaProber, ProbeError};

/// In-memory [`MediaProber`].
///
/// Answers with configured [`MediaInfo`] values keyed by location and
/// reports unknown locations as missing inputs.
#[derive(Debug, Clone, Default)]
pub struct MockProber {
    results: Arc<RwLock<HashMap<MediaLocation, MediaInfo>>>,
    /// If set, the next probe fails with this error.
    next_error: Arc<RwLock<Option<ProbeError>>>,
    probes: Arc<RwLock<Vec<MediaLocation>>>,
}

impl MockProber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `info` under its own location.
    pub async fn set_result(&self, info: MediaInfo) {
        self.results
            .write()
            .await
            .insert(info.location().clone(), info);
    }

    pub async fn set_next_error(&self, error: ProbeError) {
        *self.next_error.write().await = Some(error);
    }

    /// Every location probed so far, in order.
    pub async fn recorded_probes(&self) -> Vec<MediaLocation> {
        self.probes.read().await.clone()
    }

    pub async fn probe_count(&self) -> usize {
        self.probes.read().await.len()
    }
}

#[async_trait]
impl MediaProber for MockProber {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe(&self, location: &MediaLocation) -> Result<MediaInfo, ProbeError> {
        self.probes.write().await.push(location.clone());

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        self.results
            .read()
            .await
            .get(location)
            .cloned()
            .ok_or_else(|| ProbeError::InputNotFound {
                location: location.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_configured_result() {
        let prober = MockProber::new();
        prober.set_result(fixtures::media_info("/media/movie.mkv")).await;

        let location = MediaLocation::new("/media/movie.mkv").unwrap();
        let info = prober.probe(&location).await.unwrap();
        assert_eq!(info.audio_streams().len(), 2);
        assert_eq!(prober.recorded_probes().await, vec![location]);
    }

    #[tokio::test]
    async fn test_unknown_location_is_missing() {
        let prober = MockProber::new();
        let location = MediaLocation::new("/media/unknown.mkv").unwrap();

        let err = assert_err!(prober.probe(&location).await);
        assert!(matches!(err, ProbeError::InputNotFound { .. }));
    }

    #[tokio::test]
    async fn test_next_error_is_used_once() {
        let prober = MockProber::new();
        prober.set_result(fixtures::media_info("/media/movie.mkv")).await;
        prober.set_next_error(ProbeError::Cancelled).await;

        let location = MediaLocation::new("/media/movie.mkv").unwrap();
        assert!(matches!(
            prober.probe(&location).await,
            Err(ProbeError::Cancelled)
        ));
        assert_ok!(prober.probe(&location).await);
        assert_eq!(prober.probe_count().await, 2);
    }
}
