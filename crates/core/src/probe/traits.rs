//! Trait definitions for the probe module.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::error::ProbeError;
use super::media_info::MediaInfo;
use crate::location::MediaLocation;

/// Something that can describe a media file.
#[async_trait]
pub trait MediaProber: Send + Sync {
    /// Returns the name of this prober implementation.
    fn name(&self) -> &str;

    /// Probes a media file. Fails with [`ProbeError::InputNotFound`] before
    /// doing any work when a local input does not exist.
    async fn probe(&self, location: &MediaLocation) -> Result<MediaInfo, ProbeError>;

    /// Probes until `cancel` fires, then fails with [`ProbeError::Cancelled`].
    async fn probe_with_cancellation(
        &self,
        location: &MediaLocation,
        cancel: &CancellationToken,
    ) -> Result<MediaInfo, ProbeError> {
        tokio::select! {
            result = self.probe(location) => result,
            _ = cancel.cancelled() => Err(ProbeError::Cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;
    use std::time::Duration;

    /// Answers only after a long delay.
    struct SlowProber;

    #[async_trait]
    impl MediaProber for SlowProber {
        fn name(&self) -> &str {
            "slow"
        }

        async fn probe(&self, location: &MediaLocation) -> Result<MediaInfo, ProbeError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(fixtures::media_info(location.as_str()))
        }
    }

    #[tokio::test]
    async fn test_default_cancellation_wins_over_slow_probe() {
        let prober: &dyn MediaProber = &SlowProber;
        let location = MediaLocation::new("/media/movie.mkv").unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = prober
            .probe_with_cancellation(&location, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::Cancelled));
    }
}
