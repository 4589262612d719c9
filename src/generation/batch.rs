use futures::future::try_join_all;
use tracing::{info, warn};

use crate::generation::client::{GenerationError, GenerationSettings, ImageGenerator, ImagePayload};

/// Issues one request per prompt concurrently and gathers the payloads in
/// prompt order. The first failure fails the whole batch; nothing partial is
/// returned and nothing is retried.
pub async fn generate_batch(
    generator: &dyn ImageGenerator,
    prompts: &[String],
    settings: GenerationSettings,
) -> Result<Vec<ImagePayload>, GenerationError> {
    info!(
        "Dispatching batch of {} prompt(s) (temperature={}, seed={:?}; not forwarded to provider)",
        prompts.len(),
        settings.temperature,
        settings.seed
    );

    let requests = prompts
        .iter()
        .map(|prompt| generator.generate_image(prompt, settings));

    match try_join_all(requests).await {
        Ok(payloads) => Ok(payloads),
        Err(err) => {
            warn!("Batch of {} prompt(s) failed: {}", prompts.len(), err);
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    /// Answers each prompt with its own bytes; later prompts finish first.
    struct ReversedLatencyGenerator {
        calls: AtomicUsize,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl ImageGenerator for ReversedLatencyGenerator {
        async fn generate_image(
            &self,
            prompt: &str,
            _settings: GenerationSettings,
        ) -> Result<ImagePayload, GenerationError> {
            let index = self.calls.fetch_add(1, Ordering::SeqCst) as u64;
            tokio::time::sleep(Duration::from_millis(40u64.saturating_sub(index * 10))).await;
            if self.fail_on == Some(prompt) {
                return Err(GenerationError::Status {
                    status: 503,
                    detail: "model busy".to_string(),
                });
            }
            Ok(ImagePayload {
                mime_type: "image/jpeg".to_string(),
                bytes: prompt.as_bytes().to_vec(),
            })
        }
    }

    fn settings() -> GenerationSettings {
        GenerationSettings {
            temperature: 0.5,
            seed: None,
        }
    }

    fn prompts() -> Vec<String> {
        ["a cat, Style: Cyberpunk", "a cat, Style: Ukiyo-e", "a cat, Style: Biopunk"]
            .iter()
            .map(|p| p.to_string())
            .collect()
    }

    #[tokio::test]
    async fn keeps_prompt_order_when_completions_are_reversed() {
        let generator = ReversedLatencyGenerator {
            calls: AtomicUsize::new(0),
            fail_on: None,
        };
        let prompts = prompts();

        let payloads = generate_batch(&generator, &prompts, settings()).await.unwrap();

        assert_eq!(payloads.len(), prompts.len());
        for (payload, prompt) in payloads.iter().zip(&prompts) {
            assert_eq!(payload.bytes, prompt.as_bytes());
        }
    }

    #[tokio::test]
    async fn one_failure_fails_the_batch() {
        let generator = ReversedLatencyGenerator {
            calls: AtomicUsize::new(0),
            fail_on: Some("a cat, Style: Ukiyo-e"),
        };

        let err = generate_batch(&generator, &prompts(), settings())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn empty_batch_resolves_empty() {
        let generator = ReversedLatencyGenerator {
            calls: AtomicUsize::new(0),
            fail_on: None,
        };
        let payloads = generate_batch(&generator, &[], settings()).await.unwrap();
        assert!(payloads.is_empty());
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }
}
