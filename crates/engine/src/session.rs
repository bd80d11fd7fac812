//! Chat sessions and answer streaming.
//!
//! A session accepts one question at a time. While an answer is still
//! streaming, further questions are rejected with [`Error::Busy`] so
//! two generations can never interleave into the same display target.
//! Dropping the answer stream releases the session and cancels the
//! generation upstream.
//!
//! Whatever chunk shape the generator emits, the session yields the
//! full answer so far on every step; display logic only ever sees
//! monotonically growing text.

use crate::engine::AssistantEngine;
use socialcare_core::error::{Error, GenerationError, Result};
use socialcare_core::generator::{CumulativeText, GenerationChunk};
use socialcare_core::prompt::GREETING;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// One interactive conversation with the assistant.
pub struct ChatSession {
    engine: Arc<AssistantEngine>,
    in_flight: Arc<AtomicBool>,
}

/// Releases the session's in-flight slot when dropped.
struct FlightPermit {
    flag: Arc<AtomicBool>,
}

impl Drop for FlightPermit {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl ChatSession {
    pub(crate) fn new(engine: Arc<AssistantEngine>) -> Self {
        Self {
            engine,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Fixed opening line, shown before any model interaction.
    pub fn greeting(&self) -> &'static str {
        GREETING
    }

    /// Ask one question and stream the answer.
    ///
    /// Returns [`Error::Busy`] while a previous answer is still in
    /// flight. Generation failures during preparation surface here;
    /// failures mid-stream surface through the returned stream.
    pub async fn send(&self, question: &str) -> Result<AnswerStream> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            debug!("Question rejected; an answer is already in flight");
            return Err(Error::Busy);
        }
        // From here the permit owns the flag; any early return releases it
        let permit = FlightPermit {
            flag: Arc::clone(&self.in_flight),
        };

        let source = self.engine.answer_stream(question).await?;
        Ok(AnswerStream::spawn(source, permit))
    }
}

/// A streaming answer, yielding the full text so far on every step.
pub struct AnswerStream {
    rx: mpsc::Receiver<std::result::Result<String, GenerationError>>,
    permit: Option<FlightPermit>,
}

impl AnswerStream {
    /// Bridge raw generator chunks into normalized cumulative text.
    fn spawn(
        mut source: mpsc::Receiver<std::result::Result<GenerationChunk, GenerationError>>,
        permit: FlightPermit,
    ) -> Self {
        let (tx, rx) = mpsc::channel(64);

        tokio::spawn(async move {
            let mut acc = CumulativeText::new();
            while let Some(item) = source.recv().await {
                match item {
                    Ok(chunk) => {
                        let done = chunk.done;
                        if acc.apply(&chunk) {
                            // Send failing means the caller dropped the
                            // stream; stop consuming so the generator
                            // sees the cancellation too
                            if tx.send(Ok(acc.text().to_string())).await.is_err() {
                                return;
                            }
                        }
                        if done {
                            return;
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(e)).await;
                        return;
                    }
                }
            }
        });

        Self {
            rx,
            permit: Some(permit),
        }
    }

    /// Next update: the full answer text so far, or the terminal error.
    ///
    /// Returns `None` once the answer is complete. The session is
    /// released as soon as the stream ends or errors, without waiting
    /// for the stream to be dropped.
    pub async fn next(&mut self) -> Option<std::result::Result<String, GenerationError>> {
        match self.rx.recv().await {
            Some(Ok(text)) => Some(Ok(text)),
            Some(Err(e)) => {
                self.permit.take();
                Some(Err(e))
            }
            None => {
                self.permit.take();
                None
            }
        }
    }

    /// Drain the stream and return the final answer text.
    pub async fn collect_final(mut self) -> std::result::Result<String, GenerationError> {
        let mut last = String::new();
        while let Some(update) = self.next().await {
            last = update?;
        }
        Ok(last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::AssistantEngine;
    use crate::retriever::ContextRetriever;
    use async_trait::async_trait;
    use socialcare_core::generator::Generator;
    use socialcare_core::prompt::PromptPayload;
    use socialcare_store::{InMemoryBackend, KnowledgeStore};
    use std::sync::Mutex;

    type ChunkResult = std::result::Result<GenerationChunk, GenerationError>;

    /// Generator whose stream is fed by the test through a held sender.
    #[derive(Default)]
    struct ManualGenerator {
        tx_slot: Mutex<Option<mpsc::Sender<ChunkResult>>>,
    }

    impl ManualGenerator {
        fn sender(&self) -> mpsc::Sender<ChunkResult> {
            self.tx_slot.lock().unwrap().clone().unwrap()
        }
    }

    #[async_trait]
    impl Generator for ManualGenerator {
        fn name(&self) -> &str {
            "test_manual"
        }

        async fn complete(&self, _payload: &PromptPayload) -> std::result::Result<String, GenerationError> {
            unreachable!("streaming path only")
        }

        async fn stream(
            &self,
            _payload: &PromptPayload,
        ) -> std::result::Result<mpsc::Receiver<ChunkResult>, GenerationError> {
            let (tx, rx) = mpsc::channel(8);
            *self.tx_slot.lock().unwrap() = Some(tx);
            Ok(rx)
        }
    }

    /// Generator that replays a fixed chunk script.
    struct ScriptedChunks {
        chunks: Vec<ChunkResult>,
    }

    #[async_trait]
    impl Generator for ScriptedChunks {
        fn name(&self) -> &str {
            "test_script"
        }

        async fn complete(&self, _payload: &PromptPayload) -> std::result::Result<String, GenerationError> {
            unreachable!("streaming path only")
        }

        async fn stream(
            &self,
            _payload: &PromptPayload,
        ) -> std::result::Result<mpsc::Receiver<ChunkResult>, GenerationError> {
            let (tx, rx) = mpsc::channel(8);
            let chunks = self.chunks.clone();
            tokio::spawn(async move {
                for chunk in chunks {
                    if tx.send(chunk).await.is_err() {
                        return;
                    }
                }
            });
            Ok(rx)
        }
    }

    /// Non-streaming generator exercising the default stream adapter.
    struct CompleteOnly;

    #[async_trait]
    impl Generator for CompleteOnly {
        fn name(&self) -> &str {
            "test_complete"
        }

        async fn complete(&self, _payload: &PromptPayload) -> std::result::Result<String, GenerationError> {
            Ok("완성된 답변".to_string())
        }
    }

    async fn session_with(generator: Arc<dyn Generator>) -> ChatSession {
        let store = KnowledgeStore::new(Arc::new(InMemoryBackend::new()));
        let engine = Arc::new(AssistantEngine::new(
            store,
            generator,
            ContextRetriever::new(5, 1500),
        ));
        engine.init().await;
        engine.session()
    }

    #[tokio::test]
    async fn second_question_rejected_while_streaming() {
        let generator = Arc::new(ManualGenerator::default());
        let session = session_with(generator.clone()).await;

        let mut stream = session.send("첫 질문").await.unwrap();
        assert!(matches!(session.send("두 번째 질문").await, Err(Error::Busy)));

        // Finish the first answer; the session frees up
        let tx = generator.sender();
        tx.send(Ok(GenerationChunk::delta("답변"))).await.unwrap();
        tx.send(Ok(GenerationChunk::finished())).await.unwrap();
        drop(tx);

        assert_eq!(stream.next().await.unwrap().unwrap(), "답변");
        assert!(stream.next().await.is_none());

        let second = session.send("두 번째 질문").await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn dropping_the_stream_releases_the_session() {
        let generator = Arc::new(ManualGenerator::default());
        let session = session_with(generator).await;

        let stream = session.send("첫 질문").await.unwrap();
        drop(stream);

        assert!(session.send("두 번째 질문").await.is_ok());
    }

    #[tokio::test]
    async fn delta_chunks_grow_monotonically() {
        let generator = Arc::new(ScriptedChunks {
            chunks: vec![
                Ok(GenerationChunk::delta("안녕")),
                Ok(GenerationChunk::delta("하세요")),
                Ok(GenerationChunk::finished()),
            ],
        });
        let session = session_with(generator).await;

        let mut stream = session.send("인사").await.unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap(), "안녕");
        assert_eq!(stream.next().await.unwrap().unwrap(), "안녕하세요");
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn cumulative_chunks_normalize_to_the_same_shape() {
        let generator = Arc::new(ScriptedChunks {
            chunks: vec![
                Ok(GenerationChunk::cumulative("안녕")),
                Ok(GenerationChunk::cumulative("안녕하세요")),
                Ok(GenerationChunk::finished()),
            ],
        });
        let session = session_with(generator).await;

        let mut stream = session.send("인사").await.unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap(), "안녕");
        assert_eq!(stream.next().await.unwrap().unwrap(), "안녕하세요");
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn collect_final_returns_the_whole_answer() {
        let generator = Arc::new(ScriptedChunks {
            chunks: vec![
                Ok(GenerationChunk::delta("매뉴얼에 따르면 ")),
                Ok(GenerationChunk::delta("즉시 신고해야 합니다.")),
                Ok(GenerationChunk::finished()),
            ],
        });
        let session = session_with(generator).await;

        let stream = session.send("질문").await.unwrap();
        let answer = stream.collect_final().await.unwrap();
        assert_eq!(answer, "매뉴얼에 따르면 즉시 신고해야 합니다.");
    }

    #[tokio::test]
    async fn non_streaming_generator_still_streams_one_answer() {
        let session = session_with(Arc::new(CompleteOnly)).await;
        let stream = session.send("질문").await.unwrap();
        assert_eq!(stream.collect_final().await.unwrap(), "완성된 답변");
    }

    #[tokio::test]
    async fn mid_stream_error_surfaces_with_its_message() {
        let generator = Arc::new(ScriptedChunks {
            chunks: vec![
                Ok(GenerationChunk::delta("부분 ")),
                Err(GenerationError::ApiError {
                    status_code: 500,
                    message: "quota exceeded".into(),
                }),
            ],
        });
        let session = session_with(generator).await;

        let mut stream = session.send("질문").await.unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap(), "부분 ");

        let err = stream.next().await.unwrap().unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn error_releases_the_session_immediately() {
        let generator = Arc::new(ScriptedChunks {
            chunks: vec![Err(GenerationError::Network("connection refused".into()))],
        });
        let session = session_with(generator).await;

        let mut stream = session.send("질문").await.unwrap();
        assert!(stream.next().await.unwrap().is_err());

        // Stream still alive, but the session must accept a new question
        assert!(session.send("다시 질문").await.is_ok());
        drop(stream);
    }

    #[tokio::test]
    async fn greeting_is_fixed() {
        let session = session_with(Arc::new(CompleteOnly)).await;
        assert!(session.greeting().contains("무엇을 도와드릴까요"));
    }
}
