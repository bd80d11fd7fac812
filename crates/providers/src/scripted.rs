//! Scripted answer generator for demos and tests.
//!
//! Returns a fixed reply (or echoes the question) without any network
//! access, streaming it in small delta chunks so consumers exercise the
//! same path a live backend drives.

use async_trait::async_trait;
use socialcare_core::{GenerationChunk, GenerationError, Generator, PromptPayload};
use tokio::sync::mpsc;

const CHUNK_CHARS: usize = 12;

#[derive(Debug, Clone, Default)]
pub struct ScriptedGenerator {
    reply: Option<String>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
        }
    }

    fn reply_for(&self, payload: &PromptPayload) -> String {
        match &self.reply {
            Some(reply) => reply.clone(),
            None => format!("[scripted] {}", payload.user_message),
        }
    }
}

/// Split text into pieces of at most `size` characters, on char
/// boundaries so multi-byte text survives.
fn chunk_text(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(size).map(|c| c.iter().collect()).collect()
}

#[async_trait]
impl Generator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, payload: &PromptPayload) -> Result<String, GenerationError> {
        Ok(self.reply_for(payload))
    }

    async fn stream(
        &self,
        payload: &PromptPayload,
    ) -> Result<mpsc::Receiver<Result<GenerationChunk, GenerationError>>, GenerationError> {
        let reply = self.reply_for(payload);
        let (tx, rx) = mpsc::channel(64);

        tokio::spawn(async move {
            for piece in chunk_text(&reply, CHUNK_CHARS) {
                if tx.send(Ok(GenerationChunk::delta(piece))).await.is_err() {
                    return; // receiver dropped
                }
            }
            let _ = tx.send(Ok(GenerationChunk::finished())).await;
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use socialcare_core::{CumulativeText, prompt};

    #[tokio::test]
    async fn fixed_reply_is_returned_verbatim() {
        let generator = ScriptedGenerator::with_reply("상담 내용을 확인했습니다.");
        let payload = prompt::assemble("아무 질문", None);
        let answer = generator.complete(&payload).await.unwrap();
        assert_eq!(answer, "상담 내용을 확인했습니다.");
    }

    #[tokio::test]
    async fn echoes_the_question_without_a_configured_reply() {
        let generator = ScriptedGenerator::new();
        let payload = prompt::assemble("점심 뭐 먹지?", None);
        let answer = generator.complete(&payload).await.unwrap();
        assert_eq!(answer, "[scripted] 점심 뭐 먹지?");
    }

    #[tokio::test]
    async fn stream_reassembles_to_the_complete_reply() {
        let reply = "아동학대 의심 사례는 즉시 1391로 신고하고, 현장 조사 일정을 잡으세요.";
        let generator = ScriptedGenerator::with_reply(reply);
        let payload = prompt::assemble("신고 절차", None);

        let mut rx = generator.stream(&payload).await.unwrap();
        let mut acc = CumulativeText::new();
        let mut saw_done = false;
        while let Some(chunk) = rx.recv().await {
            let chunk = chunk.unwrap();
            acc.apply(&chunk);
            saw_done = chunk.done;
        }
        assert!(saw_done);
        assert_eq!(acc.text(), reply);
    }

    #[test]
    fn chunking_respects_char_boundaries() {
        let pieces = chunk_text("안녕하세요 반갑습니다", 4);
        assert!(pieces.iter().all(|p| p.chars().count() <= 4));
        assert_eq!(pieces.concat(), "안녕하세요 반갑습니다");
    }
}
