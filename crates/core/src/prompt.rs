//! Prompt assembly for the child-protection work assistant.
//!
//! All persona and instruction text lives here as named constants so
//! the wording is reviewable in one place. [`assemble`] is a pure
//! function of the user question and the retrieved context; it never
//! inspects configuration or talks to any backend.

/// Role the assistant plays, prepended to every system instruction.
pub const ASSISTANT_PERSONA: &str =
    "너는 아동보호전문기관의 업무 비서다. 실무자의 질문에 정확하고 간결하게 답변하라.";

/// Instruction used when manual excerpts were retrieved for the question.
pub const CONTEXT_INSTRUCTION: &str =
    "아래 [매뉴얼] 발췌 내용을 최우선 근거로 답변하고, 매뉴얼에서 가져온 내용은 매뉴얼에 근거했음을 밝혀라.";

/// Instruction used when no relevant manual excerpt was found.
///
/// The model must then say explicitly that its answer rests on general
/// knowledge rather than the manual, so workers never mistake a guess
/// for an institutional rule.
pub const NO_CONTEXT_INSTRUCTION: &str =
    "참고할 매뉴얼 자료를 찾지 못했다. 일반 지식으로 답변하되, 매뉴얼이 아닌 일반 지식에 근거한 답변임을 반드시 명시하라.";

/// Header line introducing the manual excerpt block.
pub const CONTEXT_HEADER: &str = "[매뉴얼]";

/// Fixed greeting shown when a chat session opens. Not model-generated.
pub const GREETING: &str =
    "반갑습니다. 20년 경력의 베테랑 사회복지 슈퍼바이저입니다. 무엇을 도와드릴까요?";

/// An assembled prompt, ready to hand to a [`Generator`].
///
/// [`Generator`]: crate::generator::Generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPayload {
    /// Persona, grounding instruction and any manual excerpts.
    pub system_instruction: String,
    /// The worker's question, verbatim.
    pub user_message: String,
}

/// Assemble the prompt for one question.
///
/// With context, the system instruction carries the persona, the
/// grounding instruction and the excerpt block. Without context it
/// carries the persona and the explicit no-material instruction; the
/// question is never silently answered as if the manual backed it.
pub fn assemble(user_question: &str, context: Option<&str>) -> PromptPayload {
    let system_instruction = match context {
        Some(context) => format!(
            "{ASSISTANT_PERSONA}\n{CONTEXT_INSTRUCTION}\n\n{CONTEXT_HEADER}\n{context}"
        ),
        None => format!("{ASSISTANT_PERSONA}\n{NO_CONTEXT_INSTRUCTION}"),
    };

    PromptPayload {
        system_instruction,
        user_message: user_question.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_context_includes_excerpts_and_header() {
        let payload = assemble("신고 절차는?", Some("응급 상황 시 즉시 119 신고."));
        assert!(payload.system_instruction.contains(ASSISTANT_PERSONA));
        assert!(payload.system_instruction.contains(CONTEXT_HEADER));
        assert!(payload.system_instruction.contains("응급 상황 시 즉시 119 신고."));
        assert_eq!(payload.user_message, "신고 절차는?");
    }

    #[test]
    fn without_context_states_no_material_was_found() {
        let payload = assemble("신고 절차는?", None);
        assert!(payload.system_instruction.contains(NO_CONTEXT_INSTRUCTION));
        assert!(!payload.system_instruction.contains(CONTEXT_HEADER));
    }

    #[test]
    fn question_is_carried_verbatim() {
        let question = "  공백 포함 질문  ";
        let payload = assemble(question, Some("근거"));
        assert_eq!(payload.user_message, question);
    }

    #[test]
    fn same_inputs_assemble_identically() {
        let a = assemble("질문", Some("근거"));
        let b = assemble("질문", Some("근거"));
        assert_eq!(a, b);
    }
}
