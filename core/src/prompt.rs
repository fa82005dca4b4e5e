use serde::{Deserialize, Serialize};

pub const DEFAULT_CONTEXT_LABEL: &str = "[레제 관련 요약 컨텍스트]";
pub const DEFAULT_QUERY_LABEL: &str = "[사용자 질문]";
pub const DEFAULT_INSTRUCTION: &str = "위 정보를 꼭 그대로 복사하지 말고, 핵심만 참고해서 레제답게 자연스럽게 한국어 반말로 1~2문장으로 먼저 답하고, 필요하면 이어서 덧붙여. 감정 표현은 *동작* 형태만 사용.";

/// Layout of the prompt handed to the downstream generator. The default is the
/// format the existing in-character generator is tuned for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptTemplate {
    pub context_label: String,
    pub query_label: String,
    pub instruction: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            context_label: DEFAULT_CONTEXT_LABEL.to_string(),
            query_label: DEFAULT_QUERY_LABEL.to_string(),
            instruction: DEFAULT_INSTRUCTION.to_string(),
        }
    }
}

impl PromptTemplate {
    /// Numbers the summaries from 1 and places them ahead of the query.
    pub fn render(&self, summaries: &[String], query: &str) -> String {
        let compact = summaries
            .iter()
            .enumerate()
            .map(|(i, s)| format!("({}) {}", i + 1, s))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "{}\n{}\n\n{}\n{}\n\n{}",
            self.context_label, compact, self.query_label, query, self.instruction
        )
    }
}
