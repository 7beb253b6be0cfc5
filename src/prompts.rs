//! Prompt templates for query generation and result summarization.
//!
//! Response extraction depends on exact marker text, so the markers live
//! here and nowhere else.

pub struct PromptTemplate {
    preamble: &'static str,
    input_marker: &'static str,
    context_marker: &'static str,
    response_marker: &'static str,
}

/// Instruction-formatted prompt for SQL generation from a question and a
/// schema.
pub const QUERY_PROMPT: PromptTemplate = PromptTemplate {
    preamble: "You are a powerful text-to-SQL model. Your job is to answer questions about a database. You are given a question and context regarding one or more tables.\nYou must output the SQL query that answers the question.",
    input_marker: "### Input:",
    context_marker: "### Context:",
    response_marker: "### Response:",
};

/// Instruction-formatted prompt for describing an execution result in
/// natural language.
pub const SUMMARY_PROMPT: PromptTemplate = PromptTemplate {
    preamble: "Given the SQL query result and the user's question, generate a natural language description.",
    input_marker: "### User Question:",
    context_marker: "### SQL Query Result:",
    response_marker: "### Natural Language Description:",
};

impl PromptTemplate {
    /// Render the full prompt text for an input/context pair. Pure and
    /// deterministic.
    pub fn render(&self, input: &str, context: &str) -> String {
        format!(
            "{}\n{}\n{}\n{}\n{}\n{}\n",
            self.preamble, self.input_marker, input, self.context_marker, context,
            self.response_marker
        )
    }

    /// Extract the generated response from the full decoded text.
    ///
    /// Backends serving in echo mode return the prompt followed by the
    /// completion, so the response is everything after the LAST occurrence
    /// of the response marker. A backend that does not echo the prompt
    /// returns no marker at all; then the whole text, trimmed, is the
    /// response.
    pub fn extract_response<'a>(&self, raw: &'a str) -> &'a str {
        match raw.rfind(self.response_marker) {
            Some(idx) => raw[idx + self.response_marker.len()..].trim(),
            None => raw.trim(),
        }
    }

    pub fn response_marker(&self) -> &'static str {
        self.response_marker
    }
}
