//! Result-to-text reduction: fixed-width rendering and the summary round
//! trip through the inference gateway.

use itertools::Itertools;
use serde_json::Value;

use crate::error::Result;
use crate::executor::QueryResult;
use crate::llm::InferenceGateway;
use crate::prompts::SUMMARY_PROMPT;

/// Render a result as a fixed-width text table: headers, no index column.
/// Cells are left-aligned and padded to the widest member of their column,
/// with two spaces between columns.
pub fn render_text_table(result: &QueryResult) -> String {
    let cells: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| row.iter().map(render_cell).collect())
        .collect();

    let widths: Vec<usize> = result
        .columns
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            cells
                .iter()
                .map(|row| row[idx].len())
                .chain(std::iter::once(name.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut lines = Vec::with_capacity(cells.len() + 1);
    lines.push(format_line(&result.columns, &widths));
    for row in &cells {
        lines.push(format_line(row, &widths));
    }
    lines.join("\n")
}

fn format_line(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{:<width$}", cell))
        .join("  ")
        .trim_end()
        .to_string()
}

fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Build the summary prompt from the execution result and the question,
/// delegate to the gateway with the summary token budget, and extract the
/// natural-language answer. Only invoked when execution succeeded.
pub async fn summarize(
    gateway: &dyn InferenceGateway,
    result: &QueryResult,
    question: &str,
    max_new_tokens: u32,
) -> Result<String> {
    let table = render_text_table(result);
    let prompt = SUMMARY_PROMPT.render(question, &table);
    let raw = gateway.generate(&prompt, max_new_tokens).await?;
    Ok(SUMMARY_PROMPT.extract_response(&raw).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedGateway;

    fn sample_result() -> QueryResult {
        QueryResult {
            columns: vec!["name".to_string(), "n".to_string()],
            rows: vec![
                vec![serde_json::json!("alpha"), serde_json::json!(1)],
                vec![serde_json::json!("b"), serde_json::json!(20)],
            ],
        }
    }

    #[test]
    fn renders_fixed_width_columns() {
        assert_eq!(
            render_text_table(&sample_result()),
            "name   n\nalpha  1\nb      20"
        );
    }

    #[test]
    fn renders_nulls_and_header_only_tables() {
        let result = QueryResult {
            columns: vec!["x".to_string()],
            rows: vec![vec![Value::Null]],
        };
        assert_eq!(render_text_table(&result), "x\nNULL");

        let empty = QueryResult {
            columns: vec!["a".to_string(), "b".to_string()],
            rows: vec![],
        };
        assert_eq!(render_text_table(&empty), "a  b");
    }

    #[tokio::test]
    async fn summarizes_through_the_gateway() {
        let gateway = ScriptedGateway::new([
            "### Natural Language Description:\n  Alpha leads with one unit.  ",
        ]);
        let text = summarize(&gateway, &sample_result(), "who leads?", 150)
            .await
            .unwrap();
        assert_eq!(text, "Alpha leads with one unit.");

        let prompts = gateway.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("who leads?"));
        assert!(prompts[0].contains("alpha  1"));
    }
}
