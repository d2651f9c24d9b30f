// src/services/llm.rs

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// A generated multiple-choice question as returned by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mcq {
    pub question: String,
    pub answers: Vec<String>,
    pub correct_answer: String,
}

/// Top-level shape the model is asked to produce.
#[derive(Debug, Deserialize)]
struct McqList {
    questions: Vec<Mcq>,
}

/// Failures talking to the model provider. A well-formed reply that fails
/// validation is not an error: it yields an empty question list.
#[derive(Debug)]
pub enum LlmError {
    Request(reqwest::Error),
    Status { status: u16, body: String },
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmError::Request(e) => write!(f, "request failed: {}", e),
            LlmError::Status { status, .. } => write!(f, "provider returned HTTP {}", status),
        }
    }
}

impl std::error::Error for LlmError {}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Request(err)
    }
}

/// Generates multiple-choice questions from a text.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate_mcq(&self, text: &str, nb_questions: u32) -> Result<Vec<Mcq>, LlmError>;
}

const PROMPT_TEMPLATE: &str = r#"STRICT INSTRUCTIONS:

You are an expert educational quiz generator. Your task is to write multiple-choice questions (MCQ) based ONLY on the course text given below.

Absolute rules:
- Do not use any outside knowledge.
- Every question and its correct answer must be directly justified by the given text.
- Write the questions and answers in the same language as the text.

TASKS:
1. Generate {nb_questions} MCQ questions.
2. The set of questions must cover the whole text evenly: definitions, concepts, names, dates, classifications.
3. Each question must:
   - be short and clear;
   - have exactly 4 plausible answers;
   - have exactly one correct answer, copied verbatim into "correct_answer";
   - avoid ambiguous or obvious wording.
4. Answers must be precise.

TEXT TO ANALYSE:
<<<
{text}
>>>
"#;

/// Fills the fixed prompt template.
pub fn build_prompt(text: &str, nb_questions: u32) -> String {
    PROMPT_TEMPLATE
        .replace("{nb_questions}", &nb_questions.to_string())
        .replace("{text}", text)
}

/// JSON schema passed to the model as `responseSchema`.
fn response_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "questions": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "question": { "type": "STRING" },
                        "answers": { "type": "ARRAY", "items": { "type": "STRING" } },
                        "correct_answer": { "type": "STRING" }
                    },
                    "required": ["question", "answers", "correct_answer"]
                }
            }
        },
        "required": ["questions"]
    })
}

/// Normalises an answer for matching: surrounding whitespace and one
/// trailing period do not count.
fn normalize_answer(s: &str) -> &str {
    let s = s.trim();
    s.strip_suffix('.').unwrap_or(s).trim_end()
}

/// Parses and validates the model's text output.
///
/// Malformed JSON yields an empty list. Individual questions that are blank,
/// have fewer than two answers, or whose correct answer is not one of the
/// answers are dropped. At most `nb_questions` are returned.
pub fn parse_mcq_payload(raw: &str, nb_questions: u32) -> Vec<Mcq> {
    let body = strip_code_fence(raw);

    let list: McqList = match serde_json::from_str(body) {
        Ok(list) => list,
        Err(e) => {
            let preview: String = raw.chars().take(200).collect();
            tracing::warn!("MCQ JSON parsing error: {} (payload starts with {:?})", e, preview);
            return Vec::new();
        }
    };

    list.questions
        .into_iter()
        .filter_map(|mut mcq| {
            mcq.question = mcq.question.trim().to_string();
            mcq.answers = mcq
                .answers
                .into_iter()
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .collect();

            if mcq.question.is_empty() || mcq.answers.len() < 2 {
                tracing::debug!("Discarding incomplete question: {:?}", mcq.question);
                return None;
            }

            // Point correct_answer at the exact choice text so grading is a plain comparison.
            let wanted = normalize_answer(&mcq.correct_answer);
            let matched = mcq
                .answers
                .iter()
                .find(|a| normalize_answer(a) == wanted)
                .cloned();

            match matched {
                Some(answer) => {
                    mcq.correct_answer = answer;
                    Some(mcq)
                }
                None => {
                    tracing::debug!("Discarding question with unknown answer: {:?}", mcq.question);
                    None
                }
            }
        })
        .take(nb_questions as usize)
        .collect()
}

/// Models sometimes wrap JSON in a ```json fence despite the mime type.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, all parts concatenated.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect())
            .unwrap_or_default()
    }
}

/// Google Gemini `generateContent` client.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, base_url: String) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;

        Ok(Self {
            client,
            api_key,
            model,
            base_url,
        })
    }
}

#[async_trait]
impl QuestionGenerator for GeminiClient {
    async fn generate_mcq(&self, text: &str, nb_questions: u32) -> Result<Vec<Mcq>, LlmError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let payload = json!({
            "contents": [
                { "role": "user", "parts": [ { "text": build_prompt(text, nb_questions) } ] }
            ],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": response_schema()
            }
        });

        tracing::info!(model = %self.model, nb_questions, "requesting MCQ generation");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Gemini returned {}: {}", status, body);
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let questions = parse_mcq_payload(&parsed.text(), nb_questions);
        tracing::info!("Model returned {} valid questions", questions.len());

        Ok(questions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_prompt_fills_placeholders() {
        let prompt = build_prompt("Bees pollinate flowers.", 3);
        assert!(prompt.contains("Generate 3 MCQ questions"));
        assert!(prompt.contains("Bees pollinate flowers."));
        assert!(!prompt.contains("{text}"));
    }

    #[test]
    fn test_parse_valid_payload() {
        let raw = r#"{"questions": [
            {"question": "What do bees carry?", "answers": ["Pollen", "Sand", "Water", "Salt"], "correct_answer": "Pollen"},
            {"question": "Why do bees matter?", "answers": ["Pollination.", "Noise", "Color", "Heat"], "correct_answer": "Pollination"}
        ]}"#;

        let mcqs = parse_mcq_payload(raw, 10);
        assert_eq!(mcqs.len(), 2);
        assert_eq!(mcqs[0].correct_answer, "Pollen");
        // Trailing period tolerated, stored as the exact choice text.
        assert_eq!(mcqs[1].correct_answer, "Pollination.");
    }

    #[test]
    fn test_parse_invalid_json_is_empty() {
        assert!(parse_mcq_payload("not json at all", 5).is_empty());
        assert!(parse_mcq_payload(r#"{"items": []}"#, 5).is_empty());
    }

    #[test]
    fn test_parse_drops_bad_questions() {
        let raw = r#"{"questions": [
            {"question": "", "answers": ["A", "B"], "correct_answer": "A"},
            {"question": "One choice?", "answers": ["A"], "correct_answer": "A"},
            {"question": "Wrong key?", "answers": ["A", "B", "C", "D"], "correct_answer": "E"},
            {"question": "Good?", "answers": ["A", "B", "C", "D"], "correct_answer": "B"}
        ]}"#;

        let mcqs = parse_mcq_payload(raw, 10);
        assert_eq!(mcqs.len(), 1);
        assert_eq!(mcqs[0].question, "Good?");
    }

    #[test]
    fn test_parse_truncates_and_strips_fence() {
        let raw = "```json\n{\"questions\": [\
            {\"question\": \"Q1\", \"answers\": [\"A\", \"B\"], \"correct_answer\": \"A\"},\
            {\"question\": \"Q2\", \"answers\": [\"A\", \"B\"], \"correct_answer\": \"B\"}\
        ]}\n```";

        let mcqs = parse_mcq_payload(raw, 1);
        assert_eq!(mcqs.len(), 1);
        assert_eq!(mcqs[0].question, "Q1");
    }

    #[test]
    fn test_response_text_concatenates_parts() {
        let raw = r#"{"candidates": [{"content": {"parts": [{"text": "{\"questions\""}, {"text": ": []}"}]}}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.text(), r#"{"questions": []}"#);

        let empty: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.text(), "");
    }
}
