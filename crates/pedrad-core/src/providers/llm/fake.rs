use super::ModelClient;
use crate::model::LlmResponse;
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum FakeReply {
    Text(String),
    Fail(String),
    /// Sleeps before answering; used to exercise the runner timeout.
    Delayed(Duration, String),
}

/// Offline client replaying scripted replies in call order. Once the script
/// is exhausted the last reply repeats.
pub struct FakeClient {
    model: String,
    script: Vec<FakeReply>,
    calls: Mutex<usize>,
}

pub const CANNED_IMPRESSION: &str = "1. CLINICAL ASSESSMENT\n\
Small joint effusion without bony abnormality.\n\n\
2. DIFFERENTIAL DIAGNOSIS\n\
- Septic arthritis\n\
- Juvenile idiopathic arthritis (JIA)\n\
- Traumatic effusion\n\n\
3. CLINICAL CORRELATION\n\
Correlate with inflammatory markers and fever history.\n\n\
4. RECOMMENDATIONS\n\
- ESR, CRP, CBC\n\
- Ultrasound for effusion/abscess localization\n\
- Joint aspiration if effusion develops\n";

impl FakeClient {
    pub fn new(model: &str, script: Vec<FakeReply>) -> Self {
        Self {
            model: model.to_string(),
            script,
            calls: Mutex::new(0),
        }
    }

    /// Always answers with a structured pediatric impression.
    pub fn canned(model: &str) -> Self {
        Self::new(model, vec![FakeReply::Text(CANNED_IMPRESSION.to_string())])
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().map(|c| *c).unwrap_or(0)
    }

    fn next_reply(&self) -> Option<FakeReply> {
        let mut calls = self.calls.lock().ok()?;
        let idx = (*calls).min(self.script.len().checked_sub(1)?);
        *calls += 1;
        self.script.get(idx).cloned()
    }
}

#[async_trait]
impl ModelClient for FakeClient {
    async fn complete(&self, _prompt: &str) -> anyhow::Result<LlmResponse> {
        let text = match self.next_reply() {
            Some(FakeReply::Text(t)) => t,
            Some(FakeReply::Fail(msg)) => anyhow::bail!("{}", msg),
            Some(FakeReply::Delayed(d, t)) => {
                tokio::time::sleep(d).await;
                t
            }
            None => anyhow::bail!("fake client has no scripted replies"),
        };
        Ok(LlmResponse {
            text,
            provider: "fake".into(),
            model: self.model.clone(),
            meta: serde_json::json!({}),
        })
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_script_then_repeats_last() {
        let c = FakeClient::new(
            "m",
            vec![
                FakeReply::Text("a".into()),
                FakeReply::Fail("boom".into()),
                FakeReply::Text("c".into()),
            ],
        );
        assert_eq!(c.complete("p").await.unwrap().text, "a");
        assert!(c.complete("p").await.is_err());
        assert_eq!(c.complete("p").await.unwrap().text, "c");
        assert_eq!(c.complete("p").await.unwrap().text, "c");
        assert_eq!(c.calls(), 4);
    }

    #[tokio::test]
    async fn empty_script_fails() {
        let c = FakeClient::new("m", vec![]);
        assert!(c.complete("p").await.is_err());
    }
}
