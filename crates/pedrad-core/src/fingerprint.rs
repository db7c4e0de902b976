use sha2::{Digest, Sha256};

pub fn sha256_hex(s: &str) -> String {
    let mut h = Sha256::new();
    h.update(s.as_bytes());
    hex::encode(h.finalize())
}

/// Identity of a batch run: everything that changes what the model is asked.
pub struct Context<'a> {
    pub model: &'a str,
    pub prompt_version: &'a str,
    pub prompt_body: &'a str,
    pub temperature: f32,
}

/// Stable hash over the run identity plus the tool version, so batches made
/// with different prompts or settings are never confused.
pub fn compute(ctx: Context<'_>) -> String {
    let parts = [
        format!("model={}", ctx.model),
        format!("prompt_version={}", ctx.prompt_version),
        format!("prompt={}", ctx.prompt_body),
        format!("temperature={:.3}", ctx.temperature),
        format!("pedrad_version={}", env!("CARGO_PKG_VERSION")),
    ];
    sha256_hex(&parts.join("\n"))
}
