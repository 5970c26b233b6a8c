//! Verbalizer tone selection (§4.5.4, §6 env table).

/// `Plain` never calls `event-llm` — the deterministic body is returned
/// byte-identical, which is what the idempotence law in §8 requires.
/// `Empathetic` calls the LLM verbalizer under verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbalizerTone {
    Plain,
    Empathetic,
}

impl VerbalizerTone {
    /// Reads `VERBALIZER_TONE` (`plain`|`empathetic`) or the legacy
    /// `PLAIN_VERBALIZER` boolean flag. Defaults to `Empathetic` in
    /// production, but `#[cfg(test)]` callers should construct `Plain`
    /// directly rather than relying on env for determinism.
    pub fn from_env() -> Self {
        if let Ok(v) = std::env::var("PLAIN_VERBALIZER") {
            if v == "1" || v.eq_ignore_ascii_case("true") {
                return Self::Plain;
            }
        }
        match std::env::var("VERBALIZER_TONE").as_deref() {
            Ok("plain") => Self::Plain,
            _ => Self::Empathetic,
        }
    }
}
