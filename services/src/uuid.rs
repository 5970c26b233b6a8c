use uuid::Uuid;

/// Deterministic UUIDv5 derived from an arbitrary string id, so the same
/// logical key (e.g. a thread id + step + action) always yields the same
/// task id across retries instead of a fresh random one each time.
pub fn stable_uuid(id: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, id.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_input_yields_same_uuid() {
        assert_eq!(stable_uuid("thread-1:offer_message"), stable_uuid("thread-1:offer_message"));
    }

    #[test]
    fn different_input_yields_different_uuid() {
        assert_ne!(stable_uuid("thread-1"), stable_uuid("thread-2"));
    }
}
