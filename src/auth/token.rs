use uuid::Uuid;

/// Opaque identifier for sessions and reset tokens: a random v4 UUID.
pub fn generate_uuid() -> String {
    Uuid::new_v4().to_string()
}
