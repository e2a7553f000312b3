//! Instance identifier generation.

use rand::RngCore;

/// Number of random bytes in a generated instance id.
pub const INSTANCE_ID_BYTES: usize = 4;

/// Produces identifiers for newly spawned instances.
///
/// Uniqueness is not checked against the pool: a source that repeats an id
/// causes the later spawn to replace the earlier instance.
pub trait InstanceIdSource: Send + Sync {
    /// Returns the next identifier.
    fn next_id(&self) -> String;
}

/// Default source: [`INSTANCE_ID_BYTES`] random bytes, hex encoded.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomInstanceIds;

impl InstanceIdSource for RandomInstanceIds {
    fn next_id(&self) -> String {
        let mut bytes = [0_u8; INSTANCE_ID_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}

impl<F> InstanceIdSource for F
where
    F: Fn() -> String + Send + Sync,
{
    fn next_id(&self) -> String {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_ids_are_eight_hex_characters() {
        let id = RandomInstanceIds.next_id();
        assert_eq!(id.len(), INSTANCE_ID_BYTES * 2);
        assert!(id.chars().all(|ch| ch.is_ascii_hexdigit()), "id: {id}");
    }

    #[test]
    fn closures_act_as_id_sources() {
        let source = || String::from("fixed");
        assert_eq!(source.next_id(), "fixed");
    }
}
