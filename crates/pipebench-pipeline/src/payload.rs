use bytes::Bytes;

/// The fixed, read-only payload sent in every outbound frame.
///
/// Cloning or duplicating a `Payload` only bumps a reference count; the
/// underlying bytes are allocated once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    bytes: Bytes,
}

impl Payload {
    /// A payload of `size` zero bytes.
    pub fn zeroed(size: usize) -> Self {
        Self {
            bytes: Bytes::from(vec![0u8; size]),
        }
    }

    /// A payload backed by static data.
    pub fn from_static(bytes: &'static [u8]) -> Self {
        Self {
            bytes: Bytes::from_static(bytes),
        }
    }

    /// A read-only view of the payload for one outbound frame.
    pub fn duplicate(&self) -> Bytes {
        self.bytes.clone()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeroed_payload_has_requested_size() {
        let payload = Payload::zeroed(32);
        assert_eq!(payload.len(), 32);
        assert!(payload.duplicate().iter().all(|b| *b == 0));
    }

    #[test]
    fn duplicate_shares_storage() {
        let payload = Payload::zeroed(32);
        let a = payload.duplicate();
        let b = payload.duplicate();
        assert_eq!(a.as_ptr(), b.as_ptr());
    }

    #[test]
    fn empty_payload() {
        let payload = Payload::from_static(b"");
        assert!(payload.is_empty());
    }
}
