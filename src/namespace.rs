//! Dataset namespaces: HMAC signatures over entity IDs.
//!
//! A namespace partitions entity IDs between datasets by appending a
//! keyed signature: `<plain-id>.<hex-signature>`. IDs signed by one
//! namespace fail verification in any other.

use sha2::{Digest, Sha256};

use crate::proxy::EntityProxy;

const BLOCK_SIZE: usize = 64;

/// HMAC-SHA256 per RFC 2104.
fn hmac_sha256(key: &[u8], message: &[u8]) -> [u8; 32] {
    let mut block = [0u8; BLOCK_SIZE];
    if key.len() > BLOCK_SIZE {
        let digest = Sha256::digest(key);
        block[..digest.len()].copy_from_slice(&digest);
    } else {
        block[..key.len()].copy_from_slice(key);
    }
    let mut inner = Sha256::new();
    for byte in block {
        inner.update([byte ^ 0x36]);
    }
    inner.update(message);
    let inner_hash = inner.finalize();
    let mut outer = Sha256::new();
    for byte in block {
        outer.update([byte ^ 0x5c]);
    }
    outer.update(inner_hash);
    outer.finalize().into()
}

/// Constant-time byte comparison, so signature checks do not leak a
/// matching prefix length.
fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut diff = 0u8;
    for (l, r) in left.iter().zip(right) {
        diff |= l ^ r;
    }
    diff == 0
}

#[derive(Debug, Clone)]
pub struct Namespace {
    key: Vec<u8>,
}

impl Namespace {
    /// An empty name creates a null namespace: signing strips any
    /// existing signature instead of adding one.
    pub fn new(name: &str) -> Namespace {
        Namespace {
            key: name.as_bytes().to_vec(),
        }
    }

    /// Split an ID into its plain part and trailing signature. IDs
    /// without a separator have no signature.
    pub fn parse(entity_id: &str) -> (&str, Option<&str>) {
        match entity_id.rsplit_once('.') {
            Some((plain, sig)) if !plain.is_empty() => (plain, Some(sig)),
            _ => (entity_id, None),
        }
    }

    fn signature(&self, plain: &str) -> Option<String> {
        if self.key.is_empty() || plain.is_empty() {
            return None;
        }
        Some(hex::encode(hmac_sha256(&self.key, plain.as_bytes())))
    }

    /// Sign an ID, replacing any signature it already carries.
    pub fn sign(&self, entity_id: &str) -> String {
        let (plain, _) = Namespace::parse(entity_id);
        match self.signature(plain) {
            Some(sig) => format!("{plain}.{sig}"),
            None => plain.to_string(),
        }
    }

    /// Whether the ID carries a valid signature for this namespace.
    pub fn verify(&self, entity_id: &str) -> bool {
        let (plain, Some(sig)) = Namespace::parse(entity_id) else {
            return false;
        };
        match self.signature(plain) {
            Some(expected) => constant_time_eq(sig.as_bytes(), expected.as_bytes()),
            None => false,
        }
    }

    /// Re-sign an entity's ID. Unless `shallow`, entity-reference values
    /// are rewritten too, keeping intra-dataset links consistent.
    pub fn apply<'m>(&self, entity: &EntityProxy<'m>, shallow: bool) -> EntityProxy<'m> {
        let mut out = entity.clone();
        if !out.id.is_empty() {
            out.id = self.sign(&out.id);
        }
        if shallow {
            return out;
        }
        let entity_props: Vec<String> = out
            .iter_props()
            .iter()
            .filter(|p| p.is_entity() && !p.stub)
            .map(|p| p.name.clone())
            .collect();
        for name in entity_props {
            let signed: Vec<String> = out.pop(&name).iter().map(|v| self.sign(v)).collect();
            // Signed IDs pass entity-type cleaning unchanged.
            let _ = out.set(&name, signed);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Model;

    #[test]
    fn sign_and_verify_round_trip() {
        let ns = Namespace::new("my-dataset");
        let signed = ns.sign("entity-1");
        assert!(signed.starts_with("entity-1."));
        assert!(ns.verify(&signed));
        assert!(!ns.verify("entity-1"));
    }

    #[test]
    fn foreign_signatures_fail_verification() {
        let a = Namespace::new("dataset-a");
        let b = Namespace::new("dataset-b");
        let signed = a.sign("entity-1");
        assert!(!b.verify(&signed));
    }

    #[test]
    fn resigning_replaces_the_old_signature() {
        let a = Namespace::new("dataset-a");
        let b = Namespace::new("dataset-b");
        let resigned = b.sign(&a.sign("entity-1"));
        assert!(b.verify(&resigned));
        let (plain, _) = Namespace::parse(&resigned);
        assert_eq!(plain, "entity-1");
    }

    #[test]
    fn null_namespace_strips_signatures() {
        let a = Namespace::new("dataset-a");
        let null = Namespace::new("");
        assert_eq!(null.sign(&a.sign("entity-1")), "entity-1");
    }

    #[test]
    fn hmac_matches_rfc_4231_test_case_2() {
        // Key "Jefe", message "what do ya want for nothing?".
        let mac = hmac_sha256(b"Jefe", b"what do ya want for nothing?");
        assert_eq!(
            hex::encode(mac),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn apply_rewrites_entity_references() {
        let m = Model::bundled();
        let ns = Namespace::new("my-dataset");
        let schema = m.get("Ownership").unwrap();
        let mut own = crate::proxy::EntityProxy::new(&m, schema, "o1");
        own.add("owner", ["p1"]).unwrap();
        own.add("percentage", ["50"]).unwrap();

        let signed = ns.apply(&own, false);
        assert!(ns.verify(&signed.id));
        assert!(ns.verify(signed.first("owner").unwrap()));
        assert_eq!(signed.get("percentage"), ["50"]);

        let shallow = ns.apply(&own, true);
        assert!(ns.verify(&shallow.id));
        assert_eq!(shallow.get("owner"), ["p1"]);
    }
}
