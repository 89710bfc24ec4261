use anyhow::anyhow;
use argon2::{Algorithm, Argon2, Params, Version};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use domain_snapshot::{
    exception::{SnapshotException, SnapshotResult},
    model::entity::Snapshot,
    service::SnapshotCodecService,
};
use typed_builder::TypedBuilder;

/// Envelope layout before base64:
/// `magic | memory cost (u32 le) | iterations (u32 le) | salt | nonce | ciphertext`.
const MAGIC: &[u8; 4] = b"GBK1";
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const HEADER_LEN: usize = MAGIC.len() + 4 + 4 + SALT_LEN + NONCE_LEN;
/// Upper bounds accepted from an envelope header, 1 GiB and 64 passes.
const MAX_MEMORY_COST_KIB: u32 = 1024 * 1024;
const MAX_ITERATIONS: u32 = 64;

/// JSON codec with optional Argon2id + ChaCha20-Poly1305 encryption.
#[derive(TypedBuilder, Clone, Debug)]
pub struct SnapshotCodecServiceImpl {
    /// Argon2 memory cost in KiB used for new envelopes.
    #[builder(default = Params::DEFAULT_M_COST)]
    memory_cost_kib: u32,
    /// Argon2 passes used for new envelopes.
    #[builder(default = Params::DEFAULT_T_COST)]
    iterations: u32,
}

impl Default for SnapshotCodecServiceImpl {
    fn default() -> Self {
        Self::builder().build()
    }
}

fn trim_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| !b.is_ascii_whitespace());
    let end = bytes.iter().rposition(|b| !b.is_ascii_whitespace());
    match (start, end) {
        (Some(start), Some(end)) => &bytes[start..=end],
        _ => &[],
    }
}

fn read_u32(bytes: &[u8]) -> SnapshotResult<u32> {
    let array: [u8; 4] = bytes
        .try_into()
        .map_err(|_| SnapshotException::corrupt("truncated envelope header"))?;
    Ok(u32::from_le_bytes(array))
}

fn derive_key(
    passphrase: &str,
    salt: &[u8],
    memory_cost_kib: u32,
    iterations: u32,
) -> SnapshotResult<Key> {
    let params = Params::new(memory_cost_kib, iterations, 1, Some(32))
        .map_err(|e| SnapshotException::corrupt(format!("invalid key parameters: {e}")))?;
    let mut key = [0u8; 32];
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password_into(passphrase.as_bytes(), salt, &mut key)
        .map_err(|e| anyhow!("Key derivation failed: {e}"))?;
    Ok(Key::clone_from_slice(&key))
}

fn parse(bytes: &[u8]) -> SnapshotResult<Snapshot> {
    serde_json::from_slice(bytes).map_err(SnapshotException::corrupt)
}

impl SnapshotCodecServiceImpl {
    fn seal(&self, plaintext: &[u8], passphrase: &str) -> SnapshotResult<Vec<u8>> {
        let salt = rand::random::<[u8; SALT_LEN]>();
        let nonce = rand::random::<[u8; NONCE_LEN]>();
        let key = derive_key(passphrase, &salt, self.memory_cost_kib, self.iterations)?;
        let ciphertext = ChaCha20Poly1305::new(&key)
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|e| anyhow!("Encryption failed: {e}"))?;

        let mut envelope = Vec::with_capacity(HEADER_LEN + ciphertext.len());
        envelope.extend_from_slice(MAGIC);
        envelope.extend_from_slice(&self.memory_cost_kib.to_le_bytes());
        envelope.extend_from_slice(&self.iterations.to_le_bytes());
        envelope.extend_from_slice(&salt);
        envelope.extend_from_slice(&nonce);
        envelope.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(envelope).into_bytes())
    }

    fn open(&self, text: &[u8], passphrase: &str) -> SnapshotResult<Vec<u8>> {
        let envelope = STANDARD
            .decode(text)
            .map_err(|e| SnapshotException::corrupt(format!("not an encrypted snapshot: {e}")))?;
        if envelope.len() < HEADER_LEN + TAG_LEN || !envelope.starts_with(MAGIC) {
            return Err(SnapshotException::corrupt("unrecognised encrypted envelope"));
        }

        let mut offset = MAGIC.len();
        let memory_cost_kib = read_u32(&envelope[offset..offset + 4])?;
        offset += 4;
        let iterations = read_u32(&envelope[offset..offset + 4])?;
        offset += 4;
        if memory_cost_kib > MAX_MEMORY_COST_KIB || iterations > MAX_ITERATIONS {
            return Err(SnapshotException::corrupt(
                "key parameters in envelope are out of range",
            ));
        }
        let salt = &envelope[offset..offset + SALT_LEN];
        offset += SALT_LEN;
        let nonce = &envelope[offset..offset + NONCE_LEN];
        offset += NONCE_LEN;

        let key = derive_key(passphrase, salt, memory_cost_kib, iterations)?;
        // An authentication failure can't tell a wrong key from flipped bits.
        ChaCha20Poly1305::new(&key)
            .decrypt(Nonce::from_slice(nonce), &envelope[offset..])
            .map_err(|_| SnapshotException::WrongPassword)
    }
}

impl SnapshotCodecService for SnapshotCodecServiceImpl {
    fn encode(&self, snapshot: &Snapshot, passphrase: Option<&str>) -> SnapshotResult<Vec<u8>> {
        let plaintext = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| anyhow!("Failed to serialize snapshot {}: {e}", snapshot.id))?;
        match passphrase.filter(|el| !el.is_empty()) {
            Some(passphrase) => self.seal(&plaintext, passphrase),
            None => Ok(plaintext),
        }
    }

    fn decode(&self, bytes: &[u8], passphrase: Option<&str>) -> SnapshotResult<Snapshot> {
        let content = trim_whitespace(bytes);
        if content.is_empty() {
            return Err(SnapshotException::corrupt("empty content"));
        }
        if content[0] == b'{' {
            return parse(content);
        }
        let passphrase = passphrase
            .filter(|el| !el.is_empty())
            .ok_or(SnapshotException::PasswordRequired)?;
        let plaintext = self.open(content, passphrase)?;
        parse(&plaintext)
    }

    fn is_encrypted(&self, bytes: &[u8]) -> bool {
        trim_whitespace(bytes).first().is_some_and(|b| *b != b'{')
    }
}
