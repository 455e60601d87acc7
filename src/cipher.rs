use argon2::{Algorithm, Argon2, Params, Version};
use blake3::{Hash, Hasher};
use chacha20::{
    XChaCha20,
    cipher::{KeyIvInit, StreamCipher},
};
use std::io::{Read, Write};

pub const SALT_LEN: usize = 16;
pub const NONCE_LEN: usize = 24;
pub const TAG_LEN: usize = 32;

/// Cipher key and MAC key derived from one password.
pub struct Keys {
    pub cipher: [u8; 32],
    pub mac: [u8; 32],
}

pub fn derive_keys(password: &[u8], salt: &[u8; SALT_LEN]) -> argon2::Result<Keys> {
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::DEFAULT);

    let mut out = [0u8; 64];

    argon2.hash_password_into(password, salt, &mut out)?;

    let mut keys = Keys {
        cipher: [0u8; 32],
        mac: [0u8; 32],
    };
    keys.cipher.copy_from_slice(&out[..32]);
    keys.mac.copy_from_slice(&out[32..]);

    Ok(keys)
}

/// Encrypts everything written through it and MACs the ciphertext.
pub struct Encryptor<W: Write> {
    inner: W,
    cipher: XChaCha20,
    hasher: Hasher,
}

impl<W: Write> Encryptor<W> {
    pub fn new(inner: W, keys: &Keys, nonce: &[u8; NONCE_LEN]) -> Self {
        Self {
            inner,
            cipher: XChaCha20::new((&keys.cipher).into(), nonce.into()),
            hasher: Hasher::new_keyed(&keys.mac),
        }
    }

    pub fn finalize(&self) -> Hash {
        self.hasher.finalize()
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for Encryptor<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut encrypted = buf.to_vec();

        self.cipher.apply_keystream(&mut encrypted);

        self.hasher.update(&encrypted);

        // The keystream has already advanced past `buf`, so all of it must land.
        self.inner.write_all(&encrypted)?;

        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

/// Decrypts everything read through it. Call [`Decryptor::verify`] once the
/// stream is exhausted before trusting the plaintext.
pub struct Decryptor<R: Read> {
    inner: R,
    cipher: XChaCha20,
    hasher: Hasher,
    tag: Hash,
}

impl<R: Read> Decryptor<R> {
    pub fn new(inner: R, keys: &Keys, nonce: &[u8; NONCE_LEN], tag: [u8; TAG_LEN]) -> Self {
        Self {
            inner,
            cipher: XChaCha20::new((&keys.cipher).into(), nonce.into()),
            hasher: Hasher::new_keyed(&keys.mac),
            tag: Hash::from(tag),
        }
    }

    pub fn verify(self) -> bool {
        // Hash equality is constant time.
        self.hasher.finalize() == self.tag
    }
}

impl<R: Read> Read for Decryptor<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let read = self.inner.read(buf)?;

        self.hasher.update(&buf[..read]);

        self.cipher.apply_keystream(&mut buf[..read]);

        Ok(read)
    }
}
