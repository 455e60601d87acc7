//! Sealing a journal directory into one encrypted file, and back.
//!
//! Layout: `RFLJ` magic, salt, nonce, MAC tag, then the XChaCha20-encrypted
//! `.tar.gz` of the directory. The tag is keyed BLAKE3 over the ciphertext.

use color_eyre::eyre::{WrapErr, bail, eyre};
use flate2::{Compression, read::GzDecoder, write::GzEncoder};
use rand::RngCore;
use std::{
    fs::{self, File, OpenOptions},
    io::{self, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};
use tar::{Archive, Builder};
use tracing::info;

use crate::cipher::{self, Decryptor, Encryptor, NONCE_LEN, SALT_LEN, TAG_LEN};

const MAGIC: &[u8; 4] = b"RFLJ";
const TAG_OFFSET: u64 = (MAGIC.len() + SALT_LEN + NONCE_LEN) as u64;

/// Temporary archives are written and then read back.
fn create_scratch(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .create_new(true)
        .open(path)
}

fn sibling(dir: &Path, suffix: &str) -> color_eyre::Result<PathBuf> {
    let name = dir
        .file_name()
        .ok_or_else(|| eyre!("{} has no directory name", dir.display()))?;
    Ok(dir.with_file_name(format!("{}{suffix}", name.to_string_lossy())))
}

/// Where the sealed form of `dir` lives.
pub fn sealed_path(dir: &Path) -> color_eyre::Result<PathBuf> {
    sibling(dir, ".sealed")
}

/// Archives, compresses and encrypts `dir`, then removes it.
pub fn seal(dir: &Path, password: &str, level: u32) -> color_eyre::Result<PathBuf> {
    let archive_path = sibling(dir, ".tar.gz")?;
    let sealed_path = sealed_path(dir)?;

    let out = create_scratch(&archive_path).wrap_err("Failed to create temporary archive")?;

    let compressed = GzEncoder::new(out, Compression::new(level));
    let mut archive = Builder::new(compressed);

    archive.append_dir_all(".", dir)?;
    archive.finish()?;

    let mut unencrypted = archive
        .into_inner()
        .wrap_err("Failed to extract inner stream to archive")?
        .finish()
        .wrap_err("Failed to finalize compression")?;

    let mut sealed = File::create_new(&sealed_path).wrap_err("Failed to create sealed journal")?;

    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    let mut nonce = [0u8; NONCE_LEN];
    rand::rng().fill_bytes(&mut nonce);

    let keys = cipher::derive_keys(password.as_bytes(), &salt)
        .map_err(|e| eyre!("Failed to derive key: {e}"))?;

    sealed.write_all(MAGIC)?;
    sealed.write_all(&salt)?;
    sealed.write_all(&nonce)?;
    sealed.write_all(&[0u8; TAG_LEN])?;

    unencrypted.seek(SeekFrom::Start(0))?;

    let mut encryptor = Encryptor::new(sealed, &keys, &nonce);
    io::copy(&mut unencrypted, &mut encryptor).wrap_err("Failed to encrypt journal")?;
    encryptor.flush()?;
    let tag = encryptor.finalize();

    let mut sealed = encryptor.into_inner();
    sealed.seek(SeekFrom::Start(TAG_OFFSET))?;
    sealed.write_all(tag.as_bytes())?;
    sealed.sync_all()?;

    fs::remove_dir_all(dir).wrap_err("Failed to remove journal directory")?;
    fs::remove_file(&archive_path).wrap_err("Failed to remove temporary archive")?;

    info!(path = %sealed_path.display(), "sealed journal");
    Ok(sealed_path)
}

/// Restores `dir` from its sealed file. Nothing is unpacked unless the
/// password is right and the file is intact.
pub fn unseal(dir: &Path, password: &str) -> color_eyre::Result<()> {
    let sealed_path = sealed_path(dir)?;
    let archive_path = sibling(dir, ".tar.gz")?;

    let mut sealed = File::open(&sealed_path)
        .wrap_err_with(|| format!("No sealed journal at {}", sealed_path.display()))?;

    let mut magic = [0u8; 4];
    sealed.read_exact(&mut magic)?;
    if &magic != MAGIC {
        bail!("{} is not a sealed journal", sealed_path.display());
    }
    let mut salt = [0u8; SALT_LEN];
    sealed.read_exact(&mut salt)?;
    let mut nonce = [0u8; NONCE_LEN];
    sealed.read_exact(&mut nonce)?;
    let mut tag = [0u8; TAG_LEN];
    sealed.read_exact(&mut tag)?;

    let keys = cipher::derive_keys(password.as_bytes(), &salt)
        .map_err(|e| eyre!("Failed to derive key: {e}"))?;

    let mut decrypted =
        create_scratch(&archive_path).wrap_err("Failed to create temporary archive")?;

    let mut decryptor = Decryptor::new(sealed, &keys, &nonce, tag);
    io::copy(&mut decryptor, &mut decrypted).wrap_err("Failed to decrypt")?;

    if !decryptor.verify() {
        drop(decrypted);
        fs::remove_file(&archive_path).wrap_err("Failed to remove temporary archive")?;
        bail!("Wrong password, or the sealed journal is damaged");
    }

    decrypted.flush()?;
    decrypted.seek(SeekFrom::Start(0))?;

    let decompressed = GzDecoder::new(decrypted);
    let mut archive = Archive::new(decompressed);

    archive.unpack(dir).wrap_err("Failed to unpack journal")?;

    fs::remove_file(&archive_path).wrap_err("Failed to remove temporary archive")?;
    fs::remove_file(&sealed_path).wrap_err("Failed to remove sealed journal")?;

    info!(path = %dir.display(), "unsealed journal");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn journal_dir(root: &Path) -> PathBuf {
        let dir = root.join("journal");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("journal.json"), b"{\"version\":1}").unwrap();
        fs::write(dir.join("settings.json"), b"{}").unwrap();
        dir
    }

    #[test]
    fn seal_and_unseal() {
        let root = tempfile::tempdir().unwrap();
        let dir = journal_dir(root.path());

        let sealed = seal(&dir, "hunter2", 6).unwrap();
        assert!(sealed.is_file());
        assert!(!dir.exists());
        assert!(!root.path().join("journal.tar.gz").exists());

        unseal(&dir, "hunter2").unwrap();
        assert_eq!(
            fs::read_to_string(dir.join("journal.json")).unwrap(),
            "{\"version\":1}"
        );
        assert!(!sealed.exists());
    }

    #[test]
    fn wrong_password_leaves_nothing_behind() {
        let root = tempfile::tempdir().unwrap();
        let dir = journal_dir(root.path());
        let sealed = seal(&dir, "correct horse", 1).unwrap();

        assert!(unseal(&dir, "battery staple").is_err());
        assert!(!dir.exists());
        assert!(sealed.is_file());
        assert!(!root.path().join("journal.tar.gz").exists());
    }

    #[test]
    fn rejects_foreign_files() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("journal");
        fs::write(root.path().join("journal.sealed"), b"not a journal at all, honestly").unwrap();

        assert!(unseal(&dir, "anything").is_err());
    }
}
