//! Secret key files.
//!
//! A key file holds one hex-encoded 32-byte secret, optionally `0x`
//! prefixed, with surrounding whitespace ignored. Files are created readable
//! by their owner only.

use std::{fs, io::Write, path::Path};

use anyhow::{Context, bail};
use keylink_credentials::{DelegateKeyPair, EvmSigner, KEY_LENGTH, PrimarySigner, SolanaSigner};
use zeroize::Zeroizing;

use crate::cli::Scheme;

/// Read a secret from `path`.
pub fn read_secret(path: &Path) -> anyhow::Result<Zeroizing<[u8; KEY_LENGTH]>> {
    let text = Zeroizing::new(
        fs::read_to_string(path).with_context(|| format!("reading key file {}", path.display()))?,
    );
    let digits = text.trim();
    let digits = digits.strip_prefix("0x").unwrap_or(digits);

    let mut secret = Zeroizing::new([0u8; KEY_LENGTH]);
    if digits.len() != KEY_LENGTH * 2 {
        bail!(
            "key file {} must hold {} hex digits, found {}",
            path.display(),
            KEY_LENGTH * 2,
            digits.len()
        );
    }
    hex::decode_to_slice(digits, &mut secret[..])
        .with_context(|| format!("key file {} is not hex", path.display()))?;
    Ok(secret)
}

/// Write `secret` to a new file at `path`.
///
/// Refuses to overwrite an existing file.
pub fn write_secret(path: &Path, secret: &[u8; KEY_LENGTH]) -> anyhow::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options
        .open(path)
        .with_context(|| format!("creating key file {}", path.display()))?;
    let text = Zeroizing::new(hex::encode(secret));
    file.write_all(text.as_bytes())?;
    file.write_all(b"\n")?;
    file.sync_all()?;
    Ok(())
}

pub fn read_delegate_key(path: &Path) -> anyhow::Result<DelegateKeyPair> {
    Ok(DelegateKeyPair::from_secret_bytes(&*read_secret(path)?))
}

pub fn write_delegate_key(path: &Path, key: &DelegateKeyPair) -> anyhow::Result<()> {
    write_secret(path, &*key.export())
}

pub fn read_primary_key(path: &Path, scheme: Scheme) -> anyhow::Result<PrimarySigner> {
    let secret = read_secret(path)?;
    Ok(match scheme {
        Scheme::Evm => EvmSigner::from_slice(&secret[..])
            .with_context(|| format!("{} is not a secp256k1 key", path.display()))?
            .into(),
        Scheme::Solana => SolanaSigner::from_secret_bytes(&*secret).into(),
    })
}
