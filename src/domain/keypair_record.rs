//! Keypair Record
//!
//! One validated wallet: a label, its public key and the secret keypair.
//! Raw key bytes only ever live in zeroizing buffers, and the record has no
//! accessor, serializer or `Clone` that would copy the secret out.

use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::Deserialize;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{keypair_from_seed, Keypair, Signature, Signer},
    transaction::Transaction,
};
use std::fmt;
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

use super::error::{ValidationError, WalletError};

/// Length of a solana-keygen keypair: 32-byte seed followed by 32-byte public key
pub const KEYPAIR_LENGTH: usize = 64;

/// Length of the seed half of a keypair
pub const SEED_LENGTH: usize = 32;

/// A loaded wallet
pub struct KeypairRecord {
    label: String,
    public_key: Pubkey,
    source: PathBuf,
    keypair: Keypair,
}

impl KeypairRecord {
    /// Build a record from the 64 keypair bytes.
    ///
    /// The public key is recomputed from the seed and must equal the embedded
    /// half; neither half is trusted on its own.
    pub fn from_keypair_bytes(
        label: impl Into<String>,
        source: impl Into<PathBuf>,
        bytes: &[u8],
    ) -> Result<Self, WalletError> {
        let label = validate_label(label.into())?;

        if bytes.len() != KEYPAIR_LENGTH {
            return Err(ValidationError::MalformedKeyLength {
                expected: KEYPAIR_LENGTH,
                actual: bytes.len(),
            }
            .into());
        }

        let (seed, embedded_public) = bytes.split_at(SEED_LENGTH);
        let keypair = keypair_from_seed(seed)
            .map_err(|e| ValidationError::InvalidSeed(e.to_string()))?;

        let public_key = keypair.pubkey();
        if public_key.as_ref() != embedded_public {
            return Err(ValidationError::PublicKeyMismatch.into());
        }

        Ok(Self {
            label,
            public_key,
            source: source.into(),
            keypair,
        })
    }

    /// Read, parse and validate a key file
    pub fn from_file(label: impl Into<String>, path: &Path) -> Result<Self, WalletError> {
        let contents = Zeroizing::new(
            std::fs::read(path).map_err(|e| WalletError::Io(format!("Failed to read file: {}", e)))?,
        );
        let bytes = parse_keypair_json(&contents)?;
        Self::from_keypair_bytes(label, path, &bytes)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn public_key(&self) -> Pubkey {
        self.public_key
    }

    /// File the record was loaded from
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Sign a message and return the signature
    pub fn sign_message(&self, message: &[u8]) -> Signature {
        self.keypair.sign_message(message)
    }

    /// Sign a transaction against its recent blockhash
    pub fn sign_transaction(&self, transaction: &mut Transaction) -> Result<(), WalletError> {
        transaction
            .try_sign(&[&self.keypair], transaction.message.recent_blockhash)
            .map_err(|e| WalletError::Signing(e.to_string()))
    }
}

impl fmt::Debug for KeypairRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeypairRecord")
            .field("label", &self.label)
            .field("public_key", &self.public_key)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

fn validate_label(label: String) -> Result<String, WalletError> {
    if label.trim().is_empty() {
        return Err(ValidationError::InvalidLabel("label is empty".to_string()).into());
    }
    if label.contains(['/', '\\']) {
        return Err(ValidationError::InvalidLabel(format!(
            "'{}' contains a path separator",
            label
        ))
        .into());
    }
    Ok(label)
}

/// Parse the solana-keygen JSON encoding into zeroizing bytes.
///
/// Shape errors (not JSON, not an array, non-integer elements) are parse
/// errors. Length and range problems are validation errors and are checked
/// here, before any key derivation.
pub fn parse_keypair_json(contents: &[u8]) -> Result<Zeroizing<Vec<u8>>, WalletError> {
    let mut deserializer = serde_json::Deserializer::from_slice(contents);
    let raw = deserializer.deserialize_seq(KeyArrayVisitor)?;
    deserializer.end()?;

    if raw.len != KEYPAIR_LENGTH {
        return Err(ValidationError::MalformedKeyLength {
            expected: KEYPAIR_LENGTH,
            actual: raw.len,
        }
        .into());
    }
    if let Some(index) = raw.first_out_of_range {
        return Err(ValidationError::ByteOutOfRange { index }.into());
    }

    Ok(raw.bytes)
}

struct RawKeyArray {
    bytes: Zeroizing<Vec<u8>>,
    len: usize,
    first_out_of_range: Option<usize>,
}

struct KeyArrayVisitor;

impl<'de> Visitor<'de> for KeyArrayVisitor {
    type Value = RawKeyArray;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JSON array of byte values")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<RawKeyArray, A::Error> {
        // Fixed capacity: pushing never reallocates, so no stray copies of key
        // bytes are left behind in freed memory.
        let mut bytes = Zeroizing::new(Vec::with_capacity(KEYPAIR_LENGTH));
        let mut len = 0;
        let mut first_out_of_range = None;

        while let Some(value) = seq.next_element::<ByteValue>()? {
            match value {
                ByteValue::Byte(b) if bytes.len() < KEYPAIR_LENGTH => bytes.push(b),
                ByteValue::Byte(_) => {}
                ByteValue::OutOfRange => {
                    first_out_of_range.get_or_insert(len);
                }
            }
            len += 1;
        }

        Ok(RawKeyArray {
            bytes,
            len,
            first_out_of_range,
        })
    }
}

enum ByteValue {
    Byte(u8),
    OutOfRange,
}

impl<'de> Deserialize<'de> for ByteValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ByteValueVisitor;

        impl<'de> Visitor<'de> for ByteValueVisitor {
            type Value = ByteValue;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an integer")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<ByteValue, E> {
                Ok(u8::try_from(v).map_or(ByteValue::OutOfRange, ByteValue::Byte))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<ByteValue, E> {
                Ok(u8::try_from(v).map_or(ByteValue::OutOfRange, ByteValue::Byte))
            }

            // Integer literals wider than 64 bits arrive as floats
            fn visit_f64<E: de::Error>(self, v: f64) -> Result<ByteValue, E> {
                if v.fract() == 0.0 && (v >= u64::MAX as f64 || v < i64::MIN as f64) {
                    Ok(ByteValue::OutOfRange)
                } else {
                    Err(E::invalid_type(de::Unexpected::Float(v), &self))
                }
            }
        }

        deserializer.deserialize_any(ByteValueVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn keypair_json(keypair: &Keypair) -> String {
        serde_json::to_string(&keypair.to_bytes().to_vec()).unwrap()
    }

    #[test]
    fn test_parse_solana_keygen_format() {
        let keypair = Keypair::new();
        let bytes = parse_keypair_json(keypair_json(&keypair).as_bytes()).unwrap();
        assert_eq!(&bytes[..], &keypair.to_bytes()[..]);
    }

    #[test]
    fn test_parse_accepts_whitespace_and_newlines() {
        let keypair = Keypair::new();
        let pretty = serde_json::to_string_pretty(&keypair.to_bytes().to_vec()).unwrap();
        let bytes = parse_keypair_json(format!("\n{}\n", pretty).as_bytes()).unwrap();
        assert_eq!(bytes.len(), KEYPAIR_LENGTH);
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        let err = parse_keypair_json(b"not valid json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_parse_rejects_non_array() {
        let err = parse_keypair_json(br#"{"secret": [1, 2, 3]}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);

        let err = parse_keypair_json(b"42").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_parse_rejects_non_integer_elements() {
        let err = parse_keypair_json(br#"[1, "two", 3]"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);

        let err = parse_keypair_json(b"[1, 2.5, 3]").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_parse_rejects_trailing_content() {
        let keypair = Keypair::new();
        let json = format!("{} []", keypair_json(&keypair));
        let err = parse_keypair_json(json.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_parse_rejects_short_array() {
        let err = parse_keypair_json(b"[1,2,3]").unwrap_err();
        assert_eq!(
            err.validation(),
            Some(&ValidationError::MalformedKeyLength { expected: 64, actual: 3 })
        );
    }

    #[test]
    fn test_parse_rejects_seed_only_array() {
        let keypair = Keypair::new();
        let seed_only = serde_json::to_string(&keypair.to_bytes()[..SEED_LENGTH].to_vec()).unwrap();
        let err = parse_keypair_json(seed_only.as_bytes()).unwrap_err();
        assert_eq!(
            err.validation(),
            Some(&ValidationError::MalformedKeyLength { expected: 64, actual: 32 })
        );
    }

    #[test]
    fn test_parse_rejects_long_array() {
        let values = vec![7u16; 65];
        let json = serde_json::to_string(&values).unwrap();
        let err = parse_keypair_json(json.as_bytes()).unwrap_err();
        assert_eq!(
            err.validation(),
            Some(&ValidationError::MalformedKeyLength { expected: 64, actual: 65 })
        );
    }

    #[test]
    fn test_parse_rejects_out_of_range_bytes() {
        let mut values: Vec<i64> = vec![1; 64];
        values[10] = 256;
        values[20] = -1;
        let json = serde_json::to_string(&values).unwrap();

        let err = parse_keypair_json(json.as_bytes()).unwrap_err();
        assert_eq!(err.validation(), Some(&ValidationError::ByteOutOfRange { index: 10 }));
        assert!(!err.to_string().contains("256"));
    }

    #[test]
    fn test_parse_oversized_integer_is_out_of_range() {
        let mut values: Vec<String> = vec!["1".to_string(); 64];
        values[5] = "100000000000000000000".to_string();
        values[9] = "-100000000000000000000".to_string();
        let json = format!("[{}]", values.join(","));

        let err = parse_keypair_json(json.as_bytes()).unwrap_err();
        assert_eq!(err.validation(), Some(&ValidationError::ByteOutOfRange { index: 5 }));
    }

    #[test]
    fn test_parse_rejects_small_floats_in_full_array() {
        let mut values: Vec<String> = vec!["1".to_string(); 64];
        values[3] = "1.0".to_string();
        let json = format!("[{}]", values.join(","));

        let err = parse_keypair_json(json.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_record_public_key_matches_embedded_half() {
        let keypair = Keypair::new();
        let bytes = keypair.to_bytes();
        let record = KeypairRecord::from_keypair_bytes("main", "main.json", &bytes).unwrap();

        assert_eq!(record.label(), "main");
        assert_eq!(record.public_key().to_bytes()[..], bytes[32..]);
        assert_eq!(record.public_key(), keypair.pubkey());
    }

    #[test]
    fn test_record_derivation_matches_independent_derivation() {
        let keypair = Keypair::new();
        let bytes = keypair.to_bytes();
        let record = KeypairRecord::from_keypair_bytes("main", "main.json", &bytes).unwrap();

        let rederived = keypair_from_seed(&bytes[..SEED_LENGTH]).unwrap();
        assert_eq!(record.public_key(), rederived.pubkey());
    }

    #[test]
    fn test_record_rejects_public_key_mismatch() {
        let a = Keypair::new();
        let b = Keypair::new();
        let mut bytes = a.to_bytes();
        bytes[32..].copy_from_slice(&b.pubkey().to_bytes());

        let err = KeypairRecord::from_keypair_bytes("spliced", "spliced.json", &bytes).unwrap_err();
        assert_eq!(err.validation(), Some(&ValidationError::PublicKeyMismatch));
    }

    #[test]
    fn test_record_rejects_bad_labels() {
        let bytes = Keypair::new().to_bytes();

        let err = KeypairRecord::from_keypair_bytes("", "x.json", &bytes).unwrap_err();
        assert!(matches!(err.validation(), Some(ValidationError::InvalidLabel(_))));

        let err = KeypairRecord::from_keypair_bytes("a/b", "x.json", &bytes).unwrap_err();
        assert!(matches!(err.validation(), Some(ValidationError::InvalidLabel(_))));
    }

    #[test]
    fn test_record_from_file() {
        let keypair = Keypair::new();
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(keypair_json(&keypair).as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let record = KeypairRecord::from_file("trader1", temp_file.path()).unwrap();
        assert_eq!(record.public_key(), keypair.pubkey());
        assert_eq!(record.source(), temp_file.path());
    }

    #[test]
    fn test_record_from_missing_file_is_io_error() {
        let err = KeypairRecord::from_file("ghost", Path::new("/nonexistent/ghost.json")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_sign_message_verifies() {
        let keypair = Keypair::new();
        let record =
            KeypairRecord::from_keypair_bytes("main", "main.json", &keypair.to_bytes()).unwrap();

        let message = b"Hello, Solana!";
        let signature = record.sign_message(message);
        assert_eq!(signature.as_ref().len(), 64);
        assert!(signature.verify(record.public_key().as_ref(), message));
    }

    #[test]
    fn test_debug_output_hides_secret() {
        let keypair = Keypair::new();
        let bytes = keypair.to_bytes();
        let record = KeypairRecord::from_keypair_bytes("main", "main.json", &bytes).unwrap();

        let debug = format!("{:?}", record);
        assert!(debug.contains("main"));
        assert!(debug.contains(&record.public_key().to_string()));
        assert!(!debug.contains(&format!("{:?}", &bytes[..SEED_LENGTH])));
        assert!(!debug.contains("keypair"));
    }
}
