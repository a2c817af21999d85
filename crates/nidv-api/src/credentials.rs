//! # Credential Store
//!
//! Issues API credentials and resolves inbound tokens to live credentials.
//!
//! ## Storage Model
//!
//! A credential is persisted as its SHA-256 lookup hash plus an
//! AES-256-GCM copy of the secret that exists only for operator display.
//! The plaintext secret is handed back exactly once, inside an
//! [`IssuedCredential`], and never stored.
//!
//! Records live behind the [`CredentialRepository`] trait. Two
//! implementations ship with the crate:
//!
//! - [`InMemoryCredentialRepository`] — `parking_lot::RwLock` guarded maps,
//!   indexed by id and by lookup hash.
//! - [`JsonFileCredentialRepository`] — the in-memory repository hydrated
//!   from a JSON document and rewritten after every mutation.

use std::collections::HashMap;
use std::fs::{File, Metadata, OpenOptions};
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use nidv_core::Timestamp;
use nidv_crypto::{hash_secret, AuditCipher, CryptoError, KeyHash, SecretToken};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Placeholder stored in `audit_ciphertext` when the secret could not be
/// encrypted. Never valid base64, so it cannot collide with a real value.
pub const AUDIT_UNAVAILABLE: &str = "!audit-unavailable";

/// Longest accepted owner label, after trimming.
pub const MAX_OWNER_LENGTH: usize = 100;

const DOCUMENT_VERSION: u32 = 1;

// -- Records ------------------------------------------------------------------

/// A persisted API credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub id: Uuid,
    pub lookup_hash: KeyHash,
    pub audit_ciphertext: String,
    pub audit_displayable: bool,
    pub preview_suffix: String,
    pub owner: String,
    pub created_at: Timestamp,
    pub active: bool,
}

impl Credential {
    /// Masked display form, `****XXXX`.
    pub fn masked_preview(&self) -> String {
        format!("****{}", self.preview_suffix)
    }
}

/// A freshly issued credential together with its one-time plaintext secret.
///
/// The secret zeroizes when this value is dropped. Callers display it once
/// and let it go.
#[derive(Debug)]
pub struct IssuedCredential {
    pub credential: Credential,
    pub secret: SecretToken,
}

/// Result of encrypting a secret for audit display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedSecret {
    pub ciphertext: String,
    pub displayable: bool,
}

impl SealedSecret {
    fn unavailable() -> Self {
        Self {
            ciphertext: AUDIT_UNAVAILABLE.to_string(),
            displayable: false,
        }
    }
}

// -- Errors -------------------------------------------------------------------

/// Error raised by credential storage.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A credential with the same lookup hash already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// No credential with the given id.
    #[error("credential {0} not found")]
    NotFound(Uuid),

    /// Owner label is empty or too long.
    #[error("invalid owner: {0}")]
    InvalidOwner(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backing store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

// -- Repository ---------------------------------------------------------------

/// Keyed record store for credentials.
///
/// `find_by_hash` is an exact match on the lookup hash. Implementations must
/// reject an `insert` whose hash is already present with
/// [`StoreError::Conflict`].
pub trait CredentialRepository: Send + Sync {
    fn find_by_hash(&self, hash: &KeyHash) -> Result<Option<Credential>, StoreError>;
    fn get(&self, id: Uuid) -> Result<Option<Credential>, StoreError>;
    fn insert(&self, credential: Credential) -> Result<(), StoreError>;
    fn set_active(&self, id: Uuid, active: bool) -> Result<Credential, StoreError>;
    fn list(&self) -> Result<Vec<Credential>, StoreError>;
}

#[derive(Debug, Default)]
struct Records {
    by_id: HashMap<Uuid, Credential>,
    by_hash: HashMap<KeyHash, Uuid>,
}

/// Thread-safe in-memory credential repository.
///
/// The lock is never held across `.await` points.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCredentialRepository {
    records: Arc<RwLock<Records>>,
}

impl InMemoryCredentialRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a repository from existing records, rejecting duplicate hashes.
    pub fn from_records(credentials: Vec<Credential>) -> Result<Self, StoreError> {
        let repo = Self::new();
        for credential in credentials {
            repo.insert(credential)?;
        }
        Ok(repo)
    }

    pub fn len(&self) -> usize {
        self.records.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CredentialRepository for InMemoryCredentialRepository {
    fn find_by_hash(&self, hash: &KeyHash) -> Result<Option<Credential>, StoreError> {
        let records = self.records.read();
        Ok(records
            .by_hash
            .get(hash)
            .and_then(|id| records.by_id.get(id))
            .cloned())
    }

    fn get(&self, id: Uuid) -> Result<Option<Credential>, StoreError> {
        Ok(self.records.read().by_id.get(&id).cloned())
    }

    fn insert(&self, credential: Credential) -> Result<(), StoreError> {
        let mut records = self.records.write();
        if records.by_hash.contains_key(&credential.lookup_hash) {
            return Err(StoreError::Conflict(
                "a credential with this lookup hash already exists".into(),
            ));
        }
        if records.by_id.contains_key(&credential.id) {
            return Err(StoreError::Conflict(format!(
                "credential id {} already exists",
                credential.id
            )));
        }
        records
            .by_hash
            .insert(credential.lookup_hash.clone(), credential.id);
        records.by_id.insert(credential.id, credential);
        Ok(())
    }

    fn set_active(&self, id: Uuid, active: bool) -> Result<Credential, StoreError> {
        let mut records = self.records.write();
        let credential = records.by_id.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        credential.active = active;
        Ok(credential.clone())
    }

    fn list(&self) -> Result<Vec<Credential>, StoreError> {
        let mut all: Vec<Credential> = self.records.read().by_id.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(all)
    }
}

/// On-disk layout of the credentials file.
#[derive(Debug, Serialize, Deserialize)]
struct CredentialDocument {
    version: u32,
    credentials: Vec<Credential>,
}

/// Identity of one on-disk version of the document.
///
/// Writers replace the file by rename, so on Unix every write yields a new
/// inode even when size and mtime happen to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
    inode: u64,
}

impl FileStamp {
    fn of(metadata: &Metadata) -> Self {
        #[cfg(unix)]
        let inode = {
            use std::os::unix::fs::MetadataExt;
            metadata.ino()
        };
        #[cfg(not(unix))]
        let inode = 0;
        Self {
            modified: metadata.modified().ok(),
            len: metadata.len(),
            inode,
        }
    }
}

#[derive(Debug)]
struct Snapshot {
    records: InMemoryCredentialRepository,
    stamp: Option<FileStamp>,
}

/// Credential repository persisted as a single JSON document.
///
/// The document is shared with other processes (the provisioning CLI writes
/// it while the server reads it):
///
/// - Reads compare the file's [`FileStamp`] with the cached snapshot and
///   reload when it changed, so a deactivation or issuance made elsewhere is
///   visible on the next lookup.
/// - Mutations hold an exclusive OS lock on a sidecar `.lock` file, re-read
///   the document under that lock, apply the change to a fresh copy, and
///   write it back via a temporary file and rename. The cached snapshot is
///   replaced only after the rename succeeds.
#[derive(Debug, Clone)]
pub struct JsonFileCredentialRepository {
    path: PathBuf,
    lock_path: PathBuf,
    snapshot: Arc<RwLock<Snapshot>>,
}

impl JsonFileCredentialRepository {
    /// Open the document at `path`. A missing file yields an empty repository.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let lock_path = sidecar(&path, "lock");
        let snapshot = load(&path)?;
        tracing::debug!(path = %path.display(), count = snapshot.records.len(), "credentials loaded");
        Ok(Self {
            path,
            lock_path,
            snapshot: Arc::new(RwLock::new(snapshot)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records matching the current on-disk document.
    fn current(&self) -> Result<InMemoryCredentialRepository, StoreError> {
        let stamp = stamp_of(&self.path)?;
        {
            let snapshot = self.snapshot.read();
            if snapshot.stamp == stamp {
                return Ok(snapshot.records.clone());
            }
        }
        let fresh = load(&self.path)?;
        tracing::debug!(path = %self.path.display(), count = fresh.records.len(), "credentials reloaded");
        let records = fresh.records.clone();
        *self.snapshot.write() = fresh;
        Ok(records)
    }

    /// Apply `change` to the latest document under the cross-process lock.
    fn mutate<T>(
        &self,
        change: impl FnOnce(&InMemoryCredentialRepository) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)?;
        let mut lock = fd_lock::RwLock::new(lock_file);
        let _guard = lock.write()?;

        let candidate = load(&self.path)?.records;
        let out = change(&candidate)?;
        let stamp = persist(&self.path, &candidate)?;
        *self.snapshot.write() = Snapshot {
            records: candidate,
            stamp: Some(stamp),
        };
        Ok(out)
    }
}

fn sidecar(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

fn stamp_of(path: &Path) -> Result<Option<FileStamp>, StoreError> {
    match std::fs::metadata(path) {
        Ok(metadata) => Ok(Some(FileStamp::of(&metadata))),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn load(path: &Path) -> Result<Snapshot, StoreError> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Ok(Snapshot {
                records: InMemoryCredentialRepository::new(),
                stamp: None,
            })
        }
        Err(e) => return Err(e.into()),
    };
    // Stamp and contents come from the same handle, so they describe the
    // same version even if a writer renames over the path meanwhile.
    let stamp = FileStamp::of(&file.metadata()?);
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    let document: CredentialDocument = serde_json::from_slice(&bytes)?;
    if document.version != DOCUMENT_VERSION {
        return Err(StoreError::Unavailable(format!(
            "unsupported credentials document version {}",
            document.version
        )));
    }
    Ok(Snapshot {
        records: InMemoryCredentialRepository::from_records(document.credentials)?,
        stamp: Some(stamp),
    })
}

fn persist(path: &Path, records: &InMemoryCredentialRepository) -> Result<FileStamp, StoreError> {
    let document = CredentialDocument {
        version: DOCUMENT_VERSION,
        credentials: records.list()?,
    };
    let json = serde_json::to_vec_pretty(&document)?;
    let tmp = sidecar(path, "tmp");
    std::fs::write(&tmp, json)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(FileStamp::of(&std::fs::metadata(path)?))
}

impl CredentialRepository for JsonFileCredentialRepository {
    fn find_by_hash(&self, hash: &KeyHash) -> Result<Option<Credential>, StoreError> {
        self.current()?.find_by_hash(hash)
    }

    fn get(&self, id: Uuid) -> Result<Option<Credential>, StoreError> {
        self.current()?.get(id)
    }

    fn insert(&self, credential: Credential) -> Result<(), StoreError> {
        self.mutate(|records| records.insert(credential))
    }

    fn set_active(&self, id: Uuid, active: bool) -> Result<Credential, StoreError> {
        self.mutate(|records| records.set_active(id, active))
    }

    fn list(&self) -> Result<Vec<Credential>, StoreError> {
        self.current()?.list()
    }
}

// -- Store --------------------------------------------------------------------

/// Credential issuance and lookup over a [`CredentialRepository`].
#[derive(Clone)]
pub struct CredentialStore {
    repo: Arc<dyn CredentialRepository>,
    cipher: AuditCipher,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("cipher", &self.cipher)
            .finish_non_exhaustive()
    }
}

impl CredentialStore {
    pub fn new(repo: Arc<dyn CredentialRepository>, cipher: AuditCipher) -> Self {
        Self { repo, cipher }
    }

    /// Store over a fresh in-memory repository.
    pub fn in_memory(cipher: AuditCipher) -> Self {
        Self::new(Arc::new(InMemoryCredentialRepository::new()), cipher)
    }

    /// Issue a new credential for `owner`.
    ///
    /// When `secret` is `None` a random alphanumeric secret is generated.
    /// Audit encryption failure degrades to a non-displayable credential
    /// rather than failing issuance.
    pub fn issue(
        &self,
        owner: &str,
        secret: Option<SecretToken>,
    ) -> Result<IssuedCredential, StoreError> {
        let owner = owner.trim();
        if owner.is_empty() || owner.chars().count() > MAX_OWNER_LENGTH {
            return Err(StoreError::InvalidOwner(format!(
                "owner must be 1 to {MAX_OWNER_LENGTH} characters"
            )));
        }

        let secret = secret.unwrap_or_else(SecretToken::generate);
        let sealed = self.encrypt_for_audit(&secret);
        let credential = Credential {
            id: Uuid::new_v4(),
            lookup_hash: Self::hash(&secret),
            audit_ciphertext: sealed.ciphertext,
            audit_displayable: sealed.displayable,
            preview_suffix: secret.preview_suffix(),
            owner: owner.to_string(),
            created_at: Timestamp::now(),
            active: true,
        };
        self.repo.insert(credential.clone())?;

        tracing::info!(
            credential_id = %credential.id,
            owner = %credential.owner,
            preview = %credential.masked_preview(),
            audit_displayable = credential.audit_displayable,
            "credential issued"
        );
        Ok(IssuedCredential { credential, secret })
    }

    /// Lookup hash of a secret.
    pub fn hash(secret: &SecretToken) -> KeyHash {
        hash_secret(secret)
    }

    /// Encrypt a secret for later operator display, or return the
    /// non-displayable sentinel when encryption is not possible.
    pub fn encrypt_for_audit(&self, secret: &SecretToken) -> SealedSecret {
        match self.cipher.encrypt(secret) {
            Ok(ciphertext) => SealedSecret {
                ciphertext,
                displayable: true,
            },
            Err(err) => {
                tracing::warn!(error = %err, "audit encryption unavailable; secret will not be displayable");
                SealedSecret::unavailable()
            }
        }
    }

    /// Recover the plaintext of a displayable credential.
    pub fn reveal_for_audit(&self, credential: &Credential) -> Result<Option<SecretToken>, StoreError> {
        if !credential.audit_displayable || credential.audit_ciphertext == AUDIT_UNAVAILABLE {
            return Ok(None);
        }
        Ok(Some(self.cipher.decrypt(&credential.audit_ciphertext)?))
    }

    /// Resolve a presented token to an active credential.
    ///
    /// Unknown and inactive credentials both yield `None`.
    pub fn authenticate(&self, token: &SecretToken) -> Result<Option<Credential>, StoreError> {
        let hash = Self::hash(token);
        Ok(self.repo.find_by_hash(&hash)?.filter(|c| c.active))
    }

    /// Constant-time check that `token` hashes to the credential's lookup hash.
    pub fn verify(credential: &Credential, token: &SecretToken) -> bool {
        Self::hash(token).ct_eq(&credential.lookup_hash)
    }

    pub fn set_active(&self, id: Uuid, active: bool) -> Result<Credential, StoreError> {
        let credential = self.repo.set_active(id, active)?;
        tracing::info!(credential_id = %id, active, "credential active flag changed");
        Ok(credential)
    }

    pub fn get(&self, id: Uuid) -> Result<Credential, StoreError> {
        self.repo.get(id)?.ok_or(StoreError::NotFound(id))
    }

    pub fn list(&self) -> Result<Vec<Credential>, StoreError> {
        self.repo.list()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyed_store() -> CredentialStore {
        CredentialStore::in_memory(AuditCipher::new([3u8; 32]))
    }

    #[test]
    fn issue_generates_secret_and_stores_hash_only() {
        let store = keyed_store();
        let issued = store.issue("  Test Owner  ", None).unwrap();
        let c = &issued.credential;
        assert_eq!(c.owner, "Test Owner");
        assert!(c.active);
        assert_eq!(issued.secret.as_str().len(), nidv_crypto::GENERATED_SECRET_LENGTH);
        assert_eq!(c.lookup_hash, hash_secret(&issued.secret));
        assert_eq!(c.preview_suffix, issued.secret.preview_suffix());
        assert!(c.audit_displayable);

        let json = serde_json::to_string(c).unwrap();
        assert!(!json.contains(issued.secret.as_str()));
    }

    #[test]
    fn issue_with_supplied_secret() {
        let store = keyed_store();
        let secret = SecretToken::new("test_key_12345678901234567890").unwrap();
        let issued = store.issue("owner", Some(secret)).unwrap();
        assert_eq!(issued.credential.masked_preview(), "****7890");
    }

    #[test]
    fn duplicate_secret_conflicts() {
        let store = keyed_store();
        let secret = SecretToken::new("duplicate-secret").unwrap();
        store.issue("a", Some(secret.clone())).unwrap();
        assert!(matches!(store.issue("b", Some(secret)), Err(StoreError::Conflict(_))));
    }

    #[test]
    fn owner_bounds() {
        let store = keyed_store();
        assert!(matches!(store.issue("   ", None), Err(StoreError::InvalidOwner(_))));
        assert!(matches!(store.issue(&"x".repeat(101), None), Err(StoreError::InvalidOwner(_))));
        assert!(store.issue(&"x".repeat(100), None).is_ok());
    }

    #[test]
    fn authenticate_resolves_active_only() {
        let store = keyed_store();
        let issued = store.issue("owner", None).unwrap();
        let found = store.authenticate(&issued.secret).unwrap().unwrap();
        assert_eq!(found.id, issued.credential.id);

        store.set_active(issued.credential.id, false).unwrap();
        assert!(store.authenticate(&issued.secret).unwrap().is_none());

        store.set_active(issued.credential.id, true).unwrap();
        assert!(store.authenticate(&issued.secret).unwrap().is_some());
    }

    #[test]
    fn unknown_token_is_none() {
        let store = keyed_store();
        store.issue("owner", None).unwrap();
        let other = SecretToken::new("not-a-real-key").unwrap();
        assert!(store.authenticate(&other).unwrap().is_none());
    }

    #[test]
    fn verify_compares_hashes() {
        let store = keyed_store();
        let issued = store.issue("owner", None).unwrap();
        assert!(CredentialStore::verify(&issued.credential, &issued.secret));
        let other = SecretToken::new("wrong").unwrap();
        assert!(!CredentialStore::verify(&issued.credential, &other));
    }

    #[test]
    fn reveal_round_trips_through_cipher() {
        let store = keyed_store();
        let issued = store.issue("owner", None).unwrap();
        let revealed = store.reveal_for_audit(&issued.credential).unwrap().unwrap();
        assert_eq!(revealed, issued.secret);
    }

    #[test]
    fn missing_key_degrades_to_sentinel() {
        let store = CredentialStore::in_memory(AuditCipher::disabled());
        let issued = store.issue("owner", None).unwrap();
        assert!(!issued.credential.audit_displayable);
        assert_eq!(issued.credential.audit_ciphertext, AUDIT_UNAVAILABLE);
        assert!(store.reveal_for_audit(&issued.credential).unwrap().is_none());
        // Authentication never depends on the audit copy.
        assert!(store.authenticate(&issued.secret).unwrap().is_some());
    }

    #[test]
    fn set_active_unknown_id() {
        let store = keyed_store();
        let id = Uuid::new_v4();
        assert!(matches!(store.set_active(id, false), Err(StoreError::NotFound(x)) if x == id));
    }

    #[test]
    fn json_file_repository_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let cipher = AuditCipher::new([5u8; 32]);

        let repo = Arc::new(JsonFileCredentialRepository::open(&path).unwrap());
        let store = CredentialStore::new(repo, cipher.clone());
        let issued = store.issue("owner", None).unwrap();
        store.set_active(issued.credential.id, false).unwrap();
        assert!(path.exists());

        let reopened = Arc::new(JsonFileCredentialRepository::open(&path).unwrap());
        let store = CredentialStore::new(reopened, cipher);
        let loaded = store.get(issued.credential.id).unwrap();
        assert!(!loaded.active);
        assert_eq!(loaded.lookup_hash, issued.credential.lookup_hash);
        assert!(store.authenticate(&issued.secret).unwrap().is_none());

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(!raw.contains(issued.secret.as_str()));
    }

    #[test]
    fn json_file_repository_rejects_duplicate_hashes_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let store = CredentialStore::in_memory(AuditCipher::disabled());
        let issued = store.issue("owner", None).unwrap();
        let mut twin = issued.credential.clone();
        twin.id = Uuid::new_v4();
        let doc = CredentialDocument {
            version: DOCUMENT_VERSION,
            credentials: vec![issued.credential, twin],
        };
        std::fs::write(&path, serde_json::to_vec(&doc).unwrap()).unwrap();
        assert!(matches!(
            JsonFileCredentialRepository::open(&path),
            Err(StoreError::Conflict(_))
        ));
    }

    fn file_store(path: &Path) -> CredentialStore {
        let repo = Arc::new(JsonFileCredentialRepository::open(path).unwrap());
        CredentialStore::new(repo, AuditCipher::disabled())
    }

    #[test]
    fn deactivation_by_another_handle_is_seen_on_next_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let operator = file_store(&path);
        let issued = operator.issue("owner", None).unwrap();

        let server = file_store(&path);
        assert!(server.authenticate(&issued.secret).unwrap().is_some());

        file_store(&path).set_active(issued.credential.id, false).unwrap();
        assert!(server.authenticate(&issued.secret).unwrap().is_none());

        file_store(&path).set_active(issued.credential.id, true).unwrap();
        assert!(server.authenticate(&issued.secret).unwrap().is_some());
    }

    #[test]
    fn issuance_by_another_handle_is_seen_without_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let server = file_store(&path);
        assert!(server.list().unwrap().is_empty());

        let issued = file_store(&path).issue("late", None).unwrap();
        assert!(server.authenticate(&issued.secret).unwrap().is_some());
        assert_eq!(server.list().unwrap().len(), 1);
    }

    #[test]
    fn interleaved_writers_keep_each_others_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let a = file_store(&path);
        let b = file_store(&path);

        let first = a.issue("first", None).unwrap();
        let second = b.issue("second", None).unwrap();
        b.set_active(first.credential.id, false).unwrap();
        a.set_active(second.credential.id, false).unwrap();

        let reopened = file_store(&path);
        let all = reopened.list().unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|c| !c.active));
        assert!(reopened.get(first.credential.id).is_ok());
        assert!(reopened.get(second.credential.id).is_ok());
    }

    #[test]
    fn concurrent_writers_lose_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::thread::scope(|scope| {
            for i in 0..8 {
                let path = &path;
                scope.spawn(move || {
                    let store = file_store(path);
                    for j in 0..5 {
                        store.issue(&format!("writer-{i}-{j}"), None).unwrap();
                    }
                });
            }
        });
        assert_eq!(file_store(&path).list().unwrap().len(), 40);
    }

    #[test]
    fn failed_write_leaves_no_live_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let store = file_store(&path);
        // A directory where the temporary document goes makes the write fail.
        let blocker = dir.path().join("credentials.json.tmp");
        std::fs::create_dir(&blocker).unwrap();

        let secret = SecretToken::new("retry-after-failure-0001").unwrap();
        assert!(matches!(
            store.issue("owner", Some(secret.clone())),
            Err(StoreError::Io(_))
        ));
        assert!(store.authenticate(&secret).unwrap().is_none());
        assert!(store.list().unwrap().is_empty());

        std::fs::remove_dir(&blocker).unwrap();
        let issued = store.issue("owner", Some(secret.clone())).unwrap();
        assert!(store.authenticate(&secret).unwrap().is_some());
        assert_eq!(file_store(&path).get(issued.credential.id).unwrap().owner, "owner");
    }

    #[test]
    fn failed_toggle_keeps_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let store = file_store(&path);
        let issued = store.issue("owner", None).unwrap();
        let blocker = dir.path().join("credentials.json.tmp");
        std::fs::create_dir(&blocker).unwrap();

        assert!(store.set_active(issued.credential.id, false).is_err());
        assert!(store.authenticate(&issued.secret).unwrap().is_some());
        assert!(store.get(issued.credential.id).unwrap().active);
    }

    #[test]
    fn missing_parent_directory_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent").join("credentials.json");
        let store = file_store(&path);
        let secret = SecretToken::new("never-persisted-0002").unwrap();
        assert!(store.issue("owner", Some(secret.clone())).is_err());
        assert!(store.authenticate(&secret).unwrap().is_none());
    }
}
