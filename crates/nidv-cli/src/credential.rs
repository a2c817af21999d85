//! # Credential Subcommands
//!
//! Issue, list, toggle and reveal API credentials.
//!
//! ## Security Invariant
//!
//! A plaintext secret is printed at most twice in its life: once by
//! `issue`, and again only by an explicit `reveal` when an audit key is
//! configured. Neither the secret nor its lookup hash appears in `list`
//! output.

use anyhow::{bail, Context, Result};
use clap::Args;
use uuid::Uuid;

use nidv_api::credentials::{Credential, CredentialStore, IssuedCredential};
use nidv_crypto::{SecretToken, GENERATED_SECRET_LENGTH};

use crate::StoreOptions;

/// Arguments for `nidv issue`.
#[derive(Args, Debug)]
pub struct IssueArgs {
    /// Free-text label for the credential holder (1 to 100 characters).
    #[arg(long)]
    pub owner: String,

    /// Length of the generated secret (20 to 64).
    #[arg(long, default_value_t = GENERATED_SECRET_LENGTH, conflicts_with = "secret")]
    pub length: usize,

    /// Use this secret instead of generating one. Visible in shell history;
    /// prefer generation.
    #[arg(long)]
    pub secret: Option<String>,
}

/// Arguments for `nidv list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Emit JSON instead of a table.
    #[arg(long)]
    pub json: bool,

    /// Include inactive credentials.
    #[arg(long, short)]
    pub all: bool,
}

/// Arguments for `nidv activate`, `nidv deactivate` and `nidv reveal`.
#[derive(Args, Debug)]
pub struct CredentialIdArgs {
    /// Credential id (UUID).
    pub id: Uuid,
}

/// Issue a credential.
pub fn issue(store: &CredentialStore, args: &IssueArgs) -> Result<IssuedCredential> {
    let secret = match &args.secret {
        Some(raw) => SecretToken::new(raw.as_str()).context("invalid secret")?,
        None => SecretToken::generate_with_length(args.length).context("invalid secret length")?,
    };
    store
        .issue(&args.owner, Some(secret))
        .context("failed to issue credential")
}

/// Credentials to show, oldest first.
pub fn list(store: &CredentialStore, args: &ListArgs) -> Result<Vec<Credential>> {
    let all = store.list().context("failed to list credentials")?;
    Ok(all.into_iter().filter(|c| args.all || c.active).collect())
}

/// Set the active flag.
pub fn set_active(store: &CredentialStore, id: Uuid, active: bool) -> Result<Credential> {
    store
        .set_active(id, active)
        .with_context(|| format!("failed to update credential {id}"))
}

/// Decrypt the audit copy of a credential's secret.
pub fn reveal(store: &CredentialStore, id: Uuid) -> Result<SecretToken> {
    let credential = store.get(id).with_context(|| format!("credential {id}"))?;
    match store.reveal_for_audit(&credential).context("failed to decrypt audit copy")? {
        Some(secret) => Ok(secret),
        None => bail!("credential {id} was issued without an audit key and cannot be displayed"),
    }
}

/// Execute `nidv issue`.
pub fn run_issue(opts: &StoreOptions, args: &IssueArgs) -> Result<u8> {
    let store = opts.open()?;
    let issued = issue(&store, args)?;
    let c = &issued.credential;
    println!("OK: issued credential {}", c.id);
    println!("  Owner:   {}", c.owner);
    println!("  Preview: {}", c.masked_preview());
    println!("  Secret:  {}", issued.secret.as_str());
    println!();
    println!("Store this secret now. It will not be shown again by `issue`.");
    if !c.audit_displayable {
        println!("WARNING: no audit key configured; `reveal` will not work for this credential.");
    }
    Ok(0)
}

/// Execute `nidv list`.
pub fn run_list(opts: &StoreOptions, args: &ListArgs) -> Result<u8> {
    let store = opts.open()?;
    let credentials = list(&store, args)?;

    if args.json {
        let rows: Vec<serde_json::Value> = credentials
            .iter()
            .map(|c| {
                serde_json::json!({
                    "id": c.id,
                    "owner": c.owner,
                    "preview": c.masked_preview(),
                    "active": c.active,
                    "audit_displayable": c.audit_displayable,
                    "created_at": c.created_at.to_iso8601(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(0);
    }

    if credentials.is_empty() {
        println!("No credentials.");
        return Ok(0);
    }
    println!(
        "{:<36}  {:<8}  {:<6}  {:<20}  OWNER",
        "ID", "PREVIEW", "ACTIVE", "CREATED"
    );
    for c in &credentials {
        println!(
            "{:<36}  {:<8}  {:<6}  {:<20}  {}",
            c.id,
            c.masked_preview(),
            if c.active { "yes" } else { "no" },
            c.created_at.to_iso8601(),
            c.owner
        );
    }
    Ok(0)
}

/// Execute `nidv activate` / `nidv deactivate`.
pub fn run_set_active(opts: &StoreOptions, args: &CredentialIdArgs, active: bool) -> Result<u8> {
    let store = opts.open()?;
    let c = set_active(&store, args.id, active)?;
    let state = if c.active { "active" } else { "inactive" };
    println!("OK: credential {} ({}) is now {state}", c.id, c.masked_preview());
    Ok(0)
}

/// Execute `nidv reveal`.
pub fn run_reveal(opts: &StoreOptions, args: &CredentialIdArgs) -> Result<u8> {
    if opts.audit_key.is_none() {
        bail!("NIDV_AUDIT_KEY (or --audit-key) is required to reveal a credential");
    }
    let store = opts.open()?;
    let secret = reveal(&store, args.id)?;
    tracing::warn!(credential_id = %args.id, "credential secret revealed");
    println!("{}", secret.as_str());
    Ok(0)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use nidv_crypto::AuditCipher;

    use super::*;

    fn options(dir: &Path, audit_key: Option<String>) -> StoreOptions {
        StoreOptions {
            credentials_file: dir.join("credentials.json"),
            audit_key,
        }
    }

    fn issue_args(owner: &str) -> IssueArgs {
        IssueArgs {
            owner: owner.to_string(),
            length: GENERATED_SECRET_LENGTH,
            secret: None,
        }
    }

    #[test]
    fn issue_persists_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path(), None);
        let issued = issue(&opts.open().unwrap(), &issue_args("Billing")).unwrap();
        assert_eq!(issued.secret.as_str().len(), GENERATED_SECRET_LENGTH);

        let reopened = opts.open().unwrap();
        let found = reopened.authenticate(&issued.secret).unwrap().unwrap();
        assert_eq!(found.owner, "Billing");
    }

    #[test]
    fn issue_respects_length_and_supplied_secret() {
        let dir = tempfile::tempdir().unwrap();
        let store = options(dir.path(), None).open().unwrap();

        let mut args = issue_args("a");
        args.length = 40;
        assert_eq!(issue(&store, &args).unwrap().secret.as_str().len(), 40);

        args.length = 10;
        assert!(issue(&store, &args).is_err());

        let args = IssueArgs {
            owner: "b".into(),
            length: GENERATED_SECRET_LENGTH,
            secret: Some("operator-chosen-secret-0001".into()),
        };
        assert_eq!(issue(&store, &args).unwrap().credential.preview_suffix, "0001");
    }

    #[test]
    fn list_hides_inactive_unless_all() {
        let dir = tempfile::tempdir().unwrap();
        let store = options(dir.path(), None).open().unwrap();
        let first = issue(&store, &issue_args("first")).unwrap();
        issue(&store, &issue_args("second")).unwrap();
        set_active(&store, first.credential.id, false).unwrap();

        let active = list(&store, &ListArgs { json: false, all: false }).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].owner, "second");
        let everything = list(&store, &ListArgs { json: false, all: true }).unwrap();
        assert_eq!(everything.len(), 2);
    }

    #[test]
    fn toggles_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path(), None);
        let issued = issue(&opts.open().unwrap(), &issue_args("x")).unwrap();
        set_active(&opts.open().unwrap(), issued.credential.id, false).unwrap();
        assert!(!opts.open().unwrap().get(issued.credential.id).unwrap().active);
        set_active(&opts.open().unwrap(), issued.credential.id, true).unwrap();
        assert!(opts.open().unwrap().get(issued.credential.id).unwrap().active);
    }

    #[test]
    fn unknown_id_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = options(dir.path(), None).open().unwrap();
        assert!(set_active(&store, Uuid::new_v4(), false).is_err());
        assert!(reveal(&store, Uuid::new_v4()).is_err());
    }

    #[test]
    fn reveal_requires_displayable_credential() {
        let dir = tempfile::tempdir().unwrap();
        let key = AuditCipher::generate_key_base64();
        let keyed = options(dir.path(), Some(key));
        let issued = issue(&keyed.open().unwrap(), &issue_args("keyed")).unwrap();
        let revealed = reveal(&keyed.open().unwrap(), issued.credential.id).unwrap();
        assert_eq!(revealed, issued.secret);

        let unkeyed = options(dir.path(), None);
        let plain = issue(&unkeyed.open().unwrap(), &issue_args("plain")).unwrap();
        assert!(reveal(&keyed.open().unwrap(), plain.credential.id).is_err());
    }

    #[test]
    fn invalid_audit_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(options(dir.path(), Some("not base64!".into())).open().is_err());
    }
}
