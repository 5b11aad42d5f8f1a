//! Versioned token resolution: "what did token K look like at height H".
//!
//! Pure reads. Works against committed state or against an in-flight block,
//! whatever [`StateRead`] it is handed.

use crate::error::{LedgerError, LedgerResult};
use crate::storage::{keys, read_record, StateRead};
use crate::token::{BlockHeight, Token, TokenBase, TokenExt, TokenExtOnBlockNum, TokenKey};

pub fn load_base<V: StateRead + ?Sized>(
    view: &V,
    key: &TokenKey,
) -> LedgerResult<Option<TokenBase>> {
    read_record(view, &keys::token_base(key))
}

/// Change heights for `key`. An absent index reads as an empty history.
pub fn load_history<V: StateRead + ?Sized>(
    view: &V,
    key: &TokenKey,
) -> LedgerResult<TokenExtOnBlockNum> {
    Ok(read_record(view, &keys::token_ext_index(key))?.unwrap_or_default())
}

fn load_snapshot<V: StateRead + ?Sized>(
    view: &V,
    key: &TokenKey,
    height: BlockHeight,
) -> LedgerResult<TokenExt> {
    read_record(view, &keys::token_ext(key, height))?
        .ok_or_else(|| LedgerError::NotFound(keys::token_ext(key, height)))
}

/// The `TokenExt` in effect at `height`.
///
/// Fails with [`LedgerError::NotFound`] when the token has no base record,
/// no extension history, or did not exist yet at `height`.
pub fn resolve<V: StateRead + ?Sized>(
    view: &V,
    key: &TokenKey,
    height: BlockHeight,
) -> LedgerResult<TokenExt> {
    if load_base(view, key)?.is_none() {
        return Err(LedgerError::NotFound(keys::token_base(key)));
    }
    let history = load_history(view, key)?;
    if history.is_empty() {
        return Err(LedgerError::NotFound(keys::token_ext_index(key)));
    }
    let effective = history.effective_height(height).ok_or_else(|| {
        LedgerError::NotFound(format!("token {key} at height {height}"))
    })?;
    load_snapshot(view, key, effective)
}

/// Base plus the snapshot in effect at `height`.
pub fn resolve_token<V: StateRead + ?Sized>(
    view: &V,
    key: &TokenKey,
    height: BlockHeight,
) -> LedgerResult<Token> {
    let base = load_base(view, key)?.ok_or_else(|| LedgerError::NotFound(keys::token_base(key)))?;
    let ext = resolve(view, key, height)?;
    Ok(Token::new(base, ext))
}

/// The most recent snapshot and the height it was written at.
pub fn resolve_latest<V: StateRead + ?Sized>(
    view: &V,
    key: &TokenKey,
) -> LedgerResult<(BlockHeight, TokenExt)> {
    let latest = load_history(view, key)?
        .latest()
        .ok_or_else(|| LedgerError::NotFound(keys::token_ext_index(key)))?;
    Ok((latest, load_snapshot(view, key, latest)?))
}
