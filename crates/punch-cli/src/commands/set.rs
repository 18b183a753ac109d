//! Set command: generic property mutation.

use anyhow::Result;
use chrono::NaiveDateTime;

use punch_core::keys;
use punch_store::EntryStore;

/// `args` is `[STAMP] PROPERTY VALUE...`; with exactly two arguments the most
/// recent entry is the target, and a multi-word value is rejoined with
/// spaces.
pub fn run(store: &mut EntryStore, args: &[String], now: NaiveDateTime) -> Result<()> {
    let (stamp, property, value) = split_args(args)?;
    let stamp = match stamp {
        Some(stamp) => stamp,
        None => {
            let (key, _) = store
                .latest()?
                .ok_or_else(|| anyhow::anyhow!("no entries recorded"))?;
            keys::stamp_of(&key)?.to_string()
        }
    };
    store.set_property(&stamp, &property, &value, None, now)?;
    Ok(())
}

fn split_args(args: &[String]) -> Result<(Option<String>, String, String)> {
    match args {
        [property, value] => Ok((None, property.clone(), value.clone())),
        [stamp, property, rest @ ..] if !rest.is_empty() => {
            Ok((Some(stamp.clone()), property.clone(), rest.join(" ")))
        }
        _ => anyhow::bail!("usage: punch set [STAMP] PROPERTY VALUE"),
    }
}
