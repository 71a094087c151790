use std::path::Path;

use anyhow::{bail, Context, Result};
use compat_config::log_cli_debug;
use compat_dirent::{DirStream, Position};

/// Walk `directory` printing `telldir` before each read, then seek back to
/// every recorded position and check the same name is read again.
///
/// Two names with the same hash make a position ambiguous; such entries
/// are reported as mismatches.
pub fn run(directory: &Path) -> Result<()> {
    let mut dir = DirStream::<u8>::open(directory)
        .with_context(|| format!("cannot open {}", directory.display()))?;

    let mut seen: Vec<(Position, Vec<u8>)> = Vec::new();
    loop {
        let position = dir.tell()?;
        let Some(entry) = dir.read()? else {
            println!("{:>10} <end>", position);
            break;
        };
        println!("{:>10} {}", position, entry.name_lossy());
        seen.push((position, entry.name().to_vec()));
    }

    let mut mismatched = 0;
    for (position, name) in &seen {
        let matched = dir.seek(*position).is_ok()
            && matches!(dir.read()?, Some(entry) if entry.name() == name.as_slice());
        if !matched {
            mismatched += 1;
            log_cli_debug!("Seek round trip failed", position = *position);
            println!(
                "mismatch at {}: expected {}",
                position,
                String::from_utf8_lossy(name)
            );
            dir.rewind();
        }
    }

    println!("{} positions checked, {} mismatched", seen.len(), mismatched);
    if mismatched > 0 {
        bail!("{} of {} positions did not round-trip", mismatched, seen.len());
    }
    Ok(())
}
