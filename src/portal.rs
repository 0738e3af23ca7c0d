//! The voting-portal file: the side channel through which voters hand their
//! public-key identities to the authorities ahead of registration. One
//! decimal `h` per line, appended by each voter, read back in full by the
//! registration step.

use crate::*;
use num_bigint_dig::BigUint;
use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

/// Remove a stale portal file from a previous run, if any.
pub fn reset<P: AsRef<Path>>(path: P) -> Result<(), Error> {
    match fs::remove_file(path.as_ref()) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Append one voter identity to the portal file, creating it if needed.
pub fn publish_public_key<P: AsRef<Path>>(path: P, identity: &BigUint) -> Result<(), Error> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path.as_ref())?;
    writeln!(file, "{}", identity)?;
    Ok(())
}

/// Read every published identity, in publication order. A line that does
/// not parse as a decimal integer is reported with its 1-based line number.
pub fn read_public_keys<P: AsRef<Path>>(path: P) -> Result<Vec<BigUint>, Error> {
    let contents = fs::read_to_string(path.as_ref())?;

    let mut identities = Vec::new();
    for (i, line) in contents.lines().enumerate() {
        let identity =
            BigUint::from_str(line.trim()).map_err(|_| Error::MalformedPortalLine(i + 1))?;
        identities.push(identity);
    }
    Ok(identities)
}
