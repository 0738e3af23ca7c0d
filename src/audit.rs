use crate::*;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Line-oriented audit log of the chain: one block per line, in the block's
/// display form. Diagnostic output, not a format the ledger reads back.
///
/// The file is truncated when the log is created and appended to per block,
/// so its contents always mirror the in-memory chain at the point of each
/// accepted append. Each write opens, appends, flushes and closes the file;
/// no handle is held across ledger calls.
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    /// Create (or truncate) the audit file for a fresh run.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        File::create(path.as_ref())?;
        Ok(AuditLog {
            path: path.as_ref().to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, block: &Block) -> Result<(), Error> {
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        writeln!(file, "{}", block)?;
        file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn create_truncates_and_append_adds_lines() {
        let path = std::env::temp_dir().join(format!("votechain_audit_{}.txt", std::process::id()));
        fs::write(&path, "stale contents\n").unwrap();

        let log = AuditLog::create(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");

        let group = GroupParams::generate(64).unwrap();
        let keypair = SchnorrKeyPair::generate(&group, 64);
        let tx = Transaction::plain(keypair.public().clone(), keypair.sign("m"), "m".into());
        let block = Block::new(tx, GENESIS_PREVIOUS_HASH.into(), 0);

        log.append(&block).unwrap();
        log.append(&block).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert_eq!(contents.lines().next().unwrap(), block.to_string());

        fs::remove_file(&path).unwrap();
    }
}
