use serde::Deserialize;

/// One backup (snapshot) entry from the `pbmBackups` collection.
///
/// The name is usually an RFC 3339 timestamp of when the backup started,
/// which is why sorting by name descending yields the most recent backup
/// first. The status is a free-form vocabulary owned by PBM ("done",
/// "error", "running", ...); we never enumerate it ourselves.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct BackupEntry {
    pub name: String,
    pub status: String,
}

impl BackupEntry {
    pub fn new(name: impl Into<String>, status: impl Into<String>) -> Self {
        BackupEntry {
            name: name.into(),
            status: status.into(),
        }
    }
}
