use crate::scheduler::RunReport;
use anyhow::Context;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub trait ReportStorage {
    /// Charge un rapport d'exécution.
    fn load(&self) -> anyhow::Result<RunReport>;
    /// Sauvegarde de manière atomique.
    fn save(&self, report: &RunReport) -> anyhow::Result<()>;
}

pub struct JsonReportStorage {
    path: PathBuf,
}

impl JsonReportStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportStorage for JsonReportStorage {
    fn load(&self) -> anyhow::Result<RunReport> {
        let data =
            fs::read(&self.path).with_context(|| format!("reading {}", self.path.display()))?;
        let report: RunReport = serde_json::from_slice(&data)
            .with_context(|| format!("parsing report {}", self.path.display()))?;
        Ok(report)
    }

    fn save(&self, report: &RunReport) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(report)?;
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).with_context(|| "creating temp file")?;
        tmp.write_all(&json)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).with_context(|| "atomic rename")?;
        Ok(())
    }
}
