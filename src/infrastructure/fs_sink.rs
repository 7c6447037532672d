use crate::domain::ports::ReportSink;
use crate::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// Filesystem-backed report sink: a bucket is a directory under `root` and a
/// key is a relative path inside it. Stands in for the object store.
#[derive(Debug, Clone)]
pub struct FsReportSink {
    root: PathBuf,
}

impl FsReportSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        self.root.join(bucket).join(key)
    }
}

#[async_trait]
impl ReportSink for FsReportSink {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<()> {
        let path = self.object_path(bucket, key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        self.object_path(bucket, key).display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_upload_creates_nested_key() {
        let dir = tempdir().unwrap();
        let sink = FsReportSink::new(dir.path());

        sink.upload(
            "card-reports",
            "reports/abc/report.csv",
            b"uuid,cardId\n".to_vec(),
            "text/csv",
        )
        .await
        .unwrap();

        let stored = std::fs::read(dir.path().join("card-reports/reports/abc/report.csv")).unwrap();
        assert_eq!(stored, b"uuid,cardId\n");
    }

    #[tokio::test]
    async fn test_public_url_is_object_path() {
        let dir = tempdir().unwrap();
        let sink = FsReportSink::new(dir.path());
        let url = sink.public_url("bucket", "key.csv");
        assert!(url.ends_with("bucket/key.csv"));
    }
}
