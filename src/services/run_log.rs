//! 运行日志服务 - 业务能力层
//!
//! 只负责"写运行日志文件"能力，每个目标一行，不关心流程

use anyhow::{Context, Result};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// 运行日志写入服务
///
/// 职责：
/// - 启动时写入文件头
/// - 每个目标处理结束后追加一行结果
#[derive(Clone, Debug)]
pub struct RunLog {
    path: String,
}

impl RunLog {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// 写入文件头（覆盖旧文件）
    pub async fn init(&self) -> Result<()> {
        let header = format!(
            "{}\n帖子自动化运行日志 - {}\n{}\n\n",
            "=".repeat(60),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            "=".repeat(60)
        );
        fs::write(&self.path, header)
            .await
            .with_context(|| format!("无法初始化运行日志: {}", self.path))?;
        Ok(())
    }

    async fn append(&self, line: String) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("无法打开运行日志: {}", self.path))?;
        file.write_all(line.as_bytes()).await?;
        Ok(())
    }

    /// 记录一个目标处理成功
    pub async fn write_success(&self, url: &str, posts_processed: usize) -> Result<()> {
        debug!("写入运行日志: {} | {} 条", url, posts_processed);
        self.append(format!(
            "[{}] ✅ {} | 处理帖子: {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            url,
            posts_processed
        ))
        .await
    }

    /// 记录一个目标处理失败
    pub async fn write_failure(&self, url: &str, reason: &str) -> Result<()> {
        debug!("写入运行日志: {} | 失败", url);
        self.append(format!(
            "[{}] ❌ {} | 错误: {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            url,
            reason
        ))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lines_are_appended_after_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.txt");
        let log = RunLog::new(path.display().to_string());

        log.init().await.unwrap();
        log.write_success("https://example.test/company/acme/posts/", 2)
            .await
            .unwrap();
        log.write_failure("https://example.test/in/jane/recent-activity/all/", "超时")
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(&"=".repeat(60)));
        assert!(content.contains("company/acme/posts/ | 处理帖子: 2"));
        assert!(content.contains("recent-activity/all/ | 错误: 超时"));
    }

    #[tokio::test]
    async fn append_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.txt");
        RunLog::new(path.display().to_string())
            .write_success("https://example.test", 0)
            .await
            .unwrap();
        assert!(path.exists());
    }
}
