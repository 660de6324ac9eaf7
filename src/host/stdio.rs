//! stdin/stdout JSON 桥接
//!
//! 从输入逐行读取 JSON 命令，交给命令处理器，每个响应写成一行 JSON。
//! stdout 专用于协议，所有日志都写到 stderr。

use crate::error::AppResult;
use crate::orchestrator::CommandHandler;
use crate::protocol::{ServiceCommand, ServiceResponse};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tracing::{debug, info, warn};

/// 在 stdin/stdout 上运行桥接，直到 stdin 关闭
pub async fn run_stdio_bridge<C: CommandHandler>(handler: &C) -> AppResult<()> {
    let reader = BufReader::new(tokio::io::stdin());
    let mut writer = BufWriter::new(tokio::io::stdout());
    serve_lines(handler, reader, &mut writer).await
}

/// 在任意输入输出上运行桥接，直到输入结束
pub async fn serve_lines<C, R, W>(handler: &C, mut reader: R, writer: &mut W) -> AppResult<()>
where
    C: CommandHandler,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            info!("输入已关闭，桥接退出");
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<ServiceCommand>(trimmed) {
            Ok(command) => {
                debug!("收到命令: {:?}", command);
                handler.handle(command).await
            }
            Err(e) => {
                warn!("⚠️ 无法解析命令: {} | 原始内容: {}", e, trimmed);
                ServiceResponse::error(format!("无法解析命令: {}", e))
            }
        };

        write_line(writer, &serde_json::to_string(&response)?).await?;
    }

    Ok(())
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, json: &str) -> AppResult<()> {
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
