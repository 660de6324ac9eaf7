use thiserror::Error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// 键值存储错误
    #[error("存储错误: {0}")]
    Store(#[from] StoreError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 自动化流程错误
    #[error("自动化错误: {0}")]
    Automation(#[from] AutomationError),
    /// JSON 序列化/反序列化错误
    #[error("JSON解析失败: {0}")]
    Json(#[from] serde_json::Error),
    /// 标准输入输出错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
    /// 其他错误
    #[error("错误: {0}")]
    Other(String),
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 创建页面失败
    #[error("创建页面失败: {source}")]
    PageCreationFailed { source: BoxedSource },
    /// 导航失败
    #[error("导航到 {url} 失败: {source}")]
    NavigationFailed { url: String, source: BoxedSource },
    /// 执行脚本失败
    #[error("执行脚本失败: {source}")]
    ScriptExecutionFailed { source: BoxedSource },
    /// 脚本返回了无法识别的结果
    #[error("脚本返回结果异常: {detail}")]
    UnexpectedScriptResult { detail: String },
}

/// 键值存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 读取存储文件失败
    #[error("读取存储失败 ({path}): {source}")]
    ReadFailed { path: String, source: BoxedSource },
    /// 写入存储文件失败
    #[error("写入存储失败 ({path}): {source}")]
    WriteFailed { path: String, source: BoxedSource },
    /// 存储内容不是合法的 JSON 对象
    #[error("存储内容损坏 ({path}): {detail}")]
    Corrupted { path: String, detail: String },
    /// 某个键的值无法解析
    #[error("键 {key} 的值无法解析: {source}")]
    InvalidValue { key: String, source: BoxedSource },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 定时时间格式错误，应为 HH:MM
    #[error("定时时间格式错误: '{value}' (应为 HH:MM)")]
    InvalidScheduleTime { value: String },
    /// 无法识别的目标主页
    #[error("无法识别的目标: '{value}'")]
    InvalidTarget { value: String },
    /// 不属于自动化设置的键
    #[error("不允许写入的配置项: '{key}'")]
    UnknownSettingKey { key: String },
    /// 配置文件解析失败
    #[error("配置文件解析失败 ({path}): {source}")]
    FileParseFailed { path: String, source: BoxedSource },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
}

/// 自动化流程错误
///
/// 这些错误只会终止单个目标的处理，不会影响其余目标
#[derive(Debug, Error)]
pub enum AutomationError {
    /// 页面打开或导航失败
    #[error("目标页面无法打开 ({url}): {source}")]
    TargetUnreachable { url: String, source: Box<AppError> },
    /// 页面在超时时间内没有响应命令
    #[error("页面无响应 ({url}): {reason}")]
    PageUnresponsive { url: String, reason: String },
    /// 已有一次运行正在进行
    #[error("已有自动化任务在运行，本次触发被忽略")]
    RunInProgress,
}

// ========== 从常见错误类型转换 ==========

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Browser(BrowserError::ScriptExecutionFailed {
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建导航失败错误
    pub fn navigation_failed(
        url: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Browser(BrowserError::NavigationFailed {
            url: url.into(),
            source: Box::new(source),
        })
    }

    /// 创建脚本结果异常错误
    pub fn unexpected_script_result(detail: impl Into<String>) -> Self {
        AppError::Browser(BrowserError::UnexpectedScriptResult {
            detail: detail.into(),
        })
    }

    /// 创建目标不可达错误
    pub fn target_unreachable(url: impl Into<String>, source: AppError) -> Self {
        AppError::Automation(AutomationError::TargetUnreachable {
            url: url.into(),
            source: Box::new(source),
        })
    }

    /// 创建页面无响应错误
    pub fn page_unresponsive(url: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Automation(AutomationError::PageUnresponsive {
            url: url.into(),
            reason: reason.into(),
        })
    }

    /// 是否为页面无响应
    pub fn is_page_unresponsive(&self) -> bool {
        matches!(
            self,
            AppError::Automation(AutomationError::PageUnresponsive { .. })
        )
    }

    /// 是否为"已有任务在运行"
    pub fn is_run_in_progress(&self) -> bool {
        matches!(self, AppError::Automation(AutomationError::RunInProgress))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
