//! 基础设施层：持有浏览器页面资源，只暴露能力

pub mod js_executor;

pub use js_executor::JsExecutor;
