//! 浏览器连接
//!
//! 优先连接已开启远程调试端口的浏览器（沿用用户的登录状态），
//! 连接失败时可以自行启动一个。

pub mod connection;
pub mod headless;

pub use connection::{connect_to_browser, find_page_on_host};
pub use headless::launch_browser;
