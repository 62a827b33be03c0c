//! Application lifecycle
//!
//! - `lifetime::startup`: 按配置装配存储、缓存、点击管道与服务
//! - `lifetime::shutdown`: 等待信号并排空点击管道
//! - `modes::server`: HTTP 服务器

pub mod lifetime;
pub mod modes;
