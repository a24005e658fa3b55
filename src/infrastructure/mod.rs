//! 基础设施层：只提供等待与取消能力，不认识幻灯片

pub mod cancel;
pub mod cooldown;

pub use cancel::CancelToken;
pub use cooldown::{Cancelled, CooldownGate};
