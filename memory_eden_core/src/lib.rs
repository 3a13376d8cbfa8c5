//! # 翻牌配对游戏核心逻辑库
//!
//! 这个 `core` crate 包含了翻牌配对游戏的所有核心状态管理、
//! 发牌、配对判定、计分，以及客户端-服务器通信消息的定义。
//! 它不依赖任何运行时：延迟判定以凭证的形式交给调用方调度，
//! 时间和随机数由调用方注入，因此可以被服务器、客户端或测试直接复用。

mod card;
mod clock;
mod error;
mod leaderboard;
mod logic;
mod message;
mod scoring;
mod state;

pub use card::*;

pub use clock::*;

pub use error::*;

pub use leaderboard::*;

pub use logic::*;

pub use message::*;

pub use scoring::*;

pub use state::*;
