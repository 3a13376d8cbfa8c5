use thiserror::Error;

/// 开局参数校验失败。
///
/// 只在边界（解析客户端输入、构造 `GameSetup`）出现，
/// 状态机本身的操作从不返回错误。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("至少需要一名玩家")]
    NoPlayers,
    #[error("玩家数量 {0} 超过上限 {max}", max = crate::logic::MAX_PLAYERS)]
    TooManyPlayers(usize),
    #[error("未知难度: {0}")]
    UnknownDifficulty(String),
    #[error("未知模式: {0}")]
    UnknownMode(String),
}

/// 排行榜存储失败
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeaderboardError {
    #[error("玩家名不能为空")]
    EmptyPlayerName,
    #[error("排行榜存储不可用: {0}")]
    Unavailable(String),
}
