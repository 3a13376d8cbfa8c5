use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use memory_eden_core::{FINISH_DELAY, SETTLE_DELAY};

use crate::table::TableConfig;

/// 服务器启动参数，命令行优先，其次是环境变量
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "翻牌配对游戏服务器", long_about = None)]
pub struct ServerConfig {
    /// 监听地址
    #[arg(long, env = "MEMORY_EDEN_ADDR", default_value = "0.0.0.0:25917")]
    pub addr: SocketAddr,

    /// 第二张牌翻开后到判定的等待（毫秒）
    #[arg(long, env = "MEMORY_EDEN_SETTLE_MS", default_value_t = SETTLE_DELAY.as_millis() as u64)]
    pub settle_ms: u64,

    /// 最后一对配对后到结束游戏的等待（毫秒）
    #[arg(long, env = "MEMORY_EDEN_FINISH_MS", default_value_t = FINISH_DELAY.as_millis() as u64)]
    pub finish_ms: u64,

    /// 排行榜查询的默认条数
    #[arg(long, env = "MEMORY_EDEN_LEADERBOARD_LIMIT", default_value_t = 10)]
    pub leaderboard_limit: usize,
}

impl ServerConfig {
    pub fn table_config(&self) -> TableConfig {
        TableConfig {
            settle_delay: Duration::from_millis(self.settle_ms),
            finish_delay: Duration::from_millis(self.finish_ms),
            leaderboard_limit: self.leaderboard_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::try_parse_from(["memory_eden_server"]).unwrap();
        let table = config.table_config();
        assert_eq!(table.settle_delay, SETTLE_DELAY);
        assert_eq!(table.finish_delay, FINISH_DELAY);
        assert_eq!(table.leaderboard_limit, 10);
        assert_eq!(config.addr.port(), 25917);
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::try_parse_from([
            "memory_eden_server",
            "--addr",
            "127.0.0.1:4000",
            "--settle-ms",
            "250",
            "--leaderboard-limit",
            "20",
        ])
        .unwrap();
        assert_eq!(config.addr.to_string(), "127.0.0.1:4000");
        assert_eq!(config.table_config().settle_delay, Duration::from_millis(250));
        assert_eq!(config.leaderboard_limit, 20);
    }

    #[test]
    fn test_rejects_bad_addr() {
        assert!(ServerConfig::try_parse_from(["memory_eden_server", "--addr", "nowhere"]).is_err());
    }
}
