use crate::card::CardId;
use crate::leaderboard::{DifficultyFilter, ScoreRecord};
use crate::logic::{FinalStanding, Resolution};
use crate::state::{Difficulty, GameMode, GameSession};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TableId = Uuid;

// --- 客户端 -> 服务器 的消息 ---
// 难度和模式都是封闭枚举，未知取值在反序列化时就会被拒绝。

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// 开始新的一局，会丢弃当前桌上的对局
    NewGame {
        difficulty: Difficulty,
        players: Vec<String>,
        mode: GameMode,
    },
    /// 翻开一张牌
    FlipCard { card_id: CardId },
    /// 回到初始状态
    ResetGame,
    /// 请求当前状态快照
    GetState,

    // --- 排行榜查询 ---
    GetLeaderboard {
        difficulty: DifficultyFilter,
        limit: Option<usize>,
    },
    GetRecentScores { limit: Option<usize> },
    GetPlayerBest { name: String },
}

// --- 服务器 -> 客户端 的消息 ---

#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum ServerMessage {
    /// 连接建立后发送，告知客户端所在的桌号
    Welcome { table_id: TableId },

    /// 完整会话状态的快照
    GameStateSnapshot(GameSession),

    /// 一张牌被翻开
    CardFlipped { card_id: CardId, value: String },

    /// 一对牌完成判定
    PairResolved(Resolution),

    /// 游戏结束，按最终得分排序的成绩
    GameFinished { standings: Vec<FinalStanding> },

    /// 排行榜查询结果
    Leaderboard { scores: Vec<ScoreRecord> },

    Info { message: String },
    Error { message: String },
}

impl From<CardId> for ClientMessage {
    fn from(card_id: CardId) -> Self {
        ClientMessage::FlipCard { card_id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_game_wire_format() {
        let json = r#"{"NewGame":{"difficulty":"easy","players":["Alice"],"mode":"single"}}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert_eq!(
            msg,
            ClientMessage::NewGame {
                difficulty: Difficulty::Easy,
                players: vec!["Alice".to_string()],
                mode: GameMode::Single,
            }
        );
    }

    #[test]
    fn test_unknown_difficulty_rejected_at_boundary() {
        let json = r#"{"NewGame":{"difficulty":"extreme","players":["Alice"],"mode":"single"}}"#;
        assert!(serde_json::from_str::<ClientMessage>(json).is_err());

        let json = r#"{"NewGame":{"difficulty":"easy","players":["Alice"],"mode":"coop"}}"#;
        assert!(serde_json::from_str::<ClientMessage>(json).is_err());
    }

    #[test]
    fn test_leaderboard_query_wire_format() {
        let json = r#"{"GetLeaderboard":{"difficulty":"all","limit":20}}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert_eq!(
            msg,
            ClientMessage::GetLeaderboard { difficulty: DifficultyFilter::All, limit: Some(20) }
        );
    }

    #[test]
    fn test_snapshot_serializes_lowercase_status() {
        let msg = ServerMessage::GameStateSnapshot(GameSession::new());
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""status":"setup""#));
        assert!(json.contains(r#""difficulty":"medium""#));
    }
}
