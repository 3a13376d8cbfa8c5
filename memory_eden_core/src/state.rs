use crate::card::{Card, CardId};
use crate::error::SetupError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 玩家标识，格式为 `player-<序号>`
pub type PlayerId = String;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameSession {
    pub cards: Vec<Card>,  // 发牌后大小和顺序固定
    pub players: Vec<Player>,  // 1 到 4 名玩家
    pub current_player_index: usize,
    pub status: GameStatus,
    pub difficulty: Difficulty,
    pub start_time_ms: Option<u64>,  // 进入 Playing 时设置，仅一次
    pub mode: GameMode,
    // 会话版本号，每次开局或重置都会递增。
    // 延迟判定携带签发时的版本号，版本号不一致即作废。
    pub epoch: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub score: u32,  // 只增不减
    pub moves: u32,  // 已判定的翻牌对数
    pub time_elapsed_ms: u64,  // 游戏结束时填写
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    #[default]
    Setup,
    Playing,
    /// 预留状态，目前没有任何转换会进入或离开它
    Paused,
    Finished,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Single,
    Multiplayer,
}

// --- Difficulty / GameMode 的实现方法 ---

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// 该难度下的对子数量
    pub const fn pair_count(self) -> usize {
        match self {
            Difficulty::Easy => 6,
            Difficulty::Medium => 8,
            Difficulty::Hard => 12,
        }
    }

    pub const fn card_count(self) -> usize {
        self.pair_count() * 2
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = SetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(SetupError::UnknownDifficulty(s.to_string())),
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            GameMode::Single => "single",
            GameMode::Multiplayer => "multiplayer",
        })
    }
}

impl FromStr for GameMode {
    type Err = SetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(GameMode::Single),
            "multiplayer" | "multi" => Ok(GameMode::Multiplayer),
            _ => Err(SetupError::UnknownMode(s.to_string())),
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            GameStatus::Setup => "setup",
            GameStatus::Playing => "playing",
            GameStatus::Paused => "paused",
            GameStatus::Finished => "finished",
        })
    }
}

// --- GameSession 的实现方法 ---

impl Default for GameSession {
    fn default() -> Self {
        GameSession {
            cards: Vec::new(),
            players: Vec::new(),
            current_player_index: 0,
            status: GameStatus::Setup,
            difficulty: Difficulty::default(),
            start_time_ms: None,
            mode: GameMode::default(),
            epoch: 0,
        }
    }
}

impl GameSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取当前行动的玩家 (如果存在)
    pub fn current_player(&self) -> Option<&Player> {
        self.players.get(self.current_player_index)
    }

    pub fn card(&self, card_id: CardId) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == card_id)
    }

    /// 当前正面朝上但尚未配对的牌
    pub fn pending_cards(&self) -> Vec<&Card> {
        self.cards.iter().filter(|c| c.is_pending()).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.cards.iter().filter(|c| c.is_pending()).count()
    }

    pub fn matched_pairs(&self) -> usize {
        self.cards.iter().filter(|c| c.is_matched).count() / 2
    }

    pub fn all_matched(&self) -> bool {
        !self.cards.is_empty() && self.cards.iter().all(|c| c.is_matched)
    }

    pub fn is_playing(&self) -> bool {
        self.status == GameStatus::Playing
    }

    /// 发给客户端的视图：背面朝上的牌不透露图案
    pub fn for_client(&self) -> Self {
        let mut client_state = self.clone();
        for card in client_state.cards.iter_mut().filter(|c| c.is_hidden()) {
            card.value.clear();
        }
        client_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("easy", Difficulty::Easy)]
    #[case(" Medium ", Difficulty::Medium)]
    #[case("HARD", Difficulty::Hard)]
    fn test_parse_difficulty(#[case] input: &str, #[case] expected: Difficulty) {
        assert_eq!(input.parse::<Difficulty>().unwrap(), expected);
    }

    #[test]
    fn test_reject_unknown_difficulty() {
        assert_eq!(
            "nightmare".parse::<Difficulty>(),
            Err(SetupError::UnknownDifficulty("nightmare".to_string()))
        );
    }

    #[test]
    fn test_reject_unknown_mode() {
        assert!(matches!("coop".parse::<GameMode>(), Err(SetupError::UnknownMode(_))));
        assert_eq!("multi".parse::<GameMode>().unwrap(), GameMode::Multiplayer);
    }

    #[test]
    fn test_serde_rejects_unknown_difficulty() {
        assert_eq!(serde_json::from_str::<Difficulty>("\"hard\"").unwrap(), Difficulty::Hard);
        assert!(serde_json::from_str::<Difficulty>("\"insane\"").is_err());
    }

    #[test]
    fn test_difficulty_ordering() {
        assert!(Difficulty::Easy < Difficulty::Medium);
        assert!(Difficulty::Medium < Difficulty::Hard);
        assert_eq!(Difficulty::Hard.card_count(), 24);
    }

    #[test]
    fn test_default_session_is_setup() {
        let session = GameSession::new();
        assert_eq!(session.status, GameStatus::Setup);
        assert!(session.cards.is_empty());
        assert!(session.players.is_empty());
        assert!(session.current_player().is_none());
        assert!(!session.all_matched());
    }

    #[test]
    fn test_for_client_hides_face_down_values() {
        let mut session = GameSession::new();
        session.cards = vec![Card::new("🎮"), Card::new("🎮"), Card::new("🎯"), Card::new("🎯")];
        session.cards[0].is_flipped = true;
        session.cards[2].is_flipped = true;
        session.cards[2].is_matched = true;

        let view = session.for_client();
        assert_eq!(view.cards[0].value, "🎮");
        assert_eq!(view.cards[1].value, "");
        assert_eq!(view.cards[2].value, "🎯");
        assert_eq!(view.cards[3].value, "");
        assert_eq!(view.cards[1].id, session.cards[1].id);
        assert_eq!(session.cards[1].value, "🎮");
    }
}
