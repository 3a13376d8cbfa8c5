use crate::error::LeaderboardError;
use crate::logic::FinalStanding;
use crate::state::{Difficulty, GameMode};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

pub type ScoreId = Uuid;

/// 待写入排行榜的一条成绩
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewScore {
    pub player_name: String,
    pub score: u32,
    pub moves: u32,
    pub time_elapsed_ms: u64,
    pub difficulty: Difficulty,
    pub timestamp_ms: u64,
    pub mode: Option<GameMode>,
}

/// 排行榜中已保存的成绩
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub id: ScoreId,
    pub player_name: String,
    pub score: u32,
    pub moves: u32,
    pub time_elapsed_ms: u64,
    pub difficulty: Difficulty,
    pub timestamp_ms: u64,
    pub mode: Option<GameMode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyFilter {
    #[default]
    All,
    Easy,
    Medium,
    Hard,
}

impl DifficultyFilter {
    pub fn matches(self, difficulty: Difficulty) -> bool {
        match self {
            DifficultyFilter::All => true,
            DifficultyFilter::Easy => difficulty == Difficulty::Easy,
            DifficultyFilter::Medium => difficulty == Difficulty::Medium,
            DifficultyFilter::Hard => difficulty == Difficulty::Hard,
        }
    }
}

impl From<Difficulty> for DifficultyFilter {
    fn from(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => DifficultyFilter::Easy,
            Difficulty::Medium => DifficultyFilter::Medium,
            Difficulty::Hard => DifficultyFilter::Hard,
        }
    }
}

impl FromStr for DifficultyFilter {
    type Err = crate::error::SetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(DifficultyFilter::All);
        }
        s.parse::<Difficulty>().map(DifficultyFilter::from)
    }
}

impl NewScore {
    pub fn from_standing(standing: &FinalStanding, mode: GameMode, timestamp_ms: u64) -> Self {
        NewScore {
            player_name: standing.name.clone(),
            score: standing.final_score,
            moves: standing.moves,
            time_elapsed_ms: standing.time_elapsed_ms,
            difficulty: standing.difficulty,
            timestamp_ms,
            mode: Some(mode),
        }
    }
}

/// 排行榜存储
///
/// 核心逻辑从不直接调用它，由宿主在游戏结束后写入。
pub trait LeaderboardStore: Send + Sync {
    /// 保存一条成绩，返回新记录的 id
    fn save(&self, score: NewScore) -> Result<ScoreId, LeaderboardError>;

    /// 按得分从高到低返回前 `limit` 条
    fn query_top(&self, filter: DifficultyFilter, limit: usize) -> Result<Vec<ScoreRecord>, LeaderboardError>;

    /// 按时间从新到旧返回前 `limit` 条
    fn recent(&self, limit: usize) -> Result<Vec<ScoreRecord>, LeaderboardError>;

    /// 某个玩家的最好成绩
    fn player_best(&self, player_name: &str, limit: usize) -> Result<Vec<ScoreRecord>, LeaderboardError>;
}

/// 进程内的排行榜，服务重启后清空
#[derive(Debug, Default)]
pub struct InMemoryLeaderboard {
    records: RwLock<Vec<ScoreRecord>>,
}

impl InMemoryLeaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    fn top_by<F>(&self, limit: usize, keep: F) -> Vec<ScoreRecord>
    where
        F: Fn(&ScoreRecord) -> bool,
    {
        let mut hits: Vec<ScoreRecord> = self.records.read().iter().filter(|&r| keep(r)).cloned().collect();
        // 同分时先达成的排在前面
        hits.sort_by(|a, b| b.score.cmp(&a.score).then(a.timestamp_ms.cmp(&b.timestamp_ms)));
        hits.truncate(limit);
        hits
    }
}

impl LeaderboardStore for InMemoryLeaderboard {
    fn save(&self, score: NewScore) -> Result<ScoreId, LeaderboardError> {
        let player_name = score.player_name.trim();
        if player_name.is_empty() {
            return Err(LeaderboardError::EmptyPlayerName);
        }

        let id = Uuid::new_v4();
        self.records.write().push(ScoreRecord {
            id,
            player_name: player_name.to_string(),
            score: score.score,
            moves: score.moves,
            time_elapsed_ms: score.time_elapsed_ms,
            difficulty: score.difficulty,
            timestamp_ms: score.timestamp_ms,
            mode: score.mode,
        });
        Ok(id)
    }

    fn query_top(&self, filter: DifficultyFilter, limit: usize) -> Result<Vec<ScoreRecord>, LeaderboardError> {
        Ok(self.top_by(limit, |r| filter.matches(r.difficulty)))
    }

    fn recent(&self, limit: usize) -> Result<Vec<ScoreRecord>, LeaderboardError> {
        let mut hits = self.records.read().clone();
        hits.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
        hits.truncate(limit);
        Ok(hits)
    }

    fn player_best(&self, player_name: &str, limit: usize) -> Result<Vec<ScoreRecord>, LeaderboardError> {
        let player_name = player_name.trim();
        Ok(self.top_by(limit, |r| r.player_name == player_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, score: u32, difficulty: Difficulty, timestamp_ms: u64) -> NewScore {
        NewScore {
            player_name: name.to_string(),
            score,
            moves: 10,
            time_elapsed_ms: 30_000,
            difficulty,
            timestamp_ms,
            mode: Some(GameMode::Single),
        }
    }

    fn seeded() -> InMemoryLeaderboard {
        let board = InMemoryLeaderboard::new();
        board.save(entry("Alice", 840, Difficulty::Easy, 1)).unwrap();
        board.save(entry("Bob", 1260, Difficulty::Medium, 2)).unwrap();
        board.save(entry("Alice", 1680, Difficulty::Hard, 3)).unwrap();
        board.save(entry("Carol", 900, Difficulty::Easy, 4)).unwrap();
        board
    }

    #[test]
    fn test_query_top_all() {
        let board = seeded();
        let top = board.query_top(DifficultyFilter::All, 10).unwrap();
        let scores: Vec<u32> = top.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![1680, 1260, 900, 840]);
    }

    #[test]
    fn test_query_top_filters_and_limits() {
        let board = seeded();
        let easy = board.query_top(DifficultyFilter::Easy, 10).unwrap();
        assert_eq!(easy.len(), 2);
        assert!(easy.iter().all(|r| r.difficulty == Difficulty::Easy));
        assert_eq!(easy[0].player_name, "Carol");

        let top_one = board.query_top(DifficultyFilter::All, 1).unwrap();
        assert_eq!(top_one.len(), 1);
        assert_eq!(top_one[0].score, 1680);
    }

    #[test]
    fn test_ties_keep_earliest_first() {
        let board = InMemoryLeaderboard::new();
        board.save(entry("Late", 500, Difficulty::Easy, 20)).unwrap();
        board.save(entry("Early", 500, Difficulty::Easy, 10)).unwrap();
        let top = board.query_top(DifficultyFilter::All, 2).unwrap();
        assert_eq!(top[0].player_name, "Early");
    }

    #[test]
    fn test_recent_orders_by_timestamp() {
        let board = seeded();
        let recent = board.recent(2).unwrap();
        assert_eq!(recent[0].player_name, "Carol");
        assert_eq!(recent[1].player_name, "Alice");
        assert_eq!(recent[1].timestamp_ms, 3);
    }

    #[test]
    fn test_player_best() {
        let board = seeded();
        let best = board.player_best(" Alice ", 5).unwrap();
        assert_eq!(best.len(), 2);
        assert!(best.iter().all(|r| r.player_name == "Alice"));
        assert_eq!(best[0].score, 1680);
    }

    #[test]
    fn test_save_rejects_blank_name() {
        let board = InMemoryLeaderboard::new();
        assert_eq!(
            board.save(entry("  ", 10, Difficulty::Easy, 1)),
            Err(LeaderboardError::EmptyPlayerName)
        );
        assert!(board.is_empty());
    }

    #[test]
    fn test_filter_parse() {
        assert_eq!("all".parse::<DifficultyFilter>().unwrap(), DifficultyFilter::All);
        assert_eq!("Hard".parse::<DifficultyFilter>().unwrap(), DifficultyFilter::Hard);
        assert!("legendary".parse::<DifficultyFilter>().is_err());
    }

    #[test]
    fn test_new_score_from_standing() {
        let standing = FinalStanding {
            player_id: "player-0".to_string(),
            name: "Alice".to_string(),
            match_score: 60,
            moves: 7,
            time_elapsed_ms: 30_000,
            final_score: 870,
            difficulty: Difficulty::Easy,
        };
        let score = NewScore::from_standing(&standing, GameMode::Single, 99);
        assert_eq!(score.score, 870);
        assert_eq!(score.player_name, "Alice");
        assert_eq!(score.timestamp_ms, 99);

        let board = InMemoryLeaderboard::new();
        let id = board.save(score).unwrap();
        assert_eq!(board.query_top(DifficultyFilter::Easy, 1).unwrap()[0].id, id);
    }
}
