//! 计分规则
//!
//! 局内每配对一次固定加 [`MATCH_POINTS`] 分；
//! 游戏结束时用 [`calculate_score`] 计算写入排行榜的最终得分：
//!
//! ```text
//! raw   = BASE_SCORE - MOVE_PENALTY * moves - TIME_PENALTY_PER_SECOND * seconds
//! score = round(max(raw, 0) * multiplier(difficulty))
//! ```
//!
//! 倍率：easy 1.0，medium 1.5，hard 2.0。

use crate::state::Difficulty;

/// 局内每次配对成功的固定加分
pub const MATCH_POINTS: u32 = 10;

pub const BASE_SCORE: f64 = 1000.0;
pub const MOVE_PENALTY: f64 = 10.0;
pub const TIME_PENALTY_PER_SECOND: f64 = 2.0;

/// 难度倍率，难度越高倍率越大
pub fn difficulty_multiplier(difficulty: Difficulty) -> f64 {
    match difficulty {
        Difficulty::Easy => 1.0,
        Difficulty::Medium => 1.5,
        Difficulty::Hard => 2.0,
    }
}

/// 计算最终得分
///
/// - 永远不会为负，最低为 0。
/// - 步数或用时增加时得分不会增加。
/// - 同样的表现，难度越高得分不会越低。
/// - 四舍五入到整数。
pub fn calculate_score(moves: u32, elapsed_ms: u64, difficulty: Difficulty) -> u32 {
    let seconds = elapsed_ms as f64 / 1000.0;
    let raw = BASE_SCORE - MOVE_PENALTY * moves as f64 - TIME_PENALTY_PER_SECOND * seconds;
    let scaled = raw.max(0.0) * difficulty_multiplier(difficulty);
    scaled.round() as u32
}
