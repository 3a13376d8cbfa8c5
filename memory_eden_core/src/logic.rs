use crate::card::*;
use crate::clock::Clock;
use crate::error::SetupError;
use crate::scoring::{MATCH_POINTS, calculate_score};
use crate::state::*;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, trace};

pub const MAX_PLAYERS: usize = 4;

/// 第二张牌翻开后到判定之间的等待，纯粹为了让界面展示两张牌面
pub const SETTLE_DELAY: Duration = Duration::from_millis(1000);
/// 最后一对配对成功后到结束游戏之间的等待
pub const FINISH_DELAY: Duration = Duration::from_millis(1500);

// --- 开局参数 ---

/// 经过校验的开局参数，只能通过 [`GameSetup::new`] 构造
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSetup {
    difficulty: Difficulty,
    player_names: Vec<String>,
    mode: GameMode,
}

impl GameSetup {
    /// 校验并规范化玩家名单
    ///
    /// - 单人模式总是恰好一名玩家，取第一个非空名字，没有则用 `Player 1`。
    /// - 多人模式逐个去除首尾空白，空名字替换为 `Player <序号>`；
    ///   名单为空或超过 4 人时返回错误。
    pub fn new<S: AsRef<str>>(
        difficulty: Difficulty,
        player_names: &[S],
        mode: GameMode,
    ) -> Result<GameSetup, SetupError> {
        let player_names = match mode {
            GameMode::Single => {
                let name = player_names
                    .iter()
                    .map(|n| n.as_ref().trim())
                    .find(|n| !n.is_empty())
                    .map_or_else(|| default_name(0), str::to_string);
                vec![name]
            }
            GameMode::Multiplayer => {
                if player_names.is_empty() {
                    return Err(SetupError::NoPlayers);
                }
                if player_names.len() > MAX_PLAYERS {
                    return Err(SetupError::TooManyPlayers(player_names.len()));
                }
                player_names
                    .iter()
                    .enumerate()
                    .map(|(i, n)| match n.as_ref().trim() {
                        "" => default_name(i),
                        trimmed => trimmed.to_string(),
                    })
                    .collect()
            }
        };

        Ok(GameSetup { difficulty, player_names, mode })
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn player_names(&self) -> &[String] {
        &self.player_names
    }
}

fn default_name(index: usize) -> String {
    format!("Player {}", index + 1)
}

// --- 翻牌与判定的结果类型 ---

/// 延迟判定的凭证
///
/// 在第二张牌翻开时签发，记录会话版本号和两张待判定牌的 id。
/// 判定时会对照当前状态重新校验，过期的凭证不会产生任何修改。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionTicket {
    pub epoch: u64,
    pub first: CardId,
    pub second: CardId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipOutcome {
    /// 非法操作，状态未改变
    Ignored,
    /// 翻开了第一张牌
    Flipped,
    /// 翻开了第二张牌，需要在稍后用凭证进行判定
    PairPending(ResolutionTicket),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PairOutcome {
    Matched,
    Mismatched,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub outcome: PairOutcome,
    pub first: CardId,
    pub second: CardId,
    /// 完成这对翻牌的玩家
    pub player_index: usize,
    /// 判定后轮到的玩家
    pub next_player_index: usize,
    /// 所有牌都已配对
    pub completed: bool,
}

/// 游戏结束时每名玩家的最终成绩
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalStanding {
    pub player_id: PlayerId,
    pub name: String,
    pub match_score: u32,
    pub moves: u32,
    pub time_elapsed_ms: u64,
    pub final_score: u32,
    pub difficulty: Difficulty,
}

// --- 核心游戏流程函数 ---

/// 开始新的一局游戏
///
/// - 按难度发一副洗好的牌。
/// - 按名单创建玩家，分数和步数清零。
/// - 第一个玩家先行动，记录开始时间，进入 Playing 阶段。
/// - 递增会话版本号，之前签发的判定凭证全部作废。
pub fn initialize_game<R, C>(session: &mut GameSession, setup: &GameSetup, rng: &mut R, clock: &C)
where
    R: Rng + ?Sized,
    C: Clock + ?Sized,
{
    let players = setup
        .player_names
        .iter()
        .enumerate()
        .map(|(i, name)| Player {
            id: format!("player-{}", i),
            name: name.clone(),
            score: 0,
            moves: 0,
            time_elapsed_ms: 0,
        })
        .collect();

    *session = GameSession {
        cards: generate_deck(setup.difficulty, rng),
        players,
        current_player_index: 0,
        status: GameStatus::Playing,
        difficulty: setup.difficulty,
        start_time_ms: Some(clock.now_ms()),
        mode: setup.mode,
        epoch: session.epoch + 1,
    };

    debug!(
        epoch = session.epoch,
        difficulty = %session.difficulty,
        mode = %session.mode,
        players = session.players.len(),
        "新的一局开始"
    );
}

/// 翻开一张牌
///
/// 以下情况都是静默忽略的非法操作：
/// - 当前不在 Playing 阶段；
/// - 已经有两张待判定的牌（任何时刻最多两张）；
/// - 找不到这张牌，或它已经翻开、已经配对。
///
/// 翻开后如果正好有两张待判定的牌，返回判定凭证，
/// 由调用方在 [`SETTLE_DELAY`] 之后调用 [`resolve_pair`]。
pub fn flip_card(session: &mut GameSession, card_id: CardId) -> FlipOutcome {
    if !session.is_playing() {
        trace!(%card_id, status = %session.status, "不在游戏中，忽略翻牌");
        return FlipOutcome::Ignored;
    }

    let pending: Vec<CardId> = session.pending_cards().iter().map(|c| c.id).collect();
    if pending.len() >= 2 {
        trace!(%card_id, "已有两张待判定的牌，忽略翻牌");
        return FlipOutcome::Ignored;
    }

    let Some(card) = session.cards.iter_mut().find(|c| c.id == card_id) else {
        trace!(%card_id, "未知的牌，忽略翻牌");
        return FlipOutcome::Ignored;
    };
    if !card.is_hidden() {
        trace!(%card_id, "牌已翻开或已配对，忽略翻牌");
        return FlipOutcome::Ignored;
    }
    card.is_flipped = true;

    match pending.first() {
        None => FlipOutcome::Flipped,
        Some(&first) => FlipOutcome::PairPending(ResolutionTicket {
            epoch: session.epoch,
            first,
            second: card_id,
        }),
    }
}

/// 判定一对待判定的牌
///
/// 凭证与当前状态不一致时（会话已重置或重新开局、阶段不对、
/// 牌已不再处于待判定状态）返回 `None`，不做任何修改。
///
/// - 配对成功：两张牌标记为已配对，当前玩家加分、步数加一，继续行动。
/// - 配对失败：两张牌翻回背面，当前玩家步数加一；多人模式下轮到下一位玩家。
pub fn resolve_pair(session: &mut GameSession, ticket: ResolutionTicket) -> Option<Resolution> {
    if ticket.epoch != session.epoch || !session.is_playing() || ticket.first == ticket.second {
        debug!(ticket_epoch = ticket.epoch, epoch = session.epoch, "判定凭证已过期");
        return None;
    }

    let first_idx = session.cards.iter().position(|c| c.id == ticket.first)?;
    let second_idx = session.cards.iter().position(|c| c.id == ticket.second)?;
    if !session.cards[first_idx].is_pending() || !session.cards[second_idx].is_pending() {
        debug!("凭证中的牌已不再待判定");
        return None;
    }

    let matched = is_match(&session.cards[first_idx], &session.cards[second_idx]);
    let player_index = session.current_player_index;

    for idx in [first_idx, second_idx] {
        let card = &mut session.cards[idx];
        if matched {
            card.is_matched = true;
        } else {
            card.is_flipped = false;
        }
    }

    if let Some(player) = session.players.get_mut(player_index) {
        player.moves += 1;
        if matched {
            player.score += MATCH_POINTS;
        }
    }

    if !matched && session.mode == GameMode::Multiplayer && !session.players.is_empty() {
        session.current_player_index = (player_index + 1) % session.players.len();
    }

    let resolution = Resolution {
        outcome: if matched { PairOutcome::Matched } else { PairOutcome::Mismatched },
        first: ticket.first,
        second: ticket.second,
        player_index,
        next_player_index: session.current_player_index,
        completed: session.all_matched(),
    };
    debug!(outcome = ?resolution.outcome, player_index, completed = resolution.completed, "完成判定");
    Some(resolution)
}

/// 结束游戏
///
/// 强制进入 Finished 阶段，为每名玩家填写用时，
/// 并按最终得分从高到低返回成绩。不在 Playing 阶段时什么也不做。
pub fn end_game<C: Clock + ?Sized>(session: &mut GameSession, clock: &C) -> Vec<FinalStanding> {
    if !session.is_playing() {
        trace!(status = %session.status, "不在游戏中，忽略结束请求");
        return Vec::new();
    }

    let elapsed = session
        .start_time_ms
        .map_or(0, |start| clock.now_ms().saturating_sub(start));
    session.status = GameStatus::Finished;

    let difficulty = session.difficulty;
    let mut standings: Vec<FinalStanding> = session
        .players
        .iter_mut()
        .map(|player| {
            player.time_elapsed_ms = elapsed;
            FinalStanding {
                player_id: player.id.clone(),
                name: player.name.clone(),
                match_score: player.score,
                moves: player.moves,
                time_elapsed_ms: elapsed,
                final_score: calculate_score(player.moves, elapsed, difficulty),
                difficulty,
            }
        })
        .collect();
    standings.sort_by(|a, b| b.final_score.cmp(&a.final_score));

    debug!(epoch = session.epoch, elapsed, "游戏结束");
    standings
}

/// 重置为初始的 Setup 状态
///
/// 任何阶段都可以调用。版本号继续递增，使进行中的判定失效。
pub fn reset_game(session: &mut GameSession) {
    *session = GameSession {
        epoch: session.epoch + 1,
        ..GameSession::default()
    };
    debug!(epoch = session.epoch, "会话已重置");
}

// --- 单元测试 ---
