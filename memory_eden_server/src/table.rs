use std::sync::Arc;
use std::time::Duration;

use memory_eden_core::{
    CardId, ClientMessage, Clock, FINISH_DELAY, FlipOutcome, GameSession, GameSetup,
    LeaderboardError, LeaderboardStore, NewScore, ResolutionTicket, SETTLE_DELAY, ScoreRecord,
    ServerMessage, TableId, end_game, flip_card, initialize_game, reset_game, resolve_pair,
};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// 单次排行榜查询的条数上限
pub const MAX_LEADERBOARD_LIMIT: usize = 100;
/// 个人最好成绩的条数
const PLAYER_BEST_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableConfig {
    pub settle_delay: Duration,
    pub finish_delay: Duration,
    pub leaderboard_limit: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        TableConfig {
            settle_delay: SETTLE_DELAY,
            finish_delay: FINISH_DELAY,
            leaderboard_limit: 10,
        }
    }
}

// 一张桌子对应一个 WebSocket 连接和一局游戏。
// 重要‼️：所有锁都是同步锁，不得跨越 await 持有。
pub struct Table {
    pub id: TableId,
    session: Mutex<GameSession>,
    rng: Mutex<StdRng>,
    // 正在等待的延迟任务（判定 + 结束），重置或开新局时取消
    pending: Mutex<Option<JoinHandle<()>>>,
    // 用于向该连接的 WebSocket 任务发送消息的通道
    sender: mpsc::Sender<ServerMessage>,
    leaderboard: Arc<dyn LeaderboardStore>,
    clock: Arc<dyn Clock + Send + Sync>,
    config: TableConfig,
}

impl Table {
    pub fn new(
        id: TableId,
        sender: mpsc::Sender<ServerMessage>,
        leaderboard: Arc<dyn LeaderboardStore>,
        clock: Arc<dyn Clock + Send + Sync>,
        config: TableConfig,
        rng: StdRng,
    ) -> Arc<Table> {
        Arc::new(Table {
            id,
            session: Mutex::new(GameSession::new()),
            rng: Mutex::new(rng),
            pending: Mutex::new(None),
            sender,
            leaderboard,
            clock,
            config,
        })
    }

    /// 发给客户端的当前状态
    pub fn snapshot(&self) -> GameSession {
        self.session.lock().for_client()
    }

    /// 取消正在等待的判定/结束任务
    pub fn cancel_pending(&self) {
        if let Some(handle) = self.pending.lock().take() {
            handle.abort();
        }
    }

    /// 核心消息处理逻辑
    pub async fn handle_message(self: &Arc<Self>, msg: ClientMessage) {
        match msg {
            ClientMessage::NewGame { difficulty, players, mode } => {
                let setup = match GameSetup::new(difficulty, players.as_slice(), mode) {
                    Ok(setup) => setup,
                    Err(e) => {
                        self.send(ServerMessage::Error { message: e.to_string() }).await;
                        return;
                    }
                };

                self.cancel_pending();
                let snapshot = {
                    let mut session = self.session.lock();
                    let mut rng = self.rng.lock();
                    initialize_game(&mut session, &setup, &mut *rng, self.clock.as_ref());
                    session.for_client()
                };
                info!(table = %self.id, %difficulty, %mode, players = setup.player_names().len(), "新的一局开始");
                self.send(ServerMessage::GameStateSnapshot(snapshot)).await;
            }
            ClientMessage::FlipCard { card_id } => {
                self.flip(card_id).await;
            }
            ClientMessage::ResetGame => {
                self.cancel_pending();
                let snapshot = {
                    let mut session = self.session.lock();
                    reset_game(&mut session);
                    session.for_client()
                };
                info!(table = %self.id, "对局已重置");
                self.send(ServerMessage::GameStateSnapshot(snapshot)).await;
            }
            ClientMessage::GetState => {
                let snapshot = self.snapshot();
                self.send(ServerMessage::GameStateSnapshot(snapshot)).await;
            }
            ClientMessage::GetLeaderboard { difficulty, limit } => {
                let scores = self.leaderboard.query_top(difficulty, self.clamp_limit(limit));
                self.send_scores(scores).await;
            }
            ClientMessage::GetRecentScores { limit } => {
                let scores = self.leaderboard.recent(self.clamp_limit(limit));
                self.send_scores(scores).await;
            }
            ClientMessage::GetPlayerBest { name } => {
                let scores = self.leaderboard.player_best(&name, PLAYER_BEST_LIMIT);
                self.send_scores(scores).await;
            }
        }
    }

    async fn flip(self: &Arc<Self>, card_id: CardId) {
        let (outcome, value) = {
            let mut session = self.session.lock();
            let outcome = flip_card(&mut session, card_id);
            let value = session.card(card_id).map(|c| c.value.clone()).unwrap_or_default();
            (outcome, value)
        };

        match outcome {
            FlipOutcome::Ignored => {
                debug!(table = %self.id, %card_id, "忽略无效的翻牌");
            }
            FlipOutcome::Flipped => {
                self.send(ServerMessage::CardFlipped { card_id, value }).await;
            }
            FlipOutcome::PairPending(ticket) => {
                self.send(ServerMessage::CardFlipped { card_id, value }).await;
                self.schedule_resolution(ticket);
            }
        }
    }

    /// 在等待之后判定这对牌；如果全部配对完成，再等待一段时间后结束游戏。
    /// 两步在同一个任务里完成，这样重置时只需要取消一个任务。
    fn schedule_resolution(self: &Arc<Self>, ticket: ResolutionTicket) {
        let table = Arc::clone(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(table.config.settle_delay).await;
            if table.resolve(ticket).await {
                tokio::time::sleep(table.config.finish_delay).await;
                table.finish(ticket.epoch).await;
            }
        });

        // 能翻出新的一对，说明上一对已经判定过；上一个任务可能还在发送消息，
        // 这里只替换句柄，不取消它。换局时的取消由 cancel_pending 负责。
        *self.pending.lock() = Some(handle);
    }

    /// 返回是否所有牌都已配对
    async fn resolve(&self, ticket: ResolutionTicket) -> bool {
        let resolved = {
            let mut session = self.session.lock();
            resolve_pair(&mut session, ticket).map(|resolution| (resolution, session.for_client()))
        };
        let Some((resolution, snapshot)) = resolved else {
            debug!(table = %self.id, epoch = ticket.epoch, "判定凭证已失效，跳过");
            return false;
        };

        let completed = resolution.completed;
        self.send(ServerMessage::PairResolved(resolution)).await;
        self.send(ServerMessage::GameStateSnapshot(snapshot)).await;
        completed
    }

    async fn finish(&self, epoch: u64) {
        let (standings, mode, snapshot) = {
            let mut session = self.session.lock();
            if session.epoch != epoch {
                return;
            }
            let standings = end_game(&mut session, self.clock.as_ref());
            (standings, session.mode, session.for_client())
        };
        if standings.is_empty() {
            return;
        }

        // 保存失败只记录日志，不影响游戏结束
        let now = self.clock.now_ms();
        for standing in &standings {
            match self.leaderboard.save(NewScore::from_standing(standing, mode, now)) {
                Ok(id) => debug!(table = %self.id, player = %standing.name, %id, "成绩已保存"),
                Err(e) => warn!(table = %self.id, player = %standing.name, "保存成绩失败: {}", e),
            }
        }
        info!(table = %self.id, winner = %standings[0].name, score = standings[0].final_score, "游戏结束");

        self.send(ServerMessage::GameFinished { standings }).await;
        self.send(ServerMessage::GameStateSnapshot(snapshot)).await;
    }

    fn clamp_limit(&self, limit: Option<usize>) -> usize {
        limit.unwrap_or(self.config.leaderboard_limit).clamp(1, MAX_LEADERBOARD_LIMIT)
    }

    async fn send_scores(&self, scores: Result<Vec<ScoreRecord>, LeaderboardError>) {
        let scores = scores.unwrap_or_else(|e| {
            warn!(table = %self.id, "查询排行榜失败: {}", e);
            Vec::new()
        });
        self.send(ServerMessage::Leaderboard { scores }).await;
    }

    async fn send(&self, msg: ServerMessage) {
        if self.sender.send(msg).await.is_err() {
            // 发送失败，说明客户端已断开，后续由 handle_socket 清理
            warn!(table = %self.id, "向客户端发送消息失败（可能已断开）");
        }
    }
}

// --- 单元测试 ---
