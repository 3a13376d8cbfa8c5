use crate::state::Difficulty;
use rand::Rng;
use rand::prelude::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// --- 核心数据结构定义 ---

/// 卡牌的唯一标识，在卡牌的整个生命周期内保持不变
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub Uuid);

impl CardId {
    pub fn new() -> CardId {
        CardId(Uuid::new_v4())
    }
}

impl Default for CardId {
    fn default() -> Self {
        Self::new()
    }
}

/// 单张翻牌 (Card)
///
/// 状态只有三种：
/// - 背面朝上：`!is_flipped && !is_matched`
/// - 待判定：`is_flipped && !is_matched`
/// - 已配对：`is_matched`（此后永远正面朝上）
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub value: String,
    pub is_flipped: bool,
    pub is_matched: bool,
}

impl Card {
    pub fn new(value: impl Into<String>) -> Card {
        Card {
            id: CardId::new(),
            value: value.into(),
            is_flipped: false,
            is_matched: false,
        }
    }

    /// 正面朝上但尚未配对
    pub fn is_pending(&self) -> bool {
        self.is_flipped && !self.is_matched
    }

    /// 背面朝上，可以被翻开
    pub fn is_hidden(&self) -> bool {
        !self.is_flipped && !self.is_matched
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_flipped || self.is_matched {
            write!(f, "{}", self.value)
        } else {
            write!(f, "🂠")
        }
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// --- 牌组生成 ---

/// 固定的图案库，所有难度都从这里挑选图案
pub const PALETTE: [&str; 12] = [
    "🎮", "🎨", "🎯", "🎪", "🎭", "🎸", "🎺", "🎻", "🎬", "🎤", "🎧", "🎲",
];

// 图案库必须能覆盖最难的难度
const _: () = assert!(PALETTE.len() >= Difficulty::Hard.pair_count());

/// 为给定难度生成一副洗好的牌
///
/// 1. 从图案库中随机挑选 `pair_count` 个互不相同的图案。
/// 2. 每个图案生成两张牌（图案相同，id 不同）。
/// 3. 对整副牌做均匀洗牌（Fisher-Yates，由 `SliceRandom::shuffle` 实现）。
///
/// 除了消耗随机数之外没有副作用。
pub fn generate_deck<R: Rng + ?Sized>(difficulty: Difficulty, rng: &mut R) -> Vec<Card> {
    let pair_count = difficulty.pair_count();

    let mut symbols = PALETTE.to_vec();
    symbols.shuffle(rng);
    symbols.truncate(pair_count);

    let mut deck = Vec::with_capacity(pair_count * 2);
    for symbol in symbols {
        deck.push(Card::new(symbol));
        deck.push(Card::new(symbol));
    }
    deck.shuffle(rng);
    deck
}

/// 使用线程本地的随机源生成一副牌
pub fn generate_random_deck(difficulty: Difficulty) -> Vec<Card> {
    let mut rng = rand::rng();
    generate_deck(difficulty, &mut rng)
}

// --- 配对判定 ---

/// 两张牌图案相同且不是同一张牌时才算配对
pub fn is_match(a: &Card, b: &Card) -> bool {
    a.value == b.value && a.id != b.id
}

// --- 单元测试 ---
