use memory_eden_core::{CardId, ClientMessage, Difficulty, DifficultyFilter, GameMode};

pub const HELP: &str = "\
可用命令:
  new <easy|medium|hard> [single|multi] [玩家...]  - 开始新的一局
  flip <序号>                                     - 翻开一张牌
  reset                                           - 重置对局
  state                                           - 查看当前状态
  top [all|easy|medium|hard] [条数]               - 排行榜
  recent [条数]                                   - 最近的成绩
  best <玩家>                                     - 某个玩家的最好成绩
  help                                            - 显示帮助
  exit                                            - 退出";

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Send(ClientMessage),
    Help,
    Exit,
}

/// 将一行输入解析为命令
///
/// `cards` 是最近一次快照中牌的顺序，用于把序号换成牌的 id。
pub fn parse_command(line: &str, cards: &[CardId]) -> Result<Command, String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let Some((&command, args)) = parts.split_first() else {
        return Err("请输入命令，输入 help 查看帮助".to_string());
    };

    let msg = match command {
        "new" => {
            let difficulty: Difficulty = args
                .first()
                .ok_or("用法: new <easy|medium|hard> [single|multi] [玩家...]")?
                .parse()
                .map_err(|e| format!("{}", e))?;
            // 模式可以省略，此时后面的参数都是玩家名
            let (mode, players) = match args.get(1).map(|m| m.parse::<GameMode>()) {
                Some(Ok(mode)) => (mode, &args[2..]),
                _ => (GameMode::Single, &args[1..]),
            };
            ClientMessage::NewGame {
                difficulty,
                players: players.iter().map(|p| p.to_string()).collect(),
                mode,
            }
        }
        "flip" => {
            let index: usize = args
                .first()
                .ok_or("用法: flip <序号>")?
                .parse()
                .map_err(|_| "无效的序号".to_string())?;
            let card_id = *cards.get(index).ok_or_else(|| format!("没有序号为 {} 的牌", index))?;
            ClientMessage::FlipCard { card_id }
        }
        "reset" => ClientMessage::ResetGame,
        "state" => ClientMessage::GetState,
        "top" => {
            let difficulty = match args.first() {
                Some(filter) => filter.parse::<DifficultyFilter>().map_err(|e| format!("{}", e))?,
                None => DifficultyFilter::All,
            };
            ClientMessage::GetLeaderboard { difficulty, limit: parse_limit(args.get(1))? }
        }
        "recent" => ClientMessage::GetRecentScores { limit: parse_limit(args.first())? },
        "best" => {
            if args.is_empty() {
                return Err("用法: best <玩家>".to_string());
            }
            ClientMessage::GetPlayerBest { name: args.join(" ") }
        }
        "help" => return Ok(Command::Help),
        "exit" | "quit" => return Ok(Command::Exit),
        _ => return Err(format!("未知命令: {}", line.trim())),
    };

    Ok(Command::Send(msg))
}

fn parse_limit(arg: Option<&&str>) -> Result<Option<usize>, String> {
    arg.map(|s| s.parse::<usize>().map_err(|_| "无效的条数".to_string()))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_single_defaults() {
        let cmd = parse_command("new easy", &[]).unwrap();
        assert_eq!(
            cmd,
            Command::Send(ClientMessage::NewGame {
                difficulty: Difficulty::Easy,
                players: vec![],
                mode: GameMode::Single,
            })
        );
    }

    #[test]
    fn test_new_multiplayer() {
        let cmd = parse_command("new hard multi Ann Ben", &[]).unwrap();
        assert_eq!(
            cmd,
            Command::Send(ClientMessage::NewGame {
                difficulty: Difficulty::Hard,
                players: vec!["Ann".to_string(), "Ben".to_string()],
                mode: GameMode::Multiplayer,
            })
        );
    }

    #[test]
    fn test_new_single_with_name_only() {
        let cmd = parse_command("new medium Alice", &[]).unwrap();
        assert_eq!(
            cmd,
            Command::Send(ClientMessage::NewGame {
                difficulty: Difficulty::Medium,
                players: vec!["Alice".to_string()],
                mode: GameMode::Single,
            })
        );
    }

    #[test]
    fn test_new_rejects_unknown_difficulty() {
        assert!(parse_command("new impossible", &[]).is_err());
        assert!(parse_command("new", &[]).is_err());
    }

    #[test]
    fn test_flip_by_index() {
        let cards = [CardId::new(), CardId::new()];
        assert_eq!(
            parse_command("flip 1", &cards).unwrap(),
            Command::Send(ClientMessage::FlipCard { card_id: cards[1] })
        );
        assert!(parse_command("flip 2", &cards).is_err());
        assert!(parse_command("flip x", &cards).is_err());
    }

    #[test]
    fn test_leaderboard_commands() {
        assert_eq!(
            parse_command("top medium 5", &[]).unwrap(),
            Command::Send(ClientMessage::GetLeaderboard {
                difficulty: DifficultyFilter::Medium,
                limit: Some(5),
            })
        );
        assert_eq!(
            parse_command("recent", &[]).unwrap(),
            Command::Send(ClientMessage::GetRecentScores { limit: None })
        );
        assert_eq!(
            parse_command("best Mary Ann", &[]).unwrap(),
            Command::Send(ClientMessage::GetPlayerBest { name: "Mary Ann".to_string() })
        );
    }

    #[test]
    fn test_control_commands() {
        assert_eq!(parse_command("help", &[]).unwrap(), Command::Help);
        assert_eq!(parse_command("  exit ", &[]).unwrap(), Command::Exit);
        assert!(parse_command("", &[]).is_err());
        assert!(parse_command("dance", &[]).is_err());
    }
}
