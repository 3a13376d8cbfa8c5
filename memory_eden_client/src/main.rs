use std::io::Write;
use std::sync::Arc;

use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use url::Url;

use memory_eden_core::{CardId, GameSession, ServerMessage};

mod command;

use command::{Command, HELP, parse_command};

#[derive(Parser, Debug)]
#[command(author, version, about = "翻牌配对游戏命令行客户端", long_about = None)]
struct Args {
    /// 服务器的 WebSocket 地址
    #[arg(long, env = "MEMORY_EDEN_URL", default_value = "ws://127.0.0.1:25917/ws")]
    url: Url,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!("正在连接到: {}", args.url);
    let (ws_stream, _) = connect_async(args.url.as_str()).await?;
    println!("连接成功!");

    let (mut write, mut read) = ws_stream.split();

    // 最近一次快照中牌的顺序，用于把序号换成牌的 id
    let board: Arc<Mutex<Vec<CardId>>> = Arc::new(Mutex::new(Vec::new()));

    // 启动一个任务来处理从服务器接收的消息
    let reader_board = board.clone();
    tokio::spawn(async move {
        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => match serde_json::from_str::<ServerMessage>(&text) {
                    Ok(server_msg) => {
                        print_server_message(&server_msg, &reader_board);
                        print!("> ");
                        let _ = std::io::stdout().flush();
                    }
                    Err(e) => eprintln!("解析服务器消息失败: {}", e),
                },
                Ok(_) => {}
                Err(e) => {
                    eprintln!("接收消息时出错: {}", e);
                    break;
                }
            }
        }
    });

    // 主任务处理用户输入
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    println!("--- 翻牌配对客户端 ---");
    println!("{}", HELP);

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = stdin.next_line().await? else {
            break;
        };
        let cards = board.lock().clone();

        match parse_command(&line, &cards) {
            Ok(Command::Send(msg)) => {
                let payload = serde_json::to_string(&msg)?;
                write.send(Message::Text(payload.into())).await?;
            }
            Ok(Command::Help) => println!("{}", HELP),
            Ok(Command::Exit) => {
                println!("正在断开连接...");
                break;
            }
            Err(e) => println!("{}", e),
        }
    }

    Ok(())
}

fn print_server_message(msg: &ServerMessage, board: &Mutex<Vec<CardId>>) {
    match msg {
        ServerMessage::GameStateSnapshot(session) => {
            *board.lock() = session.cards.iter().map(|c| c.id).collect();
            print_session(session);
        }
        ServerMessage::CardFlipped { card_id, value } => {
            let index = board.lock().iter().position(|id| id == card_id);
            match index {
                Some(i) => println!("\n翻开 #{}: {}", i, value),
                None => println!("\n翻开: {}", value),
            }
        }
        ServerMessage::Error { message } => println!("\n[错误] {}", message),
        ServerMessage::Info { message } => println!("\n[提示] {}", message),
        other => println!("\n<-- [服务器消息]:\n{:#?}", other),
    }
}

fn print_session(session: &GameSession) {
    println!("\n状态: {}  难度: {}  模式: {}", session.status, session.difficulty, session.mode);
    let row_len = if session.cards.len() > 16 { 6 } else { 4 };
    for (row, chunk) in session.cards.chunks(row_len).enumerate() {
        let line: Vec<String> = chunk
            .iter()
            .enumerate()
            .map(|(i, card)| format!("{:>2}:{}", row * row_len + i, card))
            .collect();
        println!("  {}", line.join("  "));
    }
    for (i, p) in session.players.iter().enumerate() {
        let marker = if i == session.current_player_index { "▶" } else { " " };
        println!("{} {}  分数 {}  步数 {}", marker, p.name, p.score, p.moves);
    }
}
